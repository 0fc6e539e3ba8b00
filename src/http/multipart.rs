//! `multipart/form-data` bodies framed with the gateway's fixed boundary.

/// Boundary token used by every upload.
pub const BOUNDARY: &str = "WebAppBoundary";

/// Value of the `Content-Type` header sent with uploads.
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data; boundary=WebAppBoundary";

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: String,
        data: Vec<u8>,
    },
}

/// Builder for an upload body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartBody {
    parts: Vec<Part>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Adds a file part. The MIME type is guessed from `file_name`.
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .to_string();
        self.parts.push(Part::File {
            name: name.into(),
            file_name,
            mime,
            data,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in self.parts {
            out.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text { name, value } => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                            escape_quotes(&name)
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    name,
                    file_name,
                    mime,
                    data,
                } => {
                    out.extend_from_slice(
                        format!(
                            concat!(
                                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                                "Content-Type: {}\r\n\r\n",
                            ),
                            escape_quotes(&name),
                            escape_quotes(&file_name),
                            mime
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(&data);
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        out
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('"', "%22")
}
