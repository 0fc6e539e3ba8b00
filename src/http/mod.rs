//! HTTP plumbing: request descriptors, body encoding and the transport.

mod client;
pub mod multipart;
mod request;

pub use client::{HttpTransport, Transport, TransportResponse};
#[cfg(test)]
pub use client::MockTransport;
pub use multipart::{BOUNDARY, MULTIPART_CONTENT_TYPE, MultipartBody};
pub use request::{
    BodyTransform, FORM_CONTENT_TYPE, JSON_CONTENT_TYPE, OutboundRequest, Payload, QueryParams,
    RequestDescriptor, ResponseFormat, form_urlencode,
};
