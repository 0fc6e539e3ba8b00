use anyhow::Result;
use clap::Parser;
use portal_api::commands::{self, Config, parse_key_value, parse_method};
use reqwest::Method;
use std::path::PathBuf;

/// portal-api - Learning portal API client
///
/// Sends requests to the portal's `/api` endpoints and prints the server's
/// response envelope as JSON.
///
/// The stored credential is read from the token file. When there is none,
/// PORTAL_SERVER_AUTHORIZATION is used as the bearer token.
///
/// Examples:
///   portal-api request /content/course/list -q pageNo=1
///   portal-api form /auth/login -f username=alice -f password=secret
///   portal-api upload /media/upload/coursefile --file intro.mp4
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Server origin, without the /api prefix (also via PORTAL_API_ORIGIN)
    #[arg(long, env = "PORTAL_API_ORIGIN", value_name = "URL", global = true)]
    origin: Option<String>,

    /// File holding the stored bearer token (also via PORTAL_TOKEN_FILE)
    #[arg(
        long = "token-file",
        env = "PORTAL_TOKEN_FILE",
        value_name = "PATH",
        global = true
    )]
    token_file: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Send a JSON request
    Request(RequestArgs),

    /// Send a URL-encoded form
    Form(FormArgs),

    /// Upload a file as multipart/form-data
    Upload(UploadArgs),
}

#[derive(clap::Args, Debug)]
struct RequestArgs {
    /// Path under /api, e.g. /content/course/list
    #[arg(value_name = "URL")]
    url: String,

    /// HTTP method
    #[arg(long, short = 'X', default_value = "GET", value_parser = parse_method)]
    method: Method,

    /// Query parameter, repeatable
    #[arg(long = "query", short = 'q', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    query: Vec<(String, String)>,

    /// JSON request body (ignored for GET)
    #[arg(long, short = 'd', value_name = "JSON")]
    data: Option<String>,
}

#[derive(clap::Args, Debug)]
struct FormArgs {
    #[arg(value_name = "URL")]
    url: String,

    #[arg(long, short = 'X', default_value = "POST", value_parser = parse_method)]
    method: Method,

    /// Form field, repeatable
    #[arg(long = "field", short = 'f', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    fields: Vec<(String, String)>,
}

#[derive(clap::Args, Debug)]
struct UploadArgs {
    #[arg(value_name = "URL")]
    url: String,

    /// File to upload
    #[arg(long, value_name = "PATH")]
    file: PathBuf,

    /// Name of the file part
    #[arg(long, default_value = "filedata")]
    name: String,

    #[arg(long, short = 'X', default_value = "POST", value_parser = parse_method)]
    method: Method,

    /// Extra text field, repeatable
    #[arg(long = "field", short = 'f', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    fields: Vec<(String, String)>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = portal_api::runtime::RealRuntime;
    let config = Config::new(runtime, cli.origin, cli.token_file)?;

    let envelope = match cli.command {
        Commands::Request(args) => {
            commands::request(
                &config.gateway,
                &args.url,
                args.method,
                args.query,
                args.data.as_deref(),
            )
            .await?
        }
        Commands::Form(args) => {
            commands::form(&config.gateway, &args.url, args.method, args.fields).await?
        }
        Commands::Upload(args) => {
            commands::upload(
                &config.runtime,
                &config.gateway,
                &args.url,
                args.method,
                &args.file,
                &args.name,
                args.fields,
            )
            .await?
        }
    };

    println!("{}", commands::render(&envelope)?);
    Ok(())
}
