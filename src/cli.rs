use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oasguard")]
#[command(version)]
#[command(about = "Validate HTTP messages against an OpenAPI 3.x document", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the operations declared in an OpenAPI file
    Routes {
        /// Path to OpenAPI file
        #[arg(short, long)]
        openapi: PathBuf,
    },

    /// Route and validate a request
    Request {
        #[command(flatten)]
        message: MessageArgs,
    },

    /// Validate a response of the operation a request routes to
    Response {
        #[command(flatten)]
        message: MessageArgs,

        /// Response status code
        #[arg(short, long)]
        status: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct MessageArgs {
    /// Path to OpenAPI file
    #[arg(short, long)]
    pub openapi: PathBuf,

    /// HTTP method of the request
    #[arg(short, long, default_value = "GET")]
    pub method: String,

    /// Request path, optionally with a query string
    #[arg(short, long)]
    pub path: String,

    /// Header as 'Name: value' (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// File holding the message body, or '-' for stdin
    #[arg(short, long)]
    pub body: Option<PathBuf>,

    /// Skip `format` checks
    #[arg(long)]
    pub no_formats: bool,

    /// Only accept paths exactly as templated, without server base paths
    #[arg(long)]
    pub no_server_prefix: bool,
}
