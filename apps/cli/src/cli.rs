//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};

/// Storefront - call the storefront API with retries and notifications
#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Send the stored bearer token
    #[arg(long, global = true)]
    pub auth: bool,

    /// Suppress toast output (failures are still logged)
    #[arg(long, global = true)]
    pub no_notify: bool,

    /// Override the retry count
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// GET a path and print the response data
    Get(PathArgs),

    /// DELETE a path
    Delete(PathArgs),

    /// POST a JSON body
    Post(BodyArgs),

    /// PUT a JSON body
    Put(BodyArgs),

    /// Store a bearer token
    Login(LoginArgs),

    /// Forget the stored bearer token
    Logout,
}

#[derive(Args, Debug)]
pub struct PathArgs {
    /// API path, e.g. /products
    pub path: String,

    /// Query parameters as key=value
    #[arg(short, long = "query", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct BodyArgs {
    /// API path, e.g. /cart/items
    pub path: String,

    /// JSON request body
    #[arg(short, long, default_value = "{}")]
    pub data: String,

    /// Success message to show when the call succeeds
    #[arg(long)]
    pub success_message: Option<String>,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Bearer token issued by the storefront
    #[arg(env = "STOREFRONT_TOKEN", hide_env_values = true)]
    pub token: String,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}
