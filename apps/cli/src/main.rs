mod cli;
mod config;

use std::sync::Arc;

use clap::Parser;
use serde_json::Value;
use storefront_api_client::{
    CancellationToken, FileTokenStore, InMemoryTokenStore, RequestOptions, RequestSpec,
    StorefrontClient, TokenStore,
};
use storefront_core::constants::AUTH_TOKEN_KEY;
use storefront_core::notifications::{defaults, NotificationFilter};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands};
use config::Config;

fn init_tracing() {
    let log_format = std::env::var("STOREFRONT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn token_store(config: &Config) -> anyhow::Result<Arc<dyn TokenStore>> {
    Ok(match &config.token_file {
        Some(path) => Arc::new(FileTokenStore::open(path)?),
        None => Arc::new(InMemoryTokenStore::new()),
    })
}

fn request_options(cli: &Cli, config: &Config) -> RequestOptions {
    let mut retries = config.retries.clone();
    if let Some(max_retries) = cli.retries {
        retries.max_retries = max_retries;
    }
    let mut options = RequestOptions::default()
        .timeout(config.timeout)
        .retries(retries);
    if cli.auth {
        options = options.require_auth();
    }
    if cli.no_notify {
        options = options.quiet();
    }
    options
}

fn with_query(spec: RequestSpec, query: &[(String, String)]) -> RequestSpec {
    query
        .iter()
        .fold(spec, |spec, (key, value)| spec.query(key, value))
}

fn print_notifications() {
    for toast in defaults::toasts().history() {
        eprintln!(
            "[{}] {}: {}",
            toast.toast_type,
            toast.title.as_deref().unwrap_or("Notice"),
            toast.message
        );
    }
    let store = defaults::store();
    let unread = store.filter(NotificationFilter::Unread);
    if !unread.is_empty() {
        eprintln!("{} unread notification(s):", store.unread_count());
        for record in unread {
            eprintln!("  - [{}] {}: {}", record.category, record.title, record.message);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    let config = Config::from_env();

    let token_store = token_store(&config)?;
    let mut options = request_options(&cli, &config);
    let spec = match &cli.command {
        Commands::Login(args) => {
            token_store.set(AUTH_TOKEN_KEY, &args.token)?;
            tracing::info!("Token stored");
            return Ok(());
        }
        Commands::Logout => {
            token_store.remove(AUTH_TOKEN_KEY)?;
            tracing::info!("Token removed");
            return Ok(());
        }
        Commands::Get(args) => with_query(RequestSpec::get(&args.path), &args.query),
        Commands::Delete(args) => with_query(RequestSpec::delete(&args.path), &args.query),
        Commands::Post(args) | Commands::Put(args) => {
            let body: Value = serde_json::from_str(&args.data)?;
            if let Some(message) = &args.success_message {
                options = options.success_message(message);
            }
            let spec = if matches!(cli.command, Commands::Post(_)) {
                RequestSpec::post(&args.path)
            } else {
                RequestSpec::put(&args.path)
            };
            spec.json(&body)?
        }
    };

    let client = StorefrontClient::builder(&config.api_url)
        .token_store(token_store)
        .login_route(&config.login_route)
        .build()?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling request");
                cancel.cancel();
            }
        });
    }

    tracing::debug!("{} {}{}", spec.method, client.base_url(), spec.path);
    let result = client.request(&spec, &options, &cancel).await;
    print_notifications();

    let response = result?;
    println!("{}", serde_json::to_string_pretty(&response.data)?);
    if let Some(meta) = &response.meta {
        tracing::info!("meta: {}", meta);
    }
    Ok(())
}
