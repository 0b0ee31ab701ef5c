//! goforit server - local web playground for running code snippets.

mod browser;
mod last_code;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::Router;
use clap::Parser;
use goforit_engine::Language;
use goforit_engine::io::config::load_config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "goforit")]
#[command(about = "Run snippets in many languages and inspect what the compiler made of them")]
struct Args {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on (0 picks a free port)
    #[arg(long, default_value = "0")]
    port: u16,

    /// Directory containing the web UI (defaults to ./static)
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Engine configuration file (TOML); defaults apply when missing
    #[arg(long, default_value = "goforit.toml")]
    config: PathBuf,

    /// File holding the last submitted snippet
    #[arg(long, default_value = "last_code.json")]
    last_code: PathBuf,

    /// Do not open a browser window on startup
    #[arg(long)]
    no_browser: bool,
}

fn banner(url: &str) -> String {
    let mut text = format!("\ngoforit is running at {url}\n\nAvailable languages:\n");
    for language in Language::ALL {
        text.push_str("- ");
        text.push_str(language.display_name());
        text.push('\n');
    }
    text.push_str("\nPress Ctrl+C to stop the server.\n");
    text
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    goforit_engine::logging::init("warn,goforit=info");

    let args = Args::parse();

    let config = load_config(&args.config)?;
    info!(config = %args.config.display(), "engine configuration loaded");

    let state = AppState::new(config, args.last_code);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .nest("/api", routes::api_router())
        .layer(cors)
        .with_state(state);

    let static_dir = args.static_dir.unwrap_or_else(|| PathBuf::from("static"));
    if static_dir.exists() {
        info!(static_dir = %static_dir.display(), "serving static files");
        let index = ServeFile::new(static_dir.join("index.html"));
        app = app.fallback_service(
            ServeDir::new(&static_dir)
                .append_index_html_on_directories(true)
                .fallback(index),
        );
    } else {
        info!(static_dir = %static_dir.display(), "static directory not found, API-only mode");
    }

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port)
        .parse()
        .context("invalid bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    let local = listener.local_addr()?;
    let url = format!("http://{local}");
    info!(addr = %local, "listening");
    println!("{}", banner(&url));

    if !args.no_browser {
        browser::open(&url);
    }

    axum::serve(listener, app).await?;

    Ok(())
}
