pub mod agent;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod generator;
pub mod history;
pub mod llm;
pub mod models;
pub mod profile;
pub mod prompt;
pub mod server;
pub mod session;
pub mod websocket;

use agent::SiteAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    if args.enable_http {
        info!("HTTP API Address: {}", args.http_addr);
    }
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("History Store Type: {}", args.history_type);
    info!("History Store Host: {}", args.history_host);
    info!("Questions Path: {}", args.questions_path);
    info!("Max Images Per Session: {}", args.max_images);
    info!("Session Idle Timeout: {}s", args.session_idle_secs);
    info!("TLS Enabled: {}", args.tls_paths().is_some());
    info!("-------------------------");

    let agent = Arc::new(SiteAgent::new(&args).await?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args);
    server.run().await?;

    Ok(())
}
