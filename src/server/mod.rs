pub mod api;
pub mod websocket;

use crate::agent::SiteAgent;
use crate::cli::Args;
use log::{ info, warn };
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    addr: String,
    agent: Arc<SiteAgent>,
    api_key: Option<String>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, agent: Arc<SiteAgent>, args: Args) -> Self {
        let api_key = args.server_api_key.clone().filter(|k| !k.trim().is_empty());

        if api_key.is_some() {
            info!("Server configured with API Key authentication.");
        } else {
            warn!("Server configured WITHOUT API Key authentication. Connections are open.");
        }

        Self { addr, agent, api_key, args }
    }

    /// Spawns the HTTP API when enabled, then serves WebSockets until the
    /// listener fails.
    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.args.enable_http {
            api::start_http_server(
                &self.args.http_addr,
                Arc::clone(&self.agent),
                self.args.clone()
            ).await?;
        } else {
            info!("HTTP API disabled.");
        }

        websocket::start_ws_server(
            &self.addr,
            Arc::clone(&self.agent),
            self.api_key.clone(),
            self.args.clone()
        ).await
    }
}
