pub mod api;
pub mod websocket;

use crate::journal::JournalAgent;
use log::{ info, warn };
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    addr: String,
    agent: Arc<JournalAgent>,
    api_key: Option<String>,
    http_port: Option<u16>,
}

impl Server {
    pub fn new(
        addr: String,
        agent: Arc<JournalAgent>,
        api_key: Option<String>,
        http_port: Option<u16>
    ) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());

        if api_key.is_some() {
            info!("Server configured with API Key authentication.");
        } else {
            warn!("Server configured WITHOUT API Key authentication. Connections are open.");
        }

        Self { addr, agent, api_key, http_port }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Some(http_port) = self.http_port {
            api::start_http_server(http_port, Arc::clone(&self.agent), self.api_key.clone()).await?;
        }

        websocket::start_ws_server(&self.addr, Arc::clone(&self.agent), self.api_key.clone()).await
    }
}
