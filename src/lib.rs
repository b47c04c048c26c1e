pub mod analysis;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod history;
pub mod journal;
pub mod llm;
pub mod models;
pub mod server;
pub mod storage;

use cli::Args;
use journal::JournalAgent;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("HTTP API Port: {:?}", args.http_port);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Store Type: {}", args.store_type);
    match args.store_type.to_lowercase().as_str() {
        "redis" => info!("Store Host: {} (prefix '{}')", args.store_host, args.store_prefix),
        "file" => info!("Store Path: {}", args.store_path),
        _ => {}
    }
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("-------------------------");

    let agent = Arc::new(JournalAgent::from_args(&args).await?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args.server_api_key.clone(), args.http_port);
    server.run().await?;

    Ok(())
}
