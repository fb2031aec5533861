pub mod cli;
pub mod history;
pub mod llm;
pub mod models;
pub mod relay;
pub mod server;

use cli::Args;
use history::initialize_history_store;
use llm::{ LlmConfig, LlmType };
use llm::chat::new_client;
use log::info;
use relay::{ ChatRelay, RelayOptions };
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let chat_llm_type: LlmType = args.chat_llm_type.parse()?;

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", chat_llm_type);
    info!("Chat Model: {}", args.chat_model);
    info!("Chat Base URL: {}", args.chat_base_url.as_deref().unwrap_or("adapter default"));
    info!("Fragment Delay: {}ms", args.fragment_delay_ms);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let chat_config = LlmConfig {
        llm_type: chat_llm_type,
        api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
        completion_model: Some(args.chat_model.clone()),
        base_url: args.chat_base_url.clone(),
    };
    let chat_client = new_client(&chat_config)?;
    info!(
        "Chat client configured: Type={}, Model={}, BaseURL={}",
        chat_client.llm_type(),
        chat_client.model(),
        chat_client.base_url()
    );

    let history = initialize_history_store(&args);
    let relay = ChatRelay::new(chat_client, history, RelayOptions {
        fragment_delay: args.fragment_delay(),
    });

    let server = Server::new(args.server_addr.clone(), relay, args.clone());
    server.run().await?;

    Ok(())
}
