pub mod agent;
pub mod cli;
pub mod codeblocks;
pub mod config;
pub mod history;
pub mod llm;
pub mod models;
pub mod roadmap;
pub mod server;
pub mod stream;

use std::error::Error;
use std::sync::Arc;

use log::info;

use agent::ChatAgent;
use cli::Args;
use history::initialize_history_store;
use llm::{ GenerationConfig, LlmConfig, new_client };
use server::Server;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Gemini Model: {}", args.gemini_model);
    info!("Gemini Base URL: {}", args.gemini_base_url);
    info!("Max Output Tokens: {}", args.max_output_tokens);
    info!("Temperature: {}", args.temperature);
    info!("History Store Type: {}", args.history_type);
    if args.history_type.to_lowercase() == "redis" {
        info!("History Store Host: {}", args.history_host);
    }
    info!("-------------------------");

    let llm_config = LlmConfig {
        api_key: args.gemini_api_key.clone(),
        model: args.gemini_model.clone(),
        base_url: args.gemini_base_url.clone(),
    };
    let chat_client = new_client(&llm_config);
    let generation = GenerationConfig {
        max_output_tokens: args.max_output_tokens,
        temperature: args.temperature,
    };

    let agent = Arc::new(ChatAgent::new(chat_client, generation));
    let history = initialize_history_store(&args)?;

    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, history, args);
    server.run().await?;

    Ok(())
}
