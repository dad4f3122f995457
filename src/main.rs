use clap::Parser;
use codementor::cli::Args;
use dotenv::dotenv;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    let args = Args::parse();
    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder
        ::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    codementor::run(args).await
}
