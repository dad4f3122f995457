use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Gemini Provider Args ---
    /// API key for the Gemini API.
    #[arg(long, env = "GEMINI_API_KEY", default_value = "")]
    pub gemini_api_key: String,

    /// Model name for chat completion.
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.5-flash")]
    pub gemini_model: String,

    /// Base URL for the Gemini API.
    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com/v1beta"
    )]
    pub gemini_base_url: String,

    // --- Generation Args ---
    /// Maximum number of output tokens per completion.
    #[arg(long, env = "MAX_OUTPUT_TOKENS", default_value = "2048")]
    pub max_output_tokens: u32,

    /// Sampling temperature for completions.
    #[arg(long, env = "TEMPERATURE", default_value = "0.7")]
    pub temperature: f32,

    // --- History Store Args ---
    /// History chat store type (memory, redis)
    #[arg(long, env = "HISTORY_TYPE", default_value = "memory")]
    pub history_type: String,

    /// History store host endpoint (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "HISTORY_HOST", default_value = "redis://127.0.0.1:6379")]
    pub history_host: String,

    /// Prefix for Redis history keys.
    #[arg(long, env = "HISTORY_REDIS_PREFIX", default_value = "history:")]
    pub history_redis_prefix: String,

    /// Maximum number of messages returned by the history endpoints.
    #[arg(long, env = "HISTORY_LIMIT", default_value = "50")]
    pub history_limit: usize,

    // --- Server Args ---
    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:8000")]
    pub server_addr: String,

    /// Optional API key required from clients on /api routes. If set, clients
    /// must send it as a bearer token.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}
