pub mod api;

use std::error::Error;
use std::sync::Arc;

use crate::agent::ChatAgent;
use crate::cli::Args;
use crate::history::HistoryStore;

pub struct Server {
    addr: String,
    agent: Arc<ChatAgent>,
    history: Arc<dyn HistoryStore>,
    args: Args,
}

impl Server {
    pub fn new(
        addr: String,
        agent: Arc<ChatAgent>,
        history: Arc<dyn HistoryStore>,
        args: Args
    ) -> Self {
        Self {
            addr,
            agent,
            history,
            args,
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::serve(
            &self.addr,
            Arc::clone(&self.agent),
            Arc::clone(&self.history),
            self.args.clone()
        ).await
    }
}
