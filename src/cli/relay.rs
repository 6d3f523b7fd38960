use chrono::Local;
use clap::Parser;

use crate::{
    api::relay::{Client, Envelope},
    beckn,
    prelude::*,
    tables::build_messages_table,
};

#[derive(Parser)]
pub struct RelayArgs {
    /// Upstream analytics endpoint.
    #[clap(long, env = "RELAY_URL")]
    url: Option<String>,

    /// Print the response envelope as JSON instead of the message log.
    #[clap(long)]
    json: bool,
}

impl RelayArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let result = Client::new()?.relay(self.url.as_deref()).await;
        if let Err(error) = &result {
            error!("relay failed: {error}");
        }
        let envelope = Envelope::from(result);
        if self.json {
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        } else if let Some(data) = &envelope.data {
            let messages = beckn::messages_from_relay(data, Local::now());
            info!(n_lines = messages.len(), "received");
            println!("{}", build_messages_table(&messages));
        }
        ensure!(envelope.success, "relay failed");
        Ok(())
    }
}
