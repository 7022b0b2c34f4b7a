use std::io::Write;
use std::time::Duration;

use anyhow::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::args::AskSubCommand;
use crate::repos::config::FileConfig;
use crate::services::ChatClient;

pub async fn execute<W: Write>(
    client: &ChatClient,
    ask: &AskSubCommand,
    out: &mut W,
) -> Result<(), Error> {
    let prompt = ask.prompt.join(" ");
    info!("Asking for a reply to a {} character prompt", prompt.chars().count());

    let reply = match ask.timeout {
        Some(secs) => {
            let deadline = Instant::now() + Duration::from_secs(secs);
            client.complete_with_deadline(&prompt, deadline).await?
        }
        None => client.complete(&prompt).await?,
    };

    if reply.is_empty() {
        warn!("The model returned an empty reply");
    }
    writeln!(out, "{}", reply)?;
    Ok(())
}

pub async fn run(source: FileConfig, ask: &AskSubCommand) -> Result<(), Error> {
    let client = ChatClient::new(source)?;
    execute(&client, ask, &mut std::io::stdout()).await
}
