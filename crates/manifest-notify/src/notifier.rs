use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::git::CommitSource;
use crate::message::{dev_channel_body, plain_body, Variant};
use crate::space::ChatClient;

/// Build the notification body. Only the dev channel variant touches git.
pub async fn compose(variant: Variant, config: &Config, commits: &dyn CommitSource) -> Result<String> {
    match variant {
        Variant::DevChannel => {
            info!("reading latest commit message");
            let commit_message = commits.latest_message().await?;
            Ok(dev_channel_body(&config.folder, &config.branch, &commit_message))
        }
        Variant::Plain => Ok(plain_body(&config.folder)),
    }
}

/// Read, authenticate, send. Stops at the first failure.
pub async fn run(
    variant: Variant,
    config: &Config,
    commits: &dyn CommitSource,
    chat: &dyn ChatClient,
) -> Result<()> {
    let body = compose(variant, config, commits).await?;

    info!(server = %config.server_url, "authenticating service account");
    chat.authenticate().await?;

    info!(channel = %config.channel_id, "sending manifest notification");
    chat.send_text_message(&config.channel_id, &body).await?;
    info!("notification sent");
    Ok(())
}
