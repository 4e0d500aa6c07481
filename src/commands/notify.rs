//! `opsrun notify` — post a message to the configured webhook.

use anyhow::{Result, bail};
use clap::Args;

use crate::ci::Webhook;
use crate::config::Config;
use crate::output::OutputContext;

#[derive(Args, Debug)]
pub struct NotifyArgs {
    /// Message text
    pub message: String,

    /// Webhook URL (defaults to `webhook_url` in the config)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,
}

/// Run `opsrun notify`.
///
/// # Errors
///
/// Returns an error if no webhook URL is configured, the request cannot be
/// sent, or the endpoint rejects it.
pub async fn run(ctx: &OutputContext, config: &Config, args: &NotifyArgs) -> Result<()> {
    let url = match args.url.clone().or_else(|| config.webhook_url.clone()) {
        Some(url) => url,
        None => bail!("no webhook URL given; pass --url or set `webhook_url` in the config"),
    };

    let message = args.message.clone();
    // ureq is blocking; keep it off the async runtime's core threads.
    let status =
        tokio::task::spawn_blocking(move || Webhook::new(url).notify(&message)).await??;

    if (200..300).contains(&status) {
        ctx.success(&format!("Notification sent ({status})"));
        Ok(())
    } else {
        bail!("webhook rejected the notification with status {status}")
    }
}
