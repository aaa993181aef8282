//! Chat delivery. Fire-and-forget: failures are logged and never retried.

pub mod console;
pub mod discord;
#[cfg(test)]
pub mod recording;

use async_trait::async_trait;
use thiserror::Error;

pub use console::ConsoleNotifier;
pub use discord::DiscordNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("message is {len} characters, the channel accepts at most {max}")]
    TooLong { len: usize, max: usize },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn signature(&self) -> &'static str;

    async fn send(&self, channel_id: &str, text: &str) -> Result<(), NotifyError>;
}

/// Send every page in order. Returns how many were delivered.
pub async fn deliver_pages(notifier: &dyn Notifier, channel_id: &str, pages: &[String]) -> usize {
    let mut delivered = 0;
    for (i, page) in pages.iter().enumerate() {
        match notifier.send(channel_id, page).await {
            Ok(()) => delivered += 1,
            Err(e) => log::error!(
                "{}: page {}/{} not delivered: {}",
                notifier.signature(),
                i + 1,
                pages.len(),
                e
            ),
        }
    }
    delivered
}
