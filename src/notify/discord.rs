//! Discord bot delivery through the REST API (no gateway connection needed to post).

use async_trait::async_trait;
use serde::Serialize;

use super::{Notifier, NotifyError};
use crate::config::SCANNER;

/// Discord rejects longer message content
pub const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

pub struct DiscordNotifier {
    client: reqwest::Client,
    token: String,
}

impl DiscordNotifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
        }
    }

    fn messages_url(&self, channel_id: &str) -> String {
        format!("{}/channels/{}/messages", SCANNER.discord_api_base, channel_id)
    }
}

fn check_length(text: &str) -> Result<(), NotifyError> {
    let len = text.chars().count();
    if len > MAX_MESSAGE_LEN {
        return Err(NotifyError::TooLong {
            len,
            max: MAX_MESSAGE_LEN,
        });
    }
    Ok(())
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn signature(&self) -> &'static str {
        "Discord"
    }

    async fn send(&self, channel_id: &str, text: &str) -> Result<(), NotifyError> {
        check_length(text)?;

        let response = self
            .client
            .post(self.messages_url(channel_id))
            .header("Authorization", format!("Bot {}", self.token))
            .json(&CreateMessage { content: text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }
        log::debug!("Posted {} characters to channel {}", text.len(), channel_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_channel_url() {
        assert_eq!(
            DiscordNotifier::new("t").messages_url("1"),
            "https://discord.com/api/v10/channels/1/messages"
        );
    }

    #[test]
    fn rejects_oversized_messages() {
        assert!(check_length(&"x".repeat(MAX_MESSAGE_LEN)).is_ok());
        assert!(matches!(
            check_length(&"x".repeat(MAX_MESSAGE_LEN + 1)),
            Err(NotifyError::TooLong { .. })
        ));
    }
}
