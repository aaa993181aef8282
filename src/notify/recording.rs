//! Test notifier that keeps every message and can be told to fail.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{Notifier, NotifyError};

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|sent| sent.iter().map(|(_, text)| text.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn signature(&self) -> &'static str {
        "Recording"
    }

    async fn send(&self, channel_id: &str, text: &str) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((channel_id.to_string(), text.to_string()));
        }
        Ok(())
    }
}

#[tokio::test]
async fn delivery_counts_and_survives_failures() {
    let pages = vec!["a".to_string(), "b".to_string()];

    let ok = RecordingNotifier::default();
    assert_eq!(super::deliver_pages(&ok, "1", &pages).await, 2);
    assert_eq!(ok.messages(), pages);

    let broken = RecordingNotifier::failing();
    assert_eq!(super::deliver_pages(&broken, "1", &pages).await, 0);
}
