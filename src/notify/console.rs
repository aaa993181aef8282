use async_trait::async_trait;

use super::{Notifier, NotifyError};

/// Prints reports to stdout. Used when posting is off.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn signature(&self) -> &'static str {
        "Console"
    }

    async fn send(&self, _channel_id: &str, text: &str) -> Result<(), NotifyError> {
        println!("{}", text);
        Ok(())
    }
}
