//! Outbound notifications for newly raised alerts.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, body: &str) -> Result<()>;
}

/// Writes each notification to the `notify` tracing target.
///
/// Stands in for an SMS gateway; swap in a real implementation at startup.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient: &str, body: &str) -> Result<()> {
        tracing::warn!(target: "notify", recipient, "{}", body);
        Ok(())
    }
}
