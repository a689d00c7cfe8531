use crate::core::NotificationSink;
use crate::domain::model::NotificationEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Logs each event instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationSink for TracingNotifier {
    async fn deliver(&self, event: NotificationEvent) -> anyhow::Result<()> {
        tracing::info!(
            "📨 {:?} for customer {} (appointment {}){}",
            event.kind,
            event.customer_id,
            event.appointment_id,
            event
                .reason
                .as_deref()
                .map(|r| format!(": {}", r))
                .unwrap_or_default()
        );
        Ok(())
    }
}

/// Forwards events to a channel drained by a delivery worker.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<NotificationEvent>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl NotificationSink for ChannelNotifier {
    async fn deliver(&self, event: NotificationEvent) -> anyhow::Result<()> {
        self.sender
            .send(event)
            .map_err(|e| anyhow::anyhow!("notification receiver dropped: {}", e))
    }
}
