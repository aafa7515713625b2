//! Notifier publisher

use std::sync::Arc;

use crate::error::NotifyResult;
use crate::message::EmailMessage;
use crate::queue::MessageQueue;

/// Publish side of the notification channel
///
/// A successful return means the message was accepted by the queue, not
/// that the email was sent.
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    async fn publish(
        &self,
        recipient: &str,
        template_id: &str,
        data: serde_json::Value,
    ) -> NotifyResult<()>;
}

/// Notifier that encodes an [`EmailMessage`] onto a queue
pub struct QueueNotifier<Q: MessageQueue> {
    queue: Arc<Q>,
}

impl<Q: MessageQueue> QueueNotifier<Q> {
    pub fn new(queue: Arc<Q>) -> Self {
        Self { queue }
    }
}

impl<Q> Notifier for QueueNotifier<Q>
where
    Q: MessageQueue + Send + Sync,
{
    async fn publish(
        &self,
        recipient: &str,
        template_id: &str,
        data: serde_json::Value,
    ) -> NotifyResult<()> {
        let body = EmailMessage::new(recipient, template_id, data).encode()?;
        self.queue.publish(body).await?;

        tracing::debug!(template_id, "notification published");
        Ok(())
    }
}
