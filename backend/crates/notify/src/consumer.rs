//! Email worker
//!
//! Drains the queue one message at a time. A message is acked only after
//! the mailer accepted it; any failure is nacked without requeue, because
//! registration already compensates for an undeliverable invitation.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::NotifyResult;
use crate::mailer::{Mailer, OutgoingEmail};
use crate::message::EmailMessage;
use crate::queue::{Delivery, MessageQueue};
use crate::template;

pub struct EmailConsumer<Q, M> {
    queue: Arc<Q>,
    mailer: Arc<M>,
}

impl<Q, M> EmailConsumer<Q, M>
where
    Q: MessageQueue + Send + Sync,
    M: Mailer + Send + Sync,
{
    pub fn new(queue: Arc<Q>, mailer: Arc<M>) -> Self {
        Self { queue, mailer }
    }

    /// Consume until `shutdown` fires or the queue closes
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!("email consumer started");

        loop {
            let delivery = tokio::select! {
                _ = shutdown.cancelled() => break,
                delivery = self.queue.next_delivery() => delivery,
            };

            let Some(delivery) = delivery else {
                tracing::info!("message queue closed");
                break;
            };
            self.handle(delivery).await;
        }

        tracing::info!("email consumer stopped");
    }

    /// Process one delivery and settle it. Returns whether it was acked.
    pub async fn handle(&self, delivery: Delivery) -> bool {
        match self.process(&delivery.body).await {
            Ok(()) => {
                delivery.ack();
                true
            }
            Err(err) => {
                tracing::warn!(
                    tag = delivery.tag,
                    error = %err,
                    "email delivery failed, discarding"
                );
                delivery.nack(false);
                false
            }
        }
    }

    async fn process(&self, body: &[u8]) -> NotifyResult<()> {
        let message = EmailMessage::decode(body)?;
        let rendered = template::render(&message.template_id, &message.data)?;

        let email = OutgoingEmail {
            to: message.to,
            subject: rendered.subject,
            html: rendered.html,
        };
        self.mailer.send(&email).await
    }
}
