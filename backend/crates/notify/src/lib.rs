//! Notify Crate - Notifier collaborator
//!
//! Activation emails travel through an at-least-once queue with manual
//! acknowledgment:
//! - `publisher` - `Notifier` seam used by registration, backed by a queue
//! - `queue` - `MessageQueue` and the in-process `InMemoryQueue`
//! - `consumer` - `EmailConsumer` worker (ack on send, nack without requeue on failure)
//! - `mailer` - `Mailer` senders (HTTP mail API, logging outbox)
//! - `template` - subject/body rendering per template id

pub mod consumer;
pub mod error;
pub mod mailer;
pub mod message;
pub mod publisher;
pub mod queue;
pub mod template;

pub use consumer::EmailConsumer;
pub use error::{NotifyError, NotifyResult};
pub use mailer::{HttpMailer, LogMailer, Mailer, MailerConfig, OutgoingEmail};
pub use message::EmailMessage;
pub use publisher::{Notifier, QueueNotifier};
pub use queue::{Delivery, InMemoryQueue, MessageQueue, QueueStats};
pub use template::USER_INVITATION_TEMPLATE;
