//! Blogcop webhook listener.
//!
//! Binds an HTTP server receiving GitHub webhook deliveries at
//! `POST /event_handler`. Every delivery's HMAC signature is verified against
//! the exact raw body before anything else is looked at; verified `push`
//! deliveries to the main branch are decoded into an [`articles::PushEvent`]
//! and handed to the configured [`articles::PushHandler`] on a background
//! task. The response does not wait for the check, and a client hanging up
//! does not cancel it.
//!
//! | Condition | Response |
//! |-----------|----------|
//! | Signature missing or wrong | 401 |
//! | Body is not JSON, or a push lacks `ref` or `repository` | 400 |
//! | Event other than `push` | 200, ignored |
//! | Push to another branch | 200, ignored |
//! | Main-branch push without an installation | 400 |
//! | Main-branch push | 202, check started; failures are logged |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport details and payload deserialization live
//! here. The `checker` crate sees only [`articles::PushHandler`] and
//! [`articles::PushEvent`].

pub mod error;
pub mod payload;
pub mod server;
pub mod signature;

pub use error::WebhookRejection;
pub use payload::PushPayload;
pub use server::{serve, webhook_router, WebhookState};
pub use signature::{verify_request, Signature, SignatureError};
