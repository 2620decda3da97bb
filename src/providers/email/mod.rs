//! Mail gateway implementations.
//!
//! This module contains the [`MailGateway`] trait and its Gmail REST
//! implementation, [`GmailGateway`].
//!
//! # Example
//!
//! ```ignore
//! use inbox_triage::providers::email::{GmailGateway, MailGateway};
//!
//! async fn subjects(gateway: &dyn MailGateway) {
//!     for id in gateway.list_recent(3).await.expect("failed to list inbox") {
//!         let message = gateway.fetch(&id).await.expect("failed to fetch message");
//!         println!("{}: {}", message.sender, message.subject);
//!     }
//! }
//! ```

mod gmail;
mod traits;

pub use gmail::GmailGateway;
#[cfg(test)]
pub use traits::MockMailGateway;
pub use traits::MailGateway;
