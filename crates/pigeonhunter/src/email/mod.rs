//! Mail store access and outgoing message composition.
//!
//! This module covers everything that touches a mailbox: the [`MailSource`]
//! seam with its IMAP implementation, parsing raw messages, composing replies
//! and notices, and the idempotency ledger that keeps a message from being
//! handled twice.

pub mod client;
pub mod composer;
pub mod error;
pub mod parser;
pub mod selector;
pub mod source;
pub mod tracker;
pub mod types;

pub use client::ImapClient;
pub use composer::{MessageComposer, ThreadingHeaders};
pub use error::EmailError;
pub use parser::EmailParser;
pub use selector::{MessageSelector, SubjectPrefixSelector};
pub use source::MailSource;
pub use tracker::{EmailTracker, LedgerStore, TrackerStats};
pub use types::{Attachment, ComposedMessage, MailMessage};
