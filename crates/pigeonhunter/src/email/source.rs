//! The mail store as seen by the pipeline.

use async_trait::async_trait;

use super::error::Result;
use super::selector::MessageSelector;
use super::types::{ComposedMessage, MailMessage};

/// Folder-level access to a mail store.
///
/// Implementations reconnect transparently after transport loss; an error
/// returned from any method means retries were exhausted.
#[async_trait]
pub trait MailSource: Send {
    /// Opens a session.
    async fn connect(&mut self) -> Result<()>;

    /// Closes the session if one is open.
    async fn disconnect(&mut self) -> Result<()>;

    /// Lists every folder name on the account.
    async fn list_folders(&mut self) -> Result<Vec<String>>;

    /// Checks whether a folder exists, without selecting it.
    async fn folder_exists(&mut self, folder: &str) -> Result<bool>;

    /// Fetches unread messages without marking them read.
    async fn fetch_unread(&mut self, folder: &str) -> Result<Vec<MailMessage>>;

    /// Fetches all messages, read or not, accepted by `selector`.
    async fn fetch_tagged(
        &mut self,
        folder: &str,
        selector: &dyn MessageSelector,
    ) -> Result<Vec<MailMessage>>;

    /// Appends a message to a folder and returns its stable identifier.
    async fn append(&mut self, folder: &str, message: &ComposedMessage) -> Result<Option<String>>;
}
