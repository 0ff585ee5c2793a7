//! IMAP implementation of [`MailSource`].

use std::time::Duration;

use async_imap::Session;
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};
use utf7_imap::{decode_utf7_imap, encode_utf7_imap};

use crate::config::ImapConfig;
use crate::sanitize;

use super::composer::MessageComposer;
use super::error::{EmailError, Result};
use super::parser::EmailParser;
use super::selector::MessageSelector;
use super::source::MailSource;
use super::types::{ComposedMessage, MailMessage};

/// Type alias for the underlying async stream (using async-std compatible TcpStream).
type AsyncTcpStream = async_io::Async<std::net::TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

type ImapSession = Session<TlsStream>;

/// Upper bound for a single IMAP round trip.
const OPERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// IMAP client for scanning folders and appending composed messages.
pub struct ImapClient {
    session: Option<ImapSession>,
    config: ImapConfig,
    parser: EmailParser,
    composer: MessageComposer,
}

impl ImapClient {
    /// Creates a new IMAP client with the given configuration.
    pub fn new(config: ImapConfig) -> Self {
        let parser = EmailParser::new(Some(config.user.clone()));
        let composer = MessageComposer::new(config.user.clone());
        Self {
            session: None,
            config,
            parser,
            composer,
        }
    }

    /// Checks if the client currently holds a session.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    async fn open_session(&mut self) -> Result<()> {
        if !self.config.use_tls {
            return Err(EmailError::ConfigError(
                "TLS is required for secure email connections".to_string(),
            ));
        }

        let addr = format!("{}:{}", self.config.server, self.config.port);
        info!("Connecting to IMAP server at {}", addr);

        let std_stream = std::net::TcpStream::connect(&addr)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        std_stream
            .set_nonblocking(true)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        let tcp_stream = async_io::Async::new(std_stream)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;

        let tls = TlsConnector::new();
        let tls_stream = tls
            .connect(&self.config.server, tcp_stream)
            .await
            .map_err(|e| EmailError::TlsError(e.to_string()))?;

        let client = async_imap::Client::new(tls_stream);
        let password = self.password()?;

        let session = client
            .login(&self.config.user, password.expose_secret())
            .await
            .map_err(|(e, _)| EmailError::AuthenticationFailed(e.to_string()))?;

        info!(
            "Authenticated to IMAP server as {}",
            sanitize::redact_address(&self.config.user)
        );
        self.session = Some(session);
        Ok(())
    }

    fn password(&self) -> Result<SecretString> {
        if self.config.password.is_some() {
            debug!("Using password stored directly in the config file");
        }
        crate::secrets::resolve_secret(
            self.config.password.as_deref(),
            self.config.password_file.as_deref(),
            self.config.password_env_var.as_deref(),
        )
        .map_err(|e| EmailError::CredentialsNotFound(e.to_string()))
    }

    /// Makes sure a live session exists, reconnecting if the old one died.
    async fn ensure_connected(&mut self) -> Result<()> {
        if let Some(session) = self.session.as_mut() {
            match tokio::time::timeout(OPERATION_TIMEOUT, session.noop()).await {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(e)) => warn!("IMAP connection lost ({}). Reconnecting...", e),
                Err(_) => warn!("IMAP NOOP timed out. Reconnecting..."),
            }
            self.session = None;
        }
        self.open_session().await
    }

    /// Runs an operation on a live session, reconnecting and retrying on
    /// transport failures up to `max_reconnect_attempts` times.
    async fn with_session<T, F>(&mut self, operation: &str, mut op: F) -> Result<T>
    where
        F: for<'s> FnMut(&'s mut ImapSession) -> BoxFuture<'s, Result<T>>,
    {
        let max_attempts = self.config.max_reconnect_attempts;
        let mut attempt = 0;

        loop {
            let result = match self.ensure_connected().await {
                Ok(()) => match self.session.as_mut() {
                    Some(session) => {
                        match tokio::time::timeout(OPERATION_TIMEOUT, op(session)).await {
                            Ok(result) => result,
                            Err(_) => Err(EmailError::Timeout(operation.to_string())),
                        }
                    }
                    None => Err(EmailError::ConnectionFailed("Not connected".to_string())),
                },
                Err(e) => Err(e),
            };

            match result {
                Err(e) if e.is_transport() && attempt < max_attempts => {
                    attempt += 1;
                    warn!(
                        "IMAP {} failed ({}); reconnecting (attempt {}/{})",
                        operation, e, attempt, max_attempts
                    );
                    self.session = None;
                }
                other => return other,
            }
        }
    }

    fn parse_all(&self, raw: Vec<(u32, Vec<u8>)>) -> Vec<MailMessage> {
        raw.into_iter()
            .filter_map(|(uid, body)| match self.parser.parse(uid, &body) {
                Ok(message) => message,
                Err(e) => {
                    warn!("Failed to parse email UID {}: {}", uid, e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl MailSource for ImapClient {
    async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!("Already connected to IMAP server");
            return Ok(());
        }
        self.open_session().await
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            info!("Disconnecting from IMAP server");
            session
                .logout()
                .await
                .map_err(|e| EmailError::ProtocolError(e.to_string()))?;
        }
        Ok(())
    }

    async fn list_folders(&mut self) -> Result<Vec<String>> {
        let folders = self
            .with_session("LIST", |s| list_names(s, "*".to_string()).boxed())
            .await?;
        debug!("Found {} folders", folders.len());
        Ok(folders)
    }

    async fn folder_exists(&mut self, folder: &str) -> Result<bool> {
        debug!("Checking existence of folder: {}", folder);
        let pattern = list_pattern(folder);
        let names = self
            .with_session("LIST", |s| list_names(s, pattern.clone()).boxed())
            .await?;
        Ok(names.iter().any(|name| name == folder))
    }

    async fn fetch_unread(&mut self, folder: &str) -> Result<Vec<MailMessage>> {
        let folder_name = folder.to_string();
        let raw = self
            .with_session("FETCH", |s| {
                fetch_matching(s, folder_name.clone(), "UNSEEN".to_string()).boxed()
            })
            .await?;

        debug!("Fetched {} unread message(s) from {}", raw.len(), folder);
        Ok(self.parse_all(raw))
    }

    async fn fetch_tagged(
        &mut self,
        folder: &str,
        selector: &dyn MessageSelector,
    ) -> Result<Vec<MailMessage>> {
        let query = match selector.search_hint() {
            Some(hint) => format!("SUBJECT {}", quote(hint)),
            None => "ALL".to_string(),
        };
        let folder_name = folder.to_string();
        let raw = self
            .with_session("FETCH", |s| {
                fetch_matching(s, folder_name.clone(), query.clone()).boxed()
            })
            .await?;

        let tagged: Vec<MailMessage> = self
            .parse_all(raw)
            .into_iter()
            .filter(|message| selector.matches(message))
            .collect();
        debug!("Found {} tagged message(s) in {}", tagged.len(), folder);
        Ok(tagged)
    }

    async fn append(&mut self, folder: &str, message: &ComposedMessage) -> Result<Option<String>> {
        let raw = self.composer.render(message)?;
        let folder_name = folder.to_string();

        self.with_session("APPEND", |s| {
            append_raw(s, folder_name.clone(), raw.clone()).boxed()
        })
        .await?;

        info!(
            "Saved message to {} with subject: {}",
            folder, message.subject
        );
        Ok(Some(message.message_id.clone()))
    }
}

impl Drop for ImapClient {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("ImapClient dropped without explicit disconnect - session will be closed");
        }
    }
}

/// Quotes an IMAP string argument.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Folder name as sent on the wire (modified UTF-7).
fn wire_name(folder: &str) -> String {
    encode_utf7_imap(folder.to_string())
}

/// LIST pattern matching exactly `folder`. The pattern argument is written
/// verbatim by the session, so it is quoted here.
fn list_pattern(folder: &str) -> String {
    quote(&wire_name(folder))
}

/// Lists folder names matching a wire-ready `pattern`, decoded to UTF-8.
async fn list_names(session: &mut ImapSession, pattern: String) -> Result<Vec<String>> {
    let names: Vec<String> = session
        .list(Some(""), Some(&pattern))
        .await?
        .map_ok(|name| decode_utf7_imap(name.name().to_string()))
        .try_collect()
        .await?;
    Ok(names)
}

/// Examines `folder` read-only and fetches every message matching `query`
/// with BODY.PEEK[] so nothing gets marked as read.
async fn fetch_matching(
    session: &mut ImapSession,
    folder: String,
    query: String,
) -> Result<Vec<(u32, Vec<u8>)>> {
    session.examine(wire_name(&folder)).await?;

    let mut uids: Vec<u32> = session.uid_search(&query).await?.into_iter().collect();
    if uids.is_empty() {
        return Ok(Vec::new());
    }
    uids.sort_unstable();

    let uid_set = uids
        .iter()
        .map(|u| u.to_string())
        .collect::<Vec<_>>()
        .join(",");
    debug!("Fetching {} emails with UIDs: {}", uids.len(), uid_set);

    let mut messages = session.uid_fetch(&uid_set, "(UID BODY.PEEK[])").await?;

    let mut results = Vec::new();
    while let Some(message_result) = messages.next().await {
        match message_result {
            Ok(message) => {
                if let (Some(uid), Some(body)) = (message.uid, message.body()) {
                    results.push((uid, body.to_vec()));
                } else {
                    warn!("Message missing UID or body");
                }
            }
            Err(e) => warn!("Error fetching message: {}", e),
        }
    }
    drop(messages);

    results.sort_by_key(|(uid, _)| *uid);
    Ok(results)
}

async fn append_raw(session: &mut ImapSession, folder: String, raw: Vec<u8>) -> Result<()> {
    let exists = list_names(session, list_pattern(&folder))
        .await?
        .iter()
        .any(|name| *name == folder);
    if !exists {
        info!("Creating folder: {}", folder);
        if let Err(e) = session.create(wire_name(&folder)).await {
            warn!("Could not create folder '{}': {}", folder, e);
        }
    }

    session.append(wire_name(&folder), None, None, &raw).await?;
    Ok(())
}
