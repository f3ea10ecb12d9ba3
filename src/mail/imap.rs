//! App-Password mailbox — IMAP over TLS for reading, SMTP via lettre for
//! sending.
//!
//! Each identity is bound to one account. Socket work is blocking and runs in
//! `spawn_blocking`; nothing is retried.

use std::collections::HashMap;
use std::io::Write as IoWrite;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use mail_parser::MessageParser;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use super::text::{extract_sender, extract_text, snippet};
use super::types::{MailMessage, Mailbox, SendOutcome};
use crate::error::{ConfigError, MailboxError};
use crate::nlu::normalize_app_password;

const READ_TIMEOUT: Duration = Duration::from_secs(30);

// ── Configuration ───────────────────────────────────────────────────

/// One mail account, built from environment variables.
#[derive(Debug, Clone)]
pub struct MailboxConfig {
    pub imap_host: String,
    pub imap_port: u16,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub app_password: SecretString,
    pub from_address: String,
}

impl MailboxConfig {
    /// Build config from environment variables.
    /// Returns `Ok(None)` if `MAIL_USERNAME` is not set (no account configured).
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(username) = std::env::var("MAIL_USERNAME")
            .ok()
            .filter(|u| !u.trim().is_empty())
        else {
            return Ok(None);
        };

        let password = std::env::var("MAIL_APP_PASSWORD")
            .map_err(|_| ConfigError::MissingEnvVar("MAIL_APP_PASSWORD".to_string()))?;
        let imap_host =
            std::env::var("MAIL_IMAP_HOST").unwrap_or_else(|_| "imap.gmail.com".to_string());
        let imap_port = port_from_env("MAIL_IMAP_PORT", 993)?;
        let smtp_host =
            std::env::var("MAIL_SMTP_HOST").unwrap_or_else(|_| imap_host.replace("imap", "smtp"));
        let smtp_port = port_from_env("MAIL_SMTP_PORT", 587)?;
        let from_address =
            std::env::var("MAIL_FROM_ADDRESS").unwrap_or_else(|_| username.clone());

        Ok(Some(Self {
            imap_host,
            imap_port,
            smtp_host,
            smtp_port,
            username,
            app_password: SecretString::from(password),
            from_address,
        }))
    }

    /// Replace the password with a dictated one ("bee aitch jay kay ...").
    pub fn with_spoken_password(mut self, spoken: &str) -> Self {
        self.app_password = SecretString::from(normalize_app_password(spoken));
        self
    }
}

fn port_from_env(key: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => parse_port(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_port(key: &str, raw: &str) -> Result<u16, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}' is not a port number"),
    })
}

// ── Mailbox ─────────────────────────────────────────────────────────

/// IMAP/SMTP backend keyed by identity.
#[derive(Default)]
pub struct ImapMailbox {
    accounts: HashMap<String, Arc<MailboxConfig>>,
}

impl ImapMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `identity` to an account.
    pub fn with_account(mut self, identity: impl Into<String>, config: MailboxConfig) -> Self {
        self.accounts.insert(identity.into(), Arc::new(config));
        self
    }

    fn account(&self, identity: &str) -> Result<Arc<MailboxConfig>, MailboxError> {
        self.accounts
            .get(identity)
            .cloned()
            .ok_or_else(|| MailboxError::NotConfigured {
                identity: identity.to_string(),
            })
    }
}

#[async_trait]
impl Mailbox for ImapMailbox {
    async fn fetch_messages(
        &self,
        identity: &str,
        limit: usize,
    ) -> Result<Vec<MailMessage>, MailboxError> {
        let config = self.account(identity)?;
        let who = identity.to_string();

        let messages = tokio::task::spawn_blocking(move || fetch_recent_imap(&config, &who, limit))
            .await
            .map_err(|e| MailboxError::Protocol(format!("IMAP task failed: {e}")))??;

        info!(identity = %identity, count = messages.len(), "Fetched recent messages");
        Ok(messages)
    }

    async fn send_message(
        &self,
        identity: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> SendOutcome {
        let config = match self.account(identity) {
            Ok(config) => config,
            Err(e) => return SendOutcome::failed(e.to_string()),
        };
        let (to, subject, body) = (to.to_string(), subject.to_string(), body.to_string());

        let result =
            tokio::task::spawn_blocking(move || send_smtp(&config, &to, &subject, &body)).await;

        match result {
            Ok(Ok(())) => {
                info!(identity = %identity, "Email sent");
                SendOutcome::sent()
            }
            Ok(Err(e)) => {
                warn!(identity = %identity, error = %e, "SMTP send failed");
                SendOutcome::failed(e.to_string())
            }
            Err(e) => SendOutcome::failed(format!("Send task failed: {e}")),
        }
    }
}

// ── SMTP ────────────────────────────────────────────────────────────

/// Send a plain-text email via SMTP with STARTTLS (blocking).
fn send_smtp(config: &MailboxConfig, to: &str, subject: &str, body: &str) -> Result<(), MailboxError> {
    let creds = Credentials::new(
        config.username.clone(),
        config.app_password.expose_secret().to_string(),
    );

    let transport = SmtpTransport::starttls_relay(&config.smtp_host)
        .map_err(|e| MailboxError::Connect {
            host: config.smtp_host.clone(),
            reason: e.to_string(),
        })?
        .port(config.smtp_port)
        .credentials(creds)
        .build();

    let email = Message::builder()
        .from(
            config
                .from_address
                .parse()
                .map_err(|e: lettre::address::AddressError| MailboxError::InvalidAddress {
                    address: config.from_address.clone(),
                    reason: e.to_string(),
                })?,
        )
        .to(to
            .parse()
            .map_err(|e: lettre::address::AddressError| MailboxError::InvalidAddress {
                address: to.to_string(),
                reason: e.to_string(),
            })?)
        .subject(subject)
        .body(body.to_string())
        .map_err(|e| MailboxError::Send(format!("Failed to build email: {e}")))?;

    transport
        .send(&email)
        .map_err(|e| MailboxError::Send(format!("SMTP send failed: {e}")))?;
    Ok(())
}

// ── IMAP ────────────────────────────────────────────────────────────

type TlsStream = rustls::StreamOwned<rustls::ClientConnection, TcpStream>;

/// Fetch the `limit` most recent INBOX messages, newest first (blocking).
///
/// Uses `BODY.PEEK[]` so reading aloud does not mark messages as seen.
fn fetch_recent_imap(
    config: &MailboxConfig,
    identity: &str,
    limit: usize,
) -> Result<Vec<MailMessage>, MailboxError> {
    let connect_err = |reason: String| MailboxError::Connect {
        host: config.imap_host.clone(),
        reason,
    };

    let tcp = TcpStream::connect((&*config.imap_host, config.imap_port))
        .map_err(|e| connect_err(e.to_string()))?;
    tcp.set_read_timeout(Some(READ_TIMEOUT))
        .map_err(|e| connect_err(e.to_string()))?;

    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = Arc::new(
        rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth(),
    );
    let server_name = rustls::pki_types::ServerName::try_from(config.imap_host.clone())
        .map_err(|e| connect_err(e.to_string()))?;
    let conn = rustls::ClientConnection::new(tls_config, server_name)
        .map_err(|e| connect_err(e.to_string()))?;
    let mut tls = rustls::StreamOwned::new(conn, tcp);

    let mut session = ImapSession {
        tls: &mut tls,
        next_tag: 1,
    };

    session.read_line()?; // greeting

    let login = session.command(&format!(
        "LOGIN {} {}",
        quote(&config.username),
        quote(config.app_password.expose_secret())
    ))?;
    if !is_tagged_ok(&login) {
        return Err(MailboxError::Auth {
            identity: identity.to_string(),
        });
    }

    let select = session.command("SELECT \"INBOX\"")?;
    if !is_tagged_ok(&select) {
        return Err(MailboxError::Protocol("Could not open INBOX".into()));
    }

    let search = session.command("SEARCH ALL")?;
    let ids = latest_ids(&parse_search(&search), limit);
    debug!(identity = %identity, ids = ?ids, "Fetching messages");

    let mut messages = Vec::with_capacity(ids.len());
    for id in ids {
        let response = session.command(&format!("FETCH {id} BODY.PEEK[]"))?;
        let raw = fetch_literal(&response);
        match parse_message(&id.to_string(), raw.as_bytes()) {
            Ok(message) => messages.push(message),
            Err(e) => warn!(identity = %identity, id, error = %e, "Skipping unparseable message"),
        }
    }

    let _ = session.command("LOGOUT");
    Ok(messages)
}

/// Tagged IMAP command/response loop over one TLS stream.
struct ImapSession<'a> {
    tls: &'a mut TlsStream,
    next_tag: u32,
}

impl ImapSession<'_> {
    fn read_line(&mut self) -> Result<String, MailboxError> {
        let mut buf = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            match std::io::Read::read(&mut *self.tls, &mut byte) {
                Ok(0) => return Err(MailboxError::Protocol("IMAP connection closed".into())),
                Ok(_) => {
                    buf.push(byte[0]);
                    if buf.ends_with(b"\r\n") {
                        return Ok(String::from_utf8_lossy(&buf).to_string());
                    }
                }
                Err(e) => return Err(MailboxError::Protocol(format!("IMAP read failed: {e}"))),
            }
        }
    }

    /// Send one command; returns every response line up to and including
    /// the tagged completion.
    fn command(&mut self, cmd: &str) -> Result<Vec<String>, MailboxError> {
        let tag = format!("A{}", self.next_tag);
        self.next_tag += 1;

        let full = format!("{tag} {cmd}\r\n");
        let write_err = |e: std::io::Error| MailboxError::Protocol(format!("IMAP write failed: {e}"));
        IoWrite::write_all(&mut *self.tls, full.as_bytes()).map_err(write_err)?;
        IoWrite::flush(&mut *self.tls).map_err(write_err)?;

        let prefix = format!("{tag} ");
        let mut lines = Vec::new();
        loop {
            let line = self.read_line()?;
            let done = line.starts_with(&prefix);
            lines.push(line);
            if done {
                break;
            }
        }
        Ok(lines)
    }
}

// ── Helpers (public for testing) ────────────────────────────────────

/// IMAP quoted string.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Whether the tagged completion line reports `OK`.
pub fn is_tagged_ok(lines: &[String]) -> bool {
    lines
        .last()
        .and_then(|l| l.split_whitespace().nth(1))
        .is_some_and(|status| status.eq_ignore_ascii_case("OK"))
}

/// Message sequence numbers from `* SEARCH` lines.
pub fn parse_search(lines: &[String]) -> Vec<u32> {
    lines
        .iter()
        .filter(|l| l.starts_with("* SEARCH"))
        .flat_map(|l| l.split_whitespace().skip(2))
        .filter_map(|n| n.parse().ok())
        .collect()
}

/// The `limit` highest ids, newest first.
pub fn latest_ids(ids: &[u32], limit: usize) -> Vec<u32> {
    let mut sorted = ids.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.truncate(limit);
    sorted
}

/// Raw message text from a FETCH response: drops the `* n FETCH (...{size}`
/// line, the closing `)` line and the tagged completion.
pub fn fetch_literal(lines: &[String]) -> String {
    lines
        .iter()
        .skip(1)
        .take(lines.len().saturating_sub(3))
        .cloned()
        .collect()
}

/// Parse one RFC 822 message into a `MailMessage`.
pub fn parse_message(id: &str, raw: &[u8]) -> Result<MailMessage, MailboxError> {
    let parsed = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| MailboxError::Parse(format!("message {id} is not valid RFC 822")))?;

    let body = extract_text(&parsed);
    let date = parsed
        .date()
        .and_then(|d| DateTime::<Utc>::from_timestamp(d.to_timestamp(), 0));

    Ok(MailMessage {
        id: id.to_string(),
        from: extract_sender(&parsed),
        subject: parsed.subject().unwrap_or("No subject").to_string(),
        date,
        snippet: snippet(&body),
        body,
    })
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    // ── Response parsing tests ──────────────────────────────────────

    #[test]
    fn search_ids_and_latest() {
        let response = lines(&["* SEARCH 1 2 3 7 9\r\n", "A3 OK SEARCH completed\r\n"]);
        let ids = parse_search(&response);
        assert_eq!(ids, vec![1, 2, 3, 7, 9]);
        assert_eq!(latest_ids(&ids, 3), vec![9, 7, 3]);
        assert_eq!(latest_ids(&ids, 10).len(), 5);
    }

    #[test]
    fn empty_search() {
        let response = lines(&["* SEARCH\r\n", "A3 OK SEARCH completed\r\n"]);
        assert!(parse_search(&response).is_empty());
    }

    #[test]
    fn tagged_status() {
        assert!(is_tagged_ok(&lines(&["A1 OK LOGIN completed\r\n"])));
        assert!(!is_tagged_ok(&lines(&["A1 NO [AUTHENTICATIONFAILED] Invalid\r\n"])));
        assert!(!is_tagged_ok(&[]));
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote(r#"pa"ss\word"#), r#""pa\"ss\\word""#);
    }

    #[test]
    fn fetch_literal_strips_framing() {
        let response = lines(&[
            "* 9 FETCH (BODY[] {40}\r\n",
            "Subject: Hi\r\n",
            "\r\n",
            "Body line\r\n",
            ")\r\n",
            "A5 OK FETCH completed\r\n",
        ]);
        assert_eq!(fetch_literal(&response), "Subject: Hi\r\n\r\nBody line\r\n");
    }

    // ── Message parsing tests ───────────────────────────────────────

    #[test]
    fn parse_message_fields() {
        let raw = b"From: Carol <carol@example.com>\r\n\
Subject: Quarterly report\r\n\
Date: Mon, 5 Jan 2026 10:00:00 +0000\r\n\
Content-Type: text/plain\r\n\
\r\n\
Numbers attached.\r\n";
        let message = parse_message("9", raw).unwrap();
        assert_eq!(message.id, "9");
        assert_eq!(message.from, "Carol <carol@example.com>");
        assert_eq!(message.subject, "Quarterly report");
        assert_eq!(message.body.trim(), "Numbers attached.");
        assert_eq!(message.snippet, "Numbers attached.");
        assert_eq!(
            message.date.map(|d| d.to_rfc3339()),
            Some("2026-01-05T10:00:00+00:00".to_string())
        );
    }

    #[test]
    fn missing_subject_gets_placeholder() {
        let raw = b"From: dan@example.com\r\n\r\nhello\r\n";
        assert_eq!(parse_message("1", raw).unwrap().subject, "No subject");
    }

    #[test]
    fn port_values_are_validated() {
        assert_eq!(parse_port("MAIL_IMAP_PORT", " 1993 ").unwrap(), 1993);
        let err = parse_port("MAIL_SMTP_PORT", "smtp").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MAIL_SMTP_PORT"));
    }

    // ── Backend tests ───────────────────────────────────────────────

    #[tokio::test]
    async fn unknown_identity_is_not_configured() {
        let mailbox = ImapMailbox::new();
        let err = mailbox.fetch_messages("nobody", 5).await.unwrap_err();
        assert!(matches!(err, MailboxError::NotConfigured { .. }));

        let outcome = mailbox.send_message("nobody", "a@b.com", "s", "b").await;
        assert!(!outcome.success);
    }

    #[test]
    fn spoken_password_is_normalized() {
        let config = MailboxConfig {
            imap_host: "imap.test.com".into(),
            imap_port: 993,
            smtp_host: "smtp.test.com".into(),
            smtp_port: 587,
            username: "user@test.com".into(),
            app_password: SecretString::from("old"),
            from_address: "user@test.com".into(),
        }
        .with_spoken_password("bee aitch jay kay");
        assert_eq!(config.app_password.expose_secret(), "bhjk");
    }
}
