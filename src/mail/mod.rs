//! Mail collaborators: the `Mailbox` boundary and the IMAP/SMTP backend.

pub mod imap;
pub mod text;
pub mod types;

pub use imap::{ImapMailbox, MailboxConfig};
pub use types::{MailMessage, Mailbox, OfflineMailbox, SendOutcome};
