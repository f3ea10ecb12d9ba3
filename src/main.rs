use std::sync::Arc;

use futures::StreamExt;

use voice_mail::cli::{CliChannel, CliInput};
use voice_mail::config::VoiceConfig;
use voice_mail::dialogue::{Orchestrator, SessionStore};
use voice_mail::error::Error;
use voice_mail::mail::{ImapMailbox, Mailbox, MailboxConfig, OfflineMailbox};
use voice_mail::speech::{NoTranscriber, SilentSynthesizer};

const LOCAL_IDENTITY: &str = "local-user";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = VoiceConfig::from_env();

    let (identity, mailbox) = build_mailbox()?;

    eprintln!("📬 Voice Mail v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Account: {}", identity);
    eprintln!("   Type what you would say, e.g. \"read my email\" or \"send email\".");
    eprintln!("   Typed fields: :to / :subject / :body / :confirm <value>. /quit to exit.\n");

    let orchestrator = Orchestrator::new(
        &config,
        mailbox,
        Arc::new(NoTranscriber),
        Arc::new(SilentSynthesizer),
    );
    let sessions = SessionStore::new();
    let cli = CliChannel::new();
    let mut inputs = cli.start();

    while let Some(input) = inputs.next().await {
        let mut session = sessions.load(&identity).await;
        let result = match input {
            CliInput::Quit => break,
            CliInput::Say(text) => orchestrator.handle_text(&identity, &text, &mut session).await,
            CliInput::Typed { field, value } => {
                orchestrator
                    .handle_typed(&identity, &field, &value, &mut session)
                    .await
            }
        };
        sessions.save(&identity, session).await;
        cli.respond(&result);
    }

    tracing::info!("Shutting down");
    Ok(())
}

/// IMAP account from the environment, or the offline mailbox.
fn build_mailbox() -> Result<(String, Arc<dyn Mailbox>), Error> {
    let Some(account) = MailboxConfig::from_env()? else {
        tracing::warn!("MAIL_USERNAME not set; running without a mailbox");
        return Ok((LOCAL_IDENTITY.to_string(), Arc::new(OfflineMailbox)));
    };
    let identity = account.username.clone();
    tracing::info!(identity = %identity, host = %account.imap_host, "Mailbox configured");
    let mailbox = ImapMailbox::new().with_account(identity.clone(), account);
    Ok((identity, Arc::new(mailbox)))
}
