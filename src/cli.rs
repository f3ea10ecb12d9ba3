//! CLI front end — stdin/stdout REPL for local use.
//!
//! Plain lines are utterances. `:to`, `:subject`, `:body` and `:confirm`
//! followed by a value are typed compose fields. `/quit` exits.

use std::pin::Pin;

use futures::{Stream, stream};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::dialogue::TurnResult;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliInput {
    /// Treat as a transcribed utterance.
    Say(String),
    /// Typed value for one compose field.
    Typed { field: String, value: String },
    Quit,
}

pub type InputStream = Pin<Box<dyn Stream<Item = CliInput> + Send>>;

/// Parse one line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<CliInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line == "/quit" || line == "/exit" {
        return Some(CliInput::Quit);
    }
    if let Some(rest) = line.strip_prefix(':') {
        let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        return Some(CliInput::Typed {
            field: field.to_string(),
            value: value.trim().to_string(),
        });
    }
    Some(CliInput::Say(line.to_string()))
}

/// Reads stdin and writes turn results to stdout.
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }

    /// Start reading stdin on a background task.
    pub fn start(&self) -> InputStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Some(input) = parse_line(&line) else {
                            eprint!("> ");
                            continue;
                        };
                        let quit = input == CliInput::Quit;
                        if tx.send(input).is_err() || quit {
                            break;
                        }
                    }
                    Ok(None) => {
                        let _ = tx.send(CliInput::Quit);
                        break;
                    }
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        let _ = tx.send(CliInput::Quit);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|input| (input, rx))
        });

        Box::pin(stream)
    }

    /// Print one turn result.
    pub fn respond(&self, result: &TurnResult) {
        if !result.response_text.is_empty() {
            println!("\n{}\n", result.response_text);
        }
        if let Some(step) = result.dialogue_step {
            eprintln!("   [compose: {step}]");
        }
        eprint!("> ");
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}
