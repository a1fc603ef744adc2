// ZenChat console entry point
// Reads questions from stdin and streams answers to stdout.

use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use zenchat_core::logging::{init_tracing, LogFormat};
use zenchat_core::{AppError, ChatConfig, ChatSessionHandle, ChatView, SubmitOutcome};

const QUIT_COMMAND: &str = "/quit";
const INTENSE_STYLE: &str = "\x1b[31m";
const RESET_STYLE: &str = "\x1b[0m";

/// Prints only the part of each frame that has not been printed yet.
#[derive(Default)]
struct AnswerPrinter {
    printed: String,
    intense: bool,
}

impl AnswerPrinter {
    fn update(&mut self, view: &ChatView) -> std::io::Result<()> {
        let mut out = std::io::stdout().lock();
        if !view.answer.starts_with(&self.printed) {
            // The answer was replaced (fallback message): start a fresh line.
            writeln!(out)?;
            self.printed.clear();
        }
        if view.is_intense && !self.intense {
            write!(out, "{}", INTENSE_STYLE)?;
            self.intense = true;
        }
        write!(out, "{}", &view.answer[self.printed.len()..])?;
        self.printed.clone_from(&view.answer);
        out.flush()
    }

    fn finish(self, view: &ChatView) -> std::io::Result<()> {
        let mut out = std::io::stdout().lock();
        if self.intense {
            write!(out, "{}", RESET_STYLE)?;
        }
        writeln!(out)?;
        if !view.suggestions.is_empty() {
            writeln!(out, "  → {}", view.suggestions.join(" · "))?;
        }
        out.flush()
    }
}

async fn ask(session: &ChatSessionHandle, line: &str) -> Result<SubmitOutcome, AppError> {
    let mut views = session.subscribe();
    views.borrow_and_update();

    let mut printer = AnswerPrinter::default();
    let submit = session.submit(line);
    tokio::pin!(submit);

    let outcome = loop {
        tokio::select! {
            outcome = &mut submit => break outcome,
            changed = views.changed() => {
                if changed.is_err() {
                    break (&mut submit).await;
                }
                let view = views.borrow_and_update().clone();
                printer.update(&view)?;
            }
        }
    };

    let view = session.view();
    if !matches!(outcome, Ok(SubmitOutcome::Ignored)) {
        printer.update(&view)?;
        printer.finish(&view)?;
    }
    outcome
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(LogFormat::from_env());

    let config = ChatConfig::from_env().context("Failed to load chat configuration")?;
    info!("Chat endpoint: {}", config.endpoint);
    let session = ChatSessionHandle::new(&config).context("Failed to start chat session")?;
    info!(session_id = session.id(), "Session ready");

    let initial = session.view();
    println!("ask me anything  → {}", initial.suggestions.join(" · "));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == QUIT_COMMAND {
            break;
        }
        match ask(&session, &line).await {
            Ok(outcome) => info!(?outcome, "Turn finished"),
            Err(e) => error!("Turn failed: {}", e),
        }
    }

    session.shutdown().await?;
    Ok(())
}
