//! Interactive and single-shot chat against the dialogue engine.

use std::io::Write;

use tracing::debug;
use uuid::Uuid;

use super::{CommandStrategy, init_router};

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Session id to resume (a fresh one is generated if not provided)
    pub session: Option<String>,
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
}

/// Strategy for executing the Chat command.
///
/// In single-shot mode the structured response is printed as JSON, which is
/// what a transport layer would serialize. Interactive mode keeps one session
/// alive across turns so partial slot state carries over.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let router = init_router()?;

        if let Some(message) = input.message {
            let response = router.handle_query(input.session.as_deref(), &message).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            return Ok(());
        }

        let session_id = input
            .session
            .unwrap_or_else(|| format!("cli:{}", Uuid::now_v7()));

        println!("=== ridewise transit assistant ===");
        println!("Session: {session_id}");
        println!("Type 'exit', 'quit', or Ctrl+C to end the session.\n");

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            if std::io::stdin().read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();

            if matches!(line, "exit" | "quit" | "q") {
                println!("\nSession ended.");
                break;
            }

            if line.is_empty() {
                continue;
            }

            let response = router.handle_query(Some(&session_id), line).await;
            debug!(
                "turn outcome: kind={:?}, station={:?}, field={:?}",
                response.kind, response.station, response.field
            );

            println!("\n{}\n", response.reply);
        }

        Ok(())
    }
}
