//! Search command handler.
//!
//! Answers a query through the history-aware session.

use clap::Args;
use recall_core::{config::AppConfig, AppError, AppResult};
use recall_history::SearchSession;

/// Ask a question, reusing or building on past answers
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// The query text
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let query = self.query.join(" ");
        if query.trim().is_empty() {
            return Err(AppError::Validation("Query must not be empty".to_string()));
        }

        let session = SearchSession::from_config(config)?;
        let outcome = session.search(&query).await?;

        if let Some(ref usage) = outcome.usage {
            tracing::debug!(
                "Token usage - Prompt: {}, Completion: {}, Total: {}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            return Ok(());
        }

        println!("{}", outcome.answer_text);

        if !outcome.citations.is_empty() {
            println!();
            println!("Sources:");
            for (i, citation) in outcome.citations.iter().enumerate() {
                match citation.title {
                    Some(ref title) if !title.is_empty() => {
                        println!("  [{}] {} <{}>", i + 1, title, citation.url)
                    }
                    _ => println!("  [{}] {}", i + 1, citation.url),
                }
            }
        }

        if outcome.from_history {
            eprintln!("(answered from history)");
        } else if !outcome.context_queries.is_empty() {
            eprintln!(
                "(with context from {} earlier {})",
                outcome.context_queries.len(),
                if outcome.context_queries.len() == 1 { "search" } else { "searches" }
            );
            for earlier in &outcome.context_queries {
                tracing::debug!("Context query: {}", earlier);
            }
        }

        Ok(())
    }
}
