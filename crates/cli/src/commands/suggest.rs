//! Suggest command handler.
//!
//! Shows past queries related to partial input, as the interactive search
//! box would.

use clap::Args;
use recall_core::{config::AppConfig, AppResult};
use recall_history::SearchSession;

/// List past searches related to partial input
#[derive(Args, Debug)]
pub struct SuggestCommand {
    /// Partial query text
    #[arg(required = true, num_args = 1..)]
    pub partial: Vec<String>,

    /// Run the top suggestion as a search
    #[arg(long)]
    pub pick: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SuggestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing suggest command");

        let session = SearchSession::from_config(config)?;
        let suggestions = session.live_suggest(&self.partial.join(" ")).await;

        if self.pick {
            let Some(top) = suggestions.first() else {
                eprintln!("No related searches in history");
                return Ok(());
            };

            let outcome = session.select_suggestion(top).await?;
            if self.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", outcome.answer_text);
            }
            return Ok(());
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        } else if suggestions.is_empty() {
            eprintln!("No related searches in history");
        } else {
            for suggestion in &suggestions {
                println!("{:.2}  {}", suggestion.similarity_score, suggestion.query);
            }
        }

        Ok(())
    }
}
