//! History command handler.
//!
//! Lists, deletes and clears stored searches. None of these need a chat or
//! embedding provider, so they work on the store directly.

use chrono::Local;
use clap::{Args, Subcommand};
use recall_core::{config::AppConfig, AppResult};
use recall_history::{filter_entries, group_history, open_store};
use std::io::{BufRead, Write};

/// Search history management
#[derive(Args, Debug)]
pub struct HistoryCommand {
    #[command(subcommand)]
    pub action: HistoryAction,
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List past searches grouped by date
    List(HistoryListCommand),
    /// Delete one search by its list index
    Delete(HistoryDeleteCommand),
    /// Delete all searches
    Clear(HistoryClearCommand),
}

impl HistoryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            HistoryAction::List(cmd) => cmd.execute(config),
            HistoryAction::Delete(cmd) => cmd.execute(config),
            HistoryAction::Clear(cmd) => cmd.execute(config),
        }
    }
}

#[derive(Args, Debug)]
pub struct HistoryListCommand {
    /// Only show searches whose query contains this text (case-insensitive)
    pub filter: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HistoryListCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing history list command");

        let store = open_store(config)?;
        let groups = group_history(
            filter_entries(store.all(), self.filter.as_deref()),
            &Local::now(),
        );

        if self.json {
            let output: Vec<serde_json::Value> = groups
                .iter()
                .map(|group| {
                    serde_json::json!({
                        "label": group.label(),
                        "entries": group.entries.iter().map(|entry| serde_json::json!({
                            "index": entry.display_index,
                            "query": entry.record.query,
                            "answerText": entry.record.answer_text,
                            "timestamp": entry.record.timestamp.to_rfc3339(),
                            "citations": entry.record.citations,
                        })).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if groups.is_empty() {
            match self.filter {
                Some(ref filter) => eprintln!("No searches matching '{}'", filter),
                None => eprintln!("No searches yet"),
            }
            return Ok(());
        }

        for group in &groups {
            println!("{}", group.label());
            for entry in &group.entries {
                let local = entry.record.timestamp.with_timezone(&Local);
                println!(
                    "  [{}] {}  {}",
                    entry.display_index,
                    local.format("%Y-%m-%d %H:%M"),
                    entry.record.query
                );
            }
        }

        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct HistoryDeleteCommand {
    /// Index shown by `history list` (0 is the newest search)
    pub index: usize,
}

impl HistoryDeleteCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing history delete command for index {}", self.index);

        let store = open_store(config)?;
        let removed = store.delete_at(self.index)?;
        println!("Deleted '{}'", removed.query);

        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct HistoryClearCommand {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl HistoryClearCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing history clear command");

        let store = open_store(config)?;
        let count = store.len();
        if count == 0 {
            println!("History is already empty");
            return Ok(());
        }

        if !self.yes && !confirm(&format!("Delete all {} searches?", count))? {
            println!("Aborted");
            return Ok(());
        }

        store.clear()?;
        println!("Cleared {} searches", count);

        Ok(())
    }
}

fn confirm(prompt: &str) -> AppResult<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
