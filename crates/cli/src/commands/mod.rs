//! Command handlers for the Recall CLI.

pub mod history;
pub mod search;
pub mod suggest;

pub use history::HistoryCommand;
pub use search::SearchCommand;
pub use suggest::SuggestCommand;
