//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `inputs` - Shared loading of transaction, profile and budget files
//! - `analysis` - Snapshot, classification and rule commands
//! - `ask` - Full pipeline command
//! - `prompts` - Prompt library management commands

pub mod analysis;
pub mod ask;
pub mod inputs;
pub mod prompts;

// Re-export command functions for main.rs
pub use analysis::*;
pub use ask::*;
pub use inputs::*;
pub use prompts::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
