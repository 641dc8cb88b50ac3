//! CLI console utilities

use colored::*;
use conduit_core::Role;
use console::Term;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::io;

/// CLI console for formatted output
pub struct CliConsole {
    verbose: bool,
}

impl CliConsole {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Print an info message (verbose only)
    pub fn info(&self, message: &str) {
        if self.verbose {
            println!("{} {}", "ℹ".blue().bold(), message);
        }
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message.green());
    }

    pub fn warn(&self, message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message.yellow());
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    pub fn print_header(&self, title: &str) {
        println!();
        println!("{}", title.bold().underline());
        println!("{}", "=".repeat(title.chars().count()).dimmed());
    }

    /// Ask for confirmation; anything but an explicit yes declines
    pub fn confirm(&self, message: &str) -> bool {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(message)
            .default(false)
            .interact()
            .unwrap_or(false)
    }

    /// Read one line of input after a prompt; `None` at end of input
    pub fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        let term = Term::stdout();
        term.write_str(&format!("{} ", prompt.cyan().bold()))?;
        match term.read_line() {
            Ok(line) => Ok(Some(line)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Colored role label used when printing conversations
pub fn role_label(role: Role) -> ColoredString {
    match role {
        Role::System => "system".dimmed(),
        Role::User => "you".green().bold(),
        Role::Assistant => "assistant".cyan().bold(),
        Role::Tool => "tool".magenta(),
    }
}

/// Truncate to `max` characters with an ellipsis
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > max {
        let kept: String = flat.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        flat
    }
}

/// Format relative time like "5 mins ago", "2 hours ago", etc.
pub fn format_relative_time(time: chrono::DateTime<chrono::Utc>) -> String {
    let duration = chrono::Utc::now().signed_duration_since(time);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        let mins = duration.num_minutes();
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if duration.num_hours() < 24 {
        let hours = duration.num_hours();
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if duration.num_days() < 30 {
        let days = duration.num_days();
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        time.format("%Y-%m-%d").to_string()
    }
}
