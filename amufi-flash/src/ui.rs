//! Operator interaction. Kept out of the decision logic so the gate stays
//! testable without a terminal.

use std::io::{self, Write};

/// Ask the operator to confirm continuing past a safety warning.
pub fn confirm(reason: &str) -> bool {
    print!("{} — continue? [y/N]: ", reason);
    io::stdout().flush().ok();
    let mut answer = String::new();
    io::stdin().read_line(&mut answer).ok();
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
