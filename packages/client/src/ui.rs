//! UI utilities for the client.

use std::io::Write;

pub const PROMPT: &str = "You: ";

/// Print a line above the prompt and redisplay the prompt
pub fn print_line(line: &str) {
    print!("\r{}\n", line);
    redisplay_prompt();
}

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}
