//! Terminal output helpers
//!
//! Colors follow NO_COLOR / CLICOLOR / CLICOLOR_FORCE via `colored`.

use std::fmt::Display;

use colored::Colorize;

/// Error line on stderr, red "error:" prefix
pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "warning".yellow(), msg);
}

/// Confirmation of a completed write
pub fn success(msg: &(impl Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Indented "nothing to report" line under a header
pub fn success_detail(msg: &(impl Display + ?Sized)) {
    println!("  {} {}", "✓".green(), msg);
}

/// Indented finding under a header
pub fn failure(msg: &(impl Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

/// `label: value` with a green label
pub fn action(label: &str, msg: &(impl Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

pub fn header(msg: &(impl Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Uncolored data output: rendered trees, tables, JSON
pub fn info(msg: &(impl Display + ?Sized)) {
    println!("{}", msg);
}
