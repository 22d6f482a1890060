//! Console output with colored module prefixes.
//!
//! ```ignore
//! log!("build"; "found {} markdown file(s)", count);
//! log_error!("study"; "{}: {}", path.display(), err);
//! ```

use colored::{ColoredString, Colorize};

/// Log a message to stdout with a colored module prefix.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::log::log($module, &format!($($arg)*))
    }};
}

/// Log an error message to stderr with a red module prefix.
#[macro_export]
macro_rules! log_error {
    ($module:expr; $($arg:tt)*) => {{
        $crate::log::log_error($module, &format!($($arg)*))
    }};
}

pub fn log(module: &str, message: &str) {
    println!("{} {}", colorize_prefix(module), message);
}

pub fn log_error(module: &str, message: &str) {
    eprintln!("{} {}", format!("[{module}]").red().bold(), message);
}

fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module {
        "build" => prefix.bright_green().bold(),
        "study" => prefix.bright_cyan().bold(),
        "index" => prefix.bright_yellow().bold(),
        "assets" => prefix.bright_magenta().bold(),
        "clean" => prefix.bright_red().bold(),
        "serve" => prefix.bright_blue().bold(),
        _ => prefix.bright_white().bold(),
    }
}
