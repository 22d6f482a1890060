//! Shared utility functions.

/// Escape HTML special characters, including both quote styles.
///
/// "<a href='x'>" -> "&lt;a href=&#039;x&#039;&gt;"
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}
