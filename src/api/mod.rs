//! API client module

pub mod auth;
pub mod client;
pub mod endpoints;

pub use auth::AuthManager;
pub use client::{ApicClient, ApicResponse};
pub use endpoints::MoQuery;

/// Leading part of a response body for error messages, cut on a character boundary
pub(crate) fn body_preview(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_preview_respects_char_boundaries() {
        let body = format!("{}é…", "a".repeat(499));
        assert_eq!(body_preview(&body, 500), format!("{}é", "a".repeat(499)));
        assert_eq!(body_preview("short", 500), "short");
        assert_eq!(body_preview("ééé", 0), "");
    }
}
