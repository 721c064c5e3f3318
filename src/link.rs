//! Link resolution: extract the Drive file id from a shared URL.
//!
//! Drive sharing links come in two shapes in the wild:
//!
//! - `https://drive.google.com/file/d/<id>/view?usp=sharing` — the id sits
//!   between `/d/` and the next `/`
//! - `https://drive.google.com/open?id=<id>&usp=sharing` — the id follows
//!   `id=` up to the next `&`
//!
//! Each shape gets its own matcher and the matchers are tried in a defined
//! order; the first capture wins. Adding a newly observed link shape means
//! appending one regex and one regression test, nothing else.

use crate::error::IntakeError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matchers tried in order. Keep the `/d/` shape first: it is the common
/// case and an `id=` query parameter can legitimately appear alongside it.
static LINK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"/d/([^/?#]+)").unwrap(),
        Regex::new(r"[?&]id=([^&#]+)").unwrap(),
    ]
});

/// Extract the Drive file id from a shared URL.
///
/// Returns the id exactly as it appears in the link — no validation beyond
/// the match itself, matching what the Drive API will accept or reject.
///
/// # Errors
/// [`IntakeError::InvalidLinkFormat`] when no pattern matches; the original
/// URL is preserved in the error for diagnostics.
pub fn resolve_file_id(url: &str) -> Result<String, IntakeError> {
    for pattern in LINK_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(url) {
            return Ok(caps[1].to_string());
        }
    }
    Err(IntakeError::InvalidLinkFormat {
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn d_segment_stops_at_next_slash() {
        let url = "https://drive.google.com/file/d/ABC123/view?usp=sharing";
        assert_eq!(resolve_file_id(url).unwrap(), "ABC123");
    }

    #[test]
    fn d_segment_without_trailing_slash() {
        let url = "https://drive.google.com/file/d/ABC123";
        assert_eq!(resolve_file_id(url).unwrap(), "ABC123");
    }

    #[test]
    fn id_param_stops_at_ampersand() {
        let url = "https://drive.google.com/open?id=XYZ789&usp=sharing";
        assert_eq!(resolve_file_id(url).unwrap(), "XYZ789");
    }

    #[test]
    fn id_param_at_end_of_url() {
        let url = "https://drive.google.com/open?id=XYZ789";
        assert_eq!(resolve_file_id(url).unwrap(), "XYZ789");
    }

    #[test]
    fn d_shape_wins_over_id_param() {
        let url = "https://drive.google.com/file/d/FIRST/view?id=SECOND";
        assert_eq!(resolve_file_id(url).unwrap(), "FIRST");
    }

    #[test]
    fn unknown_shape_preserves_url_in_error() {
        let url = "https://example.com/photo.png";
        match resolve_file_id(url) {
            Err(IntakeError::InvalidLinkFormat { url: reported }) => {
                assert_eq!(reported, url);
            }
            other => panic!("expected InvalidLinkFormat, got {other:?}"),
        }
    }
}
