//! Ticket text rendering: titles, bodies and alert mentions.
//!
//! Title directives come from the repository's `format` list:
//!
//! - `title-length=N` sets the maximum title length, clamped to
//!   [`MIN_TITLE_LENGTH`, `MAX_TITLE_LENGTH`] (default [`DEFAULT_TITLE_LENGTH`]).
//! - `short-title` uses the puzzle body alone instead of
//!   `<file name> : <lines> : <body>`.
//!
//! Unknown or malformed directives are ignored.

pub mod body;
pub mod truncate;

use std::path::Path;

use tracing::warn;

use crate::config::RepoConfig;
use crate::model::StoredPuzzle;

pub use body::{BodyTemplate, BodyVars, DefaultBodyTemplate};
pub use truncate::{DEFAULT_TAIL, truncated};

pub const DEFAULT_TITLE_LENGTH: usize = 60;
pub const MIN_TITLE_LENGTH: usize = 30;
pub const MAX_TITLE_LENGTH: usize = 255;

const TITLE_LENGTH_DIRECTIVE: &str = "title-length=";
const SHORT_TITLE_DIRECTIVE: &str = "short-title";
const MAX_ALERT_NAME: usize = 64;

/// Errors raised while rendering ticket text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The text has no word boundary early enough to cut it to `length`.
    #[error("cannot truncate text to {length} characters: no word boundary before the limit")]
    NoBoundary { length: usize },
}

/// Title settings resolved from format directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleFormat {
    pub length: usize,
    pub short: bool,
}

impl Default for TitleFormat {
    fn default() -> Self {
        Self {
            length: DEFAULT_TITLE_LENGTH,
            short: false,
        }
    }
}

impl TitleFormat {
    #[must_use]
    pub fn from_directives(directives: &[String]) -> Self {
        let mut format = Self::default();

        for directive in directives {
            let directive = directive.trim().to_lowercase();
            if directive == SHORT_TITLE_DIRECTIVE {
                format.short = true;
            } else if let Some(raw) = directive.strip_prefix(TITLE_LENGTH_DIRECTIVE) {
                if let Some(length) = parse_title_length(raw) {
                    format.length = length;
                } else {
                    warn!(directive = %directive, "ignoring malformed title-length directive");
                }
            }
        }

        format.length = format.length.clamp(MIN_TITLE_LENGTH, MAX_TITLE_LENGTH);
        format
    }
}

/// Decimal digits only; values too large for `usize` saturate (and clamp later).
fn parse_title_length(raw: &str) -> Option<usize> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(raw.parse::<usize>().unwrap_or(usize::MAX))
}

/// `@`-mentions for the tracker's configured alert users.
///
/// Names are lowercased, stripped to `[0-9a-zA-Z-]` and capped at 64
/// characters. Names that end up empty are skipped.
#[must_use]
pub fn alert_users(config: &RepoConfig, provider: &str) -> Vec<String> {
    let Some(names) = config.alerts.get(&provider.to_lowercase()) else {
        return Vec::new();
    };

    names
        .iter()
        .filter_map(|name| {
            let clean: String = name
                .trim()
                .to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .take(MAX_ALERT_NAME)
                .collect();
            (!clean.is_empty()).then(|| format!("@{clean}"))
        })
        .collect()
}

/// Renders ticket text for one tracker and repository configuration.
#[derive(Debug, Clone)]
pub struct TicketRenderer {
    provider: String,
    format: TitleFormat,
    alerts: Vec<String>,
}

impl TicketRenderer {
    #[must_use]
    pub fn new(provider: &str, config: &RepoConfig) -> Self {
        Self {
            provider: provider.to_lowercase(),
            format: TitleFormat::from_directives(&config.format),
            alerts: alert_users(config, provider),
        }
    }

    #[must_use]
    pub const fn title_format(&self) -> TitleFormat {
        self.format
    }

    #[must_use]
    pub const fn alert_users(&self) -> &[String] {
        self.alerts.as_slice()
    }

    /// Title per the `short-title` and `title-length` directives.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NoBoundary`] when the title is too long and
    /// cannot be cut at a word boundary.
    pub fn title(&self, puzzle: &StoredPuzzle) -> Result<String, RenderError> {
        if self.format.short {
            return truncated(&puzzle.body, self.format.length, DEFAULT_TAIL);
        }

        let subject = Path::new(&puzzle.file)
            .file_name()
            .map_or_else(|| puzzle.file.clone(), |n| n.to_string_lossy().into_owned());
        let (start, stop) = puzzle.line_span();
        let span = if start == stop {
            start.to_string()
        } else {
            format!("{start}-{stop}")
        };

        truncated(
            &format!("{subject} : {span} : {}", puzzle.body),
            self.format.length,
            DEFAULT_TAIL,
        )
    }

    #[must_use]
    pub fn body(&self, puzzle: &StoredPuzzle, url: String, template: &dyn BodyTemplate) -> String {
        template.render(&self.provider, &BodyVars::new(puzzle, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::stored;

    const LONG_BODY: &str = "Extract fallback logic for Bytesto a separate class in accordance \
                             to other XXXWithFallback classes. Let's wait for the fixes first.";

    fn config(format: &[&str]) -> RepoConfig {
        RepoConfig {
            format: format.iter().map(|s| (*s).to_string()).collect(),
            ..RepoConfig::default()
        }
    }

    fn puzzle(file: &str, lines: &str, body: &str) -> StoredPuzzle {
        let mut p = stored("p1", true, None);
        p.file = file.to_string();
        p.lines = lines.to_string();
        p.body = body.to_string();
        p
    }

    #[test]
    fn title_length_directive_limits_full_title() {
        let renderer = TicketRenderer::new("gitea", &config(&["title-length=40"]));
        let title = renderer
            .title(&puzzle("foobar.py", "3-5", LONG_BODY))
            .expect("title");
        assert_eq!(title, "foobar.py : 3-5 : Extract fallback...");
    }

    #[test]
    fn short_title_uses_body_only() {
        let renderer = TicketRenderer::new("gitea", &config(&["short-title"]));
        let title = renderer
            .title(&puzzle("foobar.py", "3-5", LONG_BODY))
            .expect("title");
        assert_eq!(title, "Extract fallback logic for Bytesto a separate class in...");
    }

    #[test]
    fn full_title_uses_file_name_and_collapses_single_line() {
        let renderer = TicketRenderer::new("gitea", &RepoConfig::default());
        let title = renderer
            .title(&puzzle("src/deep/dir/main.rs", "7-7", "fix   the\nparser"))
            .expect("title");
        assert_eq!(title, "main.rs : 7 : fix the parser");
    }

    #[test]
    fn title_length_is_clamped() {
        assert_eq!(TitleFormat::from_directives(&["title-length=5".into()]).length, 30);
        assert_eq!(TitleFormat::from_directives(&["title-length=9000".into()]).length, 255);
        assert_eq!(
            TitleFormat::from_directives(&["title-length=99999999999999999999999".into()]).length,
            255
        );
    }

    #[test]
    fn directives_are_case_insensitive_and_last_length_wins() {
        let format = TitleFormat::from_directives(&[
            " Title-Length=45 ".into(),
            "SHORT-TITLE".into(),
            "title-length=70".into(),
        ]);
        assert_eq!(
            format,
            TitleFormat {
                length: 70,
                short: true,
            }
        );
    }

    #[test]
    fn malformed_length_falls_back_to_default() {
        for bad in [
            "title-length=abc",
            "title-length=",
            "title-length=-40",
            "title-length=4 0",
        ] {
            let format = TitleFormat::from_directives(&[bad.to_string()]);
            assert_eq!(format.length, DEFAULT_TITLE_LENGTH, "directive {bad}");
        }
    }

    #[test]
    fn unbreakable_title_is_a_render_error() {
        let renderer = TicketRenderer::new("gitea", &config(&["short-title"]));
        let err = renderer
            .title(&puzzle("a.rs", "1-2", &"z".repeat(100)))
            .expect_err("no boundary");
        assert_eq!(err, RenderError::NoBoundary { length: 60 });
    }

    #[test]
    fn alert_users_are_sanitized_mentions() {
        let mut cfg = RepoConfig::default();
        cfg.alerts.insert(
            "gitea".to_string(),
            vec!["monomonedula".to_string(), "whoever-1234".to_string()],
        );

        assert_eq!(alert_users(&cfg, "gitea"), vec!["@monomonedula", "@whoever-1234"]);
        assert_eq!(alert_users(&cfg, "Gitea"), vec!["@monomonedula", "@whoever-1234"]);
        assert!(alert_users(&cfg, "github").is_empty());
    }

    #[test]
    fn alert_users_strip_and_cap_names() {
        let mut cfg = RepoConfig::default();
        cfg.alerts.insert(
            "github".to_string(),
            vec![
                " Jane.Doe!! ".to_string(),
                "@@@".to_string(),
                "x".repeat(100),
            ],
        );

        let users = alert_users(&cfg, "github");
        assert_eq!(users[0], "@janedoe");
        assert_eq!(users[1], format!("@{}", "x".repeat(64)));
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn absent_alerts_yield_no_users() {
        assert!(alert_users(&RepoConfig::default(), "gitea").is_empty());
        let renderer = TicketRenderer::new("gitea", &RepoConfig::default());
        assert!(renderer.alert_users().is_empty());
    }

    #[test]
    fn body_goes_through_template_with_lowercased_provider() {
        struct Echo;
        impl BodyTemplate for Echo {
            fn render(&self, provider: &str, vars: &BodyVars) -> String {
                format!("{provider}|{}|{}", vars.url, vars.id)
            }
        }

        let renderer = TicketRenderer::new("GitHub", &RepoConfig::default());
        let body = renderer.body(&stored("p9", true, None), "https://x/y".to_string(), &Echo);
        assert_eq!(body, "github|https://x/y|p9");
    }
}
