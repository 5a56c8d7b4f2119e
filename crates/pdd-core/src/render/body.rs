use chrono::DateTime;

use crate::model::StoredPuzzle;

/// Values a body template may reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyVars {
    /// Deep link to the puzzle lines at the rendered commit.
    pub url: String,
    pub id: String,
    pub ticket: String,
    pub estimate: i64,
    pub role: String,
    pub author: String,
    /// Puzzle creation date as `DD-Mon-YY`.
    pub date: String,
}

impl BodyVars {
    #[must_use]
    pub fn new(puzzle: &StoredPuzzle, url: String) -> Self {
        Self {
            url,
            id: puzzle.id.clone(),
            ticket: puzzle.ticket.clone(),
            estimate: puzzle.estimate,
            role: puzzle.role.clone(),
            author: puzzle.author.clone(),
            date: short_date(&puzzle.time),
        }
    }
}

/// Formats an issue body for a tracker provider.
pub trait BodyTemplate {
    /// `provider` is the lowercased tracker name (`gitea`, `github`, ...).
    fn render(&self, provider: &str, vars: &BodyVars) -> String;
}

/// Built-in markdown body shared by all providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBodyTemplate;

impl BodyTemplate for DefaultBodyTemplate {
    fn render(&self, _provider: &str, vars: &BodyVars) -> String {
        let mut sections = vec![
            format!(
                "The puzzle `{}` from #{} has to be resolved:",
                vars.id, vars.ticket
            ),
            vars.url.clone(),
            format!(
                "The puzzle was created by {} on {}.",
                vars.author, vars.date
            ),
        ];

        let mut facts = Vec::new();
        if vars.estimate > 0 {
            facts.push(format!("Estimate: {} minutes", vars.estimate));
        }
        if !vars.role.trim().is_empty() {
            facts.push(format!("role: {}", vars.role));
        }
        if !facts.is_empty() {
            sections.push(format!("{}.", facts.join(", ")));
        }

        sections.push(
            "If you have any technical questions, don't ask me, submit new tickets \
             instead. The task will be \"done\" when the problem is fixed and the text \
             of the puzzle is _removed_ from the source code. Here is more about \
             [PDD](http://www.yegor256.com/2009/03/04/pdd.html) and \
             [about me](http://www.yegor256.com/2017/04/05/pdd-in-action.html)."
                .to_string(),
        );

        sections.join("\n\n")
    }
}

/// `DD-Mon-YY` for an RFC 3339 timestamp; the raw text when it does not parse.
fn short_date(time: &str) -> String {
    DateTime::parse_from_rfc3339(time.trim())
        .map_or_else(|_| time.to_string(), |t| t.format("%d-%b-%y").to_string())
}
