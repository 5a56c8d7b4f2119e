//! Ticket operations the synchronizer drives, and the standard implementation
//! on top of a [`Vcs`].

use std::fmt::Write as _;

use tracing::{debug, info};

use crate::error::Result;
use crate::model::StoredPuzzle;
use crate::render::{BodyTemplate, DefaultBodyTemplate, TicketRenderer};
use crate::vcs::{Issue, Vcs};

/// What the synchronizer needs from an issue tracker.
pub trait Tickets {
    /// Open a ticket for `puzzle`. `None` means creation was skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the title cannot be rendered or a tracker call
    /// fails.
    fn submit(&self, puzzle: &StoredPuzzle) -> Result<Option<Issue>>;

    /// Close the puzzle's ticket. `true` when it is closed afterwards,
    /// including when it was already closed remotely.
    ///
    /// # Errors
    ///
    /// Returns an error if fetching, closing or commenting on the issue fails.
    fn close(&self, puzzle: &StoredPuzzle) -> Result<bool>;

    /// Comment on `issue`, addressed to its author.
    ///
    /// # Errors
    ///
    /// Returns an error if the comment cannot be posted.
    fn notify(&self, issue: &Issue, message: &str) -> Result<()>;
}

/// Tickets backed by a tracker provider, with rendered titles and bodies.
pub struct TrackerTickets<V, T = DefaultBodyTemplate> {
    vcs: V,
    template: T,
    renderer: TicketRenderer,
}

impl<V: Vcs> TrackerTickets<V> {
    pub fn new(vcs: V) -> Self {
        Self::with_template(vcs, DefaultBodyTemplate)
    }
}

impl<V: Vcs, T: BodyTemplate> TrackerTickets<V, T> {
    pub fn with_template(vcs: V, template: T) -> Self {
        let renderer = TicketRenderer::new(vcs.name(), vcs.config());
        Self {
            vcs,
            template,
            renderer,
        }
    }

    pub const fn vcs(&self) -> &V {
        &self.vcs
    }

    pub const fn renderer(&self) -> &TicketRenderer {
        &self.renderer
    }

    /// Rendered ticket title for `puzzle`.
    ///
    /// # Errors
    ///
    /// Returns a render error when the title cannot be truncated cleanly.
    pub fn title(&self, puzzle: &StoredPuzzle) -> Result<String> {
        Ok(self.renderer.title(puzzle)?)
    }

    pub fn body(&self, puzzle: &StoredPuzzle) -> String {
        let (start, stop) = puzzle.line_span();
        let url = self.vcs.puzzle_link_for_commit(
            self.vcs.repo().link_ref(),
            &puzzle.file,
            start,
            stop,
        );
        self.renderer.body(puzzle, url, &self.template)
    }

    fn users(&self) -> &[String] {
        self.renderer.alert_users()
    }
}

impl<V: Vcs, T: BodyTemplate> Tickets for TrackerTickets<V, T> {
    fn submit(&self, puzzle: &StoredPuzzle) -> Result<Option<Issue>> {
        let title = self.title(puzzle)?;
        let body = self.body(puzzle);

        let Some(issue) = self.vcs.create_issue(&title, &body)? else {
            debug!(puzzle = %puzzle.id, "tracker skipped issue creation");
            return Ok(None);
        };
        info!(puzzle = %puzzle.id, issue = %issue.number, "opened issue");

        if !self.users().is_empty() {
            let message = format!(
                "{} please pay attention to this new issue.",
                self.users().join(" ")
            );
            self.vcs.add_comment(&issue.number, &message)?;
        }

        Ok(Some(issue))
    }

    fn close(&self, puzzle: &StoredPuzzle) -> Result<bool> {
        let Some(stored) = &puzzle.issue else {
            return Ok(false);
        };

        if self.vcs.issue(&stored.number)?.closed {
            debug!(puzzle = %puzzle.id, issue = %stored.number, "issue already closed remotely");
            return Ok(true);
        }

        self.vcs.close_issue(&stored.number)?;

        let mut message = format!(
            "The puzzle `{}` has disappeared from the source code, so I closed this issue.",
            puzzle.id
        );
        if !self.users().is_empty() {
            let _ = write!(message, " //cc {}", self.users().join(" "));
        }
        self.vcs.add_comment(&stored.number, &message)?;

        info!(puzzle = %puzzle.id, issue = %stored.number, "closed issue");
        Ok(true)
    }

    fn notify(&self, issue: &Issue, message: &str) -> Result<()> {
        let comment = format!("@{} {message}", issue.author.username);
        self.vcs.add_comment(&issue.number, &comment)?;
        Ok(())
    }
}
