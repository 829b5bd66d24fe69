//! Styled stderr messages for the CLI.
//!
//! Standard output carries the rewritten document or manifest JSON, so all
//! status text goes to stderr.

use console::{Style, Term};

pub(crate) struct Output {
    term: Term,
    written: Style,
    warned: Style,
    failed: Style,
}

impl Output {
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            written: Style::new().green(),
            warned: Style::new().yellow(),
            failed: Style::new().red(),
        }
    }

    /// Report a file that was written.
    pub(crate) fn success(&self, msg: &str) {
        self.line(&self.written, msg);
    }

    /// Report a document problem that did not stop the command.
    pub(crate) fn warning(&self, msg: &str) {
        self.line(&self.warned, msg);
    }

    /// Report the error that ended the command.
    pub(crate) fn error(&self, msg: &str) {
        self.line(&self.failed, msg);
    }

    fn line(&self, style: &Style, msg: &str) {
        // Nothing sensible to do if stderr itself is gone.
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }
}
