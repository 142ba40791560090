//! UI seam
//!
//! The runtime drives everything observable through this trait, so the
//! terminal frontend is swappable and tests can record exactly what the
//! user would have seen.

use crate::chat::{Role, Turn};
use std::io::Write;

pub trait ChatView {
    /// A document was accepted: show its name and rendered initial summary.
    fn document_loaded(&mut self, filename: &str, summary_markup: &str);

    /// A committed (immutable) turn was appended to the transcript.
    fn turn_committed(&mut self, turn: &Turn, markup: &str);

    /// The in-flight assistant answer changed; `markup` is the full
    /// re-render of its accumulated content, not an increment.
    fn answer_updated(&mut self, markup: &str);

    /// The in-flight answer is complete.
    fn answer_committed(&mut self);

    fn set_pending(&mut self, pending: bool);

    fn set_input_enabled(&mut self, enabled: bool);

    /// Inline status text (validation and upload failures).
    fn status(&mut self, message: &str);

    /// Session discarded: clear the conversation and inputs.
    fn clear(&mut self);
}

/// What currently occupies the repaintable region at the bottom of the
/// scrollback.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Live {
    #[default]
    Nothing,
    Pending,
    Answer {
        lines: usize,
    },
}

/// Line-oriented terminal frontend. Repaints the in-flight answer in place
/// by erasing the lines it printed last time.
#[derive(Debug, Default)]
pub struct TerminalView {
    live: Live,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    fn erase_live(&mut self) {
        let lines = match self.live {
            Live::Nothing => 0,
            Live::Pending => 1,
            Live::Answer { lines } => lines,
        };
        if lines > 0 {
            print!("\x1b[{lines}A\x1b[0J");
        }
        self.live = Live::Nothing;
    }

    fn flush() {
        let _ = std::io::stdout().flush();
    }
}

impl ChatView for TerminalView {
    fn document_loaded(&mut self, filename: &str, summary_markup: &str) {
        println!("\n\x1b[1m{filename}\x1b[0m");
        println!("{summary_markup}\n");
        Self::flush();
    }

    fn turn_committed(&mut self, turn: &Turn, markup: &str) {
        let label = match turn.role {
            Role::User => "\x1b[1myou\x1b[0m",
            Role::Assistant => "\x1b[1mdemidoc\x1b[0m",
        };
        println!("{label} \u{203a} {markup}\n");
        Self::flush();
    }

    fn answer_updated(&mut self, markup: &str) {
        self.erase_live();
        let text = format!("\x1b[1mdemidoc\x1b[0m \u{203a} {markup}");
        println!("{text}");
        self.live = Live::Answer {
            lines: text.lines().count().max(1),
        };
        Self::flush();
    }

    fn answer_committed(&mut self) {
        // Leave the final paint in the scrollback.
        self.live = Live::Nothing;
        println!();
        Self::flush();
    }

    fn set_pending(&mut self, pending: bool) {
        if pending {
            println!("\u{2026}");
            self.live = Live::Pending;
        } else if self.live == Live::Pending {
            self.erase_live();
        } else if let Live::Answer { .. } = self.live {
            // A failed answer keeps its partial paint; just detach it so
            // the next repaint can't erase it.
            self.live = Live::Nothing;
            println!();
        }
        Self::flush();
    }

    fn set_input_enabled(&mut self, _enabled: bool) {
        // A line-oriented prompt has no widget to gray out; gating happens
        // in the state machine.
    }

    fn status(&mut self, message: &str) {
        println!("\x1b[33m{message}\x1b[0m");
        Self::flush();
    }

    fn clear(&mut self) {
        self.live = Live::Nothing;
        println!("\x1b[2m(conversation cleared)\x1b[0m");
        Self::flush();
    }
}
