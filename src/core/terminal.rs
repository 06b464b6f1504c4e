//! Terminal presentation sink
//!
//! Renders notifications as lines on a writer (stdout in the binary). With
//! color disabled the output is plain text, one notification per line group.

use std::io::Write;
use colored::{ColoredString, Colorize};

use crate::core::sinks::{Notification, PresentationSink};
use crate::core::tracker::RevelationFrame;
use crate::error::SinkError;
use crate::types::{BlockKind, ContentBlock, ResolvedChoice, SessionView};
use crate::FILE_DESIGNATION;

const REDACTED_BAR: &str = "████████████████████";

pub struct TerminalPresenter<W: Write + Send> {
    out: W,
    color: bool,
    /// Print the status line on phase entry
    status_line: bool,
}

impl<W: Write + Send> TerminalPresenter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            status_line: false,
        }
    }

    pub fn with_status_line(mut self, enabled: bool) -> Self {
        self.status_line = enabled;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn line(&mut self, text: impl AsRef<str>) -> Result<(), SinkError> {
        writeln!(self.out, "{}", text.as_ref())?;
        Ok(())
    }

    fn block(&mut self, block: &ContentBlock) -> Result<(), SinkError> {
        let text = match block.kind {
            BlockKind::Redacted => REDACTED_BAR.to_string(),
            kind => format!("{}{}", kind.prefix(), block.content),
        };
        let style: fn(&str) -> ColoredString = match block.kind {
            BlockKind::Text => |s| s.normal(),
            BlockKind::System => |s| s.bright_black(),
            BlockKind::Redacted => |s| s.bright_black(),
            BlockKind::Warning => |s| s.yellow(),
            BlockKind::Anomaly => |s| s.red(),
            BlockKind::Hollow => |s| s.magenta(),
        };
        if !self.color {
            return self.line(text);
        }
        let mut styled = style(&text);
        if block.glitch {
            styled = styled.italic();
        }
        self.line(styled.to_string())
    }

    fn registry_entry(&mut self, index: usize, choice: &ResolvedChoice) -> Result<(), SinkError> {
        if index == 0 {
            self.line("")?;
            let header = self.paint("PRE-LOGGED CHOICE REGISTRY:", |s| s.bright_black());
            self.line(header)?;
        }
        let logged = choice.logged_at(index).format("%Y-%m-%d %H:%M:%S");
        let verdict = if choice.was_correct_prediction {
            self.paint(choice.verdict(), |s| s.green())
        } else {
            self.paint(choice.verdict(), |s| s.red())
        };

        self.line(format!(
            "  PHASE: {:<20} LOGGED: {}",
            choice.phase_id.to_uppercase(),
            logged
        ))?;
        self.line(format!("  PREDICTED: {}", choice.predicted_option))?;
        self.line(format!("  SELECTED:  {} {}", choice.option_selected, verdict))?;
        self.line(format!("  HESITATION: {}", choice.hesitation_display()))
    }

    fn revelation(&mut self, frame: &RevelationFrame) -> Result<(), SinkError> {
        match frame {
            RevelationFrame::Entry { index, choice } => self.registry_entry(*index, choice),
            RevelationFrame::HashComparison {
                predicted,
                actual,
                variance_percent,
            } => {
                self.line("")?;
                let header = self.paint("OUTCOME HASH COMPARISON:", |s| s.red());
                self.line(header)?;
                let predicted = self.paint(predicted, |s| s.bold());
                let actual = self.paint(actual, |s| s.bold());
                self.line(format!("  PREDICTED (pre-session): {}", predicted))?;
                self.line(format!("  ACTUAL (post-session):   {}", actual))?;
                let variance = format!("  VARIANCE: {:.2}%", variance_percent);
                let variance = self.paint(&variance, |s| s.red());
                self.line(variance)
            }
            RevelationFrame::Conclusion => {
                self.line("")?;
                let conclusion = self.paint("All paths led here.", |s| s.magenta());
                self.line(conclusion)?;
                let follow = self.paint("Every choice confirmed the prediction.", |s| s.bright_black());
                self.line(follow)
            }
        }
    }

    fn locked(&mut self) -> Result<(), SinkError> {
        self.line("")?;
        let designation = format!("{} | THE CORRIDOR OF CHOICE", FILE_DESIGNATION);
        let designation = self.paint(&designation, |s| s.bright_black());
        self.line(designation)?;
        let banner = self.paint("[TERMINAL LOCKED]", |s| s.red().bold());
        self.line(banner)?;
        self.line("This session has concluded.")?;
        self.line("Your choices have been archived.")?;
        let matched = self.paint("They matched the prediction.", |s| s.magenta());
        self.line(matched)?;
        self.line("")?;
        let footer = self.paint("SESSION ARCHIVED | NO RESTART AVAILABLE", |s| s.bright_black());
        self.line(footer)
    }
}

impl<W: Write + Send> PresentationSink for TerminalPresenter<W> {
    fn present(&mut self, view: &SessionView, note: &Notification) -> Result<(), SinkError> {
        match note {
            Notification::PhaseEntered => {
                self.line("")?;
                if self.status_line {
                    let status = if self.color {
                        view.to_terminal_string()
                    } else {
                        view.to_parseable_string()
                    };
                    self.line(status)?;
                }
            }
            Notification::BlockRevealed(block) | Notification::ClosingBlock(block) => {
                self.block(block)?;
            }
            Notification::SystemMessage(message) => {
                let text = format!("{}{}", BlockKind::System.prefix(), message);
                let text = self.paint(&text, |s| s.bright_black());
                self.line(text)?;
            }
            Notification::AwaitingInput => {
                self.line("")?;
                let text = self.paint("[SYS] Awaiting input protocol...", |s| s.bright_black());
                self.line(text)?;
            }
            Notification::ChoicesPresented(options) => {
                for (i, option) in options.iter().enumerate() {
                    let text = format!("  [{}] {}", i + 1, option.label);
                    let text = self.paint(&text, |s| s.cyan());
                    self.line(text)?;
                }
                write!(self.out, "> ")?;
            }
            Notification::HesitationAcknowledged => {
                self.line("")?;
                let text = self.paint(
                    "Hesitation detected. Take your time. The outcome is unchanged.",
                    |s| s.yellow(),
                );
                self.line(text)?;
                write!(self.out, "> ")?;
            }
            Notification::Processing { label } => {
                self.line(format!("> {}", label))?;
                let text = self.paint("Processing response...", |s| s.bright_black());
                self.line(text)?;
            }
            Notification::Convergence(text) => {
                let text = self.paint(text, |s| s.green());
                self.line(text)?;
            }
            Notification::Revelation(frame) => self.revelation(frame)?,
            Notification::Locked => self.locked()?,
        }
        self.out.flush()?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
