//! Terminal reporting: one line per test, grouped under origin and block
//! headings, with a line diff of expected vs found for failed assertions.

use super::{Outcome, OutcomeReporter, ReportSink};
use crate::errors::TestError;
use crate::runner::{Origin, RunSummary};
use difference::{Changeset, Difference};
use miette::Diagnostic;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

struct ConsoleState<W> {
    out: W,
    origin: Option<Origin>,
    group: Option<String>,
}

/// Writes human-readable results to a colour-capable writer.
pub struct ConsoleSink<W: WriteColor = StandardStream> {
    state: Rc<RefCell<ConsoleState<W>>>,
}

impl ConsoleSink<StandardStream> {
    pub fn stdout(use_colors: bool) -> Self {
        let choice = if use_colors {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self::new(StandardStream::stdout(choice))
    }
}

impl<W: WriteColor + 'static> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: Rc::new(RefCell::new(ConsoleState {
                out,
                origin: None,
                group: None,
            })),
        }
    }

    /// Gives access to the underlying writer, e.g. to read a buffer back.
    pub fn with_writer<R>(&self, f: impl FnOnce(&W) -> R) -> R {
        f(&self.state.borrow().out)
    }
}

impl<W: WriteColor> Clone for ConsoleSink<W> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<W: WriteColor + 'static> ReportSink for ConsoleSink<W> {
    fn register_placeholder(&mut self, origin: &Origin, group: Option<&str>, name: &str) -> OutcomeReporter {
        let state = Rc::clone(&self.state);
        let origin = origin.clone();
        let group = group.map(str::to_string);
        let name = name.to_string();
        Box::new(move |outcome| {
            let mut state = state.borrow_mut();
            let _ = state.write_outcome(&origin, group.as_deref(), &name, &outcome);
        })
    }

    fn report_summary(&mut self, summary: &RunSummary) {
        let _ = self.state.borrow_mut().write_summary(summary);
    }
}

impl<W: WriteColor> ConsoleState<W> {
    fn write_outcome(
        &mut self,
        origin: &Origin,
        group: Option<&str>,
        name: &str,
        outcome: &Outcome,
    ) -> io::Result<()> {
        if self.origin.as_ref() != Some(origin) {
            self.out.set_color(ColorSpec::new().set_bold(true))?;
            writeln!(self.out, "\n{}", origin)?;
            self.out.reset()?;
            self.origin = Some(origin.clone());
            self.group = None;
        }
        if self.group.as_deref() != group {
            if let Some(g) = group {
                self.out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
                writeln!(self.out, "  {}", g)?;
                self.out.reset()?;
            }
            self.group = group.map(str::to_string);
        }
        let indent = if group.is_some() { "    " } else { "  " };

        if outcome.passed {
            self.out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            writeln!(self.out, "{}✅ {}", indent, name)?;
            return self.out.reset();
        }

        self.out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
        writeln!(self.out, "{}❌ {}", indent, name)?;
        self.out.reset()?;
        match &outcome.error {
            Some(TestError::Failure(failure)) => {
                let code = failure.code().map(|c| c.to_string()).unwrap_or_default();
                writeln!(self.out, "{}   {} [{}]", indent, failure.message, code)?;
                if let (Some(expected), Some(found)) = (&failure.expected, &failure.found) {
                    self.write_diff(indent, &expected.pretty(), &found.pretty())?;
                }
            }
            Some(TestError::Fault(fault)) => {
                self.out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
                writeln!(self.out, "{}   {}", indent, fault)?;
                self.out.reset()?;
            }
            None => writeln!(self.out, "{}   {}", indent, outcome.message)?,
        }
        Ok(())
    }

    fn write_diff(&mut self, indent: &str, expected: &str, found: &str) -> io::Result<()> {
        let changeset = Changeset::new(expected, found, "\n");
        for diff in &changeset.diffs {
            let (marker, color, text) = match diff {
                Difference::Same(x) => (' ', None, x),
                Difference::Rem(x) => ('-', Some(Color::Green), x),
                Difference::Add(x) => ('+', Some(Color::Red), x),
            };
            self.out.set_color(ColorSpec::new().set_fg(color))?;
            for line in text.lines() {
                writeln!(self.out, "{}   {} {}", indent, marker, line)?;
            }
            self.out.reset()?;
        }
        Ok(())
    }

    fn write_summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        let color = if summary.success { Color::Green } else { Color::Red };
        self.out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        writeln!(self.out, "\n{}", summary)?;
        self.out.reset()?;
        self.out.flush()
    }
}
