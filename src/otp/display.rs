//! Display sinks.
//!
//! The runner pushes every status change, every countdown tick and every
//! digit edit to a [`DisplaySink`]. Rendering is entirely up to the sink.

use crate::otp::{countdown::Countdown, digits::DigitBuffer, session::Stage, status::Status};
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

pub trait DisplaySink: Send {
    fn show_status(&mut self, stage: Stage, status: &Status) -> Result<()>;

    /// Called once per timer tick with the remaining time.
    fn show_countdown(&mut self, remaining: Countdown) -> Result<()>;

    fn show_digits(&mut self, _digits: &DigitBuffer) -> Result<()> {
        Ok(())
    }
}

/// Human readable lines.
///
/// Countdown ticks are only written on half-minute marks and during the last
/// few seconds so an interactive terminal stays readable.
///
/// Writes go through blocking `std::io::Write` on the runner task. Use it
/// with a terminal, a pipe or an in-memory buffer, not a slow writer.
#[derive(Debug)]
pub struct TextSink<W> {
    out: W,
}

impl<W: Write + Send> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> DisplaySink for TextSink<W> {
    fn show_status(&mut self, _stage: Stage, status: &Status) -> Result<()> {
        let marker = if status.is_error() { "!" } else { ">" };
        writeln!(self.out, "{marker} {status}")?;
        self.out.flush()?;
        Ok(())
    }

    fn show_countdown(&mut self, remaining: Countdown) -> Result<()> {
        let seconds = remaining.remaining();
        if seconds > 0 && (seconds % 30 == 0 || seconds <= 5) {
            writeln!(self.out, "  expires in {remaining}")?;
            self.out.flush()?;
        }
        Ok(())
    }

    fn show_digits(&mut self, digits: &DigitBuffer) -> Result<()> {
        writeln!(self.out, "  [{digits}]")?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Report<'a> {
    Status {
        stage: Stage,
        status: &'a Status,
        message: String,
    },
    Countdown {
        remaining: Countdown,
        display: String,
    },
    Digits {
        slots: String,
        focus: usize,
    },
}

/// One JSON object per line, for scripting.
#[derive(Debug)]
pub struct JsonSink<W> {
    out: W,
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, report: &Report<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.out, report)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> DisplaySink for JsonSink<W> {
    fn show_status(&mut self, stage: Stage, status: &Status) -> Result<()> {
        self.emit(&Report::Status {
            stage,
            status,
            message: status.to_string(),
        })
    }

    fn show_countdown(&mut self, remaining: Countdown) -> Result<()> {
        self.emit(&Report::Countdown {
            remaining,
            display: remaining.to_string(),
        })
    }

    fn show_digits(&mut self, digits: &DigitBuffer) -> Result<()> {
        self.emit(&Report::Digits {
            slots: digits.slots().iter().map(|slot| slot.unwrap_or('_')).collect(),
            focus: digits.focus(),
        })
    }
}

impl DisplaySink for Box<dyn DisplaySink> {
    fn show_status(&mut self, stage: Stage, status: &Status) -> Result<()> {
        (**self).show_status(stage, status)
    }

    fn show_countdown(&mut self, remaining: Countdown) -> Result<()> {
        (**self).show_countdown(remaining)
    }

    fn show_digits(&mut self, digits: &DigitBuffer) -> Result<()> {
        (**self).show_digits(digits)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub(crate) enum Shown {
        Status(Stage, Status),
        Countdown(u32),
        Digits(String),
    }

    /// Records everything it is shown; clones share the same log.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct RecordingSink(Arc<Mutex<Vec<Shown>>>);

    impl RecordingSink {
        pub(crate) fn shown(&self) -> Vec<Shown> {
            self.0.lock().unwrap().clone()
        }

        pub(crate) fn messages(&self) -> Vec<String> {
            self.shown()
                .into_iter()
                .filter_map(|shown| match shown {
                    Shown::Status(_, status) => Some(status.to_string()),
                    Shown::Countdown(_) | Shown::Digits(_) => None,
                })
                .collect()
        }

        pub(crate) fn countdowns(&self) -> Vec<u32> {
            self.shown()
                .into_iter()
                .filter_map(|shown| match shown {
                    Shown::Countdown(seconds) => Some(seconds),
                    Shown::Status(..) | Shown::Digits(_) => None,
                })
                .collect()
        }
    }

    impl DisplaySink for RecordingSink {
        fn show_status(&mut self, stage: Stage, status: &Status) -> Result<()> {
            self.0
                .lock()
                .unwrap()
                .push(Shown::Status(stage, status.clone()));
            Ok(())
        }

        fn show_countdown(&mut self, remaining: Countdown) -> Result<()> {
            self.0
                .lock()
                .unwrap()
                .push(Shown::Countdown(remaining.remaining()));
            Ok(())
        }

        fn show_digits(&mut self, digits: &DigitBuffer) -> Result<()> {
            self.0.lock().unwrap().push(Shown::Digits(digits.to_string()));
            Ok(())
        }
    }
}
