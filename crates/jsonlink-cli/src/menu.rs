//! Numbered menu driving one query per selection.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use jsonlink_core::{parse_payload, DeviceQuery, FrameKind};
use jsonlink_serial::{FrameExtractor, SerialError, Transport};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Query(DeviceQuery),
    Heartbeat,
    Exit,
}

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Query(q) => q.label(),
            MenuAction::Heartbeat => "to capture heartbeat",
            MenuAction::Exit => "exit",
        }
    }
}

pub struct Menu {
    title: String,
    actions: Vec<MenuAction>,
}

impl Menu {
    pub fn new(title: impl Into<String>) -> Self {
        let mut actions: Vec<MenuAction> =
            DeviceQuery::ALL.into_iter().map(MenuAction::Query).collect();
        actions.push(MenuAction::Heartbeat);
        actions.push(MenuAction::Exit);
        Self {
            title: title.into(),
            actions,
        }
    }

    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", self.title)?;
        for (i, action) in self.actions.iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, action.label())?;
        }
        write!(out, "> ")?;
        out.flush()
    }

    /// Selections are 1-based, as rendered.
    pub fn select(&self, line: &str) -> Option<MenuAction> {
        let index = line.trim().parse::<usize>().ok()?;
        index.checked_sub(1).and_then(|i| self.actions.get(i)).copied()
    }
}

pub struct Session<T> {
    transport: T,
    extractor: FrameExtractor,
    running: Arc<AtomicBool>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, extractor: FrameExtractor, running: Arc<AtomicBool>) -> Self {
        Self {
            transport,
            extractor,
            running,
        }
    }

    /// Runs until "exit", end of input, or the running flag is cleared.
    pub fn run<R: BufRead, W: Write>(&mut self, menu: &Menu, input: R, out: &mut W) -> Result<()> {
        let mut lines = input.lines();
        while self.running.load(Ordering::Relaxed) {
            menu.render(out)?;
            let Some(line) = lines.next() else {
                break;
            };
            let line = line.context("failed to read menu selection")?;
            if !self.running.load(Ordering::Relaxed) {
                break;
            }

            match menu.select(&line) {
                Some(MenuAction::Exit) => break,
                Some(action) => self.dispatch(action, out)?,
                None => writeln!(out, "Invalid option: {}", line.trim())?,
            }
        }
        writeln!(out, "Cleaning and closing")?;
        info!("Session closed");
        Ok(())
    }

    /// Timeouts, cancellation and malformed frames are reported to `out`;
    /// only transport failures are returned as errors.
    pub fn dispatch<W: Write>(&mut self, action: MenuAction, out: &mut W) -> Result<()> {
        let (command, want, field) = match action {
            MenuAction::Query(query) => {
                let command = query
                    .request()
                    .to_json()
                    .context("failed to serialize request")?;
                (command, FrameKind::Response, Some(query.summary_field()))
            }
            MenuAction::Heartbeat => (String::new(), FrameKind::Heartbeat, None),
            MenuAction::Exit => return Ok(()),
        };

        let frame = match self.extractor.extract(&mut self.transport, &command, want) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                writeln!(
                    out,
                    "No response from device after {} attempts",
                    self.extractor.config().max_retries
                )?;
                return Ok(());
            }
            Err(SerialError::Cancelled) => {
                writeln!(out, "Cancelled")?;
                return Ok(());
            }
            Err(e) => return Err(e).context("serial transport failed"),
        };

        let value = match parse_payload(&frame) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Device sent a malformed frame");
                writeln!(out, "Malformed response: {e}")?;
                return Ok(());
            }
        };

        writeln!(out, "[{}] {}", Local::now().format("%a %b %e %T %Y"), value)?;
        if let Some(field) = field {
            match value.get(field) {
                Some(v) => writeln!(out, "{field}: {v}")?,
                None => {
                    warn!(field, "Response lacks summary field");
                    writeln!(out, "{field}: <missing>")?;
                }
            }
        }
        Ok(())
    }
}
