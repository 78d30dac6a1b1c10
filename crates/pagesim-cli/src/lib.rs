//! Trace driver for the `vm-sim` binary.
//!
//! Feeds a trace through a [`Simulator`], echoing each step in the classic `vm-sim`
//! format:
//!
//! ```text
//!        0: PID 1 started
//!        1:   1  w  0x00000 <- ab
//!        2:   1  r  0x00000 -> ab
//!        3: PID 1 stopped
//! ```
//!
//! Step numbers count every line of the trace from zero, blank lines included.

pub mod logger;

use std::fmt;
use std::io::{BufRead, Write};

use anyhow::Context;
use pagesim::{AccessKind, Report, Simulator, SwapStore, TraceEvent, TraceReader};

/// One executed trace step, ready to be printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub number: usize,
    pub event: TraceEvent,
    /// Byte returned by an access.
    pub observed: Option<u8>,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.event {
            TraceEvent::Start(pid) => write!(f, "{:8}: PID {} started", self.number, pid),
            TraceEvent::Stop(pid) => write!(f, "{:8}: PID {} stopped", self.number, pid),
            TraceEvent::Access {
                pid,
                kind,
                address,
                value,
            } => {
                let (arrow, byte) = match kind {
                    AccessKind::Read => ("->", self.observed.unwrap_or(value)),
                    AccessKind::Write => ("<-", value),
                };
                write!(
                    f,
                    "{:8}: {:3}  {}  0x{:05x} {} {:02x}",
                    self.number,
                    pid.as_u32(),
                    kind,
                    address.as_usize(),
                    arrow,
                    byte
                )
            }
        }
    }
}

/// Runs every event of `trace` and returns the final report.
///
/// Unless `quiet` is set, each step is written to `out` as it completes. The first
/// malformed line or rejected event stops the run; a [`pagesim::SimError`] is kept as
/// the root cause so callers can recognise it.
pub fn run_trace<S, R, W>(
    sim: &mut Simulator<S>,
    trace: R,
    out: &mut W,
    quiet: bool,
) -> anyhow::Result<Report>
where
    S: SwapStore,
    R: BufRead,
    W: Write,
{
    for item in TraceReader::new(trace) {
        let (line, event) = item.context("Unable to parse trace file")?;
        let observed = sim
            .apply(event)
            .with_context(|| format!("line {}: {:?}", line, event))?;

        if !quiet {
            let step = Step {
                number: line - 1,
                event,
                observed,
            };
            writeln!(out, "{}", step)?;
        }
    }

    let report = sim.report();
    log::info!(
        "{} accesses, {} page faults, {} writebacks",
        report.accesses,
        report.page_faults,
        report.writebacks
    );
    Ok(report)
}
