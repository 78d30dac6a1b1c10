//! Trace events and the trace file reader.
//!
//! A trace is a text file with one event per line:
//!
//! ```text
//! START 1
//! 1 w 0x00000 0xab
//! 1 r 0x00000 0x00
//! STOP 1
//! ```
//!
//! Addresses and data bytes are hexadecimal, with or without a `0x` prefix. The data byte
//! of a read is ignored. Blank lines are skipped but still count towards line numbers.

use core::fmt;
use core::str::FromStr;
use std::io::BufRead;

use crate::{ParseError, Pid, TraceError, VirtualAddress};

/// Direction of a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("r"),
            Self::Write => f.write_str("w"),
        }
    }
}

/// One decoded trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// A process begins.
    Start(Pid),
    /// A process ends.
    Stop(Pid),
    /// A process reads or writes one byte.
    Access {
        pid: Pid,
        kind: AccessKind,
        address: VirtualAddress,
        value: u8,
    },
}

fn parse_hex(text: &str) -> Option<u32> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).ok()
}

/// Parses the single pid argument of a START or STOP line.
fn parse_pid<'a>(mut args: impl Iterator<Item = &'a str>) -> Option<Pid> {
    let pid: u32 = args.next()?.parse().ok()?;
    match args.next() {
        Some(_) => None,
        None => Some(Pid::new(pid)),
    }
}

fn parse_access<'a>(mut fields: impl Iterator<Item = &'a str>) -> Option<TraceEvent> {
    let pid: u32 = fields.next()?.parse().ok()?;
    let kind = match fields.next()? {
        "r" => AccessKind::Read,
        "w" => AccessKind::Write,
        _ => return None,
    };
    let address = parse_hex(fields.next()?)?;
    let value = u8::try_from(parse_hex(fields.next()?)?).ok()?;
    if fields.next().is_some() {
        return None;
    }

    Some(TraceEvent::Access {
        pid: Pid::new(pid),
        kind,
        address: VirtualAddress::from(address),
        value,
    })
}

impl FromStr for TraceEvent {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("START") => parse_pid(fields)
                .map(TraceEvent::Start)
                .ok_or(ParseError::InvalidStart),
            Some("STOP") => parse_pid(fields)
                .map(TraceEvent::Stop)
                .ok_or(ParseError::InvalidStop),
            _ => parse_access(line.split_whitespace()).ok_or(ParseError::InvalidAccess),
        }
    }
}

/// Reads trace events from a buffered source.
///
/// Yields each event together with its 1-based line number. A line that is not valid
/// UTF-8 is reported as a parse error on that line.
pub struct TraceReader<R> {
    reader: R,
    buf: Vec<u8>,
    line: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<(usize, TraceEvent), TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(err.into())),
            }
            self.line += 1;
            let line = self.line;

            let Ok(text) = core::str::from_utf8(&self.buf) else {
                return Some(Err(TraceError::Parse {
                    line,
                    source: ParseError::InvalidEncoding,
                }));
            };
            if text.trim().is_empty() {
                continue;
            }

            return Some(
                text.parse::<TraceEvent>()
                    .map(|event| (line, event))
                    .map_err(|source| TraceError::Parse { line, source }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_and_stop() {
        assert_eq!("START 12".parse::<TraceEvent>(), Ok(TraceEvent::Start(Pid::new(12))));
        assert_eq!("STOP 3".parse::<TraceEvent>(), Ok(TraceEvent::Stop(Pid::new(3))));
    }

    #[test]
    fn parses_access() {
        assert_eq!(
            "1 w 0x00000 0xAB".parse::<TraceEvent>(),
            Ok(TraceEvent::Access {
                pid: Pid::new(1),
                kind: AccessKind::Write,
                address: VirtualAddress::new(0),
                value: 0xAB,
            })
        );
        assert_eq!(
            "7 r 1f3a4 00".parse::<TraceEvent>(),
            Ok(TraceEvent::Access {
                pid: Pid::new(7),
                kind: AccessKind::Read,
                address: VirtualAddress::new(0x1F3A4),
                value: 0,
            })
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(
            "START".parse::<TraceEvent>(),
            Err(ParseError::InvalidStart)
        );
        assert_eq!(
            "START one".parse::<TraceEvent>(),
            Err(ParseError::InvalidStart)
        );
        assert_eq!(
            "STOP 1 2".parse::<TraceEvent>(),
            Err(ParseError::InvalidStop)
        );
        assert_eq!(
            "1 x 0x0 0x0".parse::<TraceEvent>(),
            Err(ParseError::InvalidAccess)
        );
        assert_eq!(
            "1 w 0x0 0x100".parse::<TraceEvent>(),
            Err(ParseError::InvalidAccess)
        );
        assert_eq!(
            "1 w 0x0".parse::<TraceEvent>(),
            Err(ParseError::InvalidAccess)
        );
        assert_eq!(
            "1 w 0xZZ 0x1".parse::<TraceEvent>(),
            Err(ParseError::InvalidAccess)
        );
    }

    #[test]
    fn reader_numbers_lines_and_skips_blanks() {
        let trace = "START 1\n\n1 r 0x10 0x00\nSTOP 1\n";
        let events: Vec<_> = TraceReader::new(trace.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            events,
            [
                (1, TraceEvent::Start(Pid::new(1))),
                (
                    3,
                    TraceEvent::Access {
                        pid: Pid::new(1),
                        kind: AccessKind::Read,
                        address: VirtualAddress::new(0x10),
                        value: 0,
                    }
                ),
                (4, TraceEvent::Stop(Pid::new(1))),
            ]
        );
    }

    #[test]
    fn reader_reports_line_of_invalid_utf8() {
        let trace: &[u8] = b"START 1\n1 r 0x0 \xff\n1 r 0x0 0x0\n";
        let mut reader = TraceReader::new(trace);

        assert!(matches!(reader.next(), Some(Ok((1, _)))));
        assert!(matches!(
            reader.next(),
            Some(Err(TraceError::Parse {
                line: 2,
                source: ParseError::InvalidEncoding
            }))
        ));
        assert!(matches!(reader.next(), Some(Ok((3, _)))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn reader_accepts_crlf_and_missing_final_newline() {
        let trace = "START 1\r\n1 w 0x10 0x2\r\nSTOP 1";
        let lines: Vec<usize> = TraceReader::new(trace.as_bytes())
            .map(|item| item.unwrap().0)
            .collect();

        assert_eq!(lines, [1, 2, 3]);
    }

    #[test]
    fn reader_reports_line_of_bad_event() {
        let trace = "START 1\nbogus\n";
        let mut reader = TraceReader::new(trace.as_bytes());

        assert!(matches!(reader.next(), Some(Ok((1, _)))));
        assert!(matches!(
            reader.next(),
            Some(Err(TraceError::Parse {
                line: 2,
                source: ParseError::InvalidAccess
            }))
        ));
        assert!(reader.next().is_none());
    }
}
