//! Access statistics and the end-of-run report.

use core::fmt;

use crate::AccessKind;

/// Cost of one memory access in nanoseconds.
pub const MEMORY_ACCESS_TIME: u64 = 100;

/// Cost of one disk access (a page fault) in nanoseconds.
pub const DISK_ACCESS_TIME: u64 = 10_000_000;

/// Running counters, updated once per access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    accesses: u64,
    reads: u64,
    writes: u64,
    page_faults: u64,
    writebacks: u64,
}

impl Statistics {
    pub fn accesses(&self) -> u64 {
        self.accesses
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn page_faults(&self) -> u64 {
        self.page_faults
    }

    pub fn writebacks(&self) -> u64 {
        self.writebacks
    }

    /// Counts one completed access, and its page fault if it took one.
    pub(crate) fn record_access(&mut self, kind: AccessKind, faulted: bool) {
        self.accesses += 1;
        match kind {
            AccessKind::Read => self.reads += 1,
            AccessKind::Write => self.writes += 1,
        }
        if faulted {
            self.page_faults += 1;
        }
    }

    pub(crate) fn record_writeback(&mut self) {
        self.writebacks += 1;
    }

    /// Derives the final report. The counters are left untouched.
    ///
    /// A run without accesses reports an average access time of zero.
    pub fn compute(&self) -> Report {
        let average_access_time = if self.accesses == 0 {
            0.0
        } else {
            let total = self.accesses as f64 * MEMORY_ACCESS_TIME as f64
                + self.page_faults as f64 * DISK_ACCESS_TIME as f64;
            total / self.accesses as f64
        };

        Report {
            accesses: self.accesses,
            reads: self.reads,
            writes: self.writes,
            page_faults: self.page_faults,
            writebacks: self.writebacks,
            average_access_time,
        }
    }
}

/// Final statistics of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    pub accesses: u64,
    pub reads: u64,
    pub writes: u64,
    pub page_faults: u64,
    pub writebacks: u64,
    /// Average access time in nanoseconds.
    pub average_access_time: f64,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Accesses     : {}", self.accesses)?;
        writeln!(f, "Reads              : {}", self.reads)?;
        writeln!(f, "Writes             : {}", self.writes)?;
        writeln!(f, "Page Faults        : {}", self.page_faults)?;
        writeln!(f, "Writes to disk     : {}", self.writebacks)?;
        write!(f, "Average Access Time: {:.6}", self.average_access_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_reads_and_writes() {
        let mut stats = Statistics::default();
        stats.record_access(AccessKind::Write, true);
        stats.record_access(AccessKind::Read, false);
        stats.record_access(AccessKind::Read, false);
        stats.record_writeback();

        assert_eq!(stats.accesses(), 3);
        assert_eq!(stats.reads(), 2);
        assert_eq!(stats.writes(), 1);
        assert_eq!(stats.page_faults(), 1);
        assert_eq!(stats.writebacks(), 1);
    }

    #[test]
    fn average_access_time() {
        let mut stats = Statistics::default();
        stats.record_access(AccessKind::Write, true);
        stats.record_access(AccessKind::Read, false);

        let report = stats.compute();

        // (2 * 100 + 1 * 10_000_000) / 2
        assert_eq!(report.average_access_time, 5_000_100.0);
        assert_eq!(report.accesses, 2);
    }

    #[test]
    fn empty_run_has_zero_average() {
        let report = Statistics::default().compute();
        assert_eq!(report.accesses, 0);
        assert_eq!(report.average_access_time, 0.0);
    }

    #[test]
    fn compute_does_not_mutate() {
        let mut stats = Statistics::default();
        stats.record_access(AccessKind::Read, true);
        let before = stats;

        let _ = stats.compute();

        assert_eq!(stats, before);
    }

    #[test]
    fn report_format() {
        let mut stats = Statistics::default();
        stats.record_access(AccessKind::Read, false);

        let text = stats.compute().to_string();

        assert_eq!(
            text,
            "Total Accesses     : 1\n\
             Reads              : 1\n\
             Writes             : 0\n\
             Page Faults        : 0\n\
             Writes to disk     : 0\n\
             Average Access Time: 100.000000"
        );
    }
}
