// This module provides arena-based session management for trace-building passes using
// the bumpalo crate. TraceSession owns a borrowed arena for the transient state of each
// pass (pending predecessor counts, finalized flags, queued flags) so that a pass's
// scratch memory is released with the arena rather than freed piecemeal. The session
// also acts as the instrumentation sink of the pass: it accumulates TraceStats across
// passes (blocks scheduled, edges visited, traces built, stale ready-queue pops, seeds
// released from cycles, traces entered from the side, elapsed time and arena usage) and
// remembers the compilation unit currently being processed. Statistics are side-channel
// only and never influence the partition the pass produces.

//! Arena-based trace-building session.
//!
//! All transient pass state is allocated in the session arena and shares its
//! lifetime. Statistics accumulate over every pass run in the session.

use bumpalo::Bump;
use std::cell::RefCell;
use std::fmt;
use std::time::Duration;

/// Summary of one finished pass, reported to the session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub blocks: usize,
    pub edges: usize,
    pub traces: usize,
    pub single_block_traces: usize,
    pub longest_trace: usize,
    pub side_entry_traces: usize,
    pub stale_pops: usize,
    pub released_seeds: usize,
    pub elapsed: Duration,
    pub arena_bytes: usize,
}

/// Arena-based trace-building session.
pub struct TraceSession<'arena> {
    /// Arena for transient pass state.
    arena: &'arena Bump,

    /// Statistics over all passes in this session.
    stats: RefCell<TraceStats>,

    /// Compilation unit being processed.
    current_unit: RefCell<Option<String>>,
}

impl<'arena> TraceSession<'arena> {
    /// Create a new session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            stats: RefCell::new(TraceStats::default()),
            current_unit: RefCell::new(None),
        }
    }

    /// Get access to the arena allocator.
    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    /// Bytes currently allocated in the arena.
    pub fn arena_bytes(&self) -> usize {
        self.arena.allocated_bytes()
    }

    /// Set the compilation unit the next passes belong to.
    pub fn set_current_unit(&self, name: &str) {
        *self.current_unit.borrow_mut() = Some(name.to_string());
    }

    /// Compilation unit currently being processed.
    pub fn current_unit(&self) -> Option<String> {
        self.current_unit.borrow().clone()
    }

    /// Record a finished pass.
    pub fn record_pass(&self, report: PassReport) {
        let unit = self.current_unit.borrow();
        let mut stats = self.stats.borrow_mut();
        stats.passes_run += 1;
        stats.blocks_scheduled += report.blocks;
        stats.edges += report.edges;
        stats.traces_built += report.traces;
        stats.single_block_traces += report.single_block_traces;
        stats.side_entry_traces += report.side_entry_traces;
        stats.stale_pops += report.stale_pops;
        stats.released_seeds += report.released_seeds;
        stats.total_time += report.elapsed;
        stats.peak_arena_bytes = stats.peak_arena_bytes.max(report.arena_bytes);

        if stats.longest_trace < report.longest_trace {
            stats.longest_trace = report.longest_trace;
            stats.longest_trace_unit = (*unit).clone().unwrap_or_default();
        }
    }

    /// Get accumulated statistics.
    pub fn stats(&self) -> TraceStats {
        self.stats.borrow().clone()
    }
}

/// Times a pass when the `stats` feature is enabled; zero-cost otherwise.
pub struct PassTimer {
    #[cfg(feature = "stats")]
    start: std::time::Instant,
}

impl PassTimer {
    pub fn start() -> Self {
        Self {
            #[cfg(feature = "stats")]
            start: std::time::Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        #[cfg(feature = "stats")]
        {
            self.start.elapsed()
        }
        #[cfg(not(feature = "stats"))]
        {
            Duration::ZERO
        }
    }
}

/// Trace-building statistics.
#[derive(Debug, Default, Clone)]
pub struct TraceStats {
    /// Number of passes run.
    pub passes_run: usize,

    /// Blocks assigned to traces.
    pub blocks_scheduled: usize,

    /// Successor edges in the processed graphs.
    pub edges: usize,

    /// Traces built.
    pub traces_built: usize,

    /// Traces consisting of one block.
    pub single_block_traces: usize,

    /// Traces entered somewhere other than their head.
    pub side_entry_traces: usize,

    /// Ready-queue pops of blocks already finalized by trace extension.
    pub stale_pops: usize,

    /// Trace seeds released from cycles with pending back edges.
    pub released_seeds: usize,

    /// Longest trace seen.
    pub longest_trace: usize,

    /// Unit containing the longest trace.
    pub longest_trace_unit: String,

    /// Time spent building traces.
    pub total_time: Duration,

    /// Largest arena footprint observed at the end of a pass.
    pub peak_arena_bytes: usize,
}

impl fmt::Display for TraceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trace Builder Statistics:")?;
        writeln!(f, "  Passes run: {}", self.passes_run)?;
        writeln!(f, "  Blocks scheduled: {}", self.blocks_scheduled)?;
        writeln!(f, "  Edges: {}", self.edges)?;
        writeln!(f, "  Traces built: {}", self.traces_built)?;
        writeln!(f, "  Single-block traces: {}", self.single_block_traces)?;
        writeln!(f, "  Traces with side entries: {}", self.side_entry_traces)?;
        writeln!(f, "  Stale ready pops: {}", self.stale_pops)?;
        writeln!(f, "  Released seeds: {}", self.released_seeds)?;
        writeln!(f, "  Time: {:?}", self.total_time)?;
        writeln!(f, "  Peak arena usage: {} bytes", self.peak_arena_bytes)?;

        if self.longest_trace > 0 {
            if self.longest_trace_unit.is_empty() {
                writeln!(f, "  Longest trace: {} blocks", self.longest_trace)?;
            } else {
                writeln!(
                    f,
                    "  Longest trace: {} blocks (in {})",
                    self.longest_trace, self.longest_trace_unit
                )?;
            }
        }

        Ok(())
    }
}
