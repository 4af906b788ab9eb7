// This module defines the error types of the trace builder using the thiserror crate.
// TraceError covers the two failure classes of the pass: input contract violations
// (an empty graph, out-of-range block references, predecessor and successor lists
// that disagree on an edge or on how often it occurs, unusable probabilities, blocks
// unreachable from the entry) and internal invariant violations (pending-count
// underflow, double enqueue, seeds with unfinalized predecessors, and every failure
// the verifier detects). Neither class is recoverable: both indicate a bug in an
// earlier pass or in the trace builder itself.
// CfgParseError reports problems in the textual CFG format with line numbers.

//! Error types for trace building.

use super::adaptor::BlockId;
use thiserror::Error;

/// Main error type of the trace-building pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraceError {
    #[error("Control-flow graph has no blocks")]
    EmptyGraph,

    #[error("Entry block {entry} is out of range ({block_count} blocks)")]
    EntryOutOfRange { entry: BlockId, block_count: usize },

    #[error("Block {from} references block {block}, out of range ({block_count} blocks)")]
    BlockOutOfRange {
        from: BlockId,
        block: BlockId,
        block_count: usize,
    },

    #[error(
        "Block {block} lists {succ} as successor, but {succ} does not list {block} as predecessor"
    )]
    MissingPredecessor { block: BlockId, succ: BlockId },

    #[error(
        "Block {block} lists {pred} as predecessor, but {pred} does not list {block} as successor"
    )]
    MissingSuccessor { block: BlockId, pred: BlockId },

    #[error(
        "Edge {from} -> {to} appears {succ_count} time(s) in the successors of {from} \
         but {pred_count} time(s) in the predecessors of {to}"
    )]
    EdgeCountMismatch {
        from: BlockId,
        to: BlockId,
        succ_count: usize,
        pred_count: usize,
    },

    #[error("Block {block} has invalid probability {probability}")]
    InvalidProbability { block: BlockId, probability: f64 },

    #[error("{count} block(s) unreachable from the entry, first is {first}")]
    UnreachableBlocks { count: usize, first: BlockId },

    #[error("Pending predecessor count of block {block} underflowed")]
    PredecessorUnderflow { block: BlockId },

    #[error("Block {block} was queued as ready twice")]
    AlreadyReady { block: BlockId },

    #[error("Trace seed {block} has unscheduled predecessor {pred}")]
    UnscheduledPredecessor { block: BlockId, pred: BlockId },

    #[error("Not all blocks assigned to traces: {covered} of {expected}")]
    IncompleteCoverage { covered: usize, expected: usize },

    #[error("Block {block} appears in trace {first_trace} and trace {second_trace}")]
    DuplicateBlock {
        block: BlockId,
        first_trace: usize,
        second_trace: usize,
    },

    #[error("Trace {trace} is empty")]
    EmptyTrace { trace: usize },

    #[error("Trace {trace}: block {prev} is not a predecessor of following block {block}")]
    BrokenTraceEdge {
        trace: usize,
        prev: BlockId,
        block: BlockId,
    },

    #[error(
        "Block {block} is recorded at trace {trace} position {position}, \
         but found at trace {found_trace} position {found_position}"
    )]
    MappingMismatch {
        block: BlockId,
        trace: usize,
        position: usize,
        found_trace: usize,
        found_position: usize,
    },
}

impl TraceError {
    /// Whether this error signals a defect in the trace builder rather than in
    /// the graph handed to it.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            TraceError::PredecessorUnderflow { .. }
                | TraceError::AlreadyReady { .. }
                | TraceError::UnscheduledPredecessor { .. }
                | TraceError::IncompleteCoverage { .. }
                | TraceError::DuplicateBlock { .. }
                | TraceError::EmptyTrace { .. }
                | TraceError::BrokenTraceEdge { .. }
                | TraceError::MappingMismatch { .. }
        )
    }
}

/// Result type alias for trace-building operations.
pub type TraceResult<T> = Result<T, TraceError>;

/// Errors produced while reading the textual CFG format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CfgParseError {
    #[error("line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error("line {line}: unknown block '^{name}'")]
    UnknownBlock { line: usize, name: String },

    #[error("line {line}: block '{name}' defined twice")]
    DuplicateBlock { line: usize, name: String },

    #[error("line {line}: invalid probability '{text}'")]
    InvalidProbability { line: usize, text: String },

    #[error("no blocks defined")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(!TraceError::EmptyGraph.is_invariant_violation());
        let unreachable = TraceError::UnreachableBlocks {
            count: 1,
            first: BlockId(3),
        };
        assert!(!unreachable.is_invariant_violation());
        let mismatch = TraceError::EdgeCountMismatch {
            from: BlockId(0),
            to: BlockId(2),
            succ_count: 1,
            pred_count: 2,
        };
        assert!(!mismatch.is_invariant_violation());
        let underflow = TraceError::PredecessorUnderflow { block: BlockId(1) };
        assert!(underflow.is_invariant_violation());
        let broken = TraceError::BrokenTraceEdge {
            trace: 0,
            prev: BlockId(0),
            block: BlockId(2),
        };
        assert!(broken.is_invariant_violation());
    }

    #[test]
    fn test_error_messages() {
        let err = TraceError::MissingPredecessor {
            block: BlockId(0),
            succ: BlockId(4),
        };
        assert_eq!(
            err.to_string(),
            "Block 0 lists 4 as successor, but 4 does not list 0 as predecessor"
        );

        let err = TraceError::EdgeCountMismatch {
            from: BlockId(0),
            to: BlockId(2),
            succ_count: 1,
            pred_count: 2,
        };
        assert_eq!(
            err.to_string(),
            "Edge 0 -> 2 appears 1 time(s) in the successors of 0 \
             but 2 time(s) in the predecessors of 2"
        );

        let err = CfgParseError::UnknownBlock {
            line: 3,
            name: "exit".to_string(),
        };
        assert_eq!(err.to_string(), "line 3: unknown block '^exit'");
    }
}
