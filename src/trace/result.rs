// This module defines TraceBuilderResult, the partition handed to the trace-based register
// allocator. It owns the list of traces (indexed by trace number), a block-to-trace map,
// and a block-to-position map giving each block's index inside its trace; positions
// replace the per-block numbering field that older designs mutated on the graph. When the
// result is built it scans every predecessor edge once and records, per trace, how many
// edges enter it from other traces and whether any of them target a block other than the
// head. The allocator's queries (incoming_edges, incoming_side_edges) then answer in O(1).

//! Partition of a CFG into traces.

use crate::core::{label, BlockId, CfgAdaptor};
use std::fmt;

/// Cross-trace edges entering one trace.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct IncomingEdges {
    /// Edges from other traces to any block of the trace.
    total: u32,
    /// Edges from other traces to non-head blocks.
    side: u32,
}

/// Result of trace building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceBuilderResult {
    traces: Vec<Vec<BlockId>>,
    block_to_trace: Vec<u32>,
    positions: Vec<u32>,
    incoming: Vec<IncomingEdges>,
}

impl TraceBuilderResult {
    /// Assemble a result from the builder's output and summarize the edges
    /// that cross trace boundaries.
    pub(crate) fn new<G: CfgAdaptor>(
        graph: &G,
        traces: Vec<Vec<BlockId>>,
        block_to_trace: Vec<u32>,
        positions: Vec<u32>,
    ) -> Self {
        let mut incoming = vec![IncomingEdges::default(); traces.len()];
        for (trace_idx, trace) in traces.iter().enumerate() {
            for (pos, &block) in trace.iter().enumerate() {
                for &pred in graph.block_preds(block) {
                    if block_to_trace[pred.index()] as usize != trace_idx {
                        incoming[trace_idx].total += 1;
                        if pos > 0 {
                            incoming[trace_idx].side += 1;
                        }
                    }
                }
            }
        }

        Self {
            traces,
            block_to_trace,
            positions,
            incoming,
        }
    }

    /// All traces; the index is the trace number.
    pub fn traces(&self) -> &[Vec<BlockId>] {
        &self.traces
    }

    pub fn trace(&self, trace: usize) -> &[BlockId] {
        &self.traces[trace]
    }

    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    /// Number of blocks covered by the partition.
    pub fn block_count(&self) -> usize {
        self.block_to_trace.len()
    }

    /// Trace number of a block.
    ///
    /// # Panics
    ///
    /// Panics if the block does not belong to the partitioned graph.
    pub fn trace_for_block(&self, block: BlockId) -> usize {
        match self.get_trace_for_block(block) {
            Some(trace) => trace,
            None => panic!(
                "block {block} is not part of this partition ({} blocks)",
                self.block_count()
            ),
        }
    }

    pub fn get_trace_for_block(&self, block: BlockId) -> Option<usize> {
        self.block_to_trace.get(block.index()).map(|&t| t as usize)
    }

    /// Index of a block inside its trace, starting at 0 for the head.
    pub fn position_in_trace(&self, block: BlockId) -> usize {
        self.positions[block.index()] as usize
    }

    /// Does any block of the trace have a predecessor in another trace?
    pub fn incoming_edges(&self, trace: usize) -> bool {
        self.incoming[trace].total > 0
    }

    /// Is any block other than the head entered from another trace?
    /// Always false for single-block traces.
    pub fn incoming_side_edges(&self, trace: usize) -> bool {
        self.incoming[trace].side > 0
    }

    /// Number of edges entering the trace from other traces.
    pub fn incoming_edge_count(&self, trace: usize) -> usize {
        self.incoming[trace].total as usize
    }

    /// All blocks, trace by trace, in trace order.
    pub fn linear_order(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.traces.iter().flatten().copied()
    }

    /// Human-readable listing using the graph's block names.
    pub fn listing<'a, G: CfgAdaptor>(&'a self, graph: &'a G) -> TraceListing<'a, G> {
        TraceListing { result: self, graph }
    }
}

/// One line per trace: `Trace     0: [entry, loop, exit]`, followed by
/// `{incoming}` or `{incoming, side}` when other traces branch into it.
pub struct TraceListing<'a, G: CfgAdaptor> {
    result: &'a TraceBuilderResult,
    graph: &'a G,
}

impl<G: CfgAdaptor> fmt::Display for TraceListing<'_, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, trace) in self.result.traces.iter().enumerate() {
            write!(f, "Trace {idx:5}: [")?;
            for (pos, &block) in trace.iter().enumerate() {
                if pos > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", label(self.graph, block))?;
            }
            f.write_str("]")?;
            if self.result.incoming_side_edges(idx) {
                f.write_str(" {incoming, side}")?;
            } else if self.result.incoming_edges(idx) {
                f.write_str(" {incoming}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::ControlFlowGraph;

    fn ids(raw: &[u32]) -> Vec<BlockId> {
        raw.iter().copied().map(BlockId).collect()
    }

    /// Diamond 0 -> {1, 2} -> 3 split as [0, 1, 3] and [2].
    fn diamond_result() -> (ControlFlowGraph, TraceBuilderResult) {
        let cfg = ControlFlowGraph::from_edges(
            &[1.0, 0.9, 0.1, 1.0],
            &[(0, 1), (0, 2), (1, 3), (2, 3)],
        );
        let result = TraceBuilderResult::new(
            &cfg,
            vec![ids(&[0, 1, 3]), ids(&[2])],
            vec![0, 0, 1, 0],
            vec![0, 1, 0, 2],
        );
        (cfg, result)
    }

    #[test]
    fn test_lookups() {
        let (_, result) = diamond_result();
        assert_eq!(result.trace_count(), 2);
        assert_eq!(result.block_count(), 4);
        assert_eq!(result.trace_for_block(BlockId(3)), 0);
        assert_eq!(result.trace_for_block(BlockId(2)), 1);
        assert_eq!(result.position_in_trace(BlockId(3)), 2);
        assert_eq!(result.get_trace_for_block(BlockId(9)), None);
        assert_eq!(result.trace(1), &[BlockId(2)]);
    }

    #[test]
    #[should_panic(expected = "not part of this partition")]
    fn test_foreign_block_panics() {
        let (_, result) = diamond_result();
        result.trace_for_block(BlockId(4));
    }

    #[test]
    fn test_incoming_edge_summaries() {
        let (_, result) = diamond_result();
        // 2 -> 3 enters trace 0 behind its head.
        assert!(result.incoming_edges(0));
        assert!(result.incoming_side_edges(0));
        assert_eq!(result.incoming_edge_count(0), 1);
        // 0 -> 2 enters trace 1 at its only block.
        assert!(result.incoming_edges(1));
        assert!(!result.incoming_side_edges(1));
    }

    #[test]
    fn test_linear_order() {
        let (_, result) = diamond_result();
        let order: Vec<_> = result.linear_order().collect();
        assert_eq!(order, ids(&[0, 1, 3, 2]));
    }

    #[test]
    fn test_listing() {
        let (cfg, result) = diamond_result();
        assert_eq!(
            result.listing(&cfg).to_string(),
            "Trace     0: [B0, B1, B3] {incoming, side}\nTrace     1: [B2] {incoming}\n"
        );
    }
}
