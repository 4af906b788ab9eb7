// This module defines the CfgAdaptor trait, the bridge between the trace builder and
// whatever control-flow graph representation the host compiler uses. The trace builder
// only needs a handful of queries: the number of blocks, the entry block, ordered
// predecessor and successor lists, and an execution probability per block. Blocks are
// identified by BlockId, a dense index in 0..block_count that the pass uses directly to
// index its per-block arrays. Predecessor and successor lists are returned as slices so
// the hot loops of the pass iterate them without boxing or dynamic dispatch.

//! Control-flow graph adaptor.
//!
//! The adaptor exposes a read-only view of a CFG to the trace builder. The
//! framework assumes:
//! - Block ids are dense: every id in `0..block_count()` names a block.
//! - The predecessor and successor relations agree with each other.
//! - Every block is reachable from the entry block.
//! - Probabilities are finite and non-negative; higher means hotter.
//!
//! These assumptions are checked by the trace builder when input validation
//! is enabled in [`TraceBuilderConfig`](crate::core::TraceBuilderConfig).

use std::fmt;

/// Dense block identifier, usable as an array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Index into per-block arrays.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only view of a control-flow graph.
pub trait CfgAdaptor {
    /// Number of blocks; ids range over `0..block_count()`.
    fn block_count(&self) -> usize;

    /// Block execution starts at.
    fn entry_block(&self) -> BlockId;

    /// Predecessors of a block, in graph order.
    fn block_preds(&self, block: BlockId) -> &[BlockId];

    /// Successors of a block, in graph order.
    fn block_succs(&self, block: BlockId) -> &[BlockId];

    /// Estimated execution probability of a block.
    fn block_probability(&self, block: BlockId) -> f64;

    /// Get the name of a block (for printing).
    fn block_name(&self, _block: BlockId) -> &str {
        ""
    }

    /// Iterator over all block ids.
    fn blocks(&self) -> BlockIter {
        BlockIter {
            next: 0,
            end: self.block_count() as u32,
        }
    }

    /// Total number of successor edges.
    fn edge_count(&self) -> usize {
        self.blocks().map(|b| self.block_succs(b).len()).sum()
    }
}

/// Iterator over `BlockId(0)..BlockId(n)`.
#[derive(Debug, Clone)]
pub struct BlockIter {
    next: u32,
    end: u32,
}

impl Iterator for BlockIter {
    type Item = BlockId;

    fn next(&mut self) -> Option<BlockId> {
        if self.next >= self.end {
            return None;
        }
        let block = BlockId(self.next);
        self.next += 1;
        Some(block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = (self.end - self.next) as usize;
        (len, Some(len))
    }
}

impl ExactSizeIterator for BlockIter {}

/// Display helper printing a block by name, falling back to its id.
pub struct BlockLabel<'a, G: CfgAdaptor + ?Sized> {
    pub graph: &'a G,
    pub block: BlockId,
}

impl<G: CfgAdaptor + ?Sized> fmt::Display for BlockLabel<'_, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.graph.block_name(self.block);
        if name.is_empty() {
            write!(f, "B{}", self.block.0)
        } else {
            f.write_str(name)
        }
    }
}

/// Shorthand for [`BlockLabel`].
pub fn label<G: CfgAdaptor + ?Sized>(graph: &G, block: BlockId) -> BlockLabel<'_, G> {
    BlockLabel { graph, block }
}
