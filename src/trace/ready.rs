// This module implements the readiness tracker of the trace builder. For every block it
// keeps the number of predecessors that have not been finalized yet; once that count
// drops to zero the block is ready and enters a max-priority queue ordered by execution
// probability. The queue decides which block seeds the next trace. Equal probabilities
// are ordered by ascending block id so that the partition is reproducible. A block that
// lost some but not all of its pending predecessors is also remembered in a second heap:
// when a loop is entered at a block the trace extension did not pick, the back edges keep
// its count above zero forever, and the builder releases the hottest such block once the
// ready queue runs dry. Pending counts and the flags live in the session arena; the heaps
// are std BinaryHeaps sized to the block count.

//! Ready-set tracking for trace seeds.

use crate::core::{BlockId, CfgAdaptor, TraceError, TraceResult};
use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Queue entry: hotter first, then lower id first.
#[derive(Debug, Clone, Copy)]
struct ReadyEntry {
    probability: f64,
    block: BlockId,
}

impl Ord for ReadyEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.probability
            .total_cmp(&other.probability)
            .then_with(|| other.block.cmp(&self.block))
    }
}

impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ReadyEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReadyEntry {}

/// Pending-predecessor counts plus the queue of ready blocks.
pub struct ReadySet<'arena, 'g, G: CfgAdaptor> {
    graph: &'g G,
    /// Unfinalized predecessors per block.
    pending: BumpVec<'arena, u32>,
    /// Whether a block has ever been queued.
    queued: BumpVec<'arena, bool>,
    /// Whether a block has been put on the waiting heap.
    waiting: BumpVec<'arena, bool>,
    queue: BinaryHeap<ReadyEntry>,
    /// Blocks with some, but not all, predecessors finalized.
    blocked: BinaryHeap<ReadyEntry>,
}

impl<'arena, 'g, G: CfgAdaptor> ReadySet<'arena, 'g, G> {
    /// Set each block's pending count to its number of predecessors.
    pub fn new_in(arena: &'arena Bump, graph: &'g G) -> Self {
        let count = graph.block_count();
        let mut pending = BumpVec::with_capacity_in(count, arena);
        pending.extend(graph.blocks().map(|b| graph.block_preds(b).len() as u32));
        let mut queued = BumpVec::with_capacity_in(count, arena);
        queued.resize(count, false);
        let mut waiting = BumpVec::with_capacity_in(count, arena);
        waiting.resize(count, false);

        Self {
            graph,
            pending,
            queued,
            waiting,
            queue: BinaryHeap::with_capacity(count),
            blocked: BinaryHeap::new(),
        }
    }

    /// Queue a block as ready. Each block may be queued once per pass.
    pub fn mark_ready(&mut self, block: BlockId) -> TraceResult<()> {
        let queued = &mut self.queued[block.index()];
        if *queued {
            return Err(TraceError::AlreadyReady { block });
        }
        *queued = true;
        self.queue.push(ReadyEntry {
            probability: self.graph.block_probability(block),
            block,
        });
        Ok(())
    }

    /// Remove the hottest ready block.
    pub fn pop_highest_probability(&mut self) -> Option<BlockId> {
        self.queue.pop().map(|entry| entry.block)
    }

    /// One more predecessor of `block` was finalized. Returns whether the
    /// block became ready. The caller guarantees `block` is not finalized.
    pub fn decrement_and_maybe_ready(&mut self, block: BlockId) -> TraceResult<bool> {
        let pending = &mut self.pending[block.index()];
        *pending = pending
            .checked_sub(1)
            .ok_or(TraceError::PredecessorUnderflow { block })?;
        if *pending == 0 {
            self.mark_ready(block)?;
            return Ok(true);
        }
        let waiting = &mut self.waiting[block.index()];
        if !*waiting {
            *waiting = true;
            self.blocked.push(ReadyEntry {
                probability: self.graph.block_probability(block),
                block,
            });
        }
        Ok(false)
    }

    /// The hottest block that has a finalized predecessor but never became
    /// ready, skipping blocks `is_processed` reports as finalized. Only
    /// blocks on a cycle through an unfinalized back edge end up here.
    pub fn release_blocked(&mut self, is_processed: impl Fn(BlockId) -> bool) -> Option<BlockId> {
        while let Some(entry) = self.blocked.pop() {
            if !is_processed(entry.block) && !self.queued[entry.block.index()] {
                self.queued[entry.block.index()] = true;
                return Some(entry.block);
            }
        }
        None
    }

    /// Unfinalized predecessors of a block.
    pub fn pending(&self, block: BlockId) -> u32 {
        self.pending[block.index()]
    }

}
