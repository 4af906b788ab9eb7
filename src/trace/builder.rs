// This module implements the trace builder pass. It partitions the blocks of a CFG into
// traces: sequences of blocks expected to execute one after another, which the trace
// register allocator then treats as straight-line code. The pass is greedy and uses two
// different orderings. A global ready queue, ordered by block probability, picks the seed
// of each new trace among blocks whose predecessors are all finalized. A trace is then
// extended locally by always following the hottest successor that is not finalized yet,
// whether or not that successor is ready; this is what lets loop headers and merge points
// be absorbed into the trace that reaches them first. Every finalized block decrements the
// pending counts of its unfinalized successors, so colder continuations become seeds of
// later traces once ready. A loop entered at a block the extension passed over never
// becomes ready, because its back edges are never finalized first; when the ready queue
// is empty the hottest such block is released as a seed so every reachable block ends
// up in a trace. Each block is finalized exactly once and every edge is looked at a
// bounded number of times.

//! Trace construction.

use super::ready::ReadySet;
use super::result::TraceBuilderResult;
use super::verify;
use crate::core::{
    label, BlockId, CfgAdaptor, PassReport, PassTimer, TraceBuilderConfig, TraceError,
    TraceResult, TraceSession,
};
use bumpalo::collections::Vec as BumpVec;

/// Build traces of sequentially executed blocks.
///
/// Validates the graph (unless disabled in `config`), runs the pass, checks
/// the result with the verifier when `config.verify` is set, and reports
/// statistics to `session`.
pub fn compute_traces<G: CfgAdaptor>(
    graph: &G,
    session: &TraceSession<'_>,
    config: TraceBuilderConfig,
) -> TraceResult<TraceBuilderResult> {
    let timer = PassTimer::start();
    let entry = graph.entry_block();
    log::debug!("start trace building: {}", label(graph, entry));

    if config.validate_input {
        validate_graph(graph)?;
    } else if graph.block_count() == 0 {
        return Err(TraceError::EmptyGraph);
    }

    let mut builder = TraceBuilder::new(graph, session);
    let traces = builder.build_traces(entry)?;
    let stale_pops = builder.stale_pops;
    let released_seeds = builder.released_seeds;
    let result = builder.finish(traces)?;

    if config.verify {
        if let Err(err) = verify::verify(graph, &result) {
            log::error!("trace verification failed: {err}");
            return Err(err);
        }
    }

    if config.log_traces && log::log_enabled!(log::Level::Debug) {
        for line in result.listing(graph).to_string().lines() {
            log::debug!("{line}");
        }
    }

    session.record_pass(PassReport {
        blocks: result.block_count(),
        edges: graph.edge_count(),
        traces: result.trace_count(),
        single_block_traces: result.traces().iter().filter(|t| t.len() == 1).count(),
        longest_trace: result.traces().iter().map(Vec::len).max().unwrap_or(0),
        side_entry_traces: (0..result.trace_count())
            .filter(|&t| result.incoming_side_edges(t))
            .count(),
        stale_pops,
        released_seeds,
        elapsed: timer.elapsed(),
        arena_bytes: session.arena_bytes(),
    });

    Ok(result)
}

/// Check the adaptor contract: ids in range, every edge listed the same
/// number of times on both ends, usable probabilities.
pub fn validate_graph<G: CfgAdaptor>(graph: &G) -> TraceResult<()> {
    let block_count = graph.block_count();
    if block_count == 0 {
        return Err(TraceError::EmptyGraph);
    }
    let entry = graph.entry_block();
    if entry.index() >= block_count {
        return Err(TraceError::EntryOutOfRange { entry, block_count });
    }

    let in_range = |from: BlockId, block: BlockId| {
        if block.index() < block_count {
            Ok(())
        } else {
            Err(TraceError::BlockOutOfRange {
                from,
                block,
                block_count,
            })
        }
    };

    for block in graph.blocks() {
        let probability = graph.block_probability(block);
        if !probability.is_finite() || probability < 0.0 {
            return Err(TraceError::InvalidProbability { block, probability });
        }
        let succs = graph.block_succs(block);
        for (idx, &succ) in succs.iter().enumerate() {
            in_range(block, succ)?;
            if succs[..idx].contains(&succ) {
                continue;
            }
            // Pending counts are per edge, so duplicates must match up.
            let succ_count = occurrences(succs, succ);
            let pred_count = occurrences(graph.block_preds(succ), block);
            if pred_count == 0 {
                return Err(TraceError::MissingPredecessor { block, succ });
            }
            if succ_count != pred_count {
                return Err(TraceError::EdgeCountMismatch {
                    from: block,
                    to: succ,
                    succ_count,
                    pred_count,
                });
            }
        }
        for &pred in graph.block_preds(block) {
            in_range(block, pred)?;
            if !graph.block_succs(pred).contains(&block) {
                return Err(TraceError::MissingSuccessor { block, pred });
            }
        }
    }
    Ok(())
}

fn occurrences(list: &[BlockId], block: BlockId) -> usize {
    list.iter().filter(|&&b| b == block).count()
}

/// Why a block starts a new trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seed {
    /// The entry block, seeded without waiting for back-edge predecessors.
    Entry,
    /// All predecessors finalized.
    Ready,
    /// Released from a cycle whose back edges are still pending.
    Released,
}

/// State of one trace-building pass.
pub struct TraceBuilder<'a, 'arena, G: CfgAdaptor> {
    graph: &'a G,
    worklist: ReadySet<'arena, 'a, G>,
    /// Finalized blocks.
    processed: BumpVec<'arena, bool>,
    block_to_trace: Vec<u32>,
    positions: Vec<u32>,
    /// Ready-queue pops of already finalized blocks.
    stale_pops: usize,
    /// Seeds released while some predecessor was still pending.
    released_seeds: usize,
}

impl<'a, 'arena, G: CfgAdaptor> TraceBuilder<'a, 'arena, G> {
    /// Allocate the transient pass state in the session arena.
    pub fn new(graph: &'a G, session: &TraceSession<'arena>) -> Self {
        let count = graph.block_count();
        let arena = session.arena();
        let mut processed = BumpVec::with_capacity_in(count, arena);
        processed.resize(count, false);

        Self {
            graph,
            worklist: ReadySet::new_in(arena, graph),
            processed,
            block_to_trace: vec![0; count],
            positions: vec![0; count],
            stale_pops: 0,
            released_seeds: 0,
        }
    }

    fn processed(&self, block: BlockId) -> bool {
        self.processed[block.index()]
    }

    /// Run the driving loop from `start_block` until no seed is left.
    pub fn build_traces(&mut self, start_block: BlockId) -> TraceResult<Vec<Vec<BlockId>>> {
        let mut traces = Vec::new();
        self.worklist.mark_ready(start_block)?;

        loop {
            while let Some(block) = self.worklist.pop_highest_probability() {
                if self.processed(block) {
                    self.stale_pops += 1;
                    continue;
                }
                let seed = if block == start_block {
                    Seed::Entry
                } else {
                    Seed::Ready
                };
                let trace = self.start_trace(block, traces.len(), seed)?;
                traces.push(trace);
            }

            let processed = &self.processed;
            match self.worklist.release_blocked(|b| processed[b.index()]) {
                Some(block) => {
                    log::debug!(
                        "releasing {} with {} pending predecessor(s)",
                        label(self.graph, block),
                        self.worklist.pending(block)
                    );
                    self.released_seeds += 1;
                    let trace = self.start_trace(block, traces.len(), Seed::Released)?;
                    traces.push(trace);
                }
                None => break,
            }
        }
        Ok(traces)
    }

    /// Build a new trace starting at `block`.
    fn start_trace(
        &mut self,
        block: BlockId,
        trace_number: usize,
        seed: Seed,
    ) -> TraceResult<Vec<BlockId>> {
        if seed == Seed::Ready {
            self.check_predecessors_processed(block)?;
        }
        log::trace!("StartTrace {trace_number}: {}", label(self.graph, block));

        let mut trace = Vec::new();
        let mut current = Some(block);
        while let Some(block) = current {
            log::trace!(
                "  add {} (prob: {:.6})",
                label(self.graph, block),
                self.graph.block_probability(block)
            );
            self.processed[block.index()] = true;
            self.positions[block.index()] = trace.len() as u32;
            trace.push(block);
            self.block_to_trace[block.index()] = trace_number as u32;
            self.unblock(block)?;
            current = self.select_next(block);
        }
        Ok(trace)
    }

    fn check_predecessors_processed(&self, block: BlockId) -> TraceResult<()> {
        match self
            .graph
            .block_preds(block)
            .iter()
            .find(|&&pred| !self.processed(pred))
        {
            Some(&pred) => Err(TraceError::UnscheduledPredecessor { block, pred }),
            None => Ok(()),
        }
    }

    /// Decrease the pending count of every unfinalized successor; those that
    /// reach zero join the worklist.
    fn unblock(&mut self, block: BlockId) -> TraceResult<()> {
        for &succ in self.graph.block_succs(block) {
            if !self.processed(succ) {
                self.worklist.decrement_and_maybe_ready(succ)?;
            }
        }
        Ok(())
    }

    /// The unfinalized successor with the highest probability; the first one
    /// in successor order wins ties.
    fn select_next(&self, block: BlockId) -> Option<BlockId> {
        let mut next: Option<BlockId> = None;
        for &succ in self.graph.block_succs(block) {
            if self.processed(succ) {
                continue;
            }
            let better = match next {
                None => true,
                Some(best) => {
                    self.graph.block_probability(succ) > self.graph.block_probability(best)
                }
            };
            if better {
                next = Some(succ);
            }
        }
        next
    }

    /// Turn the traces into a result. Blocks the driving loop never reached
    /// are unreachable from the entry.
    pub fn finish(self, traces: Vec<Vec<BlockId>>) -> TraceResult<TraceBuilderResult> {
        let mut unreachable = self
            .processed
            .iter()
            .enumerate()
            .filter(|&(_, &done)| !done)
            .map(|(idx, _)| BlockId::new(idx));
        if let Some(first) = unreachable.next() {
            return Err(TraceError::UnreachableBlocks {
                count: 1 + unreachable.count(),
                first,
            });
        }

        Ok(TraceBuilderResult::new(self.graph, traces, self.block_to_trace, self.positions))
    }
}
