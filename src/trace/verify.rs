//! Invariant checks for a finished partition.
//!
//! Runs after trace building in debug builds and with the `verify` feature.
//! A failure means the trace builder is broken, never that the input was bad:
//! input problems are rejected before building starts.

use super::result::TraceBuilderResult;
use crate::core::{BlockId, CfgAdaptor, TraceError, TraceResult};

/// Check that `result` is a valid partition of `graph`:
/// - every block is in exactly one trace and no trace is empty;
/// - each block's recorded trace and position point back at it;
/// - consecutive blocks in a trace are joined by a control-flow edge.
pub fn verify<G: CfgAdaptor>(graph: &G, result: &TraceBuilderResult) -> TraceResult<()> {
    verify_all_blocks_scheduled(graph, result)?;
    verify_mapping(result)?;
    verify_trace_edges(graph, result)
}

fn verify_all_blocks_scheduled<G: CfgAdaptor>(
    graph: &G,
    result: &TraceBuilderResult,
) -> TraceResult<()> {
    let expected = graph.block_count();
    let mut handled: Vec<Option<usize>> = vec![None; expected];
    let mut covered = 0;

    for (trace_idx, trace) in result.traces().iter().enumerate() {
        if trace.is_empty() {
            return Err(TraceError::EmptyTrace { trace: trace_idx });
        }
        for &block in trace {
            let slot = handled
                .get_mut(block.index())
                .ok_or(TraceError::IncompleteCoverage { covered, expected })?;
            if let Some(first_trace) = *slot {
                return Err(TraceError::DuplicateBlock {
                    block,
                    first_trace,
                    second_trace: trace_idx,
                });
            }
            *slot = Some(trace_idx);
            covered += 1;
        }
    }

    if covered != expected || result.block_count() != expected {
        return Err(TraceError::IncompleteCoverage { covered, expected });
    }
    Ok(())
}

fn verify_mapping(result: &TraceBuilderResult) -> TraceResult<()> {
    for (trace_idx, trace) in result.traces().iter().enumerate() {
        for (pos, &block) in trace.iter().enumerate() {
            let found_trace = result.trace_for_block(block);
            let found_position = result.position_in_trace(block);
            if found_trace != trace_idx || found_position != pos {
                return Err(TraceError::MappingMismatch {
                    block,
                    trace: trace_idx,
                    position: pos,
                    found_trace,
                    found_position,
                });
            }
        }
    }
    Ok(())
}

fn verify_trace_edges<G: CfgAdaptor>(graph: &G, result: &TraceBuilderResult) -> TraceResult<()> {
    for (trace_idx, trace) in result.traces().iter().enumerate() {
        let mut last: Option<BlockId> = None;
        for &current in trace {
            if let Some(prev) = last {
                if !graph.block_preds(current).contains(&prev) {
                    return Err(TraceError::BrokenTraceEdge {
                        trace: trace_idx,
                        prev,
                        block: current,
                    });
                }
            }
            last = Some(current);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::ControlFlowGraph;

    fn chain() -> ControlFlowGraph {
        ControlFlowGraph::from_edges(&[1.0, 1.0, 1.0], &[(0, 1), (1, 2)])
    }

    /// Result over the three-block chain with hand-written tables.
    fn partition(
        traces: &[&[u32]],
        block_to_trace: &[u32],
        positions: &[u32],
    ) -> TraceBuilderResult {
        let traces: Vec<Vec<BlockId>> = traces
            .iter()
            .map(|trace| trace.iter().copied().map(BlockId).collect())
            .collect();
        TraceBuilderResult::new(
            &chain(),
            traces,
            block_to_trace.to_vec(),
            positions.to_vec(),
        )
    }

    #[test]
    fn test_accepts_valid_partition() {
        let result = partition(&[&[0, 1], &[2]], &[0, 0, 1], &[0, 1, 0]);
        assert_eq!(verify(&chain(), &result), Ok(()));
    }

    #[test]
    fn test_rejects_missing_block() {
        let result = partition(&[&[0, 1]], &[0, 0, 0], &[0, 1, 0]);
        let expected = TraceError::IncompleteCoverage {
            covered: 2,
            expected: 3,
        };
        assert_eq!(verify(&chain(), &result), Err(expected));
    }

    #[test]
    fn test_rejects_duplicate_block() {
        let result = partition(&[&[0, 1], &[1, 2]], &[0, 1, 1], &[0, 0, 1]);
        let expected = TraceError::DuplicateBlock {
            block: BlockId(1),
            first_trace: 0,
            second_trace: 1,
        };
        assert_eq!(verify(&chain(), &result), Err(expected));
    }

    #[test]
    fn test_rejects_non_edge_neighbors() {
        let result = partition(&[&[0, 2], &[1]], &[0, 1, 0], &[0, 0, 1]);
        let expected = TraceError::BrokenTraceEdge {
            trace: 0,
            prev: BlockId(0),
            block: BlockId(2),
        };
        assert_eq!(verify(&chain(), &result), Err(expected));
    }

    #[test]
    fn test_rejects_bad_position() {
        let result = partition(&[&[0, 1, 2]], &[0, 0, 0], &[0, 2, 1]);
        let err = verify(&chain(), &result).unwrap_err();
        assert!(err.is_invariant_violation());
        let TraceError::MappingMismatch { block, .. } = &err else {
            panic!("expected a mapping mismatch, got {err:?}");
        };
        assert_eq!(*block, BlockId(1));
    }

    #[test]
    fn test_rejects_empty_trace() {
        let result = partition(&[&[0, 1, 2], &[]], &[0, 0, 0], &[0, 1, 2]);
        let expected = TraceError::EmptyTrace { trace: 1 };
        assert_eq!(verify(&chain(), &result), Err(expected));
    }
}
