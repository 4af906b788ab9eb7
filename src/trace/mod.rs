// This module groups the trace-building pass: the ready set that tracks pending
// predecessors and orders trace seeds by probability, the builder that grows each trace
// along its hottest unfinalized successor, the result type the register allocator
// queries, and the verifier that checks the partition in debug builds.

//! Trace building for the trace register allocator.
//!
//! ```ignore
//! use bumpalo::Bump;
//! use tpde_trace::{compute_traces, ControlFlowGraph, TraceBuilderConfig, TraceSession};
//!
//! let cfg = ControlFlowGraph::parse("entry: ^a ^b\na 0.9:\nb 0.1:\n")?;
//! let arena = Bump::new();
//! let session = TraceSession::new(&arena);
//! let result = compute_traces(&cfg, &session, TraceBuilderConfig::default())?;
//! for (idx, trace) in result.traces().iter().enumerate() {
//!     println!("{idx}: {trace:?} incoming={}", result.incoming_edges(idx));
//! }
//! ```

pub mod builder;
pub mod ready;
pub mod result;
pub mod verify;

pub use builder::{compute_traces, validate_graph, TraceBuilder};
pub use ready::ReadySet;
pub use result::{TraceBuilderResult, TraceListing};
pub use verify::verify;
