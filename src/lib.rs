//! TPDE trace builder.
//!
//! Partitions the basic blocks of a control-flow graph into traces, ordered
//! sequences of blocks expected to execute consecutively, for TPDE's
//! trace-based register allocator. Within a trace the allocator treats code
//! as straight-line; edges between traces need explicit resolution.
//!
//! # Primary Usage
//!
//! ```ignore
//! use bumpalo::Bump;
//! use tpde_trace::{compute_traces, ControlFlowGraph, TraceBuilderConfig, TraceSession};
//!
//! let cfg = ControlFlowGraph::parse(text)?;
//! let arena = Bump::new();
//! let session = TraceSession::new(&arena);
//! let result = compute_traces(&cfg, &session, TraceBuilderConfig::default())?;
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Graph adaptor, session, configuration, errors
//! - [`trace`] - Ready set, builder, result queries, verifier
//! - [`cfg`] - Owned CFG and its textual format

pub mod cfg;
pub mod core;
pub mod trace;

pub use self::core::{
    BlockId, CfgAdaptor, CfgParseError, TraceBuilderConfig, TraceError, TraceResult,
    TraceSession, TraceStats,
};
pub use cfg::ControlFlowGraph;
pub use trace::{compute_traces, verify, TraceBuilderResult};
