// This module is the hub for the infrastructure shared by the trace builder and its
// drivers: the CfgAdaptor trait through which the pass reads a control-flow graph, the
// arena-backed TraceSession that owns transient pass memory and collects statistics,
// the TraceBuilderConfig that switches the debug-only checks, and the thiserror-based
// error types. Nothing here knows how traces are formed; that lives in the trace module.

//! Core trace-builder infrastructure.
//!
//! # Key Components
//!
//! ## Graph Access (`adaptor`)
//! - Dense [`BlockId`]s usable as array indices
//! - Slice-based predecessor/successor queries
//!
//! ## Session Management (`session`)
//! - Arena allocation of transient pass state using `bumpalo`
//! - Pass statistics and timing
//!
//! ## Configuration (`config`)
//! - Verification and input validation switches

pub mod adaptor;
pub mod config;
pub mod error;
pub mod session;
pub mod test_utils;

pub use adaptor::{label, BlockId, BlockIter, BlockLabel, CfgAdaptor};
pub use config::TraceBuilderConfig;
pub use error::{CfgParseError, TraceError, TraceResult};
pub use session::{PassReport, PassTimer, TraceSession, TraceStats};
