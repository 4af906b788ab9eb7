//! Trace builder configuration.
//!
//! Controls the debug-only layer of the pass. Verification defaults to on in
//! debug builds and whenever the `verify` feature is enabled, so release
//! builds skip it unless asked for.

/// Options for a trace-building pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceBuilderConfig {
    /// Run the verifier on the finished partition.
    pub verify: bool,
    /// Check the adaptor's contract (ranges, edge consistency, probabilities)
    /// before building.
    pub validate_input: bool,
    /// Log the trace listing at debug level once the pass finishes.
    pub log_traces: bool,
}

impl TraceBuilderConfig {
    /// Verification on in debug builds or with the `verify` feature.
    pub const fn new() -> Self {
        Self {
            verify: cfg!(any(debug_assertions, feature = "verify")),
            validate_input: true,
            log_traces: true,
        }
    }

    /// Every check enabled regardless of build profile.
    pub const fn checked() -> Self {
        Self {
            verify: true,
            validate_input: true,
            log_traces: true,
        }
    }

    pub const fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub const fn with_validate_input(mut self, validate_input: bool) -> Self {
        self.validate_input = validate_input;
        self
    }

    pub const fn with_log_traces(mut self, log_traces: bool) -> Self {
        self.log_traces = log_traces;
        self
    }
}

impl Default for TraceBuilderConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_follows_build_profile() {
        let config = TraceBuilderConfig::default();
        assert_eq!(config.verify, cfg!(any(debug_assertions, feature = "verify")));
        assert!(config.validate_input);
    }

    #[test]
    fn test_setters() {
        let config = TraceBuilderConfig::checked()
            .with_verify(false)
            .with_validate_input(false)
            .with_log_traces(false);
        assert!(!config.verify);
        assert!(!config.validate_input);
        assert!(!config.log_traces);
    }
}
