use thiserror::Error;

/// Failures raised by the event pipeline.
///
/// Structural failures (bad range, broken wallet source, rejected query)
/// propagate to the caller. `TimestampLookup` is the only variant that is
/// recovered locally: the resolver logs it and records timestamp 0.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid block range: from {from} to {to} (max span {max_span})")]
    InvalidRange { from: u64, to: u64, max_span: u64 },

    #[error("wallet source '{url}' failed: {reason}")]
    SourceFetch { url: String, reason: String },

    #[error("timestamp lookup failed for block {block}: {reason}")]
    TimestampLookup { block: u64, reason: String },

    #[error("batch item {index} ({item}) failed: {reason}")]
    BatchItem {
        index: usize,
        item: String,
        reason: String,
    },

    #[error("failed to decode {kind} log: {reason}")]
    Decode { kind: &'static str, reason: String },

    #[error("fetch cycle aborted during {stage}: {reason}")]
    CycleAbort { stage: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("log rejected by the classifier: {0}")]
    Unclassifiable(String),
}

impl PipelineError {
    /// Wrap any failure as a cycle abort for the given stage.
    pub fn abort(stage: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::CycleAbort {
            stage: stage.into(),
            reason: err.to_string(),
        }
    }

    /// Failures a later attempt could plausibly fix.
    ///
    /// A log the classifier rejects comes back unchanged on the next fetch,
    /// so it is permanent like a bad range or a bad config.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            Self::InvalidRange { .. }
                | Self::Config(_)
                | Self::InvalidAmount { .. }
                | Self::Unclassifiable(_)
        )
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classes() {
        assert!(PipelineError::abort("transfer logs", "connection reset").is_transient());
        assert!(PipelineError::SourceFetch {
            url: "https://wallets.example".into(),
            reason: "HTTP 502".into(),
        }
        .is_transient());

        assert!(!PipelineError::Unclassifiable("unknown transferType 7".into()).is_transient());
        assert!(!PipelineError::Config("RPC URL is not set".into()).is_transient());
        assert!(!PipelineError::InvalidRange {
            from: 5,
            to: 1,
            max_span: 10,
        }
        .is_transient());
    }
}
