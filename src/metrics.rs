//! Per-turn latency metrics

/// Timing summary for one conversation turn
///
/// Created fresh at turn start, populated as stages complete, and returned to
/// the caller whether the turn finished or failed partway. All values are
/// wall-clock seconds; fields for stages that never ran stay at 0.0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceMetrics {
    /// Time spent in the speech-to-text call
    pub stt_processing_time: f64,

    /// Latency to the first generated token
    ///
    /// Always 0.0: the generation backend is invoked in non-streaming mode,
    /// so no first-token timestamp is observed. Kept as an explicit field
    /// rather than dropped, since a streaming backend would populate it.
    pub llm_first_token_time: f64,

    /// Time for the full language model response
    pub llm_complete_time: f64,

    /// Wall-clock time from turn start to turn end (or failure point)
    pub total_processing_time: f64,
}

impl PerformanceMetrics {
    /// Render the metrics as a human-readable summary block
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Performance Metrics:\n  \
             STT processing time:   {:.2}s\n  \
             LLM complete time:     {:.2}s\n  \
             Total processing time: {:.2}s",
            self.stt_processing_time, self.llm_complete_time, self.total_processing_time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_zero() {
        let metrics = PerformanceMetrics::default();
        assert_eq!(metrics.stt_processing_time, 0.0);
        assert_eq!(metrics.llm_first_token_time, 0.0);
        assert_eq!(metrics.llm_complete_time, 0.0);
        assert_eq!(metrics.total_processing_time, 0.0);
    }

    #[test]
    fn test_summary_formatting() {
        let metrics = PerformanceMetrics {
            stt_processing_time: 1.234,
            llm_first_token_time: 0.0,
            llm_complete_time: 2.5,
            total_processing_time: 4.0,
        };

        let summary = metrics.summary();
        assert!(summary.contains("STT processing time:   1.23s"));
        assert!(summary.contains("LLM complete time:     2.50s"));
        assert!(summary.contains("Total processing time: 4.00s"));
    }
}
