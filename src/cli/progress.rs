// src/cli/progress.rs — Terminal progress renderer for real-time run feedback

use crate::core::types::ProgressEvent;

/// Build a progress callback that writes formatted output to stderr.
///
/// All progress output goes to stderr so stdout remains clean for the
/// refined prompt. Suitable for `SelfRefine::with_progress()` and
/// `ProgressiveEnhancer::with_progress()`.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + 'static {
    move |event| eprintln!("{}", format_event(&event))
}

pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::IterationStart {
            iteration,
            max_iterations,
        } => format!("[iter {iteration}/{max_iterations}] critiquing..."),
        ProgressEvent::IterationEnd {
            iteration,
            score,
            gain,
            stop,
        } => {
            let next = stop.map(|r| r.as_str()).unwrap_or("improve");
            format!("[iter {iteration}] score={score:.1} ({gain:+.1}) -> {next}")
        }
        ProgressEvent::LayerEnd {
            layer,
            priority,
            outcome,
        } => format!("[layer {priority}] {layer:<26} {outcome}"),
        ProgressEvent::OracleFailure { message } => format!("[oracle] {message}"),
        ProgressEvent::Complete {
            summary,
            oracle_calls,
            max_oracle_calls,
        } => format!("[done] {summary} (calls {oracle_calls}/{max_oracle_calls})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{LayerOutcome, StopReason};
    use std::sync::{Arc, Mutex};

    /// Helper that captures progress output into a Vec instead of stderr.
    fn capturing_progress() -> (
        impl Fn(ProgressEvent) + Send + 'static,
        Arc<Mutex<Vec<String>>>,
    ) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        let cb = move |event: ProgressEvent| {
            log_clone.lock().unwrap().push(format_event(&event));
        };
        (cb, log)
    }

    #[test]
    fn test_iteration_start_format() {
        let (cb, log) = capturing_progress();
        cb(ProgressEvent::IterationStart {
            iteration: 1,
            max_iterations: 3,
        });
        let msgs = log.lock().unwrap();
        assert_eq!(msgs[0], "[iter 1/3] critiquing...");
    }

    #[test]
    fn test_iteration_end_format() {
        let (cb, log) = capturing_progress();
        cb(ProgressEvent::IterationEnd {
            iteration: 2,
            score: 7.26,
            gain: 0.5,
            stop: None,
        });
        cb(ProgressEvent::IterationEnd {
            iteration: 3,
            score: 8.1,
            gain: 0.85,
            stop: Some(StopReason::QualityAchieved),
        });
        let msgs = log.lock().unwrap();
        assert_eq!(msgs[0], "[iter 2] score=7.3 (+0.5) -> improve");
        assert!(msgs[1].ends_with("-> quality_achieved"));
    }

    #[test]
    fn test_layer_end_format() {
        let (cb, log) = capturing_progress();
        cb(ProgressEvent::LayerEnd {
            layer: "examples_patterns".into(),
            priority: 3,
            outcome: LayerOutcome::Skipped {
                reason: "already_has_examples".into(),
            },
        });
        let msgs = log.lock().unwrap();
        assert!(msgs[0].starts_with("[layer 3] examples_patterns"));
        assert!(msgs[0].ends_with("skipped (already_has_examples)"));
    }

    #[test]
    fn test_oracle_failure_format() {
        let (cb, log) = capturing_progress();
        cb(ProgressEvent::OracleFailure {
            message: "oracle claude-cli unavailable: exit 1".into(),
        });
        let msgs = log.lock().unwrap();
        assert_eq!(msgs[0], "[oracle] oracle claude-cli unavailable: exit 1");
    }

    #[test]
    fn test_complete_format() {
        let (cb, log) = capturing_progress();
        cb(ProgressEvent::Complete {
            summary: "quality_achieved after 2 iteration(s), gain +1.5".into(),
            oracle_calls: 3,
            max_oracle_calls: 8,
        });
        let msgs = log.lock().unwrap();
        assert!(msgs[0].starts_with("[done] quality_achieved"));
        assert!(msgs[0].ends_with("(calls 3/8)"));
    }

    #[test]
    fn test_full_lifecycle_sequence() {
        let (cb, log) = capturing_progress();
        cb(ProgressEvent::IterationStart {
            iteration: 1,
            max_iterations: 3,
        });
        cb(ProgressEvent::IterationEnd {
            iteration: 1,
            score: 6.0,
            gain: 1.2,
            stop: None,
        });
        cb(ProgressEvent::IterationStart {
            iteration: 2,
            max_iterations: 3,
        });
        cb(ProgressEvent::IterationEnd {
            iteration: 2,
            score: 8.4,
            gain: 2.4,
            stop: Some(StopReason::QualityAchieved),
        });
        cb(ProgressEvent::Complete {
            summary: "done".into(),
            oracle_calls: 3,
            max_oracle_calls: 8,
        });

        let msgs = log.lock().unwrap();
        assert_eq!(msgs.len(), 5);
        assert!(msgs[0].starts_with("[iter 1/3]"));
        assert!(msgs[1].contains("improve"));
        assert!(msgs[2].starts_with("[iter 2/3]"));
        assert!(msgs[3].contains("quality_achieved"));
        assert!(msgs[4].starts_with("[done]"));
    }
}
