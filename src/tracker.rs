//! Run Tracker
//!
//! Folds the decoded event stream into per-run statistics, the numbers a
//! console renders while a job is running: candidates seen, best and
//! average score, and the terminal outcome. Optionally filters by run
//! token so interleaved feeds do not pollute each other.

use crate::events::{OptimizationResult, ProgressUpdate, StreamEvent};
use serde::Serialize;
use uuid::Uuid;

/// Terminal outcome of a tracked run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RunOutcome {
    Completed,
    Failed { message: String },
}

/// Aggregated statistics over the progress seen so far
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Progress updates received, skipped candidates included
    pub received: u64,
    /// Candidates that were actually scored
    pub evaluated: u64,
    /// Candidates filtered out before scoring
    pub skipped: u64,
    /// Highest score among evaluated candidates
    pub best_score: Option<f32>,
    /// Mean score among evaluated candidates
    pub avg_score: Option<f32>,
    /// Highest iteration index seen
    pub last_iteration: Option<u32>,
}

/// Event-stream fold for one run
#[derive(Debug, Default)]
pub struct RunTracker {
    run_id: Option<Uuid>,
    stats: RunStats,
    score_sum: f64,
    best: Option<ProgressUpdate>,
    result: Option<OptimizationResult>,
    outcome: Option<RunOutcome>,
}

impl RunTracker {
    /// Track every event on the feed
    pub fn new() -> Self {
        Self::default()
    }

    /// Track only events carrying this run token. Events without any
    /// token are still accepted; not every feed echoes it.
    pub fn for_run(run_id: Uuid) -> Self {
        Self {
            run_id: Some(run_id),
            ..Self::default()
        }
    }

    /// Fold one event in. Returns false when the event belongs to a
    /// different run and was ignored.
    pub fn observe(&mut self, event: &StreamEvent) -> bool {
        if let (Some(bound), Some(seen)) = (self.run_id, event.run_id()) {
            if bound != seen {
                log::debug!("Ignoring event for foreign run {}", seen);
                return false;
            }
        }
        match event {
            StreamEvent::Progress { data } => self.observe_progress(data),
            StreamEvent::Result { data } => {
                self.outcome = Some(if data.success {
                    RunOutcome::Completed
                } else {
                    RunOutcome::Failed {
                        message: data
                            .message
                            .clone()
                            .unwrap_or_else(|| "run failed".to_string()),
                    }
                });
                self.result = Some(data.clone());
            }
            StreamEvent::Error { message } => {
                self.outcome = Some(RunOutcome::Failed {
                    message: message.clone(),
                });
            }
        }
        true
    }

    fn observe_progress(&mut self, update: &ProgressUpdate) {
        self.stats.received += 1;
        self.stats.last_iteration = Some(
            self.stats
                .last_iteration
                .map_or(update.iteration, |last| last.max(update.iteration)),
        );
        if update.is_skipped() {
            self.stats.skipped += 1;
            return;
        }
        self.stats.evaluated += 1;
        self.score_sum += update.score as f64;
        self.stats.avg_score = Some((self.score_sum / self.stats.evaluated as f64) as f32);
        let improved = self.stats.best_score.map_or(true, |best| update.score > best);
        if improved {
            self.stats.best_score = Some(update.score);
            self.best = Some(update.clone());
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Best-scoring candidate so far
    pub fn best(&self) -> Option<&ProgressUpdate> {
        self.best.as_ref()
    }

    /// Final result payload, once one arrived
    pub fn result(&self) -> Option<&OptimizationResult> {
        self.result.as_ref()
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(iteration: u32, score: f32) -> StreamEvent {
        StreamEvent::Progress {
            data: ProgressUpdate {
                iteration,
                candidate_index: 0,
                candidate: format!("candidate {}", iteration),
                score,
                prompt_safe_score: 0.5,
                ..Default::default()
            },
        }
    }

    fn skipped(iteration: u32, reason: &str) -> StreamEvent {
        StreamEvent::Progress {
            data: ProgressUpdate {
                iteration,
                skipped: Some(reason.to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_progress_aggregation() {
        let mut tracker = RunTracker::new();
        for event in [progress(0, 0.2), progress(1, 0.8), progress(2, 0.5)] {
            assert!(tracker.observe(&event));
        }

        let stats = tracker.stats();
        assert_eq!(stats.received, 3);
        assert_eq!(stats.evaluated, 3);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.best_score, Some(0.8));
        assert!((stats.avg_score.unwrap() - 0.5).abs() < 1e-6);
        assert_eq!(stats.last_iteration, Some(2));
        assert_eq!(tracker.best().unwrap().candidate, "candidate 1");
        assert!(!tracker.is_finished());
    }

    #[test]
    fn test_skipped_candidates_do_not_enter_score_aggregates() {
        let mut tracker = RunTracker::new();
        tracker.observe(&progress(0, 0.4));
        tracker.observe(&skipped(1, "prompt rejected by filter"));
        tracker.observe(&progress(2, 0.6));

        let stats = tracker.stats();
        assert_eq!(stats.received, 3);
        assert_eq!(stats.evaluated, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.best_score, Some(0.6));
        assert!((stats.avg_score.unwrap() - 0.5).abs() < 1e-6);
        assert_eq!(stats.last_iteration, Some(2));
    }

    #[test]
    fn test_fresh_tracker_has_empty_stats() {
        let tracker = RunTracker::new();
        let stats = tracker.stats();
        assert_eq!(stats.received, 0);
        assert_eq!(stats.best_score, None);
        assert_eq!(stats.avg_score, None);
        assert_eq!(stats.last_iteration, None);
        assert!(tracker.best().is_none());
        assert!(tracker.outcome().is_none());
    }

    #[test]
    fn test_successful_result_completes_the_run() {
        let mut tracker = RunTracker::new();
        tracker.observe(&progress(0, 0.9));
        tracker.observe(&StreamEvent::Result {
            data: OptimizationResult {
                success: true,
                jailbreak_prompt: Some("winning candidate".to_string()),
                iterations: 4,
                score: Some(0.92),
                ..Default::default()
            },
        });

        assert!(tracker.is_finished());
        assert_eq!(tracker.outcome(), Some(&RunOutcome::Completed));
        assert_eq!(tracker.result().unwrap().iterations, 4);
    }

    #[test]
    fn test_failed_result_carries_its_message() {
        let mut tracker = RunTracker::new();
        tracker.observe(&StreamEvent::Result {
            data: OptimizationResult {
                success: false,
                iterations: 20,
                message: Some("max iterations reached".to_string()),
                best_score: Some(0.61),
                ..Default::default()
            },
        });

        assert_eq!(
            tracker.outcome(),
            Some(&RunOutcome::Failed {
                message: "max iterations reached".to_string()
            })
        );
    }

    #[test]
    fn test_error_event_fails_the_run() {
        let mut tracker = RunTracker::new();
        tracker.observe(&StreamEvent::Error {
            message: "model unavailable".to_string(),
        });

        assert!(tracker.is_finished());
        assert_eq!(
            tracker.outcome(),
            Some(&RunOutcome::Failed {
                message: "model unavailable".to_string()
            })
        );
    }

    #[test]
    fn test_bound_tracker_filters_foreign_runs() {
        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut tracker = RunTracker::for_run(mine);

        let mut foreign = progress(0, 0.9);
        if let StreamEvent::Progress { data } = &mut foreign {
            data.run_id = Some(other);
        }
        assert!(!tracker.observe(&foreign));
        assert_eq!(tracker.stats().received, 0);

        let mut matching = progress(1, 0.3);
        if let StreamEvent::Progress { data } = &mut matching {
            data.run_id = Some(mine);
        }
        assert!(tracker.observe(&matching));

        // Token-less events are accepted for compatibility
        assert!(tracker.observe(&progress(2, 0.4)));
        assert_eq!(tracker.stats().received, 2);
    }
}
