//! Per-run mutable state.

use kahuna_protocol::RunState;
use tokio::time::Instant;

/// Pause bookkeeping across one run.
#[derive(Debug, Default)]
pub struct PauseAccounting {
    /// How many pause prompts the run has seen.
    pub count: u32,
    last_pause_at: Option<Instant>,
    /// Interval between the two most recent pauses.
    pub last_interval: Option<std::time::Duration>,
}

impl PauseAccounting {
    /// Records one pause at `now`.
    pub fn record_pause(&mut self, now: Instant) {
        if let Some(previous) = self.last_pause_at {
            self.last_interval = Some(now - previous);
        }
        self.count += 1;
        self.last_pause_at = Some(now);
    }
}

/// State the control loop carries for one submitted run.
#[derive(Debug)]
pub struct RunContext {
    /// The design the run was submitted with.
    pub design_id: i64,
    /// Most recent observable state. Never `Timeout`.
    pub last_state: RunState,
    /// Consecutive problem pauses since the last nominal observation.
    pub consecutive_problems: u32,
    /// Whether an abort was observed on this run.
    pub was_aborted: bool,
    /// Pause bookkeeping.
    pub pauses: PauseAccounting,
    /// Highest map index reported so far.
    pub last_map: u32,
}

impl RunContext {
    /// Creates context for a freshly submitted run.
    #[must_use]
    pub fn new(design_id: i64, initial: RunState) -> Self {
        debug_assert!(initial.is_observable());
        Self {
            design_id,
            last_state: initial,
            consecutive_problems: 0,
            was_aborted: false,
            pauses: PauseAccounting::default(),
            last_map: 0,
        }
    }

    /// Updates the last-known state from a classification.
    ///
    /// Only observable states are stored; the wait-loop sentinel is a
    /// statement about a wait, not about the instrument.
    pub fn observe(&mut self, state: RunState) {
        debug_assert!(state.is_observable());
        if state.is_observable() {
            self.last_state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn sentinel_never_becomes_last_state() {
        let mut ctx = RunContext::new(7, RunState::Stopped);
        ctx.observe(RunState::Running);
        assert_eq!(ctx.last_state, RunState::Running);

        // debug_assert fires in debug builds; release behavior is to
        // keep the previous state.
        if !cfg!(debug_assertions) {
            ctx.observe(RunState::Timeout);
            assert_eq!(ctx.last_state, RunState::Running);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pause_intervals_are_tracked() {
        let mut pauses = PauseAccounting::default();
        pauses.record_pause(Instant::now());
        assert_eq!(pauses.count, 1);
        assert_eq!(pauses.last_interval, None);

        tokio::time::sleep(Duration::from_secs(90)).await;
        pauses.record_pause(Instant::now());
        assert_eq!(pauses.count, 2);
        assert_eq!(pauses.last_interval, Some(Duration::from_secs(90)));
    }
}
