//! Timing engine: a free-running stopwatch and a work/rest interval timer.
//!
//! Both are plain state machines advanced by [`Ticking::tick`]. Scheduling the
//! ticks is the job of [`crate::ticker::TimerController`].

use crate::clock::SharedClock;
use crate::types::TimerTemplate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A timer driven by periodic ticks
pub trait Ticking: Send + 'static {
    /// What observers see after each change
    type Snapshot: Clone + Send + Sync + 'static;

    /// Period between ticks while running
    fn period(&self) -> Duration;

    /// Advance by one tick. Ignored unless running.
    fn tick(&mut self);

    /// Start or pause
    fn toggle(&mut self);

    /// Stop and return to the initial state
    fn reset(&mut self);

    fn is_running(&self) -> bool;

    fn snapshot(&self) -> Self::Snapshot;
}

// ============================================================================
// Interval mode
// ============================================================================

/// Work/rest/rounds configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalConfig {
    pub work_seconds: u32,
    /// 0 means rounds follow each other with no rest phase
    pub rest_seconds: u32,
    pub rounds: u32,
}

impl IntervalConfig {
    pub fn new(work_seconds: u32, rest_seconds: u32, rounds: u32) -> Self {
        Self {
            work_seconds,
            rest_seconds,
            rounds,
        }
    }

    /// Total length of a full run, in seconds
    pub fn total_seconds(&self) -> u64 {
        let rounds = u64::from(self.rounds);
        rounds * u64::from(self.work_seconds) + rounds * u64::from(self.rest_seconds)
    }
}

impl From<&TimerTemplate> for IntervalConfig {
    fn from(t: &TimerTemplate) -> Self {
        Self::new(t.work, t.rest, t.rounds)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    Rest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntervalState {
    pub phase: Phase,
    /// 1-indexed
    pub round: u32,
    pub seconds_remaining: u32,
    pub running: bool,
    pub finished: bool,
}

impl IntervalState {
    fn initial(config: &IntervalConfig) -> Self {
        Self {
            phase: Phase::Work,
            round: 1,
            seconds_remaining: config.work_seconds,
            running: false,
            finished: false,
        }
    }
}

/// What the interval timer publishes after each change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntervalSnapshot {
    pub config: IntervalConfig,
    pub state: IntervalState,
}

/// Counts down work and rest phases for a number of rounds.
///
/// Each tick counts as one second of the countdown; the tick period is one
/// second unless overridden with [`IntervalTimer::with_period`].
#[derive(Clone, Debug)]
pub struct IntervalTimer {
    config: IntervalConfig,
    state: IntervalState,
    period: Duration,
}

impl IntervalTimer {
    pub fn new(config: IntervalConfig) -> Self {
        Self::with_period(config, Duration::from_secs(1))
    }

    /// An interval timer ticking every `period` instead of every second
    pub fn with_period(config: IntervalConfig, period: Duration) -> Self {
        Self {
            state: IntervalState::initial(&config),
            config,
            period,
        }
    }

    pub fn config(&self) -> IntervalConfig {
        self.config
    }

    pub fn state(&self) -> IntervalState {
        self.state
    }

    /// Swap configuration and reset. Cancelling a running scheduler is up to
    /// the owner, see [`crate::ticker::TimerController::reconfigure`].
    pub fn reconfigure(&mut self, config: IntervalConfig) {
        self.config = config;
        self.reset();
    }

    /// Called when `seconds_remaining` hits zero
    fn end_of_phase(&mut self) {
        let more_rounds = self.state.round < self.config.rounds;
        match self.state.phase {
            Phase::Work if self.config.rest_seconds > 0 => {
                self.state.phase = Phase::Rest;
                self.state.seconds_remaining = self.config.rest_seconds;
            }
            Phase::Work | Phase::Rest if more_rounds => {
                self.state.phase = Phase::Work;
                self.state.round += 1;
                self.state.seconds_remaining = self.config.work_seconds;
            }
            Phase::Work | Phase::Rest => {
                self.state.finished = true;
                self.state.running = false;
                self.state.seconds_remaining = 0;
            }
        }
        tracing::debug!(
            "Interval phase change: {:?} round {} ({}s)",
            self.state.phase,
            self.state.round,
            self.state.seconds_remaining
        );
    }
}

impl Ticking for IntervalTimer {
    type Snapshot = IntervalSnapshot;

    fn period(&self) -> Duration {
        self.period
    }

    fn tick(&mut self) {
        if !self.state.running || self.state.finished {
            return;
        }
        self.state.seconds_remaining = self.state.seconds_remaining.saturating_sub(1);
        if self.state.seconds_remaining == 0 {
            self.end_of_phase();
        }
    }

    fn toggle(&mut self) {
        if self.state.finished {
            return;
        }
        self.state.running = !self.state.running;
    }

    fn reset(&mut self) {
        self.state = IntervalState::initial(&self.config);
    }

    fn is_running(&self) -> bool {
        self.state.running && !self.state.finished
    }

    fn snapshot(&self) -> IntervalSnapshot {
        IntervalSnapshot {
            config: self.config,
            state: self.state,
        }
    }
}

// ============================================================================
// Stopwatch mode
// ============================================================================

/// What the stopwatch publishes after each change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopwatchSnapshot {
    pub elapsed_ms: i64,
    pub running: bool,
}

/// Free-running count-up timer.
///
/// Elapsed time is read from the clock rather than summed from ticks, so a
/// late tick never loses time; ticks only refresh the published value.
pub struct Stopwatch {
    clock: SharedClock,
    refresh: Duration,
    /// Elapsed time banked before the current run
    banked_ms: i64,
    /// Clock reading when the current run started
    running_since: Option<i64>,
    /// Last sampled value
    elapsed_ms: i64,
}

impl Stopwatch {
    pub fn new(clock: SharedClock, refresh: Duration) -> Self {
        Self::resume_from(clock, refresh, 0)
    }

    /// A paused stopwatch already showing `offset_ms`
    pub fn resume_from(clock: SharedClock, refresh: Duration, offset_ms: i64) -> Self {
        let offset_ms = offset_ms.max(0);
        Self {
            clock,
            refresh,
            banked_ms: offset_ms,
            running_since: None,
            elapsed_ms: offset_ms,
        }
    }

    /// Current elapsed time, read from the clock
    pub fn elapsed_ms(&self) -> i64 {
        match self.running_since {
            Some(since) => self.banked_ms + (self.clock.now_ms() - since).max(0),
            None => self.banked_ms,
        }
    }
}

impl Ticking for Stopwatch {
    type Snapshot = StopwatchSnapshot;

    fn period(&self) -> Duration {
        self.refresh
    }

    fn tick(&mut self) {
        if self.running_since.is_some() {
            self.elapsed_ms = self.elapsed_ms();
        }
    }

    fn toggle(&mut self) {
        match self.running_since {
            Some(_) => {
                self.banked_ms = self.elapsed_ms();
                self.elapsed_ms = self.banked_ms;
                self.running_since = None;
            }
            None => self.running_since = Some(self.clock.now_ms()),
        }
    }

    fn reset(&mut self) {
        self.banked_ms = 0;
        self.elapsed_ms = 0;
        self.running_since = None;
    }

    fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    fn snapshot(&self) -> StopwatchSnapshot {
        StopwatchSnapshot {
            elapsed_ms: self.elapsed_ms,
            running: self.is_running(),
        }
    }
}
