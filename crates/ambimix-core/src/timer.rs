//! Countdown timer that stops playback when it runs out.
//!
//! The timer itself is tick-driven: something outside calls [`CountdownTimer::tick`]
//! once per elapsed second. Each call to [`CountdownTimer::start`] opens a new run,
//! identified by [`CountdownTimer::run_id`], so the tick source can tell when it has
//! to be replaced.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Notification produced by the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum TimerEvent {
    /// Display update
    Tick { minutes: u32, seconds: u32 },
    /// Countdown reached zero
    Completed,
}

impl TimerEvent {
    fn display(remaining: u32) -> Self {
        Self::Tick { minutes: remaining / 60, seconds: remaining % 60 }
    }
}

/// Observable timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerState {
    pub remaining_seconds: u32,
    pub running: bool,
}

/// Single-shot countdown.
#[derive(Debug, Default)]
pub struct CountdownTimer {
    remaining: u32,
    running: bool,
    run_id: u64,
}

impl CountdownTimer {
    /// Create an idle timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a countdown of `minutes`, replacing any running one.
    ///
    /// Zero or negative durations stop the timer instead.
    pub fn start(&mut self, minutes: i64) -> TimerEvent {
        if minutes <= 0 {
            return self.stop();
        }

        let seconds = u32::try_from(minutes.saturating_mul(60)).unwrap_or(u32::MAX);
        self.remaining = seconds;
        self.running = true;
        self.run_id += 1;

        info!(minutes, run = self.run_id, "Countdown started");
        TimerEvent::display(self.remaining)
    }

    /// Advance the countdown by one second.
    ///
    /// Returns nothing while idle. The tick that reaches zero is followed by
    /// [`TimerEvent::Completed`] and the timer goes idle.
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        if !self.running {
            return Vec::new();
        }

        self.remaining = self.remaining.saturating_sub(1);
        let mut events = vec![TimerEvent::display(self.remaining)];

        if self.remaining == 0 {
            self.running = false;
            info!(run = self.run_id, "Countdown completed");
            events.push(TimerEvent::Completed);
        }

        events
    }

    /// Cancel the countdown and clear the display.
    pub fn stop(&mut self) -> TimerEvent {
        if self.running {
            debug!(run = self.run_id, remaining = self.remaining, "Countdown stopped");
        }
        self.remaining = 0;
        self.running = false;
        TimerEvent::display(0)
    }

    /// Whether a countdown is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds left in the current run.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Identifier of the most recent run.
    #[must_use]
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TimerState {
        TimerState { remaining_seconds: self.remaining, running: self.running }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_emits_starting_value() {
        let mut timer = CountdownTimer::new();

        assert_eq!(timer.start(5), TimerEvent::Tick { minutes: 5, seconds: 0 });
        assert!(timer.is_running());
        assert_eq!(timer.remaining(), 300);
    }

    #[test]
    fn test_one_minute_ticks_sixty_times_then_completes() {
        let mut timer = CountdownTimer::new();
        timer.start(1);

        let mut ticks = Vec::new();
        let mut completions = 0;
        for _ in 0..120 {
            for event in timer.tick() {
                match event {
                    TimerEvent::Tick { minutes, seconds } => ticks.push(minutes * 60 + seconds),
                    TimerEvent::Completed => completions += 1,
                }
            }
        }

        assert_eq!(ticks.len(), 60);
        assert!(ticks.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(ticks.first(), Some(&59));
        assert_eq!(ticks.last(), Some(&0));
        assert_eq!(completions, 1);
        assert_eq!(timer.state(), TimerState { remaining_seconds: 0, running: false });
    }

    #[test]
    fn test_display_split() {
        let mut timer = CountdownTimer::new();
        timer.start(2);

        assert_eq!(timer.tick(), vec![TimerEvent::Tick { minutes: 1, seconds: 59 }]);
    }

    #[test]
    fn test_non_positive_start_stops() {
        let mut timer = CountdownTimer::new();
        timer.start(10);

        assert_eq!(timer.start(0), TimerEvent::Tick { minutes: 0, seconds: 0 });
        assert!(!timer.is_running());

        timer.start(10);
        timer.start(-3);
        assert!(!timer.is_running());
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn test_restart_replaces_run() {
        let mut timer = CountdownTimer::new();
        timer.start(1);
        timer.tick();
        let first_run = timer.run_id();

        timer.start(3);

        assert_ne!(timer.run_id(), first_run);
        assert_eq!(timer.remaining(), 180);
    }

    #[test]
    fn test_stop_clears_display() {
        let mut timer = CountdownTimer::new();
        timer.start(1);
        timer.tick();

        assert_eq!(timer.stop(), TimerEvent::Tick { minutes: 0, seconds: 0 });
        assert!(timer.tick().is_empty());
    }

    #[test]
    fn test_huge_duration_saturates() {
        let mut timer = CountdownTimer::new();
        timer.start(i64::MAX);
        assert_eq!(timer.remaining(), u32::MAX);
    }
}
