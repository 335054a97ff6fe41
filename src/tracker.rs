use crate::config::Config;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Active,
    CountingDown { started: Instant, deadline: Instant },
    /// Terminal. Nothing leaves this state.
    ShuttingDown,
}

/// What a single tick decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Quiet,
    CountdownStarted { deadline: Instant },
    Counting { remaining: Duration, urgent: bool },
    ShutdownDue,
    Halted,
}

pub struct Tracker {
    pub inactivity_threshold: Duration,
    pub shutdown_grace: Duration,
    urgent_window: Duration,
    urgent_interval: Duration,
    state: MonitorState,
    last_urgent: Option<Instant>,
}

impl Tracker {
    pub fn new(config: &Config) -> Self {
        Self {
            inactivity_threshold: config.inactivity_threshold,
            shutdown_grace: config.shutdown_grace,
            urgent_window: config.urgent_window,
            urgent_interval: config.urgent_interval,
            state: MonitorState::Active,
            last_urgent: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            MonitorState::CountingDown { deadline, .. } => Some(deadline),
            _ => None,
        }
    }

    pub fn is_counting_down(&self) -> bool {
        matches!(self.state, MonitorState::CountingDown { .. })
    }

    pub fn tick(&mut self, now: Instant, last_activity: Instant) -> Tick {
        match self.state {
            MonitorState::ShuttingDown => Tick::Halted,
            MonitorState::Active => {
                let idle = now.saturating_duration_since(last_activity);
                if idle < self.inactivity_threshold {
                    return Tick::Quiet;
                }
                let deadline = now + self.shutdown_grace;
                self.state = MonitorState::CountingDown {
                    started: now,
                    deadline,
                };
                self.last_urgent = None;
                info!(
                    "Idle for {}s, shutdown in {}s unless cancelled",
                    idle.as_secs(),
                    self.shutdown_grace.as_secs()
                );
                Tick::CountdownStarted { deadline }
            }
            MonitorState::CountingDown { deadline, .. } => {
                let remaining = deadline.saturating_duration_since(now);
                if remaining.is_zero() {
                    self.state = MonitorState::ShuttingDown;
                    info!("Countdown expired, shutting down");
                    return Tick::ShutdownDue;
                }

                let urgent = remaining < self.urgent_window
                    && self
                        .last_urgent
                        .map_or(true, |at| now.saturating_duration_since(at) >= self.urgent_interval);
                if urgent {
                    self.last_urgent = Some(now);
                }
                Tick::Counting { remaining, urgent }
            }
        }
    }

    /// True when input arrived after the current countdown began.
    pub fn interrupted_by(&self, last_activity: Instant) -> bool {
        match self.state {
            MonitorState::CountingDown { started, .. } => last_activity > started,
            _ => false,
        }
    }

    /// Cancels a running countdown. Returns false when there was none.
    pub fn reset(&mut self) -> bool {
        if !self.is_counting_down() {
            return false;
        }
        self.state = MonitorState::Active;
        self.last_urgent = None;
        debug!("Countdown cancelled");
        true
    }
}
