use std::time::Duration;

/// Timing knobs for the monitor. Everything is fixed at compile time;
/// tests construct their own values.
#[derive(Debug, Clone)]
pub struct Config {
    /// No input for this long starts the countdown.
    pub inactivity_threshold: Duration,
    /// Length of the cancellable countdown.
    pub shutdown_grace: Duration,
    pub tick: Duration,
    pub notification_ttl: Duration,
    /// Urgent notices are repeated while less than this remains.
    pub urgent_window: Duration,
    pub urgent_interval: Duration,
    /// How long the final notice stays up before the window goes away.
    pub final_pause: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inactivity_threshold: Duration::from_secs(60),
            shutdown_grace: Duration::from_secs(180),
            tick: Duration::from_secs(1),
            notification_ttl: Duration::from_secs(5),
            urgent_window: Duration::from_secs(30),
            urgent_interval: Duration::from_secs(5),
            final_pause: Duration::from_secs(2),
        }
    }
}
