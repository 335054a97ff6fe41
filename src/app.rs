use crate::config::Config;
use crate::notify::{Presenter, Severity};
use crate::tracker::{MonitorState, Tick, Tracker};
use crate::utils::format_countdown;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The final notice is up; pause, tear down, power off.
    Shutdown,
}

/// Everything the main window shows, plus the transitions behind it.
pub struct App {
    pub config: Config,
    pub tracker: Tracker,
    pub presenter: Presenter,
    /// Remaining time as of the last tick, while a countdown runs.
    pub remaining: Option<Duration>,
    pub close_warning: bool,
    pub listener_failed: bool,
}

impl App {
    pub fn new(config: Config, presenter: Presenter) -> Self {
        let tracker = Tracker::new(&config);
        Self {
            config,
            tracker,
            presenter,
            remaining: None,
            close_warning: false,
            listener_failed: false,
        }
    }

    pub fn on_tick(&mut self, now: Instant, last_activity: Instant) -> Flow {
        match self.tracker.tick(now, last_activity) {
            Tick::Quiet | Tick::Halted => {}
            Tick::CountdownStarted { deadline } => {
                self.remaining = Some(deadline.saturating_duration_since(now));
                let message = format!(
                    "No mouse or keyboard activity detected for {}.\n\n\
                     Click the 'I'm Active!' button in the main window to prevent \
                     automatic shutdown in {}.",
                    humantime::format_duration(self.config.inactivity_threshold),
                    humantime::format_duration(self.config.shutdown_grace),
                );
                self.presenter
                    .present("Inactivity Alert", &message, Severity::Info, now);
            }
            Tick::Counting { remaining, urgent } => {
                self.remaining = Some(remaining);
                if urgent {
                    let message = format!(
                        "Only {} seconds until shutdown!\n\n\
                         Click the 'I'm Active!' button immediately to cancel.",
                        remaining.as_secs()
                    );
                    self.presenter.present(
                        "URGENT: Shutdown Imminent",
                        &message,
                        Severity::Urgent,
                        now,
                    );
                }
            }
            Tick::ShutdownDue => {
                self.remaining = Some(Duration::ZERO);
                self.presenter.present(
                    "SYSTEM SHUTDOWN",
                    "Computer is shutting down now due to inactivity.\n\n\
                     All unsaved work will be lost.",
                    Severity::Urgent,
                    now,
                );
                return Flow::Shutdown;
            }
        }
        Flow::Continue
    }

    /// Any input after the countdown began cancels it quietly.
    pub fn on_activity(&mut self, last_activity: Instant) {
        if self.tracker.interrupted_by(last_activity) {
            info!("Input detected, countdown cancelled");
            self.reset();
        }
    }

    /// The "I'm Active!" button.
    pub fn confirm_active(&mut self, now: Instant) {
        if !self.button_enabled() {
            return;
        }
        info!("Activity confirmed from the main window");
        self.reset();
        self.presenter.present(
            "Activity Confirmed",
            "Shutdown cancelled! Continue working.",
            Severity::Success,
            now,
        );
    }

    fn reset(&mut self) {
        if self.tracker.reset() {
            self.remaining = None;
            self.presenter.dismiss();
        }
    }

    pub fn request_close(&mut self) {
        info!("Close attempt refused");
        self.close_warning = true;
    }

    pub fn acknowledge_warning(&mut self) {
        self.close_warning = false;
    }

    pub fn report_listener_failure(&mut self, reason: &str, now: Instant) {
        self.listener_failed = true;
        let message = format!(
            "Global input monitoring is unavailable ({}).\n\n\
             Only keys and clicks inside this window count as activity.",
            reason
        );
        self.presenter
            .present("Input Monitor Failed", &message, Severity::Urgent, now);
    }

    pub fn button_enabled(&self) -> bool {
        self.tracker.is_counting_down()
    }

    pub fn countdown_text(&self) -> String {
        match self.remaining {
            Some(remaining) => format!("Time until shutdown: {}", format_countdown(remaining)),
            None => "System active".to_string(),
        }
    }

    pub fn status_text(&self) -> &'static str {
        match self.tracker.state() {
            MonitorState::Active => "Monitoring for inactivity...",
            MonitorState::CountingDown { .. } => {
                "Warning: Inactivity detected! Click the button to prevent shutdown."
            }
            MonitorState::ShuttingDown => "Shutting down now due to inactivity.",
        }
    }
}
