use ratatui::style::Color;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub foreground: Color,
    pub border: Color,
}

impl Severity {
    pub fn palette(self) -> Palette {
        match self {
            Severity::Info => Palette {
                background: Color::Rgb(0xff, 0xf0, 0xcc),
                foreground: Color::Rgb(0xcc, 0x66, 0x00),
                border: Color::Rgb(0xff, 0xcc, 0x66),
            },
            Severity::Success => Palette {
                background: Color::Rgb(0xcc, 0xff, 0xcc),
                foreground: Color::Rgb(0x00, 0x66, 0x00),
                border: Color::Rgb(0x66, 0xcc, 0x66),
            },
            Severity::Urgent => Palette {
                background: Color::Rgb(0xff, 0xcc, 0xcc),
                foreground: Color::Rgb(0x99, 0x00, 0x00),
                border: Color::Rgb(0xff, 0x66, 0x66),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub expires_at: Instant,
}

/// Desktop-side copy of the live notification.
pub trait DesktopSink {
    fn show(&mut self, notice: &Notice, ttl: Duration);
    fn close(&mut self);
}

/// Owns the single live notification.
pub struct Presenter {
    ttl: Duration,
    current: Option<Notice>,
    desktop: Option<Box<dyn DesktopSink>>,
}

impl Presenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            current: None,
            desktop: None,
        }
    }

    /// Also mirror notices to the desktop notification daemon, where one exists.
    pub fn with_desktop(self) -> Self {
        match desktop::Mirror::new() {
            Some(mirror) => self.with_sink(Box::new(mirror)),
            None => self,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn DesktopSink>) -> Self {
        self.desktop = Some(sink);
        self
    }

    pub fn present(&mut self, title: &str, message: &str, severity: Severity, now: Instant) {
        let notice = Notice {
            title: title.to_string(),
            message: message.to_string(),
            severity,
            expires_at: now + self.ttl,
        };
        debug!("Notification: {} ({:?})", notice.title, severity);
        if let Some(sink) = self.desktop.as_mut() {
            sink.show(&notice, self.ttl);
        }
        self.current = Some(notice);
    }

    pub fn dismiss(&mut self) {
        if self.current.take().is_some() {
            self.close_desktop();
        }
    }

    pub fn expire(&mut self, now: Instant) {
        if self.current.as_ref().is_some_and(|n| now >= n.expires_at) {
            self.current = None;
            // Daemons keep critical notifications up past their timeout.
            self.close_desktop();
        }
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    fn close_desktop(&mut self) {
        if let Some(sink) = self.desktop.as_mut() {
            sink.close();
        }
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
mod desktop {
    use super::{DesktopSink, Notice, Severity};
    use notify_rust::{Notification, NotificationHandle, Timeout, Urgency};
    use std::time::Duration;
    use tracing::debug;

    pub struct Mirror {
        handle: Option<NotificationHandle>,
    }

    impl Mirror {
        pub fn new() -> Option<Self> {
            Some(Self { handle: None })
        }
    }

    impl DesktopSink for Mirror {
        fn show(&mut self, notice: &Notice, ttl: Duration) {
            let urgency = match notice.severity {
                Severity::Urgent => Urgency::Critical,
                Severity::Info | Severity::Success => Urgency::Normal,
            };
            let mut builder = Notification::new();
            builder
                .summary(&notice.title)
                .body(&notice.message)
                .appname(env!("CARGO_PKG_NAME"))
                .urgency(urgency)
                .timeout(Timeout::Milliseconds(ttl.as_millis() as u32));
            // Reuse the previous slot so the daemon replaces it in place.
            if let Some(prev) = self.handle.as_ref() {
                builder.id(prev.id());
            }
            match builder.show() {
                Ok(handle) => self.handle = Some(handle),
                Err(e) => debug!("Desktop notification failed: {}", e),
            }
        }

        fn close(&mut self) {
            // Closing one the daemon already dropped is harmless.
            if let Some(handle) = self.handle.take() {
                handle.close();
            }
        }
    }
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
mod desktop {
    use super::{DesktopSink, Notice};
    use std::time::Duration;

    pub struct Mirror;

    impl Mirror {
        pub fn new() -> Option<Self> {
            None
        }
    }

    impl DesktopSink for Mirror {
        fn show(&mut self, _notice: &Notice, _ttl: Duration) {}

        fn close(&mut self) {}
    }
}
