use rdev::{listen, EventType};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error};

/// Kinds of global input that count as user activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    PointerMove,
    PointerClick,
    PointerScroll,
    KeyPress,
    KeyRelease,
}

impl InputKind {
    pub fn from_event(event: &EventType) -> Self {
        match event {
            EventType::MouseMove { .. } => InputKind::PointerMove,
            EventType::ButtonPress(_) | EventType::ButtonRelease(_) => InputKind::PointerClick,
            EventType::Wheel { .. } => InputKind::PointerScroll,
            EventType::KeyPress(_) => InputKind::KeyPress,
            EventType::KeyRelease(_) => InputKind::KeyRelease,
        }
    }
}

/// Timestamp of the most recent input, shared between the listener thread
/// and the event loop.
///
/// Stored as milliseconds since `origin` so a single atomic is enough.
#[derive(Debug)]
pub struct ActivityClock {
    origin: Instant,
    last_ms: AtomicU64,
}

impl ActivityClock {
    pub fn new(origin: Instant) -> Self {
        Self {
            origin,
            last_ms: AtomicU64::new(0),
        }
    }

    pub fn touch_at(&self, at: Instant) {
        let ms = at.saturating_duration_since(self.origin).as_millis() as u64;
        self.last_ms.fetch_max(ms, Ordering::Relaxed);
    }

    /// Records one input event delivered at `at`.
    pub fn record(&self, event: &EventType, at: Instant) -> InputKind {
        self.touch_at(at);
        InputKind::from_event(event)
    }

    pub fn last(&self) -> Instant {
        self.origin + std::time::Duration::from_millis(self.last_ms.load(Ordering::Relaxed))
    }
}

/// Installs the global input hook on its own thread.
///
/// The hook lives for the rest of the process. If it cannot be installed,
/// the error message arrives on the returned channel.
pub fn spawn_listener(clock: Arc<ActivityClock>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = listen(move |event| {
            clock.record(&event.event_type, Instant::now());
        });
        if let Err(e) = result {
            error!("Global input hook failed: {:?}", e);
            let _ = tx.send(format!("{:?}", e));
        } else {
            debug!("Global input hook returned");
        }
    });

    rx
}
