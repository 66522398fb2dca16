//! Navigation hook used by the session lifecycle.
//!
//! The core never owns the router. It asks the host application to move to a
//! surface (the login page after logout) through the [`Navigator`] trait.

use parking_lot::Mutex;

/// Host-provided navigation.
pub trait Navigator: Send + Sync {
    fn navigate(&self, to: &str);
}

/// Navigator that ignores every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _to: &str) {}
}

/// Navigator that records requested routes, for headless hosts and tests.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes requested so far, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.history.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, to: &str) {
        self.history.lock().push(to.to_string());
    }
}
