//! Activity signal: whether the consuming context is currently active.
//!
//! The poller only reacts to true/false transitions of a boolean signal; what
//! "active" means (a visible window, a focused tab, a connected client) is up
//! to whoever drives it. [`Activity`] is a small handle over a
//! [`tokio::sync::watch`] channel that can be shared freely and injected per
//! session. [`Activity::global`] is the process-wide default used when pausing
//! is enabled and no signal was injected.
//!
//! # Examples
//!
//! ```rust
//! use tidewater::{Activity, ActivitySignal};
//!
//! let activity = Activity::new(true);
//! let listener = activity.subscribe();
//!
//! activity.set_active(false);
//! assert!(!*listener.borrow());
//! ```

use std::sync::{Arc, OnceLock};

use tokio::sync::watch;

/// Anything that can hand out a listener for the activity signal.
///
/// Implemented for [`Activity`] and for tokio `watch` channels carrying a
/// `bool`, so an existing channel can be plugged in directly.
pub trait ActivitySignal {
    /// Subscribe to the current value and future changes.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Shared, cloneable activity flag.
#[derive(Debug, Clone)]
pub struct Activity {
    sender: Arc<watch::Sender<bool>>,
}

static GLOBAL: OnceLock<Activity> = OnceLock::new();

impl Activity {
    /// Create a signal with the given initial state.
    pub fn new(active: bool) -> Self {
        let (sender, _) = watch::channel(active);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// The process-wide default signal. Starts active.
    pub fn global() -> &'static Activity {
        GLOBAL.get_or_init(|| Activity::new(true))
    }

    /// Flip the signal. Listeners are only woken on an actual change.
    pub fn set_active(&self, active: bool) {
        self.sender.send_if_modified(|current| {
            if *current == active {
                false
            } else {
                *current = active;
                true
            }
        });

        #[cfg(feature = "tracing")]
        tracing::trace!(active, "activity signal updated");
    }

    /// Current state of the signal.
    pub fn is_active(&self) -> bool {
        *self.sender.borrow()
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ActivitySignal for Activity {
    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

impl ActivitySignal for watch::Sender<bool> {
    fn subscribe(&self) -> watch::Receiver<bool> {
        watch::Sender::subscribe(self)
    }
}

impl ActivitySignal for watch::Receiver<bool> {
    fn subscribe(&self) -> watch::Receiver<bool> {
        self.clone()
    }
}

impl<S: ActivitySignal + ?Sized> ActivitySignal for &S {
    fn subscribe(&self) -> watch::Receiver<bool> {
        (**self).subscribe()
    }
}
