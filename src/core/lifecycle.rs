//! Appender lifecycle state

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeCycleState {
    Started = 0,
    Stopping = 1,
    Stopped = 2,
}

impl LifeCycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifeCycleState::Started,
            1 => LifeCycleState::Stopping,
            _ => LifeCycleState::Stopped,
        }
    }
}

impl fmt::Display for LifeCycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifeCycleState::Started => "STARTED",
            LifeCycleState::Stopping => "STOPPING",
            LifeCycleState::Stopped => "STOPPED",
        };
        f.write_str(s)
    }
}

/// Atomic one-way lifecycle: Started -> Stopping -> Stopped
#[derive(Debug)]
pub struct LifeCycle {
    state: AtomicU8,
}

impl LifeCycle {
    pub const fn started() -> Self {
        Self {
            state: AtomicU8::new(LifeCycleState::Started as u8),
        }
    }

    #[inline]
    pub fn state(&self) -> LifeCycleState {
        LifeCycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.state() == LifeCycleState::Started
    }

    /// Move from Started to Stopping. Only one caller ever gets `true`.
    pub fn begin_stop(&self) -> bool {
        self.state
            .compare_exchange(
                LifeCycleState::Started as u8,
                LifeCycleState::Stopping as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn mark_stopped(&self) {
        self.state
            .store(LifeCycleState::Stopped as u8, Ordering::Release);
    }
}

impl Default for LifeCycle {
    fn default() -> Self {
        Self::started()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_transitions() {
        let lifecycle = LifeCycle::started();
        assert!(lifecycle.is_started());

        assert!(lifecycle.begin_stop());
        assert_eq!(lifecycle.state(), LifeCycleState::Stopping);
        assert!(!lifecycle.begin_stop());

        lifecycle.mark_stopped();
        assert_eq!(lifecycle.state(), LifeCycleState::Stopped);
        assert!(!lifecycle.begin_stop());
    }

    #[test]
    fn test_single_winner_across_threads() {
        let lifecycle = Arc::new(LifeCycle::started());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lc = Arc::clone(&lifecycle);
                std::thread::spawn(move || lc.begin_stop())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
