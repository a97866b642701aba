//! Frame selection and timing.
//!
//! Delays are normalized the way browsers throttle them: anything shorter than
//! [`FrameTiming::min_delay`] plays at [`FrameTiming::default_delay`] instead, so
//! animations authored with zero delays do not flicker.
use core::cell::Cell;
use core::time::Duration;

use tracing::trace;

use crate::common::Frame;

/// A monotonic time source.
///
/// Only differences between readings are meaningful.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Wall clock backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicClock {
    /// Creates a clock whose origin is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: Duration) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Sets the current reading.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    /// Moves the reading forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Delay normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    /// Delays strictly below this are replaced by `default_delay`.
    pub min_delay: Duration,
    /// Replacement for delays below `min_delay`.
    pub default_delay: Duration,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(20),
            default_delay: Duration::from_millis(100),
        }
    }
}

impl FrameTiming {
    /// Converts a delay in centiseconds into the duration the frame is shown for.
    #[must_use]
    pub fn normalize(&self, centiseconds: u16) -> Duration {
        let delay = Duration::from_millis(u64::from(centiseconds) * 10);
        if delay < self.min_delay {
            self.default_delay
        } else {
            delay
        }
    }
}

/// Selected frame index and the time at which the next advance is due.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    selected: usize,
    next_eligible: Duration,
    timing: FrameTiming,
}

impl FrameTimer {
    /// A timer at frame 0 that is due immediately.
    #[must_use]
    pub fn new(timing: FrameTiming) -> Self {
        Self {
            selected: 0,
            next_eligible: Duration::ZERO,
            timing,
        }
    }

    /// Index of the selected frame.
    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Time after which [`is_due`](Self::is_due) reports `true`.
    #[must_use]
    pub fn next_eligible(&self) -> Duration {
        self.next_eligible
    }

    /// The normalization in use.
    #[must_use]
    pub fn timing(&self) -> FrameTiming {
        self.timing
    }

    /// Back to frame 0, due immediately.
    pub fn reset(&mut self) {
        self.selected = 0;
        self.next_eligible = Duration::ZERO;
    }

    /// Jumps to `index` without touching the schedule.
    pub fn select(&mut self, index: usize) {
        self.selected = index;
    }

    /// Selects the next frame, wrapping to 0 after the last one.
    ///
    /// Returns `true` when the selection wrapped. The schedule is recomputed from the
    /// newly selected frame's delay; a frame without a graphics control extension
    /// leaves it unchanged. Does nothing for an empty frame list.
    pub fn advance(&mut self, frames: &[Frame], now: Duration) -> bool {
        if frames.is_empty() {
            return false;
        }
        self.selected += 1;
        if self.selected >= frames.len() {
            self.selected = 0;
        }
        if let Some(delay) = frames[self.selected].delay() {
            self.next_eligible = now + self.timing.normalize(delay);
        }
        trace!(
            "selected frame {}, next advance at {:?}",
            self.selected,
            self.next_eligible
        );
        self.selected == 0
    }

    /// Whether the next advance is due at `now`.
    #[must_use]
    pub fn is_due(&self, now: Duration) -> bool {
        self.next_eligible < now
    }
}
