//! Mobile carousel: a circular single-slide viewport over the filtered issues.
//!
//! ## State
//!
//! `current ∈ [0, len)` plus an animation window. A transition starts the
//! window; until the settle delay has passed, further transitions are
//! dropped (not queued). The window is time-based and matches the CSS
//! transition length, so it is approximate by nature.
//!
//! Time is passed in as [`Instant`]s so callers (and tests) own the clock.
//!
//! ## Construction
//!
//! A carousel over fewer than two slides has nowhere to go; [`CarouselController::new`]
//! returns `None` and navigation stays disabled.

use std::fmt;
use std::time::{Duration, Instant};

/// Default settle delay, matching the slide transition.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(400);

/// Default minimum horizontal travel for a swipe, in pixels.
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 50.0;

type Listener = Box<dyn FnMut(usize)>;

pub struct CarouselController {
    len: usize,
    current: usize,
    settle: Duration,
    animating_until: Option<Instant>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for CarouselController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarouselController")
            .field("len", &self.len)
            .field("current", &self.current)
            .field("settle", &self.settle)
            .field("animating_until", &self.animating_until)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl CarouselController {
    /// A controller over `len` slides, or `None` when `len < 2`.
    pub fn new(len: usize, settle: Duration) -> Option<Self> {
        if len < 2 {
            return None;
        }
        Some(Self {
            len,
            current: 0,
            settle,
            animating_until: None,
            listeners: Vec::new(),
        })
    }

    pub fn slide_count(&self) -> usize {
        self.len
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.animating_until.is_some_and(|until| now < until)
    }

    /// Register a callback fired with the new index after every transition.
    pub fn subscribe(&mut self, listener: impl FnMut(usize) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Move to `target`, wrapping circularly. Returns `false` when the
    /// request was dropped because a transition is still settling.
    pub fn move_to(&mut self, target: isize, now: Instant) -> bool {
        if self.is_animating(now) {
            tracing::trace!(target, current = self.current, "carousel busy, dropping move");
            return false;
        }
        self.current = target.rem_euclid(self.len as isize) as usize;
        self.animating_until = Some(now + self.settle);
        for listener in &mut self.listeners {
            listener(self.current);
        }
        true
    }

    pub fn next(&mut self, now: Instant) -> bool {
        self.move_to(self.current as isize + 1, now)
    }

    pub fn prev(&mut self, now: Instant) -> bool {
        self.move_to(self.current as isize - 1, now)
    }

    /// Jump to an indicator dot by absolute index.
    pub fn select_dot(&mut self, index: usize, now: Instant) -> bool {
        self.move_to(index as isize, now)
    }

    pub fn swipe(&mut self, swipe: Swipe, now: Instant) -> bool {
        match swipe {
            Swipe::Next => self.next(now),
            Swipe::Prev => self.prev(now),
        }
    }

    /// Horizontal translation of the slide strip for a given slide width.
    pub fn offset_px(&self, slide_width: f64) -> f64 {
        -(self.current as f64) * slide_width
    }

    /// Exactly one slide and its dot are active at a time.
    pub fn is_active(&self, index: usize) -> bool {
        index == self.current
    }
}

/// Direction resolved from a completed touch gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    /// Finger moved left.
    Next,
    /// Finger moved right.
    Prev,
}

/// Turns touch start/end positions into swipes.
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    threshold: f64,
    start_x: Option<f64>,
}

impl Default for SwipeTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SWIPE_THRESHOLD)
    }
}

impl SwipeTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            start_x: None,
        }
    }

    pub fn touch_start(&mut self, x: f64) {
        self.start_x = Some(x);
    }

    /// Finish a gesture. Travel at or below the threshold is not a swipe.
    pub fn touch_end(&mut self, x: f64) -> Option<Swipe> {
        let start = self.start_x.take()?;
        if x < start - self.threshold {
            Some(Swipe::Next)
        } else if x > start + self.threshold {
            Some(Swipe::Prev)
        } else {
            None
        }
    }
}
