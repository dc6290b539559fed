//! Time windows and resource availability calendars.
//!
//! # Time Model
//! All instants are milliseconds relative to a consumer-defined epoch.
//!
//! # Precedence
//! Blocked periods override availability windows. An instant is available iff:
//! - It falls within at least one `windows` entry (or no windows are defined), AND
//! - It does NOT fall within any `blocked` entry.

use serde::{Deserialize, Serialize};

/// Milliseconds per hour.
pub const MS_PER_HOUR: i64 = 3_600_000;
/// Milliseconds per day.
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// A half-open interval `[start_ms, end_ms)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeWindow {
    /// Interval start (ms, inclusive).
    pub start_ms: i64,
    /// Interval end (ms, exclusive).
    pub end_ms: i64,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Window length (ms). Zero for inverted windows.
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        (self.end_ms - self.start_ms).max(0)
    }

    /// Whether the window has positive length.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.end_ms > self.start_ms
    }

    /// Whether an instant falls within this window.
    #[inline]
    pub fn contains(&self, time_ms: i64) -> bool {
        time_ms >= self.start_ms && time_ms < self.end_ms
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }

    /// Length of the overlap between two windows (ms).
    pub fn overlap_ms(&self, other: &Self) -> i64 {
        let start = self.start_ms.max(other.start_ms);
        let end = self.end_ms.min(other.end_ms);
        (end - start).max(0)
    }
}

/// Resource availability calendar.
///
/// An empty calendar means the resource is always available.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Calendar {
    /// Periods when the resource is available. Empty = always.
    pub windows: Vec<TimeWindow>,
    /// Periods when the resource is unavailable (overrides `windows`).
    pub blocked: Vec<TimeWindow>,
}

impl Calendar {
    /// Creates an always-available calendar.
    pub fn always() -> Self {
        Self::default()
    }

    /// Adds an availability window.
    pub fn with_window(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.windows.push(TimeWindow::new(start_ms, end_ms));
        self
    }

    /// Adds a blocked period.
    pub fn with_blocked(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.blocked.push(TimeWindow::new(start_ms, end_ms));
        self
    }

    /// Whether no restriction is configured.
    pub fn is_unrestricted(&self) -> bool {
        self.windows.is_empty() && self.blocked.is_empty()
    }

    /// Whether the resource is available at `time_ms`.
    pub fn is_available(&self, time_ms: i64) -> bool {
        if self.blocked.iter().any(|w| w.contains(time_ms)) {
            return false;
        }
        self.windows.is_empty() || self.windows.iter().any(|w| w.contains(time_ms))
    }

    /// Earliest available instant at or after `from_ms`.
    ///
    /// Returns `None` if the calendar has no availability from `from_ms` on.
    pub fn next_available(&self, from_ms: i64) -> Option<i64> {
        if self.is_available(from_ms) {
            return Some(from_ms);
        }

        // Candidate instants: window starts and blocked-period ends after `from_ms`.
        let mut candidates: Vec<i64> = self
            .windows
            .iter()
            .filter(|w| w.end_ms > from_ms)
            .map(|w| w.start_ms.max(from_ms))
            .chain(
                self.blocked
                    .iter()
                    .filter(|b| b.end_ms > from_ms)
                    .map(|b| b.end_ms),
            )
            .collect();
        candidates.sort_unstable();

        candidates.into_iter().find(|&t| self.is_available(t))
    }

    /// Available time (ms) within `range`.
    ///
    /// Overlapping windows count once, and only blocked time inside an open
    /// window is subtracted.
    pub fn available_ms_in(&self, range: &TimeWindow) -> i64 {
        if !range.is_valid() {
            return 0;
        }

        let open = if self.windows.is_empty() {
            vec![*range]
        } else {
            merged(self.windows.iter().map(|w| clip(w, range)))
        };
        let blocked = merged(self.blocked.iter().map(|b| clip(b, range)));

        open.iter()
            .map(|o| o.duration_ms() - blocked.iter().map(|b| b.overlap_ms(o)).sum::<i64>())
            .sum::<i64>()
            .max(0)
    }

    /// Whether the whole of `span` is available.
    pub fn covers(&self, span: &TimeWindow) -> bool {
        self.available_ms_in(span) >= span.duration_ms()
    }
}

fn clip(w: &TimeWindow, range: &TimeWindow) -> TimeWindow {
    TimeWindow::new(w.start_ms.max(range.start_ms), w.end_ms.min(range.end_ms))
}

/// Sorted, disjoint union of the valid windows.
fn merged(windows: impl Iterator<Item = TimeWindow>) -> Vec<TimeWindow> {
    let mut sorted: Vec<TimeWindow> = windows.filter(TimeWindow::is_valid).collect();
    sorted.sort_unstable();

    let mut out: Vec<TimeWindow> = Vec::with_capacity(sorted.len());
    for w in sorted {
        match out.last_mut() {
            Some(last) if w.start_ms <= last.end_ms => last.end_ms = last.end_ms.max(w.end_ms),
            _ => out.push(w),
        }
    }
    out
}
