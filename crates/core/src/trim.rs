//! Trim range editor.
//!
//! Two draggable endpoints over a track representing the whole input. The
//! minimum clip length is enforced on every mutation, so every state the
//! editor exposes satisfies `0 <= start <= end - MIN_GAP_MS <= duration`
//! (for inputs at least `MIN_GAP_MS` long).

use serde::{Deserialize, Serialize};

/// Shortest clip the editor will produce, in milliseconds.
pub const MIN_GAP_MS: u64 = 100;

/// A clip window in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl TrimRange {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Whole-file range.
    pub fn full(duration_ms: u64) -> Self {
        Self {
            start_ms: 0,
            end_ms: duration_ms,
        }
    }

    pub fn length_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    pub fn length_secs(&self) -> f64 {
        self.length_ms() as f64 / 1000.0
    }

    /// Whether the range respects the minimum gap within `duration_ms`.
    pub fn is_valid_for(&self, duration_ms: u64) -> bool {
        self.start_ms.saturating_add(MIN_GAP_MS) <= self.end_ms && self.end_ms <= duration_ms
    }
}

/// Which endpoint a pointer gesture is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handle {
    Start,
    End,
}

/// Pointer-driven editor over a [`TrimRange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimEditor {
    duration_ms: u64,
    range: TrimRange,
    active: Option<Handle>,
}

impl TrimEditor {
    /// Editor spanning the whole input.
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            range: TrimRange::full(duration_ms),
            active: None,
        }
    }

    /// Editor seeded with an existing range, clamped into bounds.
    pub fn with_range(duration_ms: u64, range: TrimRange) -> Self {
        let mut editor = Self::new(duration_ms);
        editor.set_end(range.end_ms);
        editor.set_start(range.start_ms);
        editor
    }

    pub fn range(&self) -> TrimRange {
        self.range
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn active(&self) -> Option<Handle> {
        self.active
    }

    /// Maps a pointer position on a track of `track_width` to a time.
    fn time_at(&self, x: f64, track_width: f64) -> Option<u64> {
        if !(track_width.is_finite() && track_width > 0.0 && x.is_finite()) {
            return None;
        }
        let ratio = (x / track_width).clamp(0.0, 1.0);
        Some((ratio * self.duration_ms as f64).round() as u64)
    }

    /// Activates whichever endpoint is nearer in time to the pointer.
    ///
    /// Ties go to the start handle. Returns the activated handle.
    pub fn pointer_down(&mut self, x: f64, track_width: f64) -> Option<Handle> {
        let t = self.time_at(x, track_width)?;
        let to_start = t.abs_diff(self.range.start_ms);
        let to_end = t.abs_diff(self.range.end_ms);
        let handle = if to_end < to_start {
            Handle::End
        } else {
            Handle::Start
        };
        self.active = Some(handle);
        Some(handle)
    }

    /// Moves the active endpoint toward the pointer, clamped. No-op when idle.
    pub fn pointer_move(&mut self, x: f64, track_width: f64) -> TrimRange {
        if let (Some(handle), Some(t)) = (self.active, self.time_at(x, track_width)) {
            match handle {
                Handle::Start => self.set_start(t),
                Handle::End => self.set_end(t),
            };
        }
        self.range
    }

    pub fn pointer_up(&mut self) {
        self.active = None;
    }

    /// Sets the start, bounded to `[0, end - MIN_GAP_MS]`.
    pub fn set_start(&mut self, ms: u64) -> TrimRange {
        let max = self.range.end_ms.saturating_sub(MIN_GAP_MS);
        self.range.start_ms = ms.min(max);
        self.range
    }

    /// Sets the end, bounded to `[start + MIN_GAP_MS, duration]`.
    pub fn set_end(&mut self, ms: u64) -> TrimRange {
        let min = self.range.start_ms.saturating_add(MIN_GAP_MS).min(self.duration_ms);
        self.range.end_ms = ms.clamp(min, self.duration_ms);
        self.range
    }
}
