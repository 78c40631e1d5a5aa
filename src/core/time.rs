//! Frame timing utilities

use std::time::Duration;

/// Tracks per-frame delta time and total simulated time, stepped with a
/// fixed delta for headless runs.
pub struct FrameTimer {
    delta: Duration,
    elapsed: Duration,
    frame_count: u64,
}

impl FrameTimer {
    /// Create a new frame timer
    pub fn new() -> Self {
        Self {
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Step the timer by a fixed delta
    pub fn advance(&mut self, delta_secs: f32) {
        self.delta = Duration::from_secs_f32(delta_secs.max(0.0));
        self.elapsed += self.delta;
        self.frame_count += 1;
    }

    /// Get delta time in seconds
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total time accumulated over all frames, in seconds
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get total frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_advance() {
        let mut timer = FrameTimer::new();
        timer.advance(0.5);
        timer.advance(0.25);
        assert_eq!(timer.frame_count(), 2);
        assert!((timer.delta_secs() - 0.25).abs() < 1e-6);
        assert!((timer.elapsed_secs() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_negative_advance_clamped() {
        let mut timer = FrameTimer::new();
        timer.advance(-1.0);
        assert_eq!(timer.delta_secs(), 0.0);
    }
}
