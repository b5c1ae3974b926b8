use std::time::Duration;

/// Fixed-size ring of recent frame times with a running sum.
///
/// Averages cover only the samples actually recorded, so the first frames
/// after startup do not report an inflated rate.
#[derive(Debug, Clone)]
pub struct FrameWindow {
    history: Vec<f64>,
    index: usize,
    filled: bool,
    sum: f64,
}

impl FrameWindow {
    /// Panics if `capacity` is zero; [`ClockConfig`](crate::ClockConfig)
    /// validation rejects that before a window is built.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "frame window needs at least one slot");
        Self {
            history: vec![0.0; capacity],
            index: 0,
            filled: false,
            sum: 0.0,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        let secs = dt.as_secs_f64();
        self.sum -= self.history[self.index];
        self.sum += secs;
        self.history[self.index] = secs;
        self.index = (self.index + 1) % self.history.len();
        if self.index == 0 {
            self.filled = true;
        }
    }

    pub fn capacity(&self) -> usize {
        self.history.len()
    }

    pub fn count(&self) -> usize {
        if self.filled {
            self.history.len()
        } else {
            self.index
        }
    }

    /// Mean frame time in seconds, or 0 with no samples.
    pub fn average_secs(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        // Clamp away negative float drift from the running subtraction.
        self.sum.max(0.0) / count as f64
    }

    /// Frames per second over the window, or 0 when no time has been recorded.
    pub fn rate(&self) -> f64 {
        let avg = self.average_secs();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }

    pub fn max_secs(&self) -> f64 {
        self.history[..self.count()]
            .iter()
            .copied()
            .fold(0.0, f64::max)
    }
}
