//! Sliding analysis window holding the most recent samples.

/// Fixed-capacity buffer of the newest audio samples.
///
/// New blocks push the oldest samples out of the front. The storage is
/// allocated once and never resized.
#[derive(Debug, Clone)]
pub struct WindowBuffer {
    samples: Vec<f32>,
}

impl WindowBuffer {
    /// Smallest power of two whose duration at `sample_rate` reaches
    /// `min_secs`.
    pub fn capacity_for(sample_rate: u32, min_secs: f64) -> usize {
        let min_samples = (min_secs * sample_rate as f64).ceil().max(1.0) as usize;
        min_samples.next_power_of_two()
    }

    /// Creates a zero-filled window of `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Current window contents, oldest first.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Appends a block, discarding as many of the oldest samples.
    ///
    /// Returns the number of samples taken in. Zero means the window is
    /// unchanged and no transform is needed. A block longer than the window
    /// keeps only its newest `capacity` samples.
    pub fn ingest(&mut self, block: &[f32]) -> usize {
        let capacity = self.samples.len();
        let block = &block[block.len().saturating_sub(capacity)..];
        let n = block.len();
        if n == 0 {
            return 0;
        }
        self.samples.copy_within(n.., 0);
        self.samples[capacity - n..].copy_from_slice(block);
        n
    }

    /// Zeroes the window.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }
}
