/// Fixed-capacity circular buffer with a running mean.
///
/// The buffer starts zero-filled and the mean always divides by the full
/// capacity, so the first `capacity` pushes are biased towards zero.
#[derive(Debug, Clone)]
pub struct MovingAverageRing {
    slots: Vec<f32>,
    cursor: usize,
}

impl MovingAverageRing {
    /// Creates a ring holding `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![0.0; capacity.max(1)],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Overwrites the oldest sample with `value` and returns the new mean.
    pub fn push(&mut self, value: f32) -> f32 {
        self.slots[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.slots.len();
        self.mean()
    }

    /// Mean over every slot.
    pub fn mean(&self) -> f32 {
        self.slots.iter().sum::<f32>() / self.slots.len() as f32
    }

    pub fn reset(&mut self) {
        self.slots.fill(0.0);
        self.cursor = 0;
    }
}
