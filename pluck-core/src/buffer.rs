//! Fixed-capacity circular sample buffer that assembles arbitrary-length
//! input chunks into analysis frames.

/// Circular buffer holding the most recent `capacity` samples.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    samples: Box<[f32]>,
    // Next slot to write. Once the buffer has wrapped, this is also the
    // oldest sample.
    write_index: usize,
    total_pushed: u64,
}

impl RingBuffer {
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Ring buffer capacity must be greater than 0");
        Self {
            samples: vec![0.0; capacity].into_boxed_slice(),
            write_index: 0,
            total_pushed: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Appends `chunk`, overwriting the oldest samples once full.
    pub fn push(&mut self, chunk: &[f32]) {
        let capacity = self.capacity();
        self.total_pushed += chunk.len() as u64;

        // Only the tail of an oversized chunk can survive.
        let chunk = if chunk.len() > capacity {
            let skipped = chunk.len() - capacity;
            self.write_index = (self.write_index + skipped) % capacity;
            &chunk[skipped..]
        } else {
            chunk
        };

        let first = chunk.len().min(capacity - self.write_index);
        self.samples[self.write_index..self.write_index + first].copy_from_slice(&chunk[..first]);
        let rest = &chunk[first..];
        self.samples[..rest.len()].copy_from_slice(rest);
        self.write_index = (self.write_index + chunk.len()) % capacity;
    }

    /// True once at least `capacity` samples have been pushed.
    pub fn is_ready(&self) -> bool {
        self.total_pushed >= self.capacity() as u64
    }

    /// The most recent `capacity` samples, oldest first.
    ///
    /// Before the buffer is ready the leading samples are zeros.
    pub fn snapshot(&self) -> Vec<f32> {
        let mut frame = vec![0.0; self.capacity()];
        self.snapshot_into(&mut frame);
        frame
    }

    /// Copies the current frame into `frame` without allocating.
    ///
    /// # Panics
    /// If `frame.len()` differs from the capacity.
    pub fn snapshot_into(&self, frame: &mut [f32]) {
        assert_eq!(frame.len(), self.capacity(), "Snapshot target must match buffer capacity");
        let (newer, older) = self.samples.split_at(self.write_index);
        frame[..older.len()].copy_from_slice(older);
        frame[older.len()..].copy_from_slice(newer);
    }

    pub fn reset(&mut self) {
        self.samples.fill(0.0);
        self.write_index = 0;
        self.total_pushed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::RingBuffer;

    fn ramp(start: usize, len: usize) -> Vec<f32> {
        (start..start + len).map(|i| i as f32).collect()
    }

    #[test]
    fn not_ready_until_capacity_reached() {
        let mut buffer = RingBuffer::new(8);
        buffer.push(&ramp(0, 5));
        assert!(!buffer.is_ready());
        buffer.push(&ramp(5, 2));
        assert!(!buffer.is_ready());
        buffer.push(&ramp(7, 1));
        assert!(buffer.is_ready());
    }

    #[test]
    fn snapshot_after_exact_capacity() {
        let mut buffer = RingBuffer::new(8);
        let input = ramp(0, 8);
        buffer.push(&input);
        assert_eq!(buffer.snapshot(), input);
    }

    #[test]
    fn snapshot_keeps_last_capacity_samples_in_order() {
        let mut buffer = RingBuffer::new(8);
        // Small chunks that wrap at odd offsets.
        for chunk in ramp(0, 19).chunks(3) {
            buffer.push(chunk);
        }
        assert_eq!(buffer.snapshot(), ramp(11, 8));
    }

    #[test]
    fn chunk_larger_than_capacity() {
        let mut buffer = RingBuffer::new(8);
        buffer.push(&ramp(0, 3));
        buffer.push(&ramp(3, 21));
        assert!(buffer.is_ready());
        assert_eq!(buffer.snapshot(), ramp(16, 8));

        buffer.push(&ramp(24, 2));
        assert_eq!(buffer.snapshot(), ramp(18, 8));
    }

    #[test]
    fn snapshot_is_idempotent() {
        let mut buffer = RingBuffer::new(16);
        buffer.push(&ramp(0, 37));
        let first = buffer.snapshot();
        let second = buffer.snapshot();
        assert_eq!(first, second);
    }

    #[test]
    fn partial_fill_is_zero_padded() {
        let mut buffer = RingBuffer::new(4);
        buffer.push(&[1.0, 2.0]);
        assert_eq!(buffer.snapshot(), vec![0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut buffer = RingBuffer::new(4);
        buffer.push(&ramp(1, 6));
        buffer.reset();
        assert!(!buffer.is_ready());
        assert_eq!(buffer.snapshot(), vec![0.0; 4]);
    }
}
