use crate::prelude::StageError;

/// Scoped scratch-buffer pool that bounds concurrent checkouts.
pub struct BufferPool {
    idle: Vec<Vec<f32>>,
    in_flight: usize,
    max_buffers: usize,
}

impl BufferPool {
    pub fn with_capacity(max_buffers: usize) -> Self {
        Self {
            idle: Vec::with_capacity(max_buffers),
            in_flight: 0,
            max_buffers,
        }
    }

    /// Hands out a zeroed buffer of the requested length.
    pub fn checkout(&mut self, length: usize) -> Result<Vec<f32>, StageError> {
        if let Some(mut buffer) = self.idle.pop() {
            buffer.resize(length, 0.0);
            self.in_flight += 1;
            Ok(buffer)
        } else if self.in_flight < self.max_buffers {
            self.in_flight += 1;
            Ok(vec![0.0; length])
        } else {
            Err(StageError::BufferExhaustion("pool depleted".to_string()))
        }
    }

    /// Returns a buffer back to the pool for reuse.
    pub fn release(&mut self, mut buffer: Vec<f32>) {
        buffer.clear();
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.idle.len() < self.max_buffers {
            self.idle.push(buffer);
        }
    }

    pub fn reset(&mut self) {
        self.idle.clear();
        self.in_flight = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_is_bounded_by_capacity() {
        let mut pool = BufferPool::with_capacity(1);
        let first = pool.checkout(8).unwrap();
        assert!(pool.checkout(8).is_err());
        pool.release(first);
        let reused = pool.checkout(4).unwrap();
        assert_eq!(reused, vec![0.0; 4]);
    }
}
