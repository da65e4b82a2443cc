use crate::point::Batch;
use crate::writer::{PointWriter, TransportError};

/// Keeps written batches in memory.
///
/// Used in tests and for dry runs; `fail_next` makes upcoming writes fail.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    batches: Vec<Batch>,
    attempts: usize,
    failures: usize,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` writes fail with [`TransportError::Unavailable`].
    pub fn fail_next(&mut self, n: usize) {
        self.failures = n;
    }

    /// Successfully written batches, oldest first.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Number of `write` calls, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl PointWriter for MemoryWriter {
    fn write(&mut self, batch: &Batch) -> Result<(), TransportError> {
        self.attempts += 1;
        if self.failures > 0 {
            self.failures -= 1;
            return Err(TransportError::Unavailable(
                "memory writer told to fail".to_string(),
            ));
        }
        self.batches.push(batch.clone());
        Ok(())
    }
}
