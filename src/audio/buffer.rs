use std::collections::VecDeque;

/// FIFO of samples delivered by the bus but not yet handed out in a batch.
///
/// Bus chunks rarely line up with batch boundaries; the remainder of a chunk
/// waits here and is delivered first on the next read, so nothing is
/// dropped or reordered.
pub struct PendingSamples {
    queue: VecDeque<i16>,
}

impl PendingSamples {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::with_capacity(4096),
        }
    }

    /// Append samples in arrival order
    pub fn push(&mut self, data: &[i16]) {
        self.queue.extend(data.iter().copied());
    }

    /// Move the oldest samples into `out`, returning how many were moved
    pub fn drain_into(&mut self, out: &mut [i16]) -> usize {
        let count = self.queue.len().min(out.len());
        for (slot, sample) in out.iter_mut().zip(self.queue.drain(..count)) {
            *slot = sample;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for PendingSamples {
    fn default() -> Self {
        Self::new()
    }
}
