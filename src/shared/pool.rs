// This is free and unencumbered software released into the public domain.

use crate::shared::nv21_buffer_size;
use bytes::Bytes;
use std::sync::Arc;

/// Owner handed to [`Bytes::from_owner`]; keeps the slot marked in flight.
#[derive(Debug)]
struct PooledBuffer(Arc<Vec<u8>>);

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Fixed ring of preview buffers reused round-robin.
///
/// A slot is only rewritten once every `Bytes` handed out for it has been
/// dropped. When the producer laps a consumer the frame is refused rather
/// than overwriting a buffer that is still being read.
#[derive(Debug, Default)]
pub struct FramePool {
    buffers: Vec<Arc<Vec<u8>>>,
    position: usize,
    buffer_len: usize,
}

impl FramePool {
    pub fn new(capacity: usize, width: usize, height: usize) -> Self {
        let mut pool = Self::default();
        pool.reallocate(capacity, width, height);
        pool
    }

    pub fn capacity(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    pub fn is_allocated(&self) -> bool {
        !self.buffers.is_empty()
    }

    /// Slots still referenced by a consumer.
    pub fn in_flight(&self) -> usize {
        self.buffers
            .iter()
            .filter(|b| Arc::strong_count(b) > 1)
            .count()
    }

    /// Replaces every buffer with `capacity` new NV21 buffers for the given
    /// resolution.
    pub fn reallocate(&mut self, capacity: usize, width: usize, height: usize) {
        let len = nv21_buffer_size(width, height);
        self.buffers = (0..capacity.max(1))
            .map(|_| Arc::new(vec![0; len]))
            .collect();
        self.buffer_len = len;
        self.position = 0;
    }

    pub fn release(&mut self) {
        self.buffers = Vec::new();
        self.buffer_len = 0;
        self.position = 0;
    }

    /// Fills the next slot and returns a shared view of it.
    ///
    /// The cursor advances even when the slot is still in flight, so one
    /// slow consumer costs at most one frame per lap. Returns `None` when
    /// nothing is allocated or the slot is in flight.
    pub fn fill_next(&mut self, fill: impl FnOnce(&mut [u8])) -> Option<Bytes> {
        if self.buffers.is_empty() {
            return None;
        }
        let index = self.position;
        self.position = (index + 1) % self.buffers.len();

        let slot = &mut self.buffers[index];
        let data = Arc::get_mut(slot)?;
        fill(data.as_mut_slice());
        Some(Bytes::from_owner(PooledBuffer(Arc::clone(slot))))
    }
}
