//! Append buffer: fixed-capacity slots filled through an atomic counter.
//!
//! Dispatch threads call [`AppendBuffer::append`] concurrently; each append
//! reserves a unique slot with a single `fetch_add`. After the dispatch the
//! orchestrator reads the final count back once with
//! [`AppendBuffer::copy_count`].

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::core::error::Error;
use crate::core::types::Result;

/// Variable-length list built by concurrent appends into fixed storage.
pub struct AppendBuffer<T> {
    slots: Box<[OnceLock<T>]>,
    counter: AtomicU32,
    dropped: AtomicU32,
}

impl<T: Copy + Send + Sync> AppendBuffer<T> {
    /// Allocate `capacity` slots. The capacity must cover the largest number
    /// of appends a single dispatch can issue.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::config("append buffer capacity must be non-zero"));
        }
        if capacity > u32::MAX as usize {
            return Err(Error::Capacity(format!(
                "append buffer capacity {} exceeds the 32-bit counter range",
                capacity
            )));
        }
        Ok(Self {
            slots: (0..capacity).map(|_| OnceLock::new()).collect(),
            counter: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        })
    }

    /// Set the counter back to zero and release last dispatch's items.
    pub fn reset(&mut self) {
        let used = self.copy_count() as usize;
        for slot in &mut self.slots[..used] {
            slot.take();
        }
        *self.counter.get_mut() = 0;
        *self.dropped.get_mut() = 0;
    }

    /// Append one item. Returns its slot index, or `None` when the buffer is
    /// full (the item is discarded and counted in [`AppendBuffer::dropped`]).
    pub fn append(&self, item: T) -> Option<u32> {
        let index = self.counter.fetch_add(1, Ordering::Relaxed);
        if index as usize >= self.slots.len() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        if self.slots[index as usize].set(item).is_err() {
            log::warn!("Append buffer slot {} written twice; item discarded", index);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        Some(index)
    }

    /// Number of items stored (the counter clamped to capacity).
    pub fn copy_count(&self) -> u32 {
        self.counter
            .load(Ordering::Acquire)
            .min(self.slots.len() as u32)
    }

    /// Appends rejected since the last reset because the buffer was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Total slot count
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Item in slot `index`, if written this dispatch.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(OnceLock::get)
    }

    /// Stored items in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots[..self.copy_count() as usize]
            .iter()
            .filter_map(OnceLock::get)
    }

    /// Copy the stored items into `out`, replacing its contents. Used to
    /// stage the buffer for upload.
    pub fn copy_to(&self, out: &mut Vec<T>) {
        out.clear();
        out.extend(self.iter().copied());
    }
}
