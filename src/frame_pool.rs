//! Rotating pool of per-frame resources shared between host and device.
//!
//! Anything the host writes every frame and the device reads later (the parameters
//! block, the force list) must not be overwritten while the device may still be reading
//! it. A [`FramePool`] holds N copies of such a resource and hands them out in ring order.
//! [`acquire`](FramePool::acquire) blocks while all N are in flight, which keeps a fast
//! control thread at most N frames ahead of the device.
//!
//! A slot stays in flight until its [`FrameSlot`] guard is released, either explicitly or
//! by dropping it. The guard is `Send`, so it can be moved into a device completion
//! callback and released from whichever thread runs it.
//!
//! # Example
//!
//! ```
//! use maxboid::FramePool;
//!
//! let pool = FramePool::new(vec![0u32, 1, 2]).unwrap();
//! let a = pool.acquire();
//! let b = pool.acquire();
//! let c = pool.acquire();
//! assert!(pool.try_acquire().is_none());
//! a.release();
//! assert!(pool.try_acquire().is_some());
//! # drop((b, c));
//! ```

use std::ops::Deref;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::PoolError;

struct PoolState {
    in_flight: Vec<bool>,
    /// Ring position to start searching from on the next acquire.
    next: usize,
}

struct PoolInner<T> {
    slots: Vec<T>,
    state: Mutex<PoolState>,
    available: Condvar,
}

impl<T> PoolInner<T> {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // A panic while holding the lock cannot leave the flags half-updated.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_free(&self, state: &mut PoolState) -> Option<usize> {
        let n = self.slots.len();
        let index = (0..n).map(|k| (state.next + k) % n).find(|&i| !state.in_flight[i])?;
        state.in_flight[index] = true;
        state.next = (index + 1) % n;
        Some(index)
    }

    fn release(&self, index: usize) {
        let mut state = self.lock();
        debug_assert!(state.in_flight[index], "frame slot {} released twice", index);
        state.in_flight[index] = false;
        drop(state);
        self.available.notify_one();
    }
}

/// A fixed ring of N resources with blocking acquisition.
pub struct FramePool<T> {
    inner: Arc<PoolInner<T>>,
}

impl<T> Clone for FramePool<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> FramePool<T> {
    /// Build a pool over `slots`. At least two slots are required.
    pub fn new(slots: Vec<T>) -> Result<Self, PoolError> {
        if slots.len() < 2 {
            return Err(PoolError::TooFewSlots(slots.len()));
        }
        let n = slots.len();
        Ok(Self {
            inner: Arc::new(PoolInner {
                slots,
                state: Mutex::new(PoolState { in_flight: vec![false; n], next: 0 }),
                available: Condvar::new(),
            }),
        })
    }

    /// Build a pool of `count` slots, creating each with `create(index)`.
    pub fn with_capacity(count: usize, create: impl FnMut(usize) -> T) -> Result<Self, PoolError> {
        Self::new((0..count).map(create).collect())
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.inner.slots.len()
    }

    /// Number of slots currently acquired and not yet released.
    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight.iter().filter(|&&busy| busy).count()
    }

    /// Shared access to slot `index` regardless of its state.
    ///
    /// Readers use this to look at the most recently submitted frame.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.inner.slots.get(index)
    }

    /// Take the next free slot, blocking until one is released.
    ///
    /// Blocks forever if every slot is held and nothing ever releases one.
    pub fn acquire(&self) -> FrameSlot<T> {
        let mut state = self.inner.lock();
        loop {
            if let Some(index) = self.inner.take_free(&mut state) {
                return self.slot(index);
            }
            state = self
                .inner
                .available
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Take the next free slot, waiting at most `timeout`.
    pub fn acquire_timeout(&self, timeout: Duration) -> Option<FrameSlot<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.lock();
        loop {
            if let Some(index) = self.inner.take_free(&mut state) {
                return Some(self.slot(index));
            }
            // Wakeups that find no free slot do not extend the wait.
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (guard, _) = self
                .inner
                .available
                .wait_timeout(state, remaining)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state = guard;
        }
    }

    /// Take the next free slot if one is available right now.
    pub fn try_acquire(&self) -> Option<FrameSlot<T>> {
        let mut state = self.inner.lock();
        self.inner.take_free(&mut state).map(|index| self.slot(index))
    }

    fn slot(&self, index: usize) -> FrameSlot<T> {
        FrameSlot { pool: Arc::clone(&self.inner), index }
    }
}

/// An acquired pool slot. Dereferences to the slot's resource.
///
/// Releasing happens exactly once: [`release`](Self::release) consumes the guard, and a
/// guard dropped without an explicit release releases itself.
pub struct FrameSlot<T> {
    pool: Arc<PoolInner<T>>,
    index: usize,
}

impl<T> FrameSlot<T> {
    /// Position of this slot in the ring.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Return the slot to the pool, waking one blocked acquirer.
    pub fn release(self) {
        // Drop does the work.
    }
}

impl<T> Deref for FrameSlot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.pool.slots[self.index]
    }
}

impl<T> Drop for FrameSlot<T> {
    fn drop(&mut self) {
        self.pool.release(self.index);
    }
}
