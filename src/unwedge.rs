use crate::{IdentityKey, UserId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A device whose Olm session is desynchronized.
///
/// The device id is not known when decryption fails, so the device is named
/// by its identity key. The next message sent to it must use a freshly
/// created outbound session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnwedgeRequest {
    /// Owner of the device.
    pub user_id: UserId,
    /// Identity key of the device.
    pub sender_key: IdentityKey,
}

/// Receives unwedging signals from the decryption pipeline.
///
/// Consumed by whatever manages outbound sessions.
pub trait UnwedgeSink {
    /// Marks a device as needing a new outbound session.
    fn mark_device_for_unwedging(&self, request: UnwedgeRequest);
}

impl<F> UnwedgeSink for F
where
    F: Fn(UnwedgeRequest),
{
    fn mark_device_for_unwedging(&self, request: UnwedgeRequest) {
        self(request)
    }
}

impl<T: UnwedgeSink + ?Sized> UnwedgeSink for Arc<T> {
    fn mark_device_for_unwedging(&self, request: UnwedgeRequest) {
        (**self).mark_device_for_unwedging(request)
    }
}

/// An [`UnwedgeSink`] that queues requests until the outbound side takes them.
///
/// Duplicate requests for a device that is already pending are dropped.
#[derive(Debug, Default)]
pub struct UnwedgeQueue {
    pending: Mutex<Vec<UnwedgeRequest>>,
}

impl UnwedgeQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every pending request, oldest first.
    pub fn take(&self) -> Vec<UnwedgeRequest> {
        std::mem::take(&mut *self.lock())
    }

    /// Whether `request` is pending.
    pub fn is_marked(&self, request: &UnwedgeRequest) -> bool {
        self.lock().contains(request)
    }

    /// Clears one pending request. Returns whether it was pending.
    pub fn clear(&self, request: &UnwedgeRequest) -> bool {
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|r| r != request);
        pending.len() != before
    }

    /// Number of pending requests.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UnwedgeRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UnwedgeSink for UnwedgeQueue {
    fn mark_device_for_unwedging(&self, request: UnwedgeRequest) {
        let mut pending = self.lock();
        if !pending.contains(&request) {
            pending.push(request);
        }
    }
}
