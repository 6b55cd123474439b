// This is free and unencumbered software released into the public domain.

use crate::shared::SessionMsg;
use core::ffi::c_void;
use std::sync::{Mutex, mpsc::SyncSender};
use tracing::trace;

#[derive(Debug)]
struct Inner {
    tx: SyncSender<SessionMsg>,
    pending: Mutex<Vec<SessionMsg>>,
}

/// Heap-pinned state handed to NDK callbacks as their `context` pointer.
///
/// Callbacks never block: device and session events are queued here and
/// the camera thread is woken with a non-blocking send. Must outlive every
/// NDK object registered with it.
#[derive(Debug)]
pub struct MessageContext(*mut Inner);

impl MessageContext {
    pub fn new(tx: SyncSender<SessionMsg>) -> Self {
        Self(Box::into_raw(Box::new(Inner {
            tx,
            pending: Mutex::default(),
        })))
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.0.cast()
    }

    /// Events queued by callbacks since the last call.
    pub fn drain(&self) -> Vec<SessionMsg> {
        let inner = unsafe { &*self.0 };
        match inner.pending.lock() {
            Ok(mut pending) => core::mem::take(&mut *pending),
            Err(poisoned) => core::mem::take(&mut *poisoned.into_inner()),
        }
    }

    /// Queues `msg` and wakes the camera thread. A full queue needs no
    /// wake-up: the camera thread drains after every message it handles.
    ///
    /// # Safety
    ///
    /// `context` must come from [`as_ptr`](Self::as_ptr) of a live context.
    pub unsafe fn post(context: *mut c_void, msg: SessionMsg) {
        let inner = unsafe { &*(context as *const Inner) };
        match inner.pending.lock() {
            Ok(mut pending) => pending.push(msg),
            Err(poisoned) => poisoned.into_inner().push(msg),
        }
        let _ = inner.tx.try_send(SessionMsg::PlatformEvents);
    }

    /// Posts straight to the camera thread unless its queue is full. A
    /// pending `ImageAvailable` already makes it pick up the latest image.
    ///
    /// # Safety
    ///
    /// As for [`post`](Self::post).
    pub unsafe fn try_post(context: *mut c_void, msg: SessionMsg) {
        let inner = unsafe { &*(context as *const Inner) };
        if inner.tx.try_send(msg).is_err() {
            trace!("camera queue full, image notification coalesced");
        }
    }
}

impl Drop for MessageContext {
    fn drop(&mut self) {
        drop(unsafe { Box::from_raw(self.0) });
    }
}
