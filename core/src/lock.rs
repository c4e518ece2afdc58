//! Shared-exclusive lock with a reentrant writer.
//!
//! Any number of readers may hold the lock at once as long as no writer is
//! active. A writer is exclusive, but the thread holding the write lock may
//! take the read or write lock again without blocking on itself.

use crate::error::LockError;
use parking_lot::{Condvar, Mutex};
use std::marker::PhantomData;
use std::thread::{self, ThreadId};

#[derive(Debug, Default)]
struct LockState {
    readers: usize,
    writers: usize,
    active_writer: Option<ThreadId>,
}

impl LockState {
    fn is_active_writer(&self, id: ThreadId) -> bool {
        self.active_writer == Some(id)
    }
}

#[derive(Debug, Default)]
pub struct SharedExclusiveLock {
    state: Mutex<LockState>,
    changed: Condvar,
}

impl SharedExclusiveLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active readers.
    pub fn readers(&self) -> usize {
        self.state.lock().readers
    }

    /// Number of active (possibly nested) write acquisitions.
    pub fn writers(&self) -> usize {
        self.state.lock().writers
    }

    /// True when the calling thread holds the write lock.
    pub fn is_active_writer(&self) -> bool {
        self.state.lock().is_active_writer(thread::current().id())
    }

    /// Blocks while another thread holds the write lock.
    pub fn lock_read(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        while state.writers > 0 && !state.is_active_writer(me) {
            self.changed.wait(&mut state);
        }
        state.readers += 1;
    }

    pub fn unlock_read(&self) -> Result<(), LockError> {
        let mut state = self.state.lock();
        if state.readers == 0 {
            return Err(LockError::NoReaders);
        }
        state.readers -= 1;
        if state.readers == 0 {
            self.changed.notify_all();
        }
        Ok(())
    }

    /// Blocks while there are readers or another writer, unless the calling
    /// thread is already the active writer.
    pub fn lock_write(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        while !state.is_active_writer(me) && (state.readers != 0 || state.writers != 0) {
            self.changed.wait(&mut state);
        }
        state.writers += 1;
        state.active_writer = Some(me);
    }

    pub fn unlock_write(&self) -> Result<(), LockError> {
        let mut state = self.state.lock();
        if state.writers == 0 {
            return Err(LockError::NoWriter);
        }
        if !state.is_active_writer(thread::current().id()) {
            return Err(LockError::NotOwner);
        }
        state.writers -= 1;
        if state.writers == 0 {
            state.active_writer = None;
            self.changed.notify_all();
        }
        Ok(())
    }

    pub fn read(&self) -> ReadGuard<'_> {
        self.lock_read();
        ReadGuard { lock: self, _not_send: PhantomData }
    }

    pub fn write(&self) -> WriteGuard<'_> {
        self.lock_write();
        WriteGuard { lock: self, _not_send: PhantomData }
    }
}

/// Releases a read acquisition on drop. Not `Send`: the releasing thread is
/// always the acquiring one.
#[must_use = "the read lock is released as soon as the guard is dropped"]
pub struct ReadGuard<'a> {
    lock: &'a SharedExclusiveLock,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.unlock_read() {
            tracing::error!(%err, "read guard released an unheld lock");
        }
    }
}

/// Releases a write acquisition on drop.
#[must_use = "the write lock is released as soon as the guard is dropped"]
pub struct WriteGuard<'a> {
    lock: &'a SharedExclusiveLock,
    _not_send: PhantomData<*const ()>,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.unlock_write() {
            tracing::error!(%err, "write guard released an unheld lock");
        }
    }
}
