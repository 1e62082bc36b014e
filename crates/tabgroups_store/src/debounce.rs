//! Write-behind wrapper that coalesces rapid saves per record key.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex as PLMutex;
use tabgroups_shared::diagnostics;

use crate::error::StoreResult;
use crate::storage::RecordStore;

type Pending = Arc<PLMutex<BTreeMap<String, String>>>;
/// Held across every take-and-write so an older batch can never land after a
/// newer one for the same key.
type WriteLock = Arc<PLMutex<()>>;

enum SaveMessage {
    Save,
    Shutdown,
}

/// Debounced storage wrapper that coalesces rapid saves.
///
/// Only the latest contents per key are written. With a zero debounce every
/// save is written through immediately.
///
/// Example:
/// ```rust,ignore
/// let storage = Storage::new(root, "default".to_string());
/// let debounced = DebouncedStorage::new(storage, 500);
/// debounced.save(STATE_KEY, json)?;
/// ```
pub struct DebouncedStorage<S: RecordStore + Clone + 'static> {
    storage: S,
    debounce: Duration,
    sender: Sender<SaveMessage>,
    pending: Pending,
    write_lock: WriteLock,
    worker: Option<JoinHandle<()>>,
}

impl<S: RecordStore + Clone + 'static> DebouncedStorage<S> {
    /// Creates a new debounced storage with the given debounce delay in milliseconds.
    pub fn new(storage: S, debounce_ms: u64) -> Self {
        let (sender, receiver) = mpsc::channel();
        let pending: Pending = Arc::new(PLMutex::new(BTreeMap::new()));
        let write_lock: WriteLock = Arc::new(PLMutex::new(()));
        let pending_clone = pending.clone();
        let write_lock_clone = write_lock.clone();
        let storage_clone = storage.clone();
        let debounce = Duration::from_millis(debounce_ms);

        let worker = thread::spawn(move || {
            Self::worker_loop(
                receiver,
                storage_clone,
                pending_clone,
                write_lock_clone,
                debounce,
            );
        });

        Self {
            storage,
            debounce,
            sender,
            pending,
            write_lock,
            worker: Some(worker),
        }
    }

    pub fn inner(&self) -> &S {
        &self.storage
    }

    /// Queues a save operation (will be debounced).
    pub fn save(&self, key: &str, contents: String) -> StoreResult<()> {
        if self.debounce.is_zero() {
            return self.save_immediate(key, &contents);
        }
        self.pending.lock().insert(key.to_string(), contents);
        let _ = self.sender.send(SaveMessage::Save);
        Ok(())
    }

    /// Forces an immediate save, bypassing the debounce.
    pub fn save_immediate(&self, key: &str, contents: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        self.pending.lock().remove(key);
        self.storage.write(key, contents)
    }

    /// Writes every pending record now, after any batch the worker is
    /// already writing.
    pub fn flush(&self) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        let pending = std::mem::take(&mut *self.pending.lock());
        for (key, contents) in pending {
            self.storage.write(&key, &contents)?;
        }
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    fn write_pending(storage: &S, pending: &Pending, write_lock: &WriteLock) {
        let _guard = write_lock.lock();
        let batch = std::mem::take(&mut *pending.lock());
        for (key, contents) in batch {
            if let Err(e) = storage.write(&key, &contents) {
                diagnostics::log(format!("debounced_save_error key={} error={}", key, e));
            }
        }
    }

    fn worker_loop(
        receiver: Receiver<SaveMessage>,
        storage: S,
        pending: Pending,
        write_lock: WriteLock,
        debounce: Duration,
    ) {
        let mut last_request: Option<Instant> = None;

        loop {
            let timeout = if last_request.is_some() {
                debounce
            } else {
                Duration::from_secs(60)
            };

            match receiver.recv_timeout(timeout) {
                Ok(SaveMessage::Save) => {
                    last_request = Some(Instant::now());
                }
                Ok(SaveMessage::Shutdown) => {
                    Self::write_pending(&storage, &pending, &write_lock);
                    break;
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if let Some(t) = last_request {
                        if t.elapsed() >= debounce {
                            Self::write_pending(&storage, &pending, &write_lock);
                            last_request = None;
                        }
                    }
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

impl<S: RecordStore + Clone + 'static> Drop for DebouncedStorage<S> {
    fn drop(&mut self) {
        let _ = self.sender.send(SaveMessage::Shutdown);
        Self::write_pending(&self.storage, &self.pending, &self.write_lock);
        if let Some(w) = self.worker.take() {
            let _ = w.join();
        }
    }
}
