//! Reader/writer gate around the shared directory
//!
//! Implements the classic reader-priority protocol: a short-held tally
//! mutex counts the readers in flight; the first reader in acquires the
//! writer-exclusion mutex on behalf of the whole group and the last reader
//! out releases it, while a writer takes the exclusion mutex directly.
//! A continuous stream of overlapping readers therefore keeps a waiting
//! writer out indefinitely; that admission order is part of the gate's
//! contract and the tests below pin it.
//!
//! Access is capability-scoped: the directory is only reachable through
//! [`DirectoryGate::with_read`] / [`DirectoryGate::with_write`] closures,
//! so every directory call runs under the matching permission by
//! construction. Closures are synchronous; nothing inside a critical
//! section blocks independently of the gate.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::directory::Directory;

/// Tally of active read sections, protected by a short-held mutex.
///
/// While at least one reader is active, the group's hold on the
/// writer-exclusion mutex is parked here as an owned guard.
struct ReaderTally {
    active: usize,
    excl_guard: Option<OwnedMutexGuard<()>>,
}

/// The concurrency gate wrapping every directory operation
pub struct DirectoryGate {
    /// Writer-exclusion primitive: held exclusively by one writer, or
    /// collectively by the group of active readers
    excl: Arc<Mutex<()>>,
    /// Reader tally
    tally: Mutex<ReaderTally>,
    /// The directory itself. Scheduling comes entirely from the two
    /// mutexes above; this cell only hands out `&` / `&mut`.
    data: RwLock<Directory>,
}

impl DirectoryGate {
    /// Wrap a directory in a fresh gate
    pub fn new(directory: Directory) -> Self {
        Self {
            excl: Arc::new(Mutex::new(())),
            tally: Mutex::new(ReaderTally {
                active: 0,
                excl_guard: None,
            }),
            data: RwLock::new(directory),
        }
    }

    /// Run a read-only query under read permission
    ///
    /// Any number of readers may be inside concurrently; no writer can be.
    pub async fn with_read<R>(&self, f: impl FnOnce(&Directory) -> R) -> R {
        self.start_read().await;
        let out = {
            let dir = self.data.read();
            f(&dir)
        };
        self.end_read().await;
        out
    }

    /// Run a mutation under exclusive write permission
    pub async fn with_write<R>(&self, f: impl FnOnce(&mut Directory) -> R) -> R {
        let _excl = self.excl.lock().await;
        let mut dir = self.data.write();
        f(&mut dir)
    }

    async fn start_read(&self) {
        let mut tally = self.tally.lock().await;
        tally.active += 1;
        if tally.active == 1 {
            // first reader locks writers out for the whole group
            tally.excl_guard = Some(self.excl.clone().lock_owned().await);
        }
    }

    async fn end_read(&self) {
        let mut tally = self.tally.lock().await;
        tally.active -= 1;
        if tally.active == 0 {
            // last reader lets writers back in
            tally.excl_guard = None;
        }
    }
}

impl Default for DirectoryGate {
    fn default() -> Self {
        Self::new(Directory::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use tokio::sync::mpsc;

    use crate::types::ConnId;

    #[tokio::test]
    async fn test_gate_scopes_directory_access() {
        let gate = Arc::new(DirectoryGate::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        gate.with_write(|dir| dir.register_user(ConnId(1), "alice", tx))
            .await
            .unwrap();

        let found = gate
            .with_read(|dir| dir.find_user_by_name("alice").map(|u| u.id))
            .await;
        assert_eq!(found, Some(ConnId(1)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_writer_overlaps_any_section() {
        let gate = Arc::new(DirectoryGate::default());
        let writers_inside = Arc::new(AtomicUsize::new(0));
        let readers_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();

        for _ in 0..4 {
            let gate = gate.clone();
            let w = writers_inside.clone();
            let r = readers_inside.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..10 {
                    gate.with_write(|_| {
                        assert_eq!(w.fetch_add(1, Ordering::SeqCst), 0);
                        assert_eq!(r.load(Ordering::SeqCst), 0);
                        std::thread::sleep(Duration::from_millis(1));
                        w.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
                }
            }));
        }

        for _ in 0..4 {
            let gate = gate.clone();
            let w = writers_inside.clone();
            let r = readers_inside.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..10 {
                    gate.with_read(|_| {
                        r.fetch_add(1, Ordering::SeqCst);
                        assert_eq!(w.load(Ordering::SeqCst), 0);
                        std::thread::sleep(Duration::from_millis(1));
                        r.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_share_the_section() {
        let gate = Arc::new(DirectoryGate::default());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let gate = gate.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                gate.with_read(|_| {
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(50));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
                .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(max_seen.load(Ordering::SeqCst) >= 2);
    }

    /// Late-arriving readers are admitted past a waiting writer; the
    /// writer only enters once the reader count drops to zero.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reader_priority_over_waiting_writer() {
        let gate = Arc::new(DirectoryGate::default());
        let events: Arc<StdMutex<Vec<&'static str>>> = Arc::new(StdMutex::new(Vec::new()));

        let mut handles = Vec::new();

        {
            let gate = gate.clone();
            let events = events.clone();
            handles.push(tokio::spawn(async move {
                gate.with_read(|_| {
                    events.lock().unwrap().push("reader-a in");
                    std::thread::sleep(Duration::from_millis(200));
                    events.lock().unwrap().push("reader-a out");
                })
                .await;
            }));
        }

        // let reader A settle in, then queue a writer behind it
        tokio::time::sleep(Duration::from_millis(50)).await;
        {
            let gate = gate.clone();
            let events = events.clone();
            handles.push(tokio::spawn(async move {
                gate.with_write(|_| {
                    events.lock().unwrap().push("writer in");
                })
                .await;
            }));
        }

        // a reader arriving while the writer waits still gets in first
        tokio::time::sleep(Duration::from_millis(50)).await;
        {
            let gate = gate.clone();
            let events = events.clone();
            handles.push(tokio::spawn(async move {
                gate.with_read(|_| {
                    events.lock().unwrap().push("reader-b in");
                    std::thread::sleep(Duration::from_millis(200));
                    events.lock().unwrap().push("reader-b out");
                })
                .await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let events = events.lock().unwrap();
        let pos = |e| events.iter().position(|&x| x == e).unwrap();
        assert!(pos("reader-b in") < pos("writer in"));
        assert!(pos("reader-a out") < pos("writer in"));
        assert!(pos("reader-b out") < pos("writer in"));
    }
}
