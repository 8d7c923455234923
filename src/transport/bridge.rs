//! Host bridge: the catalog served in-process by an embedded store.
//!
//! [`HostBridge`] mirrors the object a desktop host injects. Its methods are
//! callback-style and return immediately; a dedicated worker thread owns the
//! SQLite connection, runs each request in arrival order and hands the result
//! to the callback. Construction is asynchronous as well: [`HostBridge::spawn`]
//! yields a [`PendingBridge`] and only [`PendingBridge::wait_ready`] hands out
//! a usable bridge, so no request can be issued before the store is open.
//!
//! [`BridgeTransport`] adapts the callbacks to the blocking
//! [`CatalogTransport`] contract by waiting on each reply with a timeout.

use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use super::{CatalogTransport, TransportKind};
use crate::db;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Book, NewBook};

/// Where the bridge keeps its books.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    /// Seeded, throwaway store that lives as long as the bridge.
    Memory,
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreLocation::File(path) => write!(f, "{}", path.display()),
            StoreLocation::Memory => write!(f, ":memory:"),
        }
    }
}

type Job = Box<dyn FnOnce(&Connection) + Send + 'static>;

/// Callback handed to the bridge; invoked once on the worker thread.
pub type Reply<T> = Box<dyn FnOnce(CatalogResult<T>) + Send + 'static>;

/// A bridge whose store is still being opened.
pub struct PendingBridge {
    bridge: HostBridge,
    ready: Receiver<Result<(), String>>,
}

impl PendingBridge {
    /// Block until the worker reports the store open, or fail.
    pub fn wait_ready(self, timeout: Duration) -> CatalogResult<HostBridge> {
        let reason = match self.ready.recv_timeout(timeout) {
            Ok(Ok(())) => {
                info!("bridge ready");
                return Ok(self.bridge);
            }
            Ok(Err(reason)) => reason,
            Err(RecvTimeoutError::Timeout) => {
                format!("bridge not ready after {}s", timeout.as_secs())
            }
            Err(RecvTimeoutError::Disconnected) => "bridge worker exited during startup".to_string(),
        };

        Err(CatalogError::Init {
            transport: "bridge",
            reason,
        })
    }
}

/// Callback-style catalog API served by the embedded store.
pub struct HostBridge {
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl HostBridge {
    /// Start the worker thread. Opening and migrating the store happens on
    /// that thread; the returned handle reports when it is done.
    pub fn spawn(location: StoreLocation) -> CatalogResult<PendingBridge> {
        let (jobs_tx, jobs_rx) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("bookshelf-bridge".to_string())
            .spawn(move || {
                let opened = match &location {
                    StoreLocation::File(path) => db::open_store(path),
                    StoreLocation::Memory => db::open_in_memory(),
                };
                let conn = match opened {
                    Ok(conn) => {
                        let _ = ready_tx.send(Ok(()));
                        conn
                    }
                    Err(err) => {
                        let reason = format!("{err:#}");
                        warn!(store = %location, error = %reason, "bridge store failed to open");
                        let _ = ready_tx.send(Err(reason));
                        return;
                    }
                };

                debug!(store = %location, "bridge worker serving");
                for job in jobs_rx {
                    job(&conn);
                }
                debug!("bridge worker stopped");
            })
            .map_err(|err| CatalogError::Init {
                transport: "bridge",
                reason: format!("failed to spawn bridge worker: {err}"),
            })?;

        Ok(PendingBridge {
            bridge: HostBridge {
                jobs: Some(jobs_tx),
                worker: Some(worker),
            },
            ready: ready_rx,
        })
    }

    pub fn get_books(&self, category: Option<String>, callback: Reply<Vec<Book>>) {
        self.dispatch(
            move |conn| db::fetch_books(conn, category.as_deref()).map_err(store_error),
            callback,
        );
    }

    pub fn search_books(&self, term: String, callback: Reply<Vec<Book>>) {
        self.dispatch(
            move |conn| db::search_books(conn, &term).map_err(store_error),
            callback,
        );
    }

    pub fn add_book(&self, book: NewBook, callback: Reply<Book>) {
        self.dispatch(
            move |conn| db::create_book(conn, &book).map_err(store_error),
            callback,
        );
    }

    pub fn delete_book(&self, id: i64, callback: Reply<()>) {
        self.dispatch(
            move |conn| match db::delete_book(conn, id) {
                Ok(true) => Ok(()),
                Ok(false) => Err(CatalogError::NotFound(id)),
                Err(err) => Err(store_error(err)),
            },
            callback,
        );
    }

    pub fn erase_all(&self, callback: Reply<()>) {
        self.dispatch(
            |conn| db::erase_books(conn).map(|_| ()).map_err(store_error),
            callback,
        );
    }

    /// Queue `work` on the worker. If the worker is gone the job (and with it
    /// the callback) is dropped, which callers observe as a disconnect.
    fn dispatch<T, F>(&self, work: F, callback: Reply<T>)
    where
        T: 'static,
        F: FnOnce(&Connection) -> CatalogResult<T> + Send + 'static,
    {
        let Some(jobs) = &self.jobs else {
            return;
        };
        let job: Job = Box::new(move |conn| callback(work(conn)));
        if jobs.send(job).is_err() {
            warn!("bridge worker is no longer running");
        }
    }
}

impl Drop for HostBridge {
    fn drop(&mut self) {
        // Closing the queue ends the worker loop.
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("bridge worker panicked");
            }
        }
    }
}

fn store_error(err: anyhow::Error) -> CatalogError {
    CatalogError::Bridge(format!("{err:#}"))
}

/// Blocking adapter over [`HostBridge`].
pub struct BridgeTransport {
    bridge: HostBridge,
    timeout: Duration,
}

impl BridgeTransport {
    /// Spawn a bridge over `location` and wait for it to become ready.
    pub fn connect(location: StoreLocation, timeout: Duration) -> CatalogResult<Self> {
        let bridge = HostBridge::spawn(location)?.wait_ready(timeout)?;
        Ok(Self::from_bridge(bridge, timeout))
    }

    pub fn from_bridge(bridge: HostBridge, timeout: Duration) -> Self {
        Self { bridge, timeout }
    }

    fn call<T, F>(&self, operation: &'static str, issue: F) -> CatalogResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&HostBridge, Reply<T>),
    {
        let (tx, rx) = mpsc::channel();
        debug!(operation, "calling bridge");
        issue(
            &self.bridge,
            Box::new(move |result| {
                // The caller may have given up waiting; a late reply is dropped.
                let _ = tx.send(result);
            }),
        );

        match rx.recv_timeout(self.timeout) {
            Ok(result) => {
                if let Err(err) = &result {
                    warn!(operation, error = %err, "bridge call failed");
                }
                result
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(operation, "bridge call timed out");
                Err(CatalogError::Timeout {
                    operation,
                    after: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(CatalogError::Bridge(
                "bridge stopped before answering".to_string(),
            )),
        }
    }
}

impl CatalogTransport for BridgeTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Bridge
    }

    fn list(&self, category: Option<&str>) -> CatalogResult<Vec<Book>> {
        let category = category.map(str::to_string);
        self.call("list", move |bridge, reply| bridge.get_books(category, reply))
    }

    fn search(&self, term: &str) -> CatalogResult<Vec<Book>> {
        let term = term.to_string();
        self.call("search", move |bridge, reply| bridge.search_books(term, reply))
    }

    fn add(&self, book: &NewBook) -> CatalogResult<Book> {
        let book = book.clone();
        self.call("add", move |bridge, reply| bridge.add_book(book, reply))
    }

    fn delete(&self, id: i64) -> CatalogResult<()> {
        self.call("delete", move |bridge, reply| bridge.delete_book(id, reply))
    }

    fn erase_all(&self) -> CatalogResult<()> {
        self.call("erase", |bridge, reply| bridge.erase_all(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_bridge() -> HostBridge {
        HostBridge::spawn(StoreLocation::Memory)
            .unwrap()
            .wait_ready(Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn callbacks_receive_results() {
        let bridge = memory_bridge();
        let (tx, rx) = mpsc::channel();
        bridge.get_books(
            Some("Philosophy".to_string()),
            Box::new(move |result| tx.send(result).unwrap()),
        );

        let books = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(books.len(), 3);
    }

    #[test]
    fn requests_are_served_in_order() {
        let bridge = memory_bridge();
        let (tx, rx) = mpsc::channel();

        let add_tx = tx.clone();
        bridge.add_book(
            NewBook::new("Dune", "Herbert", "1965", "SciFi"),
            Box::new(move |result| add_tx.send(result.map(|_| 0)).unwrap()),
        );
        bridge.search_books(
            "dune".to_string(),
            Box::new(move |result| tx.send(result.map(|books| books.len())).unwrap()),
        );

        assert_eq!(rx.recv().unwrap().unwrap(), 0);
        assert_eq!(rx.recv().unwrap().unwrap(), 1);
    }

    #[test]
    fn unknown_delete_is_not_found() {
        let transport = BridgeTransport::from_bridge(memory_bridge(), Duration::from_secs(5));
        assert!(matches!(
            transport.delete(999),
            Err(CatalogError::NotFound(999))
        ));
    }
}
