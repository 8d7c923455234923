//! The two ways of reaching the catalog and the one-time choice between them.
//!
//! [`CatalogTransport`] is the seam: the client only ever talks to a boxed
//! trait object, never to the HTTP or bridge types directly. [`select`] binds
//! exactly one implementation per session and does not return until that
//! implementation is ready to serve requests.

mod bridge;
mod http;

use std::fmt;
use std::time::Duration;

use tracing::{error, info};

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Book, NewBook};

pub use bridge::{BridgeTransport, HostBridge, PendingBridge, Reply, StoreLocation};
pub use http::HttpTransport;

/// Default time allowed for any single transport call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Which implementation is bound for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Network,
    Bridge,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Network => write!(f, "network"),
            TransportKind::Bridge => write!(f, "bridge"),
        }
    }
}

/// Catalog operations every transport provides with the same result shapes.
/// Calls block until the collaborator answers or the timeout elapses.
pub trait CatalogTransport {
    fn kind(&self) -> TransportKind;

    /// Books in `category`, or all books when `category` is `None`.
    fn list(&self, category: Option<&str>) -> CatalogResult<Vec<Book>>;

    /// Books whose title contains `term`. Callers pass a non-blank term.
    fn search(&self, term: &str) -> CatalogResult<Vec<Book>>;

    fn add(&self, book: &NewBook) -> CatalogResult<Book>;

    fn delete(&self, id: i64) -> CatalogResult<()>;

    fn erase_all(&self) -> CatalogResult<()>;
}

/// Inputs for the startup decision.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL of the catalog HTTP API.
    pub api_url: String,
    /// Set when the host injected a bridge; names the store it serves.
    pub bridge: Option<StoreLocation>,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            bridge: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Bind the session's transport. A signalled bridge that fails to come up is
/// an initialization error; there is no fallback to the network.
pub fn select(config: &TransportConfig) -> CatalogResult<Box<dyn CatalogTransport>> {
    let transport: Box<dyn CatalogTransport> = match &config.bridge {
        Some(location) => {
            info!(store = %location, "host bridge detected");
            let bridge = BridgeTransport::connect(location.clone(), config.timeout)
                .map_err(|err| init_error(TransportKind::Bridge, err))?;
            Box::new(bridge)
        }
        None => {
            let http = HttpTransport::new(&config.api_url, config.timeout)
                .map_err(|err| init_error(TransportKind::Network, err))?;
            Box::new(http)
        }
    };

    info!(transport = %transport.kind(), "transport bound");
    Ok(transport)
}

fn init_error(kind: TransportKind, err: CatalogError) -> CatalogError {
    error!(transport = %kind, error = %err, "transport initialization failed");
    match err {
        CatalogError::Init { .. } => err,
        other => CatalogError::Init {
            transport: match kind {
                TransportKind::Network => "network",
                TransportKind::Bridge => "bridge",
            },
            reason: other.to_string(),
        },
    }
}
