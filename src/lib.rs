//! Book catalog front-end. The same client drives the terminal UI and the
//! batch commands; which transport it talks through (HTTP API or embedded
//! host bridge) is decided once at startup.
pub mod catalog;
pub mod cli;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod transport;
pub mod ui;

pub use catalog::{Applied, CatalogClient, ViewState};
pub use error::{CatalogError, CatalogResult};
pub use models::{Book, NewBook, Summary};
pub use transport::{select, CatalogTransport, TransportConfig, TransportKind};
pub use ui::{run_app, App};
