use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{CatalogTransport, TransportKind};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Book, NewBook};

/// Talks to the catalog's JSON API over HTTP.
pub struct HttpTransport {
    client: Client,
    base: Url,
    timeout: Duration,
}

/// `POST /api/books` answers either with the record itself or wrapped as
/// `{"success": true, "book": {...}}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Created {
    Wrapped { book: Book },
    Bare(Book),
}

impl From<Created> for Book {
    fn from(created: Created) -> Self {
        match created {
            Created::Wrapped { book } | Created::Bare(book) => book,
        }
    }
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> CatalogResult<Self> {
        let mut base = Url::parse(base_url).map_err(|err| CatalogError::Init {
            transport: "network",
            reason: format!("invalid API URL {base_url:?}: {err}"),
        })?;
        // Endpoints are joined relatively, so a path prefix must end in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| CatalogError::Init {
                transport: "network",
                reason: err.to_string(),
            })?;

        Ok(Self {
            client,
            base,
            timeout,
        })
    }

    fn endpoint(&self, path: &str) -> CatalogResult<Url> {
        self.base
            .join(path)
            .map_err(|err| CatalogError::Transport(format!("bad endpoint {path}: {err}")))
    }

    fn send(&self, operation: &'static str, request: RequestBuilder) -> CatalogResult<Response> {
        debug!(operation, "sending request");
        let response = request
            .send()
            .map_err(|err| self.request_error(operation, err))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            warn!(operation, status = status.as_u16(), "request rejected");
            Err(CatalogError::Rejected {
                status: status.as_u16(),
            })
        }
    }

    fn request_error(&self, operation: &'static str, err: reqwest::Error) -> CatalogError {
        if err.is_timeout() {
            warn!(operation, "request timed out");
            CatalogError::Timeout {
                operation,
                after: self.timeout,
            }
        } else {
            warn!(operation, error = %err, "request failed");
            CatalogError::from(err)
        }
    }

    fn read_books(&self, operation: &'static str, response: Response) -> CatalogResult<Vec<Book>> {
        response
            .json::<Vec<Book>>()
            .map_err(|err| self.request_error(operation, err))
    }
}

impl CatalogTransport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Network
    }

    fn list(&self, category: Option<&str>) -> CatalogResult<Vec<Book>> {
        let mut request = self.client.get(self.endpoint("api/books")?);
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        let response = self.send("list", request)?;
        self.read_books("list", response)
    }

    fn search(&self, term: &str) -> CatalogResult<Vec<Book>> {
        let request = self
            .client
            .post(self.endpoint("api/books/search")?)
            .json(&json!({ "name": term }));
        let response = self.send("search", request)?;
        self.read_books("search", response)
    }

    fn add(&self, book: &NewBook) -> CatalogResult<Book> {
        let request = self.client.post(self.endpoint("api/books")?).json(book);
        let response = self.send("add", request)?;
        response
            .json::<Created>()
            .map(Book::from)
            .map_err(|err| self.request_error("add", err))
    }

    fn delete(&self, id: i64) -> CatalogResult<()> {
        let request = self.client.delete(self.endpoint(&format!("api/books/{id}"))?);
        match self.send("delete", request) {
            Ok(_) => Ok(()),
            Err(CatalogError::Rejected { status }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(CatalogError::NotFound(id))
            }
            Err(err) => Err(err),
        }
    }

    fn erase_all(&self) -> CatalogResult<()> {
        let request = self.client.post(self.endpoint("api/books/erase")?);
        self.send("erase", request).map(|_| ())
    }
}
