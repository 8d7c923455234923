//! Catalog client and the view state it keeps in sync.
//!
//! Every operation follows the same shape: talk to the bound transport, and
//! only once that succeeded replace the [`ViewState`] collection in one step.
//! A failed call leaves the view exactly as it was.

use tracing::{info, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::models::{category_filter, Book, NewBook, Summary, ALL_CATEGORIES};
use crate::transport::{CatalogTransport, TransportKind};

/// What the renderer shows: the current collection, the optional selection
/// and the inputs that produced the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    books: Vec<Book>,
    selected: Option<i64>,
    category: String,
    search: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            books: Vec::new(),
            selected: None,
            category: ALL_CATEGORIES.to_string(),
            search: String::new(),
        }
    }
}

impl ViewState {
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    pub fn selected_book(&self) -> Option<&Book> {
        let id = self.selected?;
        self.books.iter().find(|book| book.id == id)
    }

    /// Active category filter; `All` when unfiltered.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Contents of the search input.
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Select `id`, or clear the selection if `id` is already selected.
    /// Identifiers outside the collection are ignored.
    pub fn toggle_selection(&mut self, id: i64) {
        if self.selected == Some(id) {
            self.selected = None;
        } else if self.books.iter().any(|book| book.id == id) {
            self.selected = Some(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    fn replace(&mut self, books: Vec<Book>) {
        self.books = books;
        self.selected = None;
    }
}

/// A change the store accepted. `reload` carries the error of the follow-up
/// list when that failed; the view then still shows the previous collection.
#[derive(Debug)]
pub struct Applied<T> {
    pub value: T,
    pub reload: Option<CatalogError>,
}

/// The four catalog operations (plus erase and summary), written once against
/// whichever transport was bound at startup.
pub struct CatalogClient {
    transport: Box<dyn CatalogTransport>,
}

impl CatalogClient {
    pub fn new(transport: Box<dyn CatalogTransport>) -> Self {
        Self { transport }
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Load the books in `category` (`None`/`All` for everything) into the
    /// view. Returns how many were loaded.
    pub fn list(&self, view: &mut ViewState, category: Option<&str>) -> CatalogResult<usize> {
        let filter = category_filter(category);
        let books = self.transport.list(filter)?;
        let count = books.len();
        view.replace(books);
        view.category = filter.unwrap_or(ALL_CATEGORIES).to_string();
        Ok(count)
    }

    /// Load books whose title contains `term`, across every category. A
    /// blank term is the same as an unfiltered [`CatalogClient::list`].
    pub fn search(&self, view: &mut ViewState, term: &str) -> CatalogResult<usize> {
        let term = term.trim();
        if term.is_empty() {
            let count = self.list(view, None)?;
            view.search.clear();
            return Ok(count);
        }

        let books = self.transport.search(term)?;
        let count = books.len();
        view.replace(books);
        view.category = ALL_CATEGORIES.to_string();
        view.search = term.to_string();
        Ok(count)
    }

    /// Validate and store a new book, then reload the view under the current
    /// filter and clear the search input. Blank fields are rejected before the
    /// transport is contacted.
    pub fn add(
        &self,
        view: &mut ViewState,
        candidate: &NewBook,
    ) -> CatalogResult<Applied<Book>> {
        let candidate = candidate.trimmed();
        if let Some(field) = candidate.first_missing_field() {
            return Err(CatalogError::MissingField(field));
        }

        let created = self.transport.add(&candidate)?;
        info!(id = created.id, name = %created.name, "book added");

        view.search.clear();
        Ok(self.refresh(view, created))
    }

    /// Delete `id`, then clear the selection and reload under the current
    /// filter.
    pub fn delete(&self, view: &mut ViewState, id: i64) -> CatalogResult<Applied<()>> {
        if let Err(err) = self.transport.delete(id) {
            warn!(id, error = %err, "delete failed");
            return Err(err);
        }
        info!(id, "book deleted");

        view.clear_selection();
        Ok(self.refresh(view, ()))
    }

    /// Remove every book and reload.
    pub fn erase_all(&self, view: &mut ViewState) -> CatalogResult<Applied<()>> {
        self.transport.erase_all()?;
        info!("catalog erased");

        view.clear_selection();
        Ok(self.refresh(view, ()))
    }

    /// Reload after a change that already reached the store. A failed reload
    /// leaves the old collection in place and is handed back, not raised.
    fn refresh<T>(&self, view: &mut ViewState, value: T) -> Applied<T> {
        let category = view.category.clone();
        let reload = self.list(view, Some(category.as_str())).err();
        if let Some(err) = &reload {
            warn!(error = %err, "reload after change failed");
        }
        Applied { value, reload }
    }

    /// Totals across the whole catalog. Does not touch any view.
    pub fn summary(&self) -> CatalogResult<Summary> {
        let books = self.transport.list(None)?;
        Ok(Summary::from_books(&books))
    }
}
