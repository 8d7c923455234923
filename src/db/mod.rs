//! Embedded SQLite store backing the host bridge, split across logical
//! submodules.

mod books;
mod connection;
mod seed;

pub use books::{create_book, delete_book, erase_books, fetch_books, search_books};
pub use connection::{data_dir, default_db_path, ensure_schema, open_in_memory, open_store};
