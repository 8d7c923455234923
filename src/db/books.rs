use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use crate::models::{category_filter, Book, NewBook};

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        name: row.get(1)?,
        author: row.get(2)?,
        date: row.get(3)?,
        category: row.get(4)?,
    })
}

/// Retrieve books in insertion order, optionally restricted to one category.
/// `All` and blank filters return everything.
pub fn fetch_books(conn: &Connection, category: Option<&str>) -> Result<Vec<Book>> {
    let books = match category_filter(category) {
        Some(category) => {
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, author, date, category FROM books
                     WHERE category = ?1
                     ORDER BY id",
                )
                .context("failed to prepare category query")?;
            let rows = stmt
                .query_map([category], book_from_row)
                .context("failed to iterate books")?
                .collect::<Result<Vec<_>, _>>()
                .context("failed to collect books")?;
            rows
        }
        None => {
            let mut stmt = conn
                .prepare("SELECT id, name, author, date, category FROM books ORDER BY id")
                .context("failed to prepare books query")?;
            let rows = stmt
                .query_map([], book_from_row)
                .context("failed to iterate books")?
                .collect::<Result<Vec<_>, _>>()
                .context("failed to collect books")?;
            rows
        }
    };

    Ok(books)
}

/// Case-insensitive substring match on the title. SQLite's `LOWER` only folds
/// ASCII, so the comparison happens on the Rust side.
pub fn search_books(conn: &Connection, term: &str) -> Result<Vec<Book>> {
    let needle = term.trim().to_lowercase();
    let books = fetch_books(conn, None)?;
    Ok(books
        .into_iter()
        .filter(|book| book.name.to_lowercase().contains(&needle))
        .collect())
}

/// Insert a book and echo it back with its new identifier. `AUTOINCREMENT`
/// guarantees identifiers are never reused, even after deletes.
pub fn create_book(conn: &Connection, book: &NewBook) -> Result<Book> {
    conn.execute(
        "INSERT INTO books (name, author, date, category) VALUES (?1, ?2, ?3, ?4)",
        params![book.name, book.author, book.date, book.category],
    )
    .context("failed to insert book")?;

    let id = conn.last_insert_rowid();
    Ok(Book {
        id,
        name: book.name.clone(),
        author: book.author.clone(),
        date: book.date.clone(),
        category: book.category.clone(),
    })
}

/// Remove a book. Returns `false` when no row had that identifier.
pub fn delete_book(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM books WHERE id = ?1", params![id])
        .context("failed to delete book")?;
    Ok(deleted > 0)
}

/// Drop every book, returning how many were removed.
pub fn erase_books(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM books", [])
        .context("failed to erase books")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use pretty_assertions::assert_eq;

    #[test]
    fn fresh_store_is_seeded() {
        let conn = open_in_memory().unwrap();
        let books = fetch_books(&conn, None).unwrap();
        assert_eq!(books.len(), 23);
        assert_eq!(books[0].name, "Madonna in a Fur Coat");
        assert_eq!(books.iter().filter(|b| b.category == "Novel").count(), 18);
    }

    #[test]
    fn category_filter_restricts_rows() {
        let conn = open_in_memory().unwrap();
        let poetry = fetch_books(&conn, Some("Poetry")).unwrap();
        assert_eq!(poetry.len(), 2);
        assert!(poetry.iter().all(|book| book.category == "Poetry"));
        assert_eq!(fetch_books(&conn, Some("All")).unwrap().len(), 23);
    }

    #[test]
    fn search_ignores_case() {
        let conn = open_in_memory().unwrap();
        let hits = search_books(&conn, "the ID").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "The Idiot");
    }

    #[test]
    fn identifiers_are_not_reused_after_delete() {
        let conn = open_in_memory().unwrap();
        let first = create_book(&conn, &NewBook::new("Dune", "Herbert", "1965", "SciFi")).unwrap();
        assert!(delete_book(&conn, first.id).unwrap());
        let second =
            create_book(&conn, &NewBook::new("Hyperion", "Simmons", "1989", "SciFi")).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn delete_reports_missing_rows() {
        let conn = open_in_memory().unwrap();
        assert!(!delete_book(&conn, 999).unwrap());
    }

    #[test]
    fn erased_store_stays_empty_on_reopen() {
        let conn = open_in_memory().unwrap();
        assert_eq!(erase_books(&conn).unwrap(), 23);
        crate::db::ensure_schema(&conn).unwrap();
        assert!(fetch_books(&conn, None).unwrap().is_empty());
    }
}
