//! Domain models shared by both transports, the embedded store and the TUI.
//! The types stay light-weight data holders; the field names follow the JSON
//! shape the catalog server speaks so the same structs serialize straight onto
//! the wire.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Filter value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";

/// The fixed set of categories a new book can be filed under. Ordering here is
/// the ordering used by the filter and the add form.
pub const CATEGORIES: &[&str] = &[
    "Novel",
    "Philosophy",
    "Poetry",
    "SciFi",
    "History",
    "Biography",
];

/// Normalize a user-facing filter value. `None`, blank and `All` all mean
/// "unfiltered".
pub fn category_filter(category: Option<&str>) -> Option<&str> {
    match category.map(str::trim) {
        None => None,
        Some(value) if value.is_empty() || value == ALL_CATEGORIES => None,
        Some(value) => Some(value),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A catalog entry as returned by either transport.
pub struct Book {
    /// Server-assigned identifier.
    pub id: i64,
    /// Title. The wire format calls it `name`.
    pub name: String,
    pub author: String,
    /// Free-form date. Some servers emit a bare year as a JSON number, so the
    /// decoder accepts both and keeps the text.
    #[serde(deserialize_with = "string_or_number")]
    pub date: String,
    pub category: String,
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.author)
    }
}

/// A book that has not been stored yet, so it carries no identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub name: String,
    pub author: String,
    pub date: String,
    pub category: String,
}

impl NewBook {
    pub fn new(
        name: impl Into<String>,
        author: impl Into<String>,
        date: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            date: date.into(),
            category: category.into(),
        }
    }

    /// Copy with every field trimmed, matching what the add form submits.
    pub fn trimmed(&self) -> Self {
        Self::new(
            self.name.trim(),
            self.author.trim(),
            self.date.trim(),
            self.category.trim(),
        )
    }

    /// Name of the first required field that is blank, if any.
    pub fn first_missing_field(&self) -> Option<&'static str> {
        [
            ("title", &self.name),
            ("author", &self.author),
            ("date", &self.date),
            ("category", &self.category),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

/// Catalog totals: how many books exist and how they spread over categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_books: usize,
    pub categories: BTreeMap<String, usize>,
}

impl Summary {
    pub fn from_books(books: &[Book]) -> Self {
        let mut categories = BTreeMap::new();
        for book in books {
            *categories.entry(book.category.clone()).or_insert(0) += 1;
        }
        Self {
            total_books: books.len(),
            categories,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Int(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_numeric_and_text_dates() {
        let books: Vec<Book> = serde_json::from_str(
            r#"[
                {"id": 1, "name": "Kokoro", "author": "Natsume Soseki", "date": 1914, "category": "Novel"},
                {"id": 2, "name": "Dune", "author": "Herbert", "date": "1965", "category": "SciFi"}
            ]"#,
        )
        .unwrap();

        assert_eq!(books[0].date, "1914");
        assert_eq!(books[1].date, "1965");
    }

    #[test]
    fn all_and_blank_filters_mean_unfiltered() {
        assert_eq!(category_filter(None), None);
        assert_eq!(category_filter(Some("All")), None);
        assert_eq!(category_filter(Some("  ")), None);
        assert_eq!(category_filter(Some("Poetry")), Some("Poetry"));
    }

    #[test]
    fn reports_first_blank_field() {
        let book = NewBook::new("Dune", "  ", "1965", "SciFi");
        assert_eq!(book.first_missing_field(), Some("author"));
        assert_eq!(NewBook::default().first_missing_field(), Some("title"));
        assert_eq!(
            NewBook::new("Dune", "Herbert", "1965", "SciFi").first_missing_field(),
            None
        );
    }

    #[test]
    fn summary_counts_per_category() {
        let books = vec![
            Book {
                id: 1,
                name: "Tulips".into(),
                author: "Sylvia Plath".into(),
                date: "1965".into(),
                category: "Poetry".into(),
            },
            Book {
                id: 2,
                name: "The Bell Jar".into(),
                author: "Sylvia Plath".into(),
                date: "1963".into(),
                category: "Novel".into(),
            },
            Book {
                id: 3,
                name: "Milk and honey".into(),
                author: "Rupi Kaur".into(),
                date: "2014".into(),
                category: "Poetry".into(),
            },
        ];

        let summary = Summary::from_books(&books);
        assert_eq!(summary.total_books, 3);
        assert_eq!(summary.categories.get("Poetry"), Some(&2));
        assert_eq!(summary.categories.get("Novel"), Some(&1));
    }
}
