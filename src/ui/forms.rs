use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, NewBook, CATEGORIES};

/// Form state for adding a book.
#[derive(Default, Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) date: String,
    /// Index into [`CATEGORIES`]; `None` until the user picks one.
    pub(crate) category: Option<usize>,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

/// Fields available within the book form, in focus order.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Date,
    Category,
}

impl BookForm {
    /// Move focus to the next field, wrapping around.
    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            BookField::Title => BookField::Author,
            BookField::Author => BookField::Date,
            BookField::Date => BookField::Category,
            BookField::Category => BookField::Title,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            BookField::Title => BookField::Category,
            BookField::Author => BookField::Title,
            BookField::Date => BookField::Author,
            BookField::Category => BookField::Date,
        };
    }

    /// Append a character to the active text field. The category is picked,
    /// not typed, so characters are refused there.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BookField::Title => self.title.push(ch),
            BookField::Author => self.author.push(ch),
            BookField::Date => self.date.push(ch),
            BookField::Category => return false,
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Title => {
                self.title.pop();
            }
            BookField::Author => {
                self.author.pop();
            }
            BookField::Date => {
                self.date.pop();
            }
            BookField::Category => self.category = None,
        }
    }

    /// Step through the category list; the first step from "unset" lands on
    /// the first (or last) entry.
    pub(crate) fn cycle_category(&mut self, offset: isize) {
        let len = CATEGORIES.len() as isize;
        let next = match self.category {
            None if offset >= 0 => 0,
            None => len - 1,
            Some(idx) => (idx as isize + offset).rem_euclid(len),
        };
        self.category = Some(next as usize);
    }

    pub(crate) fn category_name(&self) -> &'static str {
        self.category
            .and_then(|idx| CATEGORIES.get(idx).copied())
            .unwrap_or("")
    }

    /// Snapshot of the inputs; validation happens in the catalog client.
    pub(crate) fn to_new_book(&self) -> NewBook {
        NewBook::new(
            self.title.as_str(),
            self.author.as_str(),
            self.date.as_str(),
            self.category_name(),
        )
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field_name: &str, field: BookField) -> Line<'static> {
        let is_active = self.active == field;
        let value = match field {
            BookField::Title => self.title.clone(),
            BookField::Author => self.author.clone(),
            BookField::Date => self.date.clone(),
            BookField::Category => self.category_name().to_string(),
        };

        let display = if !value.is_empty() {
            value.clone()
        } else if field == BookField::Category {
            "<use ←/→ to choose>".to_string()
        } else {
            "<required>".to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Character count of the requested field, for cursor placement.
    pub(crate) fn value_len(&self, field: BookField) -> usize {
        match field {
            BookField::Title => self.title.chars().count(),
            BookField::Author => self.author.chars().count(),
            BookField::Date => self.date.chars().count(),
            BookField::Category => self.category_name().chars().count(),
        }
    }
}

/// State for confirming the deletion of one book.
pub(crate) struct ConfirmDelete {
    pub(crate) book: Book,
}
