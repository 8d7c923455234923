use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Cell, Row};

use crate::models::Book;

/// Marker drawn in front of the selected book.
pub(crate) const SELECTED_MARKER: &str = "●";

/// Build one table row. The selected book is bold, green and marked.
pub(crate) fn book_row(book: &Book, selected: bool) -> Row<'static> {
    let marker = if selected { SELECTED_MARKER } else { " " };
    let row = Row::new(vec![
        Cell::from(marker),
        Cell::from(book.name.clone()),
        Cell::from(book.author.clone()),
        Cell::from(book.date.clone()),
        Cell::from(book.category.clone()),
    ]);

    if selected {
        row.style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        row
    }
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}
