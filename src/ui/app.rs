use std::cmp::min;
use std::mem;

use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use tracing::error;

use crate::catalog::{CatalogClient, ViewState};
use crate::error::CatalogError;
use crate::models::{Book, ALL_CATEGORIES, CATEGORIES};

use super::forms::{BookField, BookForm, ConfirmDelete};
use super::helpers::{book_row, centered_rect};

/// Rows reserved for the filter/search summary above the table.
const HEADER_HEIGHT: u16 = 3;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 10;

/// What the keyboard currently drives.
enum Mode {
    Normal,
    Searching(SearchState),
    AddingBook(BookForm),
    ConfirmDelete(ConfirmDelete),
    ConfirmErase,
}

/// State for the search bar while the user types.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Terminal front-end state: the catalog client, the view it keeps in sync
/// and the purely presentational bits (cursor, mode, footer status).
pub struct App {
    client: CatalogClient,
    view: ViewState,
    cursor: usize,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(client: CatalogClient) -> Self {
        Self {
            client,
            view: ViewState::default(),
            cursor: 0,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Initial unfiltered load. A failure is shown in the footer rather than
    /// aborting, so the user can retry with `r`.
    pub fn load(&mut self) {
        match self.client.list(&mut self.view, None) {
            Ok(count) => {
                self.after_reload();
                self.set_status(
                    format!("Loaded {count} books via {}.", self.client.transport_kind()),
                    StatusKind::Info,
                );
            }
            Err(err) => self.report_failure("Error loading books", &err),
        }
    }

    /// Feed one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Searching(state) => self.handle_search(code, state),
            Mode::AddingBook(form) => self.handle_add_book(code, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::ConfirmErase => self.handle_confirm_erase(code),
        };

        exit
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::PageUp => self.move_cursor(-PAGE_STEP),
            KeyCode::PageDown => self.move_cursor(PAGE_STEP),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.view.books().len().saturating_sub(1),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current(),
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.clear_status();
                return Mode::Searching(SearchState {
                    query: self.view.search().to_string(),
                });
            }
            KeyCode::Char('c') => self.cycle_category(1),
            KeyCode::Char('C') => self.cycle_category(-1),
            KeyCode::Char('+') | KeyCode::Char('n') => {
                self.clear_status();
                return Mode::AddingBook(BookForm::default());
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(book) = self.delete_target() {
                    self.clear_status();
                    return Mode::ConfirmDelete(ConfirmDelete { book });
                }
                self.set_status("No book selected to delete.", StatusKind::Error);
            }
            KeyCode::Char('E') => match self.client.summary() {
                Ok(summary) if summary.total_books == 0 => {
                    self.set_status("Nothing to erase.", StatusKind::Error);
                }
                Ok(_) => {
                    self.clear_status();
                    return Mode::ConfirmErase;
                }
                Err(err) => self.report_failure("Error loading books", &err),
            },
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('s') => self.show_summary(),
            _ => {}
        }
        Mode::Normal
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Search cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Enter => {
                self.run_search(&state.query);
                return Mode::Normal;
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => {}
        }
        Mode::Searching(state)
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add book cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left if form.active == BookField::Category => {
                form.cycle_category(-1);
                form.error = None;
            }
            KeyCode::Right if form.active == BookField::Category => {
                form.cycle_category(1);
                form.error = None;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.client.add(&mut self.view, &form.to_new_book()) {
                Ok(applied) => {
                    let book = applied.value;
                    self.report_change(format!("Added '{}'.", book.name), applied.reload);
                    if let Some(idx) = self.view.books().iter().position(|b| b.id == book.id) {
                        self.cursor = idx;
                    }
                    keep_open = false;
                }
                Err(err) => {
                    form.error = Some(err.to_string());
                    self.report_failure("Error adding book", &err);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Mode::AddingBook(form)
        } else {
            Mode::Normal
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.client.delete(&mut self.view, confirm.book.id) {
                    Ok(applied) => self.report_change(
                        format!("Deleted '{}'.", confirm.book.name),
                        applied.reload,
                    ),
                    Err(err) => self.report_failure("Error deleting book", &err),
                }
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn handle_confirm_erase(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Erase cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.client.erase_all(&mut self.view) {
                    Ok(applied) => {
                        self.report_change("Erased every book.".to_string(), applied.reload)
                    }
                    Err(err) => self.report_failure("Error erasing books", &err),
                }
                Mode::Normal
            }
            _ => Mode::ConfirmErase,
        }
    }

    /// Re-run whatever produced the current collection.
    fn reload(&mut self) {
        if !self.view.search().trim().is_empty() {
            let term = self.view.search().to_string();
            self.run_search(&term);
            return;
        }

        let category = self.view.category().to_string();
        match self.client.list(&mut self.view, Some(&category)) {
            Ok(count) => {
                self.after_reload();
                self.set_status(format!("Reloaded {count} books."), StatusKind::Info);
            }
            Err(err) => self.report_failure("Error loading books", &err),
        }
    }

    fn run_search(&mut self, term: &str) {
        match self.client.search(&mut self.view, term) {
            Ok(count) => {
                self.after_reload();
                let message = if term.trim().is_empty() {
                    format!("Showing all {count} books.")
                } else {
                    format!("Found {count} books matching '{}'.", term.trim())
                };
                self.set_status(message, StatusKind::Info);
            }
            Err(err) => self.report_failure("Error searching books", &err),
        }
    }

    /// Step the category filter through `All` and the fixed categories.
    fn cycle_category(&mut self, offset: isize) {
        let options: Vec<&str> = std::iter::once(ALL_CATEGORIES)
            .chain(CATEGORIES.iter().copied())
            .collect();
        let current = options
            .iter()
            .position(|option| *option == self.view.category())
            .unwrap_or(0) as isize;
        let next = options[(current + offset).rem_euclid(options.len() as isize) as usize];

        match self.client.list(&mut self.view, Some(next)) {
            Ok(count) => {
                // The search bar no longer describes what is shown.
                self.view.set_search("");
                self.after_reload();
                self.set_status(
                    format!("Showing {count} books in {next}."),
                    StatusKind::Info,
                );
            }
            Err(err) => self.report_failure("Error loading books", &err),
        }
    }

    fn show_summary(&mut self) {
        match self.client.summary() {
            Ok(summary) => {
                let parts: Vec<String> = summary
                    .categories
                    .iter()
                    .map(|(category, count)| format!("{category} {count}"))
                    .collect();
                let text = if parts.is_empty() {
                    format!("{} books.", summary.total_books)
                } else {
                    format!("{} books: {}.", summary.total_books, parts.join(", "))
                };
                self.set_status(text, StatusKind::Info);
            }
            Err(err) => self.report_failure("Error loading summary", &err),
        }
    }

    fn toggle_current(&mut self) {
        let Some(book) = self.view.books().get(self.cursor) else {
            return;
        };
        let (id, name) = (book.id, book.name.clone());
        self.view.toggle_selection(id);
        if self.view.selected() == Some(id) {
            self.set_status(format!("Selected '{name}'."), StatusKind::Info);
        } else {
            self.set_status("Selection cleared.", StatusKind::Info);
        }
    }

    /// The selected book, or the one under the cursor when nothing is selected.
    fn delete_target(&self) -> Option<Book> {
        self.view
            .selected_book()
            .or_else(|| self.view.books().get(self.cursor))
            .cloned()
    }

    fn move_cursor(&mut self, offset: isize) {
        let len = self.view.books().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let target = (self.cursor as isize + offset).clamp(0, len as isize - 1);
        self.cursor = target as usize;
    }

    fn after_reload(&mut self) {
        self.cursor = min(self.cursor, self.view.books().len().saturating_sub(1));
    }

    /// Status for a change the store accepted. When the reload after it
    /// failed, the table is stale and the user is pointed at `r`.
    fn report_change(&mut self, done: String, reload: Option<CatalogError>) {
        self.after_reload();
        match reload {
            None => self.set_status(done, StatusKind::Info),
            Some(err) => {
                error!(error = %err, "reload after change failed");
                self.set_status(
                    format!("{done} Reloading failed: {err}. Press r to retry."),
                    StatusKind::Error,
                );
            }
        }
    }

    fn report_failure(&mut self, context: &str, err: &CatalogError) {
        let text = match err {
            CatalogError::MissingField(_) => err.to_string(),
            _ if err.is_retryable() => {
                error!(error = %err, "{context}");
                format!("{context}: {err}. Press r to retry.")
            }
            _ => {
                error!(error = %err, "{context}");
                format!("{context}: {err}.")
            }
        };
        self.set_status(text, StatusKind::Error);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        self.draw_books(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::AddingBook(form) => self.draw_book_form(frame, area, form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::ConfirmErase => self.draw_confirm_erase(frame, area),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let label_style = Style::default().add_modifier(Modifier::BOLD);
        let search = if self.view.search().is_empty() {
            Span::styled("-", Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(self.view.search().to_string())
        };

        let line = Line::from(vec![
            Span::styled("Category: ", label_style),
            Span::raw(self.view.category().to_string()),
            Span::raw("   "),
            Span::styled("Search: ", label_style),
            search,
            Span::raw("   "),
            Span::styled(
                format!("via {}", self.client.transport_kind()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);

        let paragraph = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL).title("Online Library"));
        frame.render_widget(paragraph, area);
    }

    fn draw_books(&self, frame: &mut Frame, area: Rect) {
        let books = self.view.books();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Books ({})", books.len()));

        if books.is_empty() {
            let message = Paragraph::new("No books found")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let selected = self.view.selected();
        let rows: Vec<Row> = books
            .iter()
            .map(|book| book_row(book, selected == Some(book.id)))
            .collect();

        let header = Row::new(vec!["", "Title", "Author", "Date", "Category"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let table = Table::new(
            rows,
            [
                Constraint::Length(1),
                Constraint::Percentage(45),
                Constraint::Percentage(30),
                Constraint::Length(8),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = TableState::default().with_selected(Some(self.cursor));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.mode {
            Mode::Searching(_) => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Search   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::AddingBook(_) => Line::from(vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Next Field   "),
                Span::styled("[←→]", key_style),
                Span::raw(" Category   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::ConfirmDelete(_) | Mode::ConfirmErase => Line::from(vec![
                Span::styled("[y]", key_style),
                Span::raw(" Confirm   "),
                Span::styled("[n]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::Normal => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Move   "),
                Span::styled("[Space]", key_style),
                Span::raw(" Select   "),
                Span::styled("[f]", key_style),
                Span::raw(" Search   "),
                Span::styled("[c]", key_style),
                Span::raw(" Category   "),
                Span::styled("[+]", key_style),
                Span::raw(" New   "),
                Span::styled("[-]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[E]", key_style),
                Span::raw(" Erase All   "),
                Span::styled("[s]", key_style),
                Span::raw(" Summary   "),
                Span::styled("[r]", key_style),
                Span::raw(" Reload   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, form: &BookForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let fields = [
            ("Title", BookField::Title),
            ("Author", BookField::Author),
            ("Date", BookField::Date),
            ("Category", BookField::Category),
        ];
        let mut lines: Vec<Line> = fields
            .iter()
            .map(|(name, field)| form.build_line(name, *field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        if form.active != BookField::Category {
            let (row, (name, _)) = fields
                .iter()
                .enumerate()
                .find(|(_, (_, field))| *field == form.active)
                .unwrap_or((0, &fields[0]));
            let prefix = format!("{name}: ").len() as u16;
            frame.set_cursor_position((
                inner.x + prefix + form.value_len(form.active) as u16,
                inner.y + row as u16,
            ));
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Delete '{}' by {}?",
                confirm.book.name, confirm.book.author
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_erase(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Erase All").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from("Erase every book in the catalog?"),
            Line::from("This cannot be undone."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}
