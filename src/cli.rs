//! Command-line surface: transport flags shared by every command, plus the
//! non-interactive subcommands that drive the same [`CatalogClient`] the
//! terminal UI uses.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::catalog::{CatalogClient, ViewState};
use crate::db;
use crate::models::{Book, NewBook};
use crate::transport::{StoreLocation, TransportConfig};

#[derive(Parser, Debug)]
#[command(
    name = "bookshelf",
    about = "Browse and edit a book catalog over HTTP or an embedded store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of the catalog HTTP API
    #[arg(long, env = "BOOKSHELF_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Serve the catalog from this SQLite file instead of the HTTP API
    #[arg(long, env = "BOOKSHELF_BRIDGE_DB", value_name = "PATH")]
    pub bridge_db: Option<PathBuf>,

    /// Serve the catalog from the embedded store in the data directory
    #[arg(long, conflicts_with = "bridge_db")]
    pub embedded: bool,

    /// Seconds allowed for any single catalog call
    #[arg(long, env = "BOOKSHELF_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Where the terminal UI writes its log (defaults to the data directory)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the interactive terminal UI (the default)
    Tui,

    /// Print the books, optionally restricted to one category
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Print the books whose title contains TERM
    Search {
        term: String,
        #[arg(long)]
        json: bool,
    },

    /// Add a book
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        category: String,
    },

    /// Delete the book with the given id
    Delete { id: i64 },

    /// Delete every book
    Erase {
        /// Required; erasing cannot be undone
        #[arg(long)]
        yes: bool,
    },

    /// Print the total and per-category counts
    Summary {
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Whether this invocation runs the terminal UI.
    pub fn is_tui(&self) -> bool {
        matches!(self.command, None | Some(Command::Tui))
    }

    /// Translate the flags into the startup transport decision. An explicit
    /// store path wins over `--embedded`.
    pub fn transport_config(&self) -> Result<TransportConfig> {
        let bridge = match (&self.bridge_db, self.embedded) {
            (Some(path), _) => Some(StoreLocation::File(path.clone())),
            (None, true) => Some(StoreLocation::File(db::default_db_path()?)),
            (None, false) => None,
        };

        Ok(TransportConfig {
            api_url: self.api_url.clone(),
            bridge,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(db::data_dir()?.join("bookshelf.log")),
        }
    }
}

impl Command {
    /// Run a non-interactive command, writing its report to `out`.
    pub fn execute(&self, client: &CatalogClient, out: &mut impl Write) -> Result<()> {
        let mut view = ViewState::default();
        match self {
            Command::Tui => bail!("the terminal UI is not a batch command"),
            Command::List { category, json } => {
                client
                    .list(&mut view, category.as_deref())
                    .context("failed to list books")?;
                print_books(out, view.books(), *json)
            }
            Command::Search { term, json } => {
                client
                    .search(&mut view, term)
                    .context("failed to search books")?;
                print_books(out, view.books(), *json)
            }
            Command::Add {
                title,
                author,
                date,
                category,
            } => {
                let candidate = NewBook::new(
                    title.as_str(),
                    author.as_str(),
                    date.as_str(),
                    category.as_str(),
                );
                let book = client
                    .add(&mut view, &candidate)
                    .context("failed to add book")?
                    .value;
                writeln!(out, "Added #{}: {book}", book.id)?;
                Ok(())
            }
            Command::Delete { id } => {
                client
                    .delete(&mut view, *id)
                    .with_context(|| format!("failed to delete book {id}"))?;
                writeln!(out, "Deleted #{id}")?;
                Ok(())
            }
            Command::Erase { yes } => {
                if !yes {
                    bail!("refusing to erase every book without --yes");
                }
                client
                    .erase_all(&mut view)
                    .context("failed to erase books")?;
                writeln!(out, "Erased every book")?;
                Ok(())
            }
            Command::Summary { json } => {
                let summary = client.summary().context("failed to load summary")?;
                if *json {
                    serde_json::to_writer_pretty(&mut *out, &summary)
                        .context("failed to encode summary")?;
                    writeln!(out)?;
                } else {
                    writeln!(out, "Total books: {}", summary.total_books)?;
                    for (category, count) in &summary.categories {
                        writeln!(out, "  {category}: {count}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

fn print_books(out: &mut impl Write, books: &[Book], json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, books).context("failed to encode books")?;
        writeln!(out)?;
        return Ok(());
    }

    if books.is_empty() {
        writeln!(out, "No books found")?;
        return Ok(());
    }
    for book in books {
        writeln!(
            out,
            "{:>4}  {}  {}  {}  {}",
            book.id, book.name, book.author, book.date, book.category
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{self, TransportKind};
    use pretty_assertions::assert_eq;

    fn memory_client() -> CatalogClient {
        let config = TransportConfig {
            bridge: Some(StoreLocation::Memory),
            ..TransportConfig::default()
        };
        CatalogClient::new(transport::select(&config).unwrap())
    }

    fn run(client: &CatalogClient, command: Command) -> String {
        let mut out = Vec::new();
        command.execute(client, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["bookshelf"]).unwrap();
        assert!(cli.is_tui());
        assert_eq!(cli.transport_config().unwrap().bridge, None);
    }

    #[test]
    fn bridge_flag_selects_store_file() {
        let cli =
            Cli::try_parse_from(["bookshelf", "--bridge-db", "/tmp/books.sqlite", "list"]).unwrap();
        assert!(!cli.is_tui());
        assert_eq!(
            cli.transport_config().unwrap().bridge,
            Some(StoreLocation::File(PathBuf::from("/tmp/books.sqlite")))
        );
    }

    #[test]
    fn parses_add_arguments() {
        let cli = Cli::try_parse_from([
            "bookshelf", "add", "--title", "Dune", "--author", "Herbert", "--date", "1965",
            "--category", "SciFi",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Add {
                title: "Dune".into(),
                author: "Herbert".into(),
                date: "1965".into(),
                category: "SciFi".into(),
            })
        );
    }

    #[test]
    fn list_prints_filtered_books() {
        let client = memory_client();
        assert_eq!(client.transport_kind(), TransportKind::Bridge);
        let output = run(
            &client,
            Command::List {
                category: Some("Poetry".into()),
                json: false,
            },
        );
        assert_eq!(output.lines().count(), 2);
        assert!(output.contains("Tulips"));
    }

    #[test]
    fn summary_json_is_machine_readable() {
        let client = memory_client();
        let output = run(&client, Command::Summary { json: true });
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["total_books"], 23);
        assert_eq!(value["categories"]["Philosophy"], 3);
    }

    #[test]
    fn erase_requires_confirmation_flag() {
        let client = memory_client();
        let mut out = Vec::new();
        assert!(Command::Erase { yes: false }.execute(&client, &mut out).is_err());
        assert_eq!(client.summary().unwrap().total_books, 23);
    }
}
