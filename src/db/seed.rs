use anyhow::{Context, Result};
use rusqlite::{params, Connection};

/// Sample catalogue written into a newly created store:
/// `(name, author, date, category)`.
const SAMPLE_BOOKS: &[(&str, &str, &str, &str)] = &[
    ("Madonna in a Fur Coat", "Sabahattin Ali", "1943", "Novel"),
    ("Notes from Underground", "Fyodor Dostoevsky", "1864", "Novel"),
    ("Crime and Punishment", "Fyodor Dostoevsky", "1866", "Novel"),
    ("White Nights", "Fyodor Dostoevsky", "1848", "Novel"),
    ("Letters to Milena", "Franz Kafka", "1952", "Novel"),
    ("The Metamorphosis", "Franz Kafka", "1915", "Novel"),
    ("The First Man", "Albert Camus", "1994", "Novel"),
    ("The Stranger", "Albert Camus", "1942", "Novel"),
    ("The Idiot", "Fyodor Dostoevsky", "1869", "Novel"),
    ("No Longer Human", "Osamu Dazai", "1948", "Novel"),
    ("Kokoro", "Natsume Sōseki", "1914", "Novel"),
    ("I Am a Cat", "Natsume Sōseki", "1906", "Novel"),
    ("Pachinko", "Min Jin Lee", "2017", "Novel"),
    ("I Have the Right to Destroy Myself", "Kim Young-ha", "1996", "Novel"),
    ("Ali and Nino", "Kurban Said", "1937", "Novel"),
    ("The Devil", "Huseyn Javid", "1924", "Novel"),
    ("The Bell Jar", "Sylvia Plath", "1963", "Novel"),
    ("Orlando: A Biography", "Virginia Woolf", "1928", "Novel"),
    (
        "On Truth and Lies in a Nonmoral Sense",
        "Friedrich Nietzsche",
        "1896",
        "Philosophy",
    ),
    (
        "Beyond Good and Evil: Prelude to a Philosophy of the Future",
        "Friedrich Nietzsche",
        "1886",
        "Philosophy",
    ),
    ("A Room of One's Own", "Virginia Woolf", "1929", "Philosophy"),
    ("Milk and honey", "Rupi Kaur", "2014", "Poetry"),
    ("Tulips", "Sylvia Plath", "1965", "Poetry"),
];

/// Insert the sample catalogue, returning how many rows were written.
pub(crate) fn seed_books(conn: &Connection) -> Result<usize> {
    let mut stmt = conn
        .prepare("INSERT INTO books (name, author, date, category) VALUES (?1, ?2, ?3, ?4)")
        .context("failed to prepare seed insert")?;

    for (name, author, date, category) in SAMPLE_BOOKS {
        stmt.execute(params![name, author, date, category])
            .with_context(|| format!("failed to seed {name}"))?;
    }

    Ok(SAMPLE_BOOKS.len())
}
