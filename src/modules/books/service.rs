//! Lookup capability for books and its in-memory implementation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Book, BookId};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("book id '{0}' appears more than once in the catalog")]
    DuplicateId(BookId),

    #[error("failed to read catalog seed {path}")]
    Seed {
        path: PathBuf,
        #[source]
        source: SeedError,
    },

    #[error("catalog backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Resolves a book identifier to a record.
///
/// `Ok(None)` means no book has that identifier; `Err` is reserved for
/// failures of the backing store itself.
#[async_trait]
pub trait BookService: Send + Sync {
    async fn find_book_by_id(&self, book_id: &BookId) -> Result<Option<Book>, LookupError>;
}

/// Read-only catalog held in memory.
#[derive(Debug, Default)]
pub struct InMemoryBookService {
    books: HashMap<BookId, Book>,
}

impl InMemoryBookService {
    pub fn new(books: impl IntoIterator<Item = Book>) -> Result<Self, LookupError> {
        let mut catalog = HashMap::new();
        for book in books {
            if catalog.contains_key(&book.id) {
                return Err(LookupError::DuplicateId(book.id));
            }
            catalog.insert(book.id.clone(), book);
        }
        Ok(Self { books: catalog })
    }

    /// Load a JSON array of books.
    pub fn from_seed_file(path: &Path) -> Result<Self, LookupError> {
        let seed_error = |source: SeedError| LookupError::Seed {
            path: path.to_path_buf(),
            source,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| seed_error(e.into()))?;
        let books: Vec<Book> = serde_json::from_str(&raw).map_err(|e| seed_error(e.into()))?;

        tracing::debug!(path = %path.display(), count = books.len(), "loaded catalog seed");
        Self::new(books)
    }

    pub fn with_default_catalog() -> Self {
        let books = [
            Book::new("book-1", "The Rust Programming Language")
                .with_author("Steve Klabnik"),
            Book::new("book-2", "Programming Rust").with_author("Jim Blandy"),
            Book::new("book-3", "Rust for Rustaceans").with_author("Jon Gjengset"),
        ];

        Self {
            books: books
                .into_iter()
                .map(|book| (book.id.clone(), book))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[async_trait]
impl BookService for InMemoryBookService {
    async fn find_book_by_id(&self, book_id: &BookId) -> Result<Option<Book>, LookupError> {
        Ok(self.books.get(book_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_known_book() {
        let service = InMemoryBookService::new([Book::new("b1", "Dune")]).unwrap();

        let book = service.find_book_by_id(&BookId::new("b1")).await.unwrap();
        assert_eq!(book, Some(Book::new("b1", "Dune")));
    }

    #[tokio::test]
    async fn unknown_book_is_absent() {
        let service = InMemoryBookService::new([Book::new("b1", "Dune")]).unwrap();

        let book = service
            .find_book_by_id(&BookId::new("missing"))
            .await
            .unwrap();
        assert!(book.is_none());
    }

    #[tokio::test]
    async fn ids_are_matched_exactly() {
        let service = InMemoryBookService::new([Book::new("b1", "Dune")]).unwrap();

        for probe in ["B1", " b1", "b1/", ""] {
            let book = service.find_book_by_id(&BookId::new(probe)).await.unwrap();
            assert!(book.is_none(), "unexpected match for {probe:?}");
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = InMemoryBookService::new([Book::new("b1", "Dune"), Book::new("b1", "Emma")])
            .unwrap_err();
        assert!(matches!(err, LookupError::DuplicateId(id) if id.as_str() == "b1"));
    }

    #[test]
    fn default_catalog_is_populated() {
        let service = InMemoryBookService::with_default_catalog();
        assert_eq!(service.len(), 3);
        assert!(!service.is_empty());
    }

    #[tokio::test]
    async fn loads_seed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        std::fs::write(
            &path,
            r#"[{"id":"b1","title":"Dune","author":"Frank Herbert"},{"id":"b2","title":"Emma"}]"#,
        )
        .unwrap();

        let service = InMemoryBookService::from_seed_file(&path).unwrap();
        assert_eq!(service.len(), 2);

        let dune = service
            .find_book_by_id(&BookId::new("b1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dune.author.as_deref(), Some("Frank Herbert"));
    }

    #[test]
    fn malformed_seed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = InMemoryBookService::from_seed_file(&path).unwrap_err();
        match err {
            LookupError::Seed { path: p, source } => {
                assert_eq!(p, path);
                assert!(matches!(source, SeedError::Json(_)));
            }
            other => panic!("expected seed error, got {other:?}"),
        }
    }

    #[test]
    fn missing_seed_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = InMemoryBookService::from_seed_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(
            err,
            LookupError::Seed {
                source: SeedError::Io(_),
                ..
            }
        ));
    }
}
