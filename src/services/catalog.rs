//! Catalog management service: books, authors, copies and dashboard counts

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorDetails, AuthorInput},
        book::{Book, BookDetails, BookInput, BookShort},
        book_instance::{BookInstanceDetails, CreateBookInstance},
        catalog::CatalogCounts,
        ListQuery,
    },
    repository::Repository,
};

/// Keyword counted in book titles on the dashboard
pub const DASHBOARD_TITLE_KEYWORD: &str = "Name";

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    pub async fn list_books(&self, query: &ListQuery) -> AppResult<(Vec<BookShort>, i64)> {
        self.repository
            .books
            .list(query.offset(), query.per_page())
            .await
    }

    /// Book with author, language, genres and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;

        let author = match book.author_id {
            Some(author_id) => Some(self.repository.authors.get_by_id(author_id).await?),
            None => None,
        };
        let language = match book.language_id {
            Some(language_id) => self.repository.catalog.get_language(language_id).await?,
            None => None,
        };
        let genres = self.repository.catalog.genres_for_book(id).await?;

        let today = super::today();
        let instances = self
            .repository
            .book_instances
            .list_for_book(id)
            .await?
            .into_iter()
            .map(|row| row.into_details(today))
            .collect();

        Ok(BookDetails {
            id: book.id,
            title: book.title,
            summary: book.summary,
            isbn: book.isbn,
            author,
            language,
            genres,
            instances,
        })
    }

    pub async fn create_book(&self, input: BookInput) -> AppResult<Book> {
        self.check_book_references(&input).await?;
        let book = self.repository.books.create(&input).await?;
        tracing::info!(book_id = book.id, title = %book.title, "Book created");
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, input: BookInput) -> AppResult<Book> {
        self.check_book_references(&input).await?;
        let book = self.repository.books.update(id, &input).await?;
        tracing::info!(book_id = id, "Book updated");
        Ok(book)
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    /// Referenced author, language and genres must exist
    async fn check_book_references(&self, input: &BookInput) -> AppResult<()> {
        if let Some(author_id) = input.author_id {
            if !self.repository.authors.exists(author_id).await? {
                return Err(AppError::Validation(format!("Unknown author id {}", author_id)));
            }
        }

        if let Some(language_id) = input.language_id {
            if self.repository.catalog.get_language(language_id).await?.is_none() {
                return Err(AppError::Validation(format!("Unknown language id {}", language_id)));
            }
        }

        let missing = self.repository.catalog.missing_genres(&input.genre_ids).await?;
        if !missing.is_empty() {
            return Err(AppError::Validation(format!("Unknown genre ids {:?}", missing)));
        }

        Ok(())
    }

    // =========================================================================
    // COPIES
    // =========================================================================

    /// Register a newly acquired copy of a book
    pub async fn add_instance(
        &self,
        book_id: i32,
        request: CreateBookInstance,
    ) -> AppResult<BookInstanceDetails> {
        self.repository.books.get_by_id(book_id).await?;

        let status = request.status.unwrap_or_default();
        let instance = self
            .repository
            .book_instances
            .create(book_id, &request.imprint, status)
            .await?;

        tracing::info!(instance_id = %instance.id, book_id, "Book instance added");

        let row = self.repository.book_instances.get_by_id(instance.id).await?;
        Ok(row.into_details(super::today()))
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self, query: &ListQuery) -> AppResult<(Vec<Author>, i64)> {
        self.repository
            .authors
            .list(query.offset(), query.per_page())
            .await
    }

    /// Author with their books
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetails { author, books })
    }

    pub async fn create_author(&self, input: AuthorInput) -> AppResult<Author> {
        let author = self.repository.authors.create(&input).await?;
        tracing::info!(author_id = author.id, name = %author.display_name(), "Author created");
        Ok(author)
    }

    pub async fn update_author(&self, id: i32, input: AuthorInput) -> AppResult<Author> {
        let author = self.repository.authors.update(id, &input).await?;
        tracing::info!(author_id = id, "Author updated");
        Ok(author)
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!(author_id = id, "Author deleted");
        Ok(())
    }

    // =========================================================================
    // DASHBOARD
    // =========================================================================

    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        Ok(CatalogCounts {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.book_instances.count().await?,
            num_instances_available: self
                .repository
                .book_instances
                .count_by_status(crate::models::LoanStatus::Available)
                .await?,
            num_authors: self.repository.authors.count().await?,
            num_genres: self.repository.catalog.count_genres().await?,
            num_books_title_contains: self
                .repository
                .books
                .count_title_contains(DASHBOARD_TITLE_KEYWORD)
                .await?,
        })
    }
}
