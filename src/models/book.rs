//! Book (catalog title) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    author::Author,
    book_instance::BookInstanceDetails,
    catalog::{Genre, Language},
};

/// Book record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    /// 13 character ISBN
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
}

/// Short book representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    /// "Last, First" of the author, if any
    pub author_name: Option<String>,
}

/// Book with its relations and physical copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<Author>,
    pub language: Option<Language>,
    pub genres: Vec<Genre>,
    pub instances: Vec<BookInstanceDetails>,
}

/// Create or replace a book
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    pub summary: String,
    #[validate(length(equal = 13, message = "ISBN must be exactly 13 characters"))]
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(isbn: &str) -> BookInput {
        BookInput {
            title: "The Dispossessed".into(),
            summary: "An ambiguous utopia.".into(),
            isbn: isbn.into(),
            author_id: Some(1),
            language_id: None,
            genre_ids: vec![],
        }
    }

    #[test]
    fn thirteen_character_isbn_is_valid() {
        assert!(input("9780061054884").validate().is_ok());
    }

    #[test]
    fn short_isbn_is_rejected() {
        let errors = input("0061054887").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("isbn"));
    }

    #[test]
    fn genre_ids_default_to_empty() {
        let parsed: BookInput = serde_json::from_value(serde_json::json!({
            "title": "Dune",
            "summary": "",
            "isbn": "9780441013593",
            "author_id": null,
            "language_id": null
        }))
        .unwrap();
        assert!(parsed.genre_ids.is_empty());
    }
}
