//! Persistence layer used by models.
//!
//! Models never talk to the database directly. Instead they are given a
//! [`Store`], which in production is a [`PgStore`] backed by a pool of
//! PostgreSQL connections.

use archivarr_error::{ApiError, StatusCode, impl_from};
use chrono::NaiveDateTime;
use diesel::result::Error as DbError;
use failure::Fail;
use std::borrow::Cow;

use crate::{config::Storage, db::models as db};

pub mod files;
mod pg;

pub use self::pg::{AddVersionError, PgStore};

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage of documents, their versions, reviews, and users.
pub trait Store: Send + Sync {
    /// Directory in which contents of document versions are kept.
    fn storage(&self) -> &Storage;

    fn user(&self, id: i32) -> StoreResult<Option<db::User>>;

    fn user_by_name(&self, username: &str) -> StoreResult<Option<db::User>>;

    fn document(&self, id: i32) -> StoreResult<Option<db::Document>>;

    fn version(&self, id: i32) -> StoreResult<Option<db::DocumentVersion>>;

    /// Get all versions whose IDs are listed in `ids`. Missing versions are
    /// skipped. The result is ordered by ID.
    fn versions(&self, ids: &[i32]) -> StoreResult<Vec<db::DocumentVersion>>;

    /// Get all versions of a document, newest first.
    fn document_versions(&self, document: i32)
    -> StoreResult<Vec<db::DocumentVersion>>;

    /// Delete all versions of a document created after `timestamp`, returning
    /// the deleted records.
    fn delete_versions_after(&self, document: i32, timestamp: NaiveDateTime)
    -> StoreResult<Vec<db::DocumentVersion>>;

    /// Is there any version whose contents are kept in file `path`?
    fn path_in_use(&self, path: &str) -> StoreResult<bool>;

    fn set_page_count(&self, version: i32, count: i32) -> StoreResult<()>;

    /// Record that `user` has accessed `document` at `accessed`.
    ///
    /// Only [`RECENT_DOCUMENTS_LIMIT`] most recent entries are kept for each
    /// user.
    ///
    /// [`RECENT_DOCUMENTS_LIMIT`]: crate::models::document::RECENT_DOCUMENTS_LIMIT
    fn mark_recent(&self, user: i32, document: i32, accessed: NaiveDateTime)
    -> StoreResult<()>;

    /// Documents recently accessed by `user`, most recent first.
    fn recent_documents(&self, user: i32)
    -> StoreResult<Vec<(db::Document, NaiveDateTime)>>;

    fn review(&self, id: i32) -> StoreResult<Option<db::Review>>;

    /// Reviews of a document together with their authors, newest first.
    fn document_reviews(&self, document: i32)
    -> StoreResult<Vec<(db::Review, db::User)>>;

    fn insert_review(&self, review: db::NewReview) -> StoreResult<db::Review>;

    fn update_review(&self, id: i32, change: db::ReviewChange)
    -> StoreResult<db::Review>;

    fn delete_review(&self, id: i32) -> StoreResult<()>;

    /// Raw permission bits granted to `user` over `document` by access
    /// control entries.
    fn acl_permissions(&self, user: i32, document: i32) -> StoreResult<i32>;
}

#[derive(Debug, Fail)]
pub enum StoreError {
    /// Error communicating with the database.
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// Error obtaining a database connection.
    #[fail(display = "Database error: {}", _0)]
    Pool(#[cause] r2d2::Error),
}

impl_from! { for StoreError ;
    DbError => |e| StoreError::Database(e),
    r2d2::Error => |e| StoreError::Pool(e),
}

impl ApiError for StoreError {
    fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn code(&self) -> Option<Cow<str>> {
        None
    }
}
