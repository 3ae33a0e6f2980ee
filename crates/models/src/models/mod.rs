//! Data and behaviours modelled as objects.

use archivarr_error::{ApiError, StatusCode};
use failure::Fail;
use serde::Serialize;
use std::borrow::Cow;

use crate::store::StoreError;

pub mod document;
pub mod review;
pub mod user;
pub mod version;

pub use self::{
    document::Document,
    review::{Review, SaveReviewError},
    user::User,
    version::{RevertVersionError, Version},
};

/// Common behaviour of all models.
pub trait Model: Sized {
    /// Category used to build error codes for this model, for example
    /// `review:not-found`.
    const ERROR_CATEGORY: &'static str;

    /// Type of this model's identifier.
    type Id;

    /// Type of the database record(s) this model is constructed from.
    type Database;

    /// Portion of this model's data which can be shown to users.
    type Public: Serialize;

    /// Construct model from its database counterpart.
    fn from_db(data: Self::Database) -> Self;

    /// Unpack this model into its database counterpart.
    fn into_db(self) -> Self::Database;

    /// Get this model's ID.
    fn id(&self) -> Self::Id;

    /// Get the public portion of this model's data.
    fn get_public(&self) -> Self::Public;
}

pub type FindModelResult<T> = Result<T, FindModelError>;

/// Error looking up a model.
#[derive(Debug, Fail)]
pub enum FindModelError {
    /// Storage failed while looking the model up.
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
    /// No such object. The field is the model's error category.
    #[fail(display = "No such {}", _0)]
    NotFound(&'static str),
}

impl FindModelError {
    pub fn not_found<M: Model>() -> Self {
        FindModelError::NotFound(M::ERROR_CATEGORY)
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            FindModelError::NotFound(_) => true,
            FindModelError::Store(_) => false,
        }
    }
}

impl From<StoreError> for FindModelError {
    fn from(err: StoreError) -> Self {
        FindModelError::Store(err)
    }
}

impl ApiError for FindModelError {
    fn status(&self) -> StatusCode {
        match self {
            FindModelError::Store(err) => err.status(),
            FindModelError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn code(&self) -> Option<Cow<str>> {
        match self {
            FindModelError::Store(err) => err.code(),
            FindModelError::NotFound(category) =>
                Some(Cow::Owned(format!("{}:not-found", category))),
        }
    }
}
