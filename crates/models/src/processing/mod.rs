//! Background processing of stored documents.

use actix::{Addr, prelude::SendError};
use archivarr_error::{ApiError, StatusCode};
use failure::Fail;
use std::borrow::Cow;

mod page_count;

pub use self::page_count::{PageCountUpdater, UpdatePageCount, count_pages};

/// Queue of background jobs.
pub trait TaskQueue: Send + Sync {
    /// Schedule recalculation of a version's page count.
    fn update_page_count(&self, version_id: i32) -> Result<(), EnqueueError>;
}

impl TaskQueue for Addr<PageCountUpdater> {
    fn update_page_count(&self, version_id: i32) -> Result<(), EnqueueError> {
        self.try_send(UpdatePageCount { version_id })
            .map_err(|err| match err {
                SendError::Full(_) => EnqueueError::Full,
                SendError::Closed(_) => EnqueueError::Closed,
            })
    }
}

#[derive(Debug, Fail)]
pub enum EnqueueError {
    #[fail(display = "Task queue is full")]
    Full,
    #[fail(display = "Task queue is closed")]
    Closed,
}

impl ApiError for EnqueueError {
    fn status(&self) -> StatusCode {
        StatusCode::SERVICE_UNAVAILABLE
    }

    fn code(&self) -> Option<Cow<str>> {
        None
    }
}
