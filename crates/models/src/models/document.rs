use chrono::{NaiveDateTime, Utc};
use serde::Serialize;

use crate::{db::models as db, store::{Store, StoreResult}};
use super::{FindModelError, FindModelResult, Model, User};

/// Maximum number of documents remembered as recently accessed for a single
/// user. Older entries are dropped.
pub const RECENT_DOCUMENTS_LIMIT: i64 = 400;

/// A document: a labelled collection of versions and reviews.
#[derive(Clone, Debug)]
pub struct Document {
    data: db::Document,
}

/// A subset of document's data that can safely be publicly exposed.
#[derive(Debug, Serialize)]
pub struct Public {
    pub id: i32,
    pub label: String,
}

impl Model for Document {
    const ERROR_CATEGORY: &'static str = "document";

    type Id = i32;
    type Database = db::Document;
    type Public = Public;

    fn from_db(data: Self::Database) -> Self {
        Document { data }
    }

    fn into_db(self) -> Self::Database {
        self.data
    }

    fn id(&self) -> Self::Id {
        self.data.id
    }

    fn get_public(&self) -> Public {
        Public {
            id: self.data.id,
            label: self.data.label.clone(),
        }
    }
}

impl Document {
    /// Find a document by its ID.
    pub fn by_id(store: &dyn Store, id: i32) -> FindModelResult<Document> {
        store.document(id)?
            .map(Document::from_db)
            .ok_or_else(FindModelError::not_found::<Document>)
    }

    /// Documents recently accessed by `user`, together with time of last
    /// access, most recent first.
    pub fn recent_for(store: &dyn Store, user: &User)
    -> StoreResult<Vec<(Document, NaiveDateTime)>> {
        Ok(store.recent_documents(user.id)?
            .into_iter()
            .map(|(data, accessed)| (Document::from_db(data), accessed))
            .collect())
    }

    /// Remember that `user` has just accessed this document.
    pub fn add_as_recent_for(&self, store: &dyn Store, user: &User)
    -> StoreResult<()> {
        store.mark_recent(user.id, self.data.id, Utc::now().naive_utc())
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.write_str(&self.data.label)
    }
}

impl std::ops::Deref for Document {
    type Target = db::Document;

    fn deref(&self) -> &db::Document {
        &self.data
    }
}
