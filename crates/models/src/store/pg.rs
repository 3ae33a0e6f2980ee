use chrono::{NaiveDateTime, Utc};
use diesel::{Connection as _Connection, prelude::*, result::Error as DbError};
use std::io::Read;

use crate::{
    config::Storage,
    db::{Pool, models as db, schema::*},
    models::document::RECENT_DOCUMENTS_LIMIT,
    permissions::DocumentPermissions,
};
use super::{Store, StoreError, StoreResult, files};

/// [`Store`] keeping its data in a PostgreSQL database.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
    storage: Storage,
}

impl PgStore {
    pub fn new(pool: Pool, storage: Storage) -> PgStore {
        PgStore { pool, storage }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Create a new user.
    pub fn create_user(&self, username: &str, full_name: &str, is_super: bool)
    -> StoreResult<db::User> {
        let db = self.pool.get()?;

        diesel::insert_into(users::table)
            .values(db::NewUser {
                username,
                full_name,
                is_super,
                permissions: 0,
            })
            .get_result(&*db)
            .map_err(From::from)
    }

    /// Grant `permissions` to a user, either over all documents or, when
    /// `document` is given, over just that one.
    pub fn grant(
        &self,
        user: i32,
        document: Option<i32>,
        permissions: DocumentPermissions,
    ) -> StoreResult<()> {
        let db = self.pool.get()?;

        db.transaction::<_, DbError, _>(|| {
            match document {
                None => {
                    let current = users::table
                        .filter(users::id.eq(user))
                        .select(users::permissions)
                        .get_result::<i32>(&*db)?;

                    diesel::update(users::table.filter(users::id.eq(user)))
                        .set(users::permissions
                            .eq(current | permissions.bits()))
                        .execute(&*db)?;
                }
                Some(document) => {
                    let current = acl_entries::table
                        .filter(acl_entries::user.eq(user)
                            .and(acl_entries::document.eq(document)))
                        .select(acl_entries::permissions)
                        .get_result::<i32>(&*db)
                        .optional()?
                        .unwrap_or(0);

                    let entry = db::AclEntry {
                        user,
                        document,
                        permissions: current | permissions.bits(),
                    };

                    diesel::insert_into(acl_entries::table)
                        .values(&entry)
                        .on_conflict((acl_entries::user, acl_entries::document))
                        .do_update()
                        .set(acl_entries::permissions.eq(entry.permissions))
                        .execute(&*db)?;
                }
            }

            Ok(())
        }).map_err(From::from)
    }

    /// Create a new, empty document.
    pub fn create_document(&self, label: &str) -> StoreResult<db::Document> {
        let db = self.pool.get()?;

        diesel::insert_into(documents::table)
            .values(db::NewDocument { label })
            .get_result(&*db)
            .map_err(From::from)
    }

    /// Add a new version to a document, copying its contents into storage.
    pub fn add_version<R: Read>(
        &self,
        document: i32,
        filename: &str,
        contents: R,
        comment: &str,
    ) -> Result<db::DocumentVersion, AddVersionError> {
        let path = files::store(&self.storage, contents)?;
        let mime = files::guess_mime(filename);
        let db = self.pool.get().map_err(StoreError::from)?;

        diesel::insert_into(document_versions::table)
            .values(db::NewDocumentVersion {
                document,
                timestamp: Utc::now().naive_utc(),
                comment,
                filename,
                mime: &mime,
                path: &path,
            })
            .get_result(&*db)
            .map_err(|e| AddVersionError::Store(e.into()))
    }
}

#[derive(Debug, failure::Fail)]
pub enum AddVersionError {
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
    #[fail(display = "Could not store file: {}", _0)]
    Storage(#[cause] std::io::Error),
}

archivarr_error::impl_from! { for AddVersionError ;
    StoreError => |e| AddVersionError::Store(e),
    std::io::Error => |e| AddVersionError::Storage(e),
}

impl Store for PgStore {
    fn storage(&self) -> &Storage {
        &self.storage
    }

    fn user(&self, id: i32) -> StoreResult<Option<db::User>> {
        let db = self.pool.get()?;

        users::table
            .filter(users::id.eq(id))
            .get_result(&*db)
            .optional()
            .map_err(From::from)
    }

    fn user_by_name(&self, username: &str) -> StoreResult<Option<db::User>> {
        let db = self.pool.get()?;

        users::table
            .filter(users::username.eq(username))
            .get_result(&*db)
            .optional()
            .map_err(From::from)
    }

    fn document(&self, id: i32) -> StoreResult<Option<db::Document>> {
        let db = self.pool.get()?;

        documents::table
            .filter(documents::id.eq(id))
            .get_result(&*db)
            .optional()
            .map_err(From::from)
    }

    fn version(&self, id: i32) -> StoreResult<Option<db::DocumentVersion>> {
        let db = self.pool.get()?;

        document_versions::table
            .filter(document_versions::id.eq(id))
            .get_result(&*db)
            .optional()
            .map_err(From::from)
    }

    fn versions(&self, ids: &[i32]) -> StoreResult<Vec<db::DocumentVersion>> {
        let db = self.pool.get()?;

        document_versions::table
            .filter(document_versions::id.eq_any(ids.to_vec()))
            .order_by(document_versions::id.asc())
            .get_results(&*db)
            .map_err(From::from)
    }

    fn document_versions(&self, document: i32)
    -> StoreResult<Vec<db::DocumentVersion>> {
        let db = self.pool.get()?;

        document_versions::table
            .filter(document_versions::document.eq(document))
            .order_by(document_versions::timestamp.desc())
            .get_results(&*db)
            .map_err(From::from)
    }

    fn delete_versions_after(&self, document: i32, timestamp: NaiveDateTime)
    -> StoreResult<Vec<db::DocumentVersion>> {
        let db = self.pool.get()?;

        diesel::delete(document_versions::table
            .filter(document_versions::document.eq(document)
                .and(document_versions::timestamp.gt(timestamp))))
            .get_results(&*db)
            .map_err(From::from)
    }

    fn path_in_use(&self, path: &str) -> StoreResult<bool> {
        let db = self.pool.get()?;

        diesel::select(diesel::dsl::exists(document_versions::table
            .filter(document_versions::path.eq(path))))
            .get_result(&*db)
            .map_err(From::from)
    }

    fn set_page_count(&self, version: i32, count: i32) -> StoreResult<()> {
        let db = self.pool.get()?;

        let updated = diesel::update(document_versions::table
            .filter(document_versions::id.eq(version)))
            .set(document_versions::page_count.eq(count))
            .execute(&*db)?;

        if updated == 0 {
            Err(StoreError::Database(DbError::NotFound))
        } else {
            Ok(())
        }
    }

    fn mark_recent(&self, user: i32, document: i32, accessed: NaiveDateTime)
    -> StoreResult<()> {
        let db = self.pool.get()?;

        db.transaction::<_, DbError, _>(|| {
            diesel::insert_into(recent_documents::table)
                .values(db::RecentDocument { user, document, accessed })
                .on_conflict((recent_documents::user, recent_documents::document))
                .do_update()
                .set(recent_documents::accessed.eq(accessed))
                .execute(&*db)?;

            let keep = recent_documents::table
                .filter(recent_documents::user.eq(user))
                .order_by(recent_documents::accessed.desc())
                .limit(RECENT_DOCUMENTS_LIMIT)
                .select(recent_documents::document)
                .get_results::<i32>(&*db)?;

            diesel::delete(recent_documents::table
                .filter(recent_documents::user.eq(user)
                    .and(recent_documents::document.ne_all(keep))))
                .execute(&*db)?;

            Ok(())
        }).map_err(From::from)
    }

    fn recent_documents(&self, user: i32)
    -> StoreResult<Vec<(db::Document, NaiveDateTime)>> {
        let db = self.pool.get()?;

        recent_documents::table
            .inner_join(documents::table)
            .filter(recent_documents::user.eq(user))
            .order_by(recent_documents::accessed.desc())
            .select((documents::all_columns, recent_documents::accessed))
            .get_results(&*db)
            .map_err(From::from)
    }

    fn review(&self, id: i32) -> StoreResult<Option<db::Review>> {
        let db = self.pool.get()?;

        reviews::table
            .filter(reviews::id.eq(id))
            .get_result(&*db)
            .optional()
            .map_err(From::from)
    }

    fn document_reviews(&self, document: i32)
    -> StoreResult<Vec<(db::Review, db::User)>> {
        let db = self.pool.get()?;

        reviews::table
            .inner_join(users::table)
            .filter(reviews::document.eq(document))
            .order_by(reviews::submit_date.desc())
            .get_results(&*db)
            .map_err(From::from)
    }

    fn insert_review(&self, review: db::NewReview) -> StoreResult<db::Review> {
        let db = self.pool.get()?;

        diesel::insert_into(reviews::table)
            .values(&review)
            .get_result(&*db)
            .map_err(From::from)
    }

    fn update_review(&self, id: i32, change: db::ReviewChange)
    -> StoreResult<db::Review> {
        let db = self.pool.get()?;

        diesel::update(reviews::table.filter(reviews::id.eq(id)))
            .set(&change)
            .get_result(&*db)
            .map_err(From::from)
    }

    fn delete_review(&self, id: i32) -> StoreResult<()> {
        let db = self.pool.get()?;

        let deleted = diesel::delete(reviews::table.filter(reviews::id.eq(id)))
            .execute(&*db)?;

        if deleted == 0 {
            Err(StoreError::Database(DbError::NotFound))
        } else {
            Ok(())
        }
    }

    fn acl_permissions(&self, user: i32, document: i32) -> StoreResult<i32> {
        let db = self.pool.get()?;

        acl_entries::table
            .filter(acl_entries::user.eq(user)
                .and(acl_entries::document.eq(document)))
            .select(acl_entries::permissions)
            .get_result::<i32>(&*db)
            .optional()
            .map(|bits| bits.unwrap_or(0))
            .map_err(From::from)
    }
}
