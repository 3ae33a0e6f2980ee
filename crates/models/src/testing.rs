//! In-memory implementations of [`Store`], [`AuditLog`], and [`TaskQueue`]
//! for use in tests.

use chrono::NaiveDateTime;
use diesel::result::Error as DbError;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, atomic::{AtomicBool, Ordering}},
};
use tempfile::TempDir;

use crate::{
    audit::{AuditLog, Event},
    config::Storage,
    db::models as db,
    models::document::RECENT_DOCUMENTS_LIMIT,
    permissions::DocumentPermissions,
    processing::{EnqueueError, TaskQueue},
    store::{Store, StoreError, StoreResult, files},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(|err| err.into_inner())
}

fn simulated_failure() -> StoreError {
    StoreError::Database(DbError::QueryBuilderError("simulated failure".into()))
}

#[derive(Default)]
struct State {
    next_id: i32,
    users: Vec<db::User>,
    documents: Vec<db::Document>,
    versions: Vec<db::DocumentVersion>,
    reviews: Vec<db::Review>,
    recent: Vec<db::RecentDocument>,
    acl: HashMap<(i32, i32), i32>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// [`Store`] keeping its records in memory and version files in a temporary
/// directory.
pub struct MemoryStore {
    state: Mutex<State>,
    storage: Storage,
    fail_writes: AtomicBool,
    _dir: TempDir,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        let dir = tempfile::tempdir()
            .expect("could not create temporary storage directory");

        MemoryStore {
            state: Mutex::default(),
            storage: Storage { path: dir.path().to_owned() },
            fail_writes: AtomicBool::new(false),
            _dir: dir,
        }
    }

    /// Make all subsequent modifications fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writes(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(simulated_failure())
        } else {
            Ok(())
        }
    }

    pub fn add_user(&self, username: &str, full_name: &str) -> db::User {
        let mut state = lock(&self.state);
        let user = db::User {
            id: state.next_id(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            is_super: false,
            permissions: 0,
        };
        state.users.push(user.clone());
        user
    }

    pub fn add_document(&self, label: &str) -> db::Document {
        let mut state = lock(&self.state);
        let document = db::Document {
            id: state.next_id(),
            label: label.to_string(),
        };
        state.documents.push(document.clone());
        document
    }

    pub fn add_version(
        &self,
        document: i32,
        timestamp: NaiveDateTime,
        filename: &str,
        contents: &[u8],
    ) -> db::DocumentVersion {
        let path = files::store(&self.storage, contents)
            .expect("could not store version contents");
        let mut state = lock(&self.state);
        let version = db::DocumentVersion {
            id: state.next_id(),
            document,
            timestamp,
            comment: String::new(),
            filename: filename.to_string(),
            mime: files::guess_mime(filename),
            path,
            page_count: None,
        };
        state.versions.push(version.clone());
        version
    }

    pub fn add_review(
        &self,
        document: i32,
        user: i32,
        comment: &str,
        submit_date: NaiveDateTime,
    ) -> db::Review {
        let mut state = lock(&self.state);
        let review = db::Review {
            id: state.next_id(),
            document,
            user,
            comment: comment.to_string(),
            submit_date,
        };
        state.reviews.push(review.clone());
        review
    }

    /// Grant `user` permissions over `document`.
    pub fn grant(&self, user: i32, document: i32, permissions: DocumentPermissions) {
        *lock(&self.state).acl.entry((user, document)).or_insert(0)
            |= permissions.bits();
    }

    /// Paths of all files currently present in the storage directory.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names = std::fs::read_dir(self.storage.path())
            .map(|entries| entries
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect::<Vec<_>>())
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

fn newest_first(versions: &mut Vec<db::DocumentVersion>) {
    versions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}

impl Store for MemoryStore {
    fn storage(&self) -> &Storage {
        &self.storage
    }

    fn user(&self, id: i32) -> StoreResult<Option<db::User>> {
        Ok(lock(&self.state).users.iter().find(|u| u.id == id).cloned())
    }

    fn user_by_name(&self, username: &str) -> StoreResult<Option<db::User>> {
        Ok(lock(&self.state).users.iter()
            .find(|u| u.username == username)
            .cloned())
    }

    fn document(&self, id: i32) -> StoreResult<Option<db::Document>> {
        Ok(lock(&self.state).documents.iter().find(|d| d.id == id).cloned())
    }

    fn version(&self, id: i32) -> StoreResult<Option<db::DocumentVersion>> {
        Ok(lock(&self.state).versions.iter().find(|v| v.id == id).cloned())
    }

    fn versions(&self, ids: &[i32]) -> StoreResult<Vec<db::DocumentVersion>> {
        let mut versions = lock(&self.state).versions.iter()
            .filter(|v| ids.contains(&v.id))
            .cloned()
            .collect::<Vec<_>>();
        versions.sort_by_key(|v| v.id);
        Ok(versions)
    }

    fn document_versions(&self, document: i32)
    -> StoreResult<Vec<db::DocumentVersion>> {
        let mut versions = lock(&self.state).versions.iter()
            .filter(|v| v.document == document)
            .cloned()
            .collect();
        newest_first(&mut versions);
        Ok(versions)
    }

    fn delete_versions_after(&self, document: i32, timestamp: NaiveDateTime)
    -> StoreResult<Vec<db::DocumentVersion>> {
        self.check_writes()?;

        let mut state = lock(&self.state);
        let (removed, kept): (Vec<_>, Vec<_>) = state.versions.drain(..)
            .partition(|v| v.document == document && v.timestamp > timestamp);
        state.versions = kept;
        Ok(removed)
    }

    fn path_in_use(&self, path: &str) -> StoreResult<bool> {
        Ok(lock(&self.state).versions.iter().any(|v| v.path == path))
    }

    fn set_page_count(&self, version: i32, count: i32) -> StoreResult<()> {
        self.check_writes()?;

        match lock(&self.state).versions.iter_mut().find(|v| v.id == version) {
            Some(v) => {
                v.page_count = Some(count);
                Ok(())
            }
            None => Err(StoreError::Database(DbError::NotFound)),
        }
    }

    fn mark_recent(&self, user: i32, document: i32, accessed: NaiveDateTime)
    -> StoreResult<()> {
        self.check_writes()?;

        let mut state = lock(&self.state);
        state.recent.retain(|r| !(r.user == user && r.document == document));
        state.recent.push(db::RecentDocument { user, document, accessed });
        state.recent.sort_by(|a, b| b.accessed.cmp(&a.accessed));

        let mut seen = 0;
        state.recent.retain(|r| {
            if r.user != user {
                return true;
            }
            seen += 1;
            seen <= RECENT_DOCUMENTS_LIMIT
        });

        Ok(())
    }

    fn recent_documents(&self, user: i32)
    -> StoreResult<Vec<(db::Document, NaiveDateTime)>> {
        let state = lock(&self.state);

        Ok(state.recent.iter()
            .filter(|r| r.user == user)
            .filter_map(|r| state.documents.iter()
                .find(|d| d.id == r.document)
                .map(|d| (d.clone(), r.accessed)))
            .collect())
    }

    fn review(&self, id: i32) -> StoreResult<Option<db::Review>> {
        Ok(lock(&self.state).reviews.iter().find(|r| r.id == id).cloned())
    }

    fn document_reviews(&self, document: i32)
    -> StoreResult<Vec<(db::Review, db::User)>> {
        let state = lock(&self.state);

        let mut reviews = state.reviews.iter()
            .filter(|r| r.document == document)
            .filter_map(|r| state.users.iter()
                .find(|u| u.id == r.user)
                .map(|u| (r.clone(), u.clone())))
            .collect::<Vec<_>>();
        reviews.sort_by(|(a, _), (b, _)| b.submit_date.cmp(&a.submit_date));

        Ok(reviews)
    }

    fn insert_review(&self, review: db::NewReview) -> StoreResult<db::Review> {
        self.check_writes()?;

        let mut state = lock(&self.state);
        let review = db::Review {
            id: state.next_id(),
            document: review.document,
            user: review.user,
            comment: review.comment.to_string(),
            submit_date: review.submit_date,
        };
        state.reviews.push(review.clone());
        Ok(review)
    }

    fn update_review(&self, id: i32, change: db::ReviewChange)
    -> StoreResult<db::Review> {
        self.check_writes()?;

        match lock(&self.state).reviews.iter_mut().find(|r| r.id == id) {
            Some(review) => {
                review.comment = change.comment.to_string();
                Ok(review.clone())
            }
            None => Err(StoreError::Database(DbError::NotFound)),
        }
    }

    fn delete_review(&self, id: i32) -> StoreResult<()> {
        self.check_writes()?;

        let mut state = lock(&self.state);
        let before = state.reviews.len();
        state.reviews.retain(|r| r.id != id);

        if state.reviews.len() == before {
            Err(StoreError::Database(DbError::NotFound))
        } else {
            Ok(())
        }
    }

    fn acl_permissions(&self, user: i32, document: i32) -> StoreResult<i32> {
        Ok(lock(&self.state).acl.get(&(user, document)).cloned().unwrap_or(0))
    }
}

/// [`AuditLog`] keeping events in memory.
#[derive(Default)]
pub struct MemoryAuditLog {
    events: Mutex<Vec<Event>>,
    fail: AtomicBool,
}

impl MemoryAuditLog {
    pub fn new() -> MemoryAuditLog {
        MemoryAuditLog::default()
    }

    /// All events recorded so far.
    pub fn events(&self) -> Vec<Event> {
        lock(&self.events).clone()
    }

    /// Make recording events fail (or succeed again).
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl AuditLog for MemoryAuditLog {
    fn record(&self, event: Event) -> StoreResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(simulated_failure());
        }

        lock(&self.events).push(event);
        Ok(())
    }
}

/// [`TaskQueue`] remembering scheduled jobs instead of running them.
#[derive(Default)]
pub struct RecordingQueue {
    jobs: Mutex<Vec<i32>>,
}

impl RecordingQueue {
    pub fn new() -> RecordingQueue {
        RecordingQueue::default()
    }

    /// IDs of versions scheduled for page count recalculation, in order.
    pub fn page_count_jobs(&self) -> Vec<i32> {
        lock(&self.jobs).clone()
    }
}

impl TaskQueue for RecordingQueue {
    fn update_page_count(&self, version_id: i32) -> Result<(), EnqueueError> {
        lock(&self.jobs).push(version_id);
        Ok(())
    }
}
