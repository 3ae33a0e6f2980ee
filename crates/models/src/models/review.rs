use archivarr_error::{ApiError, StatusCode};
use chrono::Utc;
use failure::Fail;
use serde::Serialize;
use std::{borrow::Cow, fmt};

use crate::{
    audit::{Actor, AuditLog, Event, Kind, Object},
    db::models as db,
    store::{Store, StoreError, StoreResult},
};
use super::{Document, FindModelError, FindModelResult, Model, User, user};

/// A single reviewer's comment on a document.
#[derive(Clone, Debug)]
pub struct Review {
    data: db::Review,
    author: User,
}

/// A subset of review's data that can safely be publicly exposed.
#[derive(Debug, Serialize)]
pub struct Public {
    pub id: i32,
    pub document: i32,
    pub author: user::Public,
    pub comment: String,
    pub submit_date: String,
    pub url: String,
}

impl Model for Review {
    const ERROR_CATEGORY: &'static str = "review";

    type Id = i32;
    type Database = (db::Review, db::User);
    type Public = Public;

    fn from_db((data, author): Self::Database) -> Self {
        Review {
            data,
            author: User::from_db(author),
        }
    }

    fn into_db(self) -> Self::Database {
        (self.data, self.author.into_db())
    }

    fn id(&self) -> Self::Id {
        self.data.id
    }

    fn get_public(&self) -> Public {
        Public {
            id: self.data.id,
            document: self.data.document,
            author: self.author.get_public(),
            comment: self.data.comment.clone(),
            submit_date: self.data.submit_date
                .format("%Y-%m-%d %H:%M:%S").to_string(),
            url: self.url(),
        }
    }
}

impl Review {
    /// Find a review by its ID.
    pub fn by_id(store: &dyn Store, id: i32) -> FindModelResult<Review> {
        let data = store.review(id)?
            .ok_or_else(FindModelError::not_found::<Review>)?;
        let author = store.user(data.user)?
            .ok_or_else(FindModelError::not_found::<User>)?;

        Ok(Review::from_db((data, author)))
    }

    /// Get all reviews of a document, newest first.
    pub fn for_document(store: &dyn Store, document: &Document)
    -> StoreResult<Vec<Review>> {
        Ok(store.document_reviews(document.id)?
            .into_iter()
            .map(Review::from_db)
            .collect())
    }

    /// Submit a new review of a document.
    pub fn create(
        store: &dyn Store,
        audit: &dyn AuditLog,
        document: &Document,
        author: &User,
        comment: &str,
    ) -> Result<Review, SaveReviewError> {
        let comment = validate_comment(comment)?;

        let data = store.insert_review(db::NewReview {
            document: document.id,
            user: author.id,
            comment,
            submit_date: Utc::now().naive_utc(),
        })?;

        audit.record(Event::new(
            Actor::User(author.id), Kind::ReviewCreated, Object::Review(data.id))
            .with_action_object(Object::Document(document.id)))
            .map_err(SaveReviewError::Audit)?;

        Ok(Review {
            data,
            author: author.clone(),
        })
    }

    /// Change this review's comment.
    pub fn edit(
        &mut self,
        store: &dyn Store,
        audit: &dyn AuditLog,
        actor: &User,
        comment: &str,
    ) -> Result<(), SaveReviewError> {
        let comment = validate_comment(comment)?;

        self.data = store.update_review(
            self.data.id, db::ReviewChange { comment })?;

        audit.record(Event::new(
            Actor::User(actor.id), Kind::ReviewEdited, Object::Review(self.data.id))
            .with_action_object(Object::Document(self.data.document)))
            .map_err(SaveReviewError::Audit)
    }

    /// Delete this review.
    pub fn delete(self, store: &dyn Store, audit: &dyn AuditLog, actor: &User)
    -> Result<(), SaveReviewError> {
        store.delete_review(self.data.id)?;

        audit.record(Event::new(
            Actor::User(actor.id),
            Kind::ReviewDeleted,
            Object::Document(self.data.document),
        )).map_err(SaveReviewError::Audit)
    }

    /// User who submitted this review.
    pub fn author(&self) -> &User {
        &self.author
    }

    pub fn url(&self) -> String {
        format!("/reviews/{}", self.data.id)
    }
}

fn validate_comment(comment: &str) -> Result<&str, SaveReviewError> {
    let comment = comment.trim();

    if comment.is_empty() {
        Err(SaveReviewError::EmptyComment)
    } else {
        Ok(comment)
    }
}

impl fmt::Display for Review {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.data.comment)
    }
}

impl std::ops::Deref for Review {
    type Target = db::Review;

    fn deref(&self) -> &db::Review {
        &self.data
    }
}

#[derive(Debug, Fail)]
pub enum SaveReviewError {
    #[fail(display = "Review comment cannot be empty")]
    EmptyComment,
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
    #[fail(display = "Could not record event: {}", _0)]
    Audit(#[cause] StoreError),
}

impl From<StoreError> for SaveReviewError {
    fn from(err: StoreError) -> Self {
        SaveReviewError::Store(err)
    }
}

impl ApiError for SaveReviewError {
    fn status(&self) -> StatusCode {
        match self {
            SaveReviewError::EmptyComment => StatusCode::BAD_REQUEST,
            SaveReviewError::Store(_) | SaveReviewError::Audit(_) =>
                StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> Option<Cow<str>> {
        match self {
            SaveReviewError::EmptyComment =>
                Some(Cow::Borrowed("review:comment:empty")),
            SaveReviewError::Store(_) | SaveReviewError::Audit(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crate::{
        audit::Event,
        testing::{MemoryAuditLog, MemoryStore},
    };
    use super::*;

    struct Fixture {
        store: MemoryStore,
        audit: MemoryAuditLog,
        document: Document,
        author: User,
        editor: User,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let document = Document::from_db(store.add_document("report.pdf"));
        let author = User::from_db(store.add_user("jdoe", "Jane Doe"));
        let editor = User::from_db(store.add_user("admin", ""));

        Fixture { store, audit: MemoryAuditLog::new(), document, author, editor }
    }

    #[test]
    fn create_sets_submit_date_and_records_event() {
        let f = fixture();
        let before = Utc::now().naive_utc();

        let review = Review::create(
            &f.store, &f.audit, &f.document, &f.author, "  Looks good  ").unwrap();

        assert!(review.submit_date >= before);
        assert_eq!(review.comment, "Looks good");
        assert_eq!(review.user, f.author.id);
        assert_eq!(review.to_string(), "Looks good");
        assert_eq!(review.author().label(), "Jane Doe");
        assert_eq!(review.url(), format!("/reviews/{}", review.id));
        assert_eq!(f.audit.events(), vec![
            Event::new(Actor::User(f.author.id), Kind::ReviewCreated,
                Object::Review(review.id))
                .with_action_object(Object::Document(f.document.id)),
        ]);
    }

    #[test]
    fn blank_comment_is_rejected_before_storing() {
        let f = fixture();

        let err = Review::create(&f.store, &f.audit, &f.document, &f.author, " \n ")
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code().as_ref().map(|c| &**c), Some("review:comment:empty"));
        assert!(Review::for_document(&f.store, &f.document).unwrap().is_empty());
        assert!(f.audit.events().is_empty());
    }

    #[test]
    fn edit_changes_only_comment() {
        let f = fixture();
        let submitted = NaiveDate::from_ymd(2019, 1, 2).and_hms(3, 4, 5);
        let data = f.store.add_review(
            f.document.id, f.author.id, "First draft", submitted);
        let mut review = Review::by_id(&f.store, data.id).unwrap();

        review.edit(&f.store, &f.audit, &f.editor, "Second draft").unwrap();

        let stored = Review::by_id(&f.store, data.id).unwrap();
        assert_eq!(stored.comment, "Second draft");
        assert_eq!(stored.submit_date, submitted);
        assert_eq!(stored.user, f.author.id);
        assert_eq!(f.audit.events(), vec![
            Event::new(Actor::User(f.editor.id), Kind::ReviewEdited,
                Object::Review(data.id))
                .with_action_object(Object::Document(f.document.id)),
        ]);
    }

    #[test]
    fn delete_records_single_event_for_document() {
        let f = fixture();
        let submitted = NaiveDate::from_ymd(2019, 1, 2).and_hms(3, 4, 5);
        let data = f.store.add_review(f.document.id, f.author.id, "Bad", submitted);
        let review = Review::by_id(&f.store, data.id).unwrap();

        review.delete(&f.store, &f.audit, &f.editor).unwrap();

        assert!(Review::by_id(&f.store, data.id).unwrap_err().is_not_found());
        assert_eq!(f.audit.events(), vec![
            Event::new(Actor::User(f.editor.id), Kind::ReviewDeleted,
                Object::Document(f.document.id)),
        ]);
    }

    #[test]
    fn failed_delete_keeps_review_and_records_nothing() {
        let f = fixture();
        let submitted = NaiveDate::from_ymd(2019, 1, 2).and_hms(3, 4, 5);
        let data = f.store.add_review(f.document.id, f.author.id, "Bad", submitted);
        let review = Review::by_id(&f.store, data.id).unwrap();

        f.store.fail_writes(true);
        assert!(review.delete(&f.store, &f.audit, &f.editor).is_err());
        f.store.fail_writes(false);

        assert!(Review::by_id(&f.store, data.id).is_ok());
        assert!(f.audit.events().is_empty());
    }

    #[test]
    fn reviews_are_listed_newest_first() {
        let f = fixture();
        let day = |d| NaiveDate::from_ymd(2019, 1, d).and_hms(12, 0, 0);
        f.store.add_review(f.document.id, f.author.id, "old", day(1));
        f.store.add_review(f.document.id, f.author.id, "new", day(3));
        f.store.add_review(f.document.id, f.author.id, "mid", day(2));

        let comments = Review::for_document(&f.store, &f.document).unwrap()
            .into_iter()
            .map(|r| r.comment.clone())
            .collect::<Vec<_>>();

        assert_eq!(comments, ["new", "mid", "old"]);
    }
}
