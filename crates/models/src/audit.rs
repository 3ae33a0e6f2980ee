//! Audit log of actions taken on documents, versions, and reviews.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use std::fmt;

use crate::{
    db::{Pool, models as db, schema::audit_log},
    store::StoreResult,
};

/// Entity responsible for an action.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Actor {
    /// System. This actor is used for actions carried automatically by the
    /// system, and actions invoked from the CLI.
    System,
    /// A user.
    User(i32),
}

impl Actor {
    fn as_db(self) -> Option<i32> {
        match self {
            Actor::System => None,
            Actor::User(id) => Some(id),
        }
    }
}

impl From<i32> for Actor {
    fn from(id: i32) -> Self {
        Actor::User(id)
    }
}

/// Kind of an audited event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    ReviewCreated,
    ReviewEdited,
    ReviewDeleted,
    DocumentViewed,
    VersionReverted,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::ReviewCreated => "document_reviews.review_created",
            Kind::ReviewEdited => "document_reviews.review_edited",
            Kind::ReviewDeleted => "document_reviews.review_deleted",
            Kind::DocumentViewed => "documents.document_view",
            Kind::VersionReverted => "documents.document_version_revert",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// Object an event refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Object {
    Document(i32),
    Version(i32),
    Review(i32),
}

impl Object {
    fn into_db(self) -> (&'static str, i32) {
        match self {
            Object::Document(id) => ("document", id),
            Object::Version(id) => ("document_version", id),
            Object::Review(id) => ("review", id),
        }
    }
}

/// A single audited event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Event {
    pub actor: Actor,
    pub kind: Kind,
    /// Object the action was performed on.
    pub target: Object,
    /// Object the action was performed with, if any.
    pub action_object: Option<Object>,
}

impl Event {
    pub fn new(actor: Actor, kind: Kind, target: Object) -> Event {
        Event { actor, kind, target, action_object: None }
    }

    pub fn with_action_object(self, action_object: Object) -> Event {
        Event { action_object: Some(action_object), ..self }
    }
}

/// Sink for audited events.
pub trait AuditLog: Send + Sync {
    fn record(&self, event: Event) -> StoreResult<()>;
}

/// [`AuditLog`] storing events in the database.
#[derive(Clone)]
pub struct DbAuditLog {
    pool: Pool,
}

impl DbAuditLog {
    pub fn new(pool: Pool) -> DbAuditLog {
        DbAuditLog { pool }
    }

    /// Get all events targeting `target`, oldest first.
    pub fn for_target(&self, target: Object) -> StoreResult<Vec<db::AuditLog>> {
        let db = self.pool.get()?;
        let (kind, id) = target.into_db();

        audit_log::table
            .filter(audit_log::target_kind.eq(kind)
                .and(audit_log::target_id.eq(id)))
            .order_by(audit_log::timestamp.asc())
            .get_results(&*db)
            .map_err(From::from)
    }
}

impl AuditLog for DbAuditLog {
    fn record(&self, event: Event) -> StoreResult<()> {
        let db = self.pool.get()?;
        let entry = new_entry(&event, Utc::now().naive_utc());

        diesel::insert_into(audit_log::table)
            .values(&entry)
            .execute(&*db)?;

        log::debug!("Audit: {:?}", event);

        Ok(())
    }
}

fn new_entry(event: &Event, timestamp: NaiveDateTime) -> db::NewAuditLog<'static> {
    let (target_kind, target_id) = event.target.into_db();
    let action_object = event.action_object.map(Object::into_db);

    db::NewAuditLog {
        timestamp,
        actor: event.actor.as_db(),
        kind: event.kind.as_str(),
        target_kind,
        target_id,
        action_object_kind: action_object.map(|(kind, _)| kind),
        action_object_id: action_object.map(|(_, id)| id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_carry_action_object() {
        let event = Event::new(Actor::User(3), Kind::ReviewCreated, Object::Review(7))
            .with_action_object(Object::Document(1));
        let entry = new_entry(&event, Utc::now().naive_utc());

        assert_eq!(entry.actor, Some(3));
        assert_eq!(entry.kind, "document_reviews.review_created");
        assert_eq!((entry.target_kind, entry.target_id), ("review", 7));
        assert_eq!(entry.action_object_kind, Some("document"));
        assert_eq!(entry.action_object_id, Some(1));
    }

    #[test]
    fn system_actor_is_stored_as_null() {
        let event = Event::new(Actor::System, Kind::VersionReverted, Object::Document(1));
        let entry = new_entry(&event, Utc::now().naive_utc());

        assert_eq!(entry.actor, None);
        assert_eq!(entry.action_object_kind, None);
    }
}
