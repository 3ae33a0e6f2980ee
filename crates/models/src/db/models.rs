use chrono::NaiveDateTime;

use super::schema::*;

#[derive(Clone, Debug, Identifiable, Queryable)]
pub struct User {
    pub id: i32,
    /// Login identifier. Users are matched against it when authenticated by
    /// the upstream proxy.
    pub username: String,
    /// User's full name. May be empty, in which case the username is shown in
    /// its place.
    pub full_name: String,
    /// Is this user an administrator? Administrators pass all permission
    /// checks.
    pub is_super: bool,
    /// Permissions granted to this user over all documents.
    pub permissions: i32,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "users"]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub full_name: &'a str,
    pub is_super: bool,
    pub permissions: i32,
}

#[derive(Clone, Debug, Identifiable, Queryable)]
pub struct Document {
    pub id: i32,
    /// Human readable label, usually the name of the file the document was
    /// created from.
    pub label: String,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "documents"]
pub struct NewDocument<'a> {
    pub label: &'a str,
}

#[derive(Associations, Clone, Debug, Identifiable, Queryable)]
#[belongs_to(Document, foreign_key = "document")]
pub struct DocumentVersion {
    pub id: i32,
    /// Document this is a version of.
    pub document: i32,
    /// Date and time this version was created. Versions of a document are
    /// ordered by this field.
    pub timestamp: NaiveDateTime,
    /// Free-form comment left by the uploader.
    pub comment: String,
    /// Name of the file this version was uploaded from.
    pub filename: String,
    /// Mime type of this version's contents.
    pub mime: String,
    /// Path to file in the underlying storage containing contents of this
    /// version.
    pub path: String,
    /// Number of pages, once computed.
    pub page_count: Option<i32>,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "document_versions"]
pub struct NewDocumentVersion<'a> {
    pub document: i32,
    pub timestamp: NaiveDateTime,
    pub comment: &'a str,
    pub filename: &'a str,
    pub mime: &'a str,
    pub path: &'a str,
}

#[derive(Clone, Copy, Debug, Insertable, Queryable)]
#[table_name = "recent_documents"]
pub struct RecentDocument {
    pub user: i32,
    pub document: i32,
    pub accessed: NaiveDateTime,
}

#[derive(Associations, Clone, Debug, Identifiable, Queryable)]
#[belongs_to(Document, foreign_key = "document")]
#[belongs_to(User, foreign_key = "user")]
pub struct Review {
    pub id: i32,
    /// Document being reviewed.
    pub document: i32,
    /// Author of this review.
    pub user: i32,
    /// Text of the review.
    pub comment: String,
    /// Date and time this review was submitted.
    pub submit_date: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "reviews"]
pub struct NewReview<'a> {
    pub document: i32,
    pub user: i32,
    pub comment: &'a str,
    pub submit_date: NaiveDateTime,
}

#[derive(AsChangeset, Clone, Copy, Debug)]
#[table_name = "reviews"]
pub struct ReviewChange<'a> {
    pub comment: &'a str,
}

#[derive(Clone, Copy, Debug, Insertable, Queryable)]
#[table_name = "acl_entries"]
pub struct AclEntry {
    pub user: i32,
    pub document: i32,
    pub permissions: i32,
}

#[derive(Clone, Debug, Queryable)]
pub struct AuditLog {
    pub id: i32,
    pub timestamp: NaiveDateTime,
    pub actor: Option<i32>,
    pub kind: String,
    pub target_kind: String,
    pub target_id: i32,
    pub action_object_kind: Option<String>,
    pub action_object_id: Option<i32>,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "audit_log"]
pub struct NewAuditLog<'a> {
    pub timestamp: NaiveDateTime,
    pub actor: Option<i32>,
    pub kind: &'a str,
    pub target_kind: &'a str,
    pub target_id: i32,
    pub action_object_kind: Option<&'a str>,
    pub action_object_id: Option<i32>,
}
