//! Fine-grained control over actions a user can take on documents.

use archivarr_error::{ApiError, StatusCode};
use bitflags::bitflags;
use failure::Fail;
use serde::ser::{self, SerializeSeq};
use std::{borrow::Cow, fmt, sync::Arc};

use crate::{
    models::User,
    store::{Store, StoreResult},
};

bitflags! {
    /// Permissions over a document, its versions, and its reviews.
    pub struct DocumentPermissions: i32 {
        /// All currently allocated bits.
        const ALL_BITS = 0x0000_00ff;
        /// Permission holder can download contents of document versions.
        const DOWNLOAD = 0x0000_0001;
        /// Permission holder can run maintenance tools, such as page count
        /// recalculation.
        const TOOLS = 0x0000_0002;
        /// Permission holder can list and preview versions.
        const VIEW_VERSIONS = 0x0000_0004;
        /// Permission holder can revert a document to an earlier version,
        /// deleting all later versions.
        const REVERT_VERSION = 0x0000_0008;
        const VIEW_REVIEWS = 0x0000_0010;
        const CREATE_REVIEW = 0x0000_0020;
        const EDIT_REVIEW = 0x0000_0040;
        const DELETE_REVIEW = 0x0000_0080;
    }
}

static NAMES: &[(DocumentPermissions, &str)] = &[
    (DocumentPermissions::DOWNLOAD, "document:download"),
    (DocumentPermissions::TOOLS, "document:tools"),
    (DocumentPermissions::VIEW_VERSIONS, "version:view"),
    (DocumentPermissions::REVERT_VERSION, "version:revert"),
    (DocumentPermissions::VIEW_REVIEWS, "review:view"),
    (DocumentPermissions::CREATE_REVIEW, "review:create"),
    (DocumentPermissions::EDIT_REVIEW, "review:edit"),
    (DocumentPermissions::DELETE_REVIEW, "review:delete"),
];

impl DocumentPermissions {
    pub fn from_str(s: &str) -> Option<Self> {
        NAMES.iter()
            .find(|(_, name)| *name == s)
            .map(|(bits, _)| *bits)
    }

    pub fn as_str(self) -> &'static str {
        NAMES.iter()
            .find(|(bits, _)| *bits == self)
            .map_or("*", |(_, name)| name)
    }

    /// Verify that all required permissions are present.
    ///
    /// This is the same check as `self.contains(permissions)`, but returns an
    /// [`ApiError`].
    pub fn require(self, permissions: DocumentPermissions)
    -> Result<(), RequirePermissionsError> {
        if self.contains(permissions) {
            Ok(())
        } else {
            log::trace!("Missing permissions: {:?}", permissions - self);
            Err(RequirePermissionsError(permissions - self))
        }
    }
}

impl ser::Serialize for DocumentPermissions {
    fn serialize<S>(&self, ser: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        if !ser.is_human_readable() {
            return ser.serialize_i32(self.bits());
        }

        let mut seq = ser.serialize_seq(Some(self.bits().count_ones() as usize))?;
        for (bits, name) in NAMES {
            if self.contains(*bits) {
                seq.serialize_element(name)?;
            }
        }
        seq.end()
    }
}

#[derive(Debug, Fail)]
pub struct RequirePermissionsError(pub DocumentPermissions);

impl ApiError for RequirePermissionsError {
    fn status(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }

    fn code(&self) -> Option<Cow<str>> {
        Some(Cow::Borrowed("user:insufficient-permissions"))
    }
}

impl fmt::Display for RequirePermissionsError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Missing required permissions: {}", self.0.as_str())
    }
}

/// Decides what a user may do with a document.
pub trait PermissionCheck: Send + Sync {
    /// Compute all permissions `user` has over `document`.
    fn effective(&self, user: &User, document: i32)
    -> StoreResult<DocumentPermissions>;

    fn allows(&self, user: &User, document: i32, required: DocumentPermissions)
    -> StoreResult<bool> {
        Ok(self.effective(user, document)?.contains(required))
    }
}

/// [`PermissionCheck`] combining user's global permissions with access
/// control entries for specific documents. Superusers are allowed everything.
pub struct AclPermissions {
    store: Arc<dyn Store>,
}

impl AclPermissions {
    pub fn new(store: Arc<dyn Store>) -> AclPermissions {
        AclPermissions { store }
    }
}

impl PermissionCheck for AclPermissions {
    fn effective(&self, user: &User, document: i32)
    -> StoreResult<DocumentPermissions> {
        if user.is_super {
            return Ok(DocumentPermissions::all());
        }

        let global = DocumentPermissions::from_bits_truncate(user.permissions);
        let acl = DocumentPermissions::from_bits_truncate(
            self.store.acl_permissions(user.id, document)?);

        Ok(global | acl)
    }
}

#[cfg(test)]
mod tests {
    use crate::{models::Model, testing::MemoryStore};
    use super::*;

    #[test]
    fn names_round_trip() {
        for (bits, name) in NAMES {
            assert_eq!(DocumentPermissions::from_str(name), Some(*bits));
            assert_eq!(bits.as_str(), *name);
        }
        assert_eq!(DocumentPermissions::from_str("document:eat"), None);
    }

    #[test]
    fn require_reports_missing_bits() {
        let held = DocumentPermissions::DOWNLOAD | DocumentPermissions::VIEW_VERSIONS;

        assert!(held.require(DocumentPermissions::DOWNLOAD).is_ok());

        let err = held.require(DocumentPermissions::DOWNLOAD
            | DocumentPermissions::REVERT_VERSION).unwrap_err();
        assert_eq!(err.0, DocumentPermissions::REVERT_VERSION);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Missing required permissions: version:revert");
    }

    #[test]
    fn acl_extends_global_permissions() {
        let store = Arc::new(MemoryStore::new());
        let mut data = store.add_user("jdoe", "");
        data.permissions = DocumentPermissions::DOWNLOAD.bits();
        let user = User::from_db(data);
        let document = store.add_document("report.pdf").id;
        let other = store.add_document("notes.txt").id;
        store.grant(user.id, document, DocumentPermissions::VIEW_VERSIONS);

        let check = AclPermissions::new(store.clone());

        assert_eq!(check.effective(&user, document).unwrap(),
            DocumentPermissions::DOWNLOAD | DocumentPermissions::VIEW_VERSIONS);
        assert!(check.allows(&user, other, DocumentPermissions::DOWNLOAD).unwrap());
        assert!(!check.allows(&user, other, DocumentPermissions::VIEW_VERSIONS).unwrap());
    }

    #[test]
    fn superuser_is_allowed_everything() {
        let store = Arc::new(MemoryStore::new());
        let mut data = store.add_user("root", "");
        data.is_super = true;
        let user = User::from_db(data);

        let check = AclPermissions::new(store);
        assert!(check.allows(&user, 1, DocumentPermissions::ALL_BITS).unwrap());
    }
}
