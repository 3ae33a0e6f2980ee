use archivarr_error::{ApiError, StatusCode};
use chrono::NaiveDateTime;
use failure::Fail;
use serde::Serialize;
use std::{borrow::Cow, fmt, fs, io, path::PathBuf};

use crate::{
    audit::{self, Actor, AuditLog, Event, Object},
    db::models as db,
    store::{Store, StoreError, StoreResult, files},
};
use super::{Document, FindModelError, FindModelResult, Model};

/// Format in which version timestamps are presented to users.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single version of a document.
#[derive(Clone, Debug)]
pub struct Version {
    data: db::DocumentVersion,
    parent: Document,
}

/// A subset of version's data that can safely be publicly exposed.
#[derive(Debug, Serialize)]
pub struct Public {
    pub id: i32,
    pub document: i32,
    pub label: String,
    pub timestamp: String,
    pub comment: String,
    pub filename: String,
    pub mime: String,
    pub page_count: Option<i32>,
}

impl Model for Version {
    const ERROR_CATEGORY: &'static str = "version";

    type Id = i32;
    type Database = (db::DocumentVersion, db::Document);
    type Public = Public;

    fn from_db((data, document): Self::Database) -> Self {
        Version {
            data,
            parent: Document::from_db(document),
        }
    }

    fn into_db(self) -> Self::Database {
        (self.data, self.parent.into_db())
    }

    fn id(&self) -> Self::Id {
        self.data.id
    }

    fn get_public(&self) -> Public {
        let db::DocumentVersion {
            id, document, ref comment, ref filename, ref mime, page_count, ..
        } = self.data;

        Public {
            id,
            document,
            label: self.to_string(),
            timestamp: self.data.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            comment: comment.clone(),
            filename: filename.clone(),
            mime: mime.clone(),
            page_count,
        }
    }
}

impl Version {
    /// Find a version by its ID.
    pub fn by_id(store: &dyn Store, id: i32) -> FindModelResult<Version> {
        let data = store.version(id)?
            .ok_or_else(FindModelError::not_found::<Version>)?;
        let document = store.document(data.document)?
            .ok_or_else(FindModelError::not_found::<Document>)?;

        Ok(Version::from_db((data, document)))
    }

    /// Find all versions with IDs listed in `ids`.
    ///
    /// Unlike [`Version::by_id`] this function does not fail when some of the
    /// versions don't exist, they are simply skipped.
    pub fn by_ids(store: &dyn Store, ids: &[i32]) -> StoreResult<Vec<Version>> {
        let mut versions = Vec::with_capacity(ids.len());

        for data in store.versions(ids)? {
            if let Some(document) = store.document(data.document)? {
                versions.push(Version::from_db((data, document)));
            }
        }

        Ok(versions)
    }

    /// Get all versions of a document, newest first.
    pub fn for_document(store: &dyn Store, document: &Document)
    -> StoreResult<Vec<Version>> {
        Ok(store.document_versions(document.id)?
            .into_iter()
            .map(|data| Version {
                data,
                parent: document.clone(),
            })
            .collect())
    }

    /// Document this is a version of.
    pub fn document(&self) -> &Document {
        &self.parent
    }

    /// Path to the file holding contents of this version.
    pub fn file_path(&self, store: &dyn Store) -> PathBuf {
        store.storage().path().join(&self.data.path)
    }

    pub fn open(&self, store: &dyn Store) -> io::Result<fs::File> {
        fs::File::open(self.file_path(store))
    }

    /// Read entire contents of this version into memory.
    pub fn read(&self, store: &dyn Store) -> io::Result<Vec<u8>> {
        fs::read(self.file_path(store))
    }

    /// Render this version as a string suitable for use as a file name.
    ///
    /// The string is made of document's label followed by the timestamp of
    /// this version. When `preserve_extension` is set the label's extension
    /// is moved after the timestamp, so that the result can be opened by
    /// programs recognising files by their extension.
    pub fn rendered_string(&self, preserve_extension: bool) -> String {
        render(&self.parent.label, self.data.timestamp, preserve_extension)
    }

    /// Revert the document to this version.
    ///
    /// All versions of the same document created after this one are deleted,
    /// as are their files, unless other versions still use them.
    ///
    /// Returns number of deleted versions. Versions are deleted before their
    /// files are removed and the event is recorded, see
    /// [`RevertVersionError::is_partial`].
    pub fn revert(&self, store: &dyn Store, audit: &dyn AuditLog, actor: Actor)
    -> Result<usize, RevertVersionError> {
        let removed = store.delete_versions_after(
            self.data.document, self.data.timestamp)?;

        for version in &removed {
            let in_use = store.path_in_use(&version.path)
                .map_err(RevertVersionError::FileUsage)?;

            if !in_use {
                files::remove(store.storage(), &version.path)
                    .map_err(RevertVersionError::Storage)?;
            }
        }

        audit.record(Event::new(
            actor, audit::Kind::VersionReverted, Object::Document(self.data.document))
            .with_action_object(Object::Version(self.data.id)))
            .map_err(RevertVersionError::Audit)?;

        log::info!("Document {} reverted to version {}, {} versions removed",
            self.data.document, self.data.id, removed.len());

        Ok(removed.len())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.rendered_string(false))
    }
}

impl std::ops::Deref for Version {
    type Target = db::DocumentVersion;

    fn deref(&self) -> &db::DocumentVersion {
        &self.data
    }
}

fn render(label: &str, timestamp: NaiveDateTime, preserve_extension: bool)
-> String {
    let timestamp = timestamp.format(TIMESTAMP_FORMAT);

    if preserve_extension {
        let (stem, ext) = split_extension(label);
        format!("{} ({}){}", stem, timestamp, ext)
    } else {
        format!("{} ({})", label, timestamp)
    }
}

/// Split a file name into a stem and an extension (including the leading
/// dot). Leading dots of the last path component don't start an extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    let base_start = name.rfind('/').map_or(0, |inx| inx + 1);
    let base = &name[base_start..];
    let leading = base.len() - base.trim_start_matches('.').len();

    match base[leading..].rfind('.') {
        Some(inx) => name.split_at(base_start + leading + inx),
        None => (name, ""),
    }
}

#[derive(Debug, Fail)]
pub enum RevertVersionError {
    /// Later versions could not be deleted.
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
    #[fail(display = "could not check whether file is in use: {}", _0)]
    FileUsage(#[cause] StoreError),
    #[fail(display = "could not remove file: {}", _0)]
    Storage(#[cause] io::Error),
    #[fail(display = "could not record event: {}", _0)]
    Audit(#[cause] StoreError),
}

impl From<StoreError> for RevertVersionError {
    fn from(err: StoreError) -> Self {
        RevertVersionError::Store(err)
    }
}

impl RevertVersionError {
    /// Did this error occur after later versions were already deleted?
    pub fn is_partial(&self) -> bool {
        match self {
            RevertVersionError::Store(_) => false,
            RevertVersionError::FileUsage(_)
            | RevertVersionError::Storage(_)
            | RevertVersionError::Audit(_) => true,
        }
    }
}

impl ApiError for RevertVersionError {
    fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn code(&self) -> Option<Cow<str>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use super::*;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd(2019, 3, 14).and_hms(15, 9, 26)
    }

    #[test]
    fn split_extension_like_path_splitext() {
        assert_eq!(split_extension("report.pdf"), ("report", ".pdf"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
        assert_eq!(split_extension("..hidden.txt"), ("..hidden", ".txt"));
        assert_eq!(split_extension("dir.d/file"), ("dir.d/file", ""));
        assert_eq!(split_extension("name."), ("name", "."));
    }

    #[test]
    fn rendered_string_appends_timestamp() {
        assert_eq!(
            render("report.pdf", timestamp(), false),
            "report.pdf (2019-03-14 15:09:26)",
        );
    }

    #[test]
    fn rendered_string_preserves_extension() {
        assert_eq!(
            render("report.pdf", timestamp(), true),
            "report (2019-03-14 15:09:26).pdf",
        );
        assert_eq!(
            render("notes", timestamp(), true),
            "notes (2019-03-14 15:09:26)",
        );
    }
}
