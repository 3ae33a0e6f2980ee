use actix_files::NamedFile;
use actix_web::{
    HttpResponse,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
};
use archivarr_models::{Store, Version};
use std::io::{self, Cursor};
use zip::{ZipWriter, result::ZipError, write::FileOptions};

pub trait FileExt {
    /// Get an Actix responder streaming contents of this version as an
    /// attachment named after its rendered string.
    fn stream(&self, store: &dyn Store, preserve_extension: bool)
    -> io::Result<NamedFile>;
}

impl FileExt for Version {
    fn stream(&self, store: &dyn Store, preserve_extension: bool)
    -> io::Result<NamedFile> {
        let mime = self.mime.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM);

        Ok(NamedFile::open(self.file_path(store))?
            .set_content_type(mime)
            .set_content_disposition(attachment(
                self.rendered_string(preserve_extension))))
    }
}

fn attachment(filename: String) -> ContentDisposition {
    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(filename)],
    }
}

/// Pack contents of `versions` into a ZIP archive, each under its rendered
/// string.
pub fn build_zip(store: &dyn Store, versions: &[Version], preserve_extension: bool)
-> io::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for version in versions {
        zip.start_file(version.rendered_string(preserve_extension),
                FileOptions::default())
            .map_err(zip_error)?;
        io::copy(&mut version.open(store)?, &mut zip)?;
    }

    Ok(zip.finish().map_err(zip_error)?.into_inner())
}

/// Build a response sending contents of `versions` as a ZIP archive named
/// `filename`.
pub fn zip_response(
    store: &dyn Store,
    versions: &[Version],
    preserve_extension: bool,
    filename: String,
) -> io::Result<HttpResponse> {
    let data = build_zip(store, versions, preserve_extension)?;

    Ok(HttpResponse::Ok()
        .content_type("application/zip")
        .set(attachment(filename))
        .body(data))
}

fn zip_error(err: ZipError) -> io::Error {
    match err {
        ZipError::Io(err) => err,
        err => io::Error::new(io::ErrorKind::Other, err),
    }
}

#[cfg(test)]
mod tests {
    use archivarr_models::{Model, testing::MemoryStore};
    use chrono::NaiveDate;
    use std::io::Read;
    use super::*;

    #[test]
    fn archive_contains_versions_under_rendered_names() {
        let store = MemoryStore::new();
        let doc = store.add_document("report.txt");
        let ts = |h| NaiveDate::from_ymd(2019, 1, 1).and_hms(h, 0, 0);
        let a = store.add_version(doc.id, ts(1), "report.txt", b"first");
        let b = store.add_version(doc.id, ts(2), "report.txt", b"second");
        let versions = Version::by_ids(&store, &[a.id, b.id]).unwrap();

        let data = build_zip(&store, &versions, true).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();

        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive.by_name("report (2019-01-01 01:00:00).txt").unwrap()
            .read_to_string(&mut content).unwrap();
        assert_eq!(content, "first");

        content.clear();
        archive.by_name("report (2019-01-01 02:00:00).txt").unwrap()
            .read_to_string(&mut content).unwrap();
        assert_eq!(content, "second");

        assert_eq!(versions[0].id(), a.id);
    }
}
