use actix::{Actor, Addr, Handler, Message, SyncArbiter, SyncContext};
use failure::Error;
use log::{debug, error};
use std::sync::Arc;

use crate::{models::Version, store::Store};

/// Count pages in a document.
///
/// For PDF documents this is the number of pages in the page tree. For textual
/// documents it is the number of form-feed separated pages. Any other
/// document is considered to have a single page.
pub fn count_pages(mime: &str, data: &[u8]) -> i32 {
    let count = if mime == "application/pdf" {
        count_pdf_pages(data)
    } else if mime.starts_with("text/") {
        count_text_pages(data)
    } else {
        1
    };

    count.max(1) as i32
}

fn count_pdf_pages(data: &[u8]) -> usize {
    match lopdf::Document::load_mem(data) {
        Ok(document) => document.get_pages().len(),
        Err(err) => {
            debug!("Could not parse PDF document: {}", err);
            0
        }
    }
}

fn count_text_pages(data: &[u8]) -> usize {
    let pages = data.split(|&b| b == b'\x0c').count();

    if data.ends_with(b"\x0c") {
        pages - 1
    } else {
        pages
    }
}

/// Request page count of a document version to be recalculated.
pub struct UpdatePageCount {
    pub version_id: i32,
}

impl Message for UpdatePageCount {
    type Result = ();
}

/// Actix actor recalculating page counts of document versions.
pub struct PageCountUpdater {
    store: Arc<dyn Store>,
}

impl PageCountUpdater {
    pub fn new(store: Arc<dyn Store>) -> PageCountUpdater {
        PageCountUpdater { store }
    }

    pub fn start(store: Arc<dyn Store>) -> Addr<PageCountUpdater> {
        SyncArbiter::start(1, move || PageCountUpdater::new(store.clone()))
    }

    fn update(&self, version_id: i32) -> Result<i32, Error> {
        let version = Version::by_id(&*self.store, version_id)?;
        let data = version.read(&*self.store)?;
        let count = count_pages(&version.mime, &data);

        self.store.set_page_count(version_id, count)?;

        Ok(count)
    }
}

impl Actor for PageCountUpdater {
    type Context = SyncContext<Self>;
}

impl Handler<UpdatePageCount> for PageCountUpdater {
    type Result = ();

    fn handle(&mut self, msg: UpdatePageCount, _: &mut Self::Context) {
        match self.update(msg.version_id) {
            Ok(count) => debug!("Version {} has {} pages", msg.version_id, count),
            Err(err) => error!("Could not update page count of version {}: {}",
                msg.version_id, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{Document, Object, dictionary};
    use super::*;

    fn pdf(pages: usize) -> Vec<u8> {
        let mut document = Document::with_version("1.5");
        let tree = document.new_object_id();
        let kids = (0..pages)
            .map(|_| document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => tree,
            }).into())
            .collect::<Vec<Object>>();
        document.objects.insert(tree, Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }));
        let catalog = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => tree,
        });
        document.trailer.set("Root", catalog);

        let mut data = Vec::new();
        document.save_to(&mut data).unwrap();
        data
    }

    #[test]
    fn pdf_pages_are_counted_from_page_tree() {
        assert_eq!(count_pages("application/pdf", &pdf(3)), 3);
        assert_eq!(count_pages("application/pdf", &pdf(1)), 1);
    }

    #[test]
    fn pdf_without_pages_counts_as_one() {
        assert_eq!(count_pages("application/pdf", &pdf(0)), 1);
    }

    #[test]
    fn unparsable_pdf_counts_as_one() {
        assert_eq!(count_pages("application/pdf", b"%PDF-1.4\n%%EOF"), 1);
    }

    #[test]
    fn text_pages_are_separated_by_form_feeds() {
        assert_eq!(count_pages("text/plain", b"one"), 1);
        assert_eq!(count_pages("text/plain", b"one\x0ctwo\x0cthree"), 3);
        assert_eq!(count_pages("text/plain", b"one\x0ctwo\x0c"), 2);
        assert_eq!(count_pages("text/plain", b""), 1);
    }

    #[test]
    fn other_documents_have_one_page() {
        assert_eq!(count_pages("image/png", b"\x89PNG\x0c\x0c"), 1);
    }
}
