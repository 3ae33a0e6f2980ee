use actix_web::{HttpRequest, HttpResponse, web::Data};
use archivarr_models::{Document, Model, version::TIMESTAMP_FORMAT};
use archivarr_web::{FlashMessages, Services};
use serde::Serialize;

use crate::{Result, render};

#[derive(Serialize)]
struct RecentTemplate {
    documents: Vec<Recent>,
}

#[derive(Serialize)]
struct Recent {
    document: <Document as Model>::Public,
    accessed: String,
}

/// List documents recently accessed by the current user.
///
/// ## Method
///
/// ```text
/// GET /documents/recent
/// ```
pub fn recent(
    req: HttpRequest,
    services: Data<Services>,
    flash: FlashMessages,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let documents = Document::recent_for(&*services.store, &user)?
        .into_iter()
        .map(|(document, accessed)| Recent {
            document: document.get_public(),
            accessed: accessed.format(TIMESTAMP_FORMAT).to_string(),
        })
        .collect();

    render(&user, &flash, "recent.html", &RecentTemplate { documents })
}
