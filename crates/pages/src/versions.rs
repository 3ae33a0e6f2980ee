//! Views over document versions.

use actix_files::NamedFile;
use actix_web::{
    Either,
    HttpRequest,
    HttpResponse,
    web::{Data, Form, Path, Query},
};
use archivarr_models::{
    Document,
    DocumentPermissions,
    Model,
    User,
    Version,
    audit::{Actor, Event, Kind, Object},
};
use archivarr_web::{
    DownloadParams,
    FileExt,
    FlashMessages,
    Message,
    Selection,
    Services,
    messages::redirect,
    params::{DEFAULT_ZIP_FILENAME, parse_flag},
    zip_response,
};
use log::error;
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    common::{Confirm, confirm, filter_permitted, require, versions_url},
    render,
};

/// Maximal number of characters of a textual version shown in its preview.
const PREVIEW_LENGTH: usize = 4000;

#[derive(Serialize)]
struct ListTemplate {
    document: <Document as Model>::Public,
    versions: Vec<<Version as Model>::Public>,
    can_download: bool,
    can_revert: bool,
    can_use_tools: bool,
}

/// List all versions of a document, newest first.
///
/// ## Method
///
/// ```text
/// GET /documents/:id/versions
/// ```
pub fn list(
    req: HttpRequest,
    services: Data<Services>,
    flash: FlashMessages,
    id: Path<i32>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let document = Document::by_id(&*services.store, *id)?;
    let permissions = require(
        &services, &user, document.id, DocumentPermissions::VIEW_VERSIONS)?;

    document.add_as_recent_for(&*services.store, &user)?;

    let versions = Version::for_document(&*services.store, &document)?;

    render(&user, &flash, "version_list.html", &ListTemplate {
        document: document.get_public(),
        versions: versions.iter().map(Model::get_public).collect(),
        can_download: permissions.contains(DocumentPermissions::DOWNLOAD),
        can_revert: permissions.contains(DocumentPermissions::REVERT_VERSION),
        can_use_tools: permissions.contains(DocumentPermissions::TOOLS),
    })
}

#[derive(Serialize)]
struct PreviewTemplate {
    version: <Version as Model>::Public,
    /// Image embedded as a data URL.
    image: Option<String>,
    /// Beginning of a textual version.
    excerpt: Option<String>,
}

/// Show a preview of a single version.
///
/// ## Method
///
/// ```text
/// GET /documents/versions/:id
/// ```
pub fn preview(
    req: HttpRequest,
    services: Data<Services>,
    flash: FlashMessages,
    id: Path<i32>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let version = Version::by_id(&*services.store, *id)?;
    require(&services, &user, version.document, DocumentPermissions::VIEW_VERSIONS)?;

    version.document().add_as_recent_for(&*services.store, &user)?;
    services.audit.record(Event::new(
        Actor::User(user.id), Kind::DocumentViewed, Object::Document(version.document)))?;

    let (image, excerpt) = if version.mime.starts_with("image/") {
        let data = version.read(&*services.store)?;
        let url = format!("data:{};base64,{}", version.mime, base64::encode(&data));
        (Some(url), None)
    } else if version.mime.starts_with("text/") {
        let data = version.read(&*services.store)?;
        let text = String::from_utf8_lossy(&data)
            .chars()
            .take(PREVIEW_LENGTH)
            .collect::<String>();
        (None, Some(text))
    } else {
        (None, None)
    };

    render(&user, &flash, "version_preview.html", &PreviewTemplate {
        version: version.get_public(),
        image,
        excerpt,
    })
}

#[derive(Serialize)]
struct DownloadFormTemplate {
    version: <Version as Model>::Public,
    zip_filename: &'static str,
}

/// Ask for download options.
///
/// ## Method
///
/// ```text
/// GET /documents/versions/:id/download/form
/// ```
pub fn download_form(
    req: HttpRequest,
    services: Data<Services>,
    flash: FlashMessages,
    id: Path<i32>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let version = Version::by_id(&*services.store, *id)?;
    require(&services, &user, version.document, DocumentPermissions::DOWNLOAD)?;

    render(&user, &flash, "download_form.html", &DownloadFormTemplate {
        version: version.get_public(),
        zip_filename: DEFAULT_ZIP_FILENAME,
    })
}

#[derive(Deserialize)]
pub struct DownloadForm {
    compressed: Option<String>,
    zip_filename: Option<String>,
    preserve_extension: Option<String>,
}

/// Accept download options and redirect to the actual download.
///
/// ## Method
///
/// ```text
/// POST /documents/versions/:id/download/form
/// ```
pub fn do_download_form(
    req: HttpRequest,
    services: Data<Services>,
    id: Path<i32>,
    form: Form<DownloadForm>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let version = Version::by_id(&*services.store, *id)?;
    require(&services, &user, version.document, DocumentPermissions::DOWNLOAD)?;

    let DownloadForm { compressed, zip_filename, preserve_extension } =
        form.into_inner();
    let flag = |value: Option<String>|
        if parse_flag(value.as_ref().map(String::as_str)) { "true" } else { "false" };

    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("id_list", &version.id.to_string())
        .append_pair("compressed", flag(compressed))
        .append_pair("zip_filename",
            zip_filename.as_ref().map_or(DEFAULT_ZIP_FILENAME, String::as_str))
        .append_pair("preserve_extension", flag(preserve_extension))
        .finish();

    Ok(redirect(
        &format!("/documents/versions/multiple/download?{}", query), &[]))
}

/// Download contents of a single version.
///
/// ## Method
///
/// ```text
/// GET /documents/versions/:id/download
/// ```
pub fn download(
    req: HttpRequest,
    services: Data<Services>,
    id: Path<i32>,
    query: Query<DownloadParams>,
    form: Option<Form<DownloadParams>>,
) -> Result<Either<NamedFile, HttpResponse>> {
    let user = services.authenticate(&req)?;
    let version = Version::by_id(&*services.store, *id)?;
    let params = DownloadParams::merge(query.into_inner(), form.map(Form::into_inner));

    send_versions(&services, &user, vec![version], &params)
}

/// Download contents of selected versions.
///
/// ## Method
///
/// ```text
/// GET /documents/versions/multiple/download?id_list=:id&id_list=:id
/// ```
pub fn download_multiple(
    req: HttpRequest,
    services: Data<Services>,
    selection: Selection,
    query: Query<DownloadParams>,
    form: Option<Form<DownloadParams>>,
) -> Result<Either<NamedFile, HttpResponse>> {
    let user = services.authenticate(&req)?;
    let versions = Version::by_ids(&*services.store, &selection.ids()?)?;
    let params = DownloadParams::merge(query.into_inner(), form.map(Form::into_inner));

    send_versions(&services, &user, versions, &params)
}

fn send_versions(
    services: &Services,
    user: &User,
    versions: Vec<Version>,
    params: &DownloadParams,
) -> Result<Either<NamedFile, HttpResponse>> {
    let versions = filter_permitted(
        services, user, versions, DocumentPermissions::DOWNLOAD)?;
    let preserve_extension = params.preserve_extension();

    if params.compressed() || versions.len() > 1 {
        zip_response(
            &*services.store, &versions, preserve_extension, params.zip_filename())
            .map(Either::B)
            .map_err(From::from)
    } else {
        versions[0].stream(&*services.store, preserve_extension)
            .map(Either::A)
            .map_err(From::from)
    }
}

/// Ask for confirmation before reverting a document to a version.
///
/// ## Method
///
/// ```text
/// GET /documents/versions/:id/revert
/// ```
pub fn revert(
    req: HttpRequest,
    services: Data<Services>,
    flash: FlashMessages,
    id: Path<i32>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let version = Version::by_id(&*services.store, *id)?;
    require(&services, &user, version.document, DocumentPermissions::REVERT_VERSION)?;

    confirm(&user, &flash, &Confirm {
        title: "Revert to this version?",
        message: Some("All later version after this one will be deleted too."),
        object: Some(version.to_string()),
        action: req.path(),
        cancel: &versions_url(version.document),
    })
}

/// Revert a document to a version.
///
/// Failures of the revert itself are reported to the user as a message,
/// and the request still completes with a redirect.
///
/// ## Method
///
/// ```text
/// POST /documents/versions/:id/revert
/// ```
pub fn do_revert(
    req: HttpRequest,
    services: Data<Services>,
    id: Path<i32>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let version = Version::by_id(&*services.store, *id)?;
    require(&services, &user, version.document, DocumentPermissions::REVERT_VERSION)?;

    let message = match version.revert(
        &*services.store, &*services.audit, Actor::User(user.id))
    {
        Ok(_) => Message::success("Document version reverted successfully"),
        Err(err) => {
            error!("Could not revert document {} to version {}: {}",
                version.document, version.id, err);

            if err.is_partial() {
                Message::error(format!(
                    "Document version reverted, but cleaning up failed; {}", err))
            } else {
                Message::error(format!("Error reverting document version; {}", err))
            }
        }
    };

    Ok(redirect(&versions_url(version.document), &[message]))
}

/// Ask for confirmation before recalculating page count of a version.
///
/// ## Method
///
/// ```text
/// GET /documents/versions/:id/page_count
/// ```
pub fn page_count(
    req: HttpRequest,
    services: Data<Services>,
    flash: FlashMessages,
    id: Path<i32>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let version = Version::by_id(&*services.store, *id)?;
    let versions = filter_permitted(
        &services, &user, vec![version], DocumentPermissions::TOOLS)?;

    confirm_page_count(&req, &user, &flash, &versions)
}

/// Ask for confirmation before recalculating page count of selected
/// versions.
///
/// ## Method
///
/// ```text
/// GET /documents/versions/multiple/page_count?id_list=:id&id_list=:id
/// ```
pub fn page_count_multiple(
    req: HttpRequest,
    services: Data<Services>,
    flash: FlashMessages,
    selection: Selection,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let versions = Version::by_ids(&*services.store, &selection.ids()?)?;
    let versions = filter_permitted(
        &services, &user, versions, DocumentPermissions::TOOLS)?;

    confirm_page_count(&req, &user, &flash, &versions)
}

fn confirm_page_count(
    req: &HttpRequest,
    user: &User,
    flash: &FlashMessages,
    versions: &[Version],
) -> Result<HttpResponse> {
    let title = page_count_title(versions);
    // Post back to the same URL, keeping the selection and `next`.
    let action = req.uri().to_string();

    confirm(user, flash, &Confirm {
        title: &title,
        message: None,
        object: None,
        action: &action,
        cancel: &versions_url(versions[0].document),
    })
}

fn page_count_title(versions: &[Version]) -> String {
    match versions {
        [version] => format!(
            "Recalculate the page count of the document version: {}?", version),
        _ => "Recalculate the page count of the selected document versions?"
            .to_string(),
    }
}

/// Queue recalculation of page count of a version.
///
/// ## Method
///
/// ```text
/// POST /documents/versions/:id/page_count
/// ```
pub fn do_page_count(
    req: HttpRequest,
    services: Data<Services>,
    id: Path<i32>,
    selection: Selection,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let version = Version::by_id(&*services.store, *id)?;
    let versions = filter_permitted(
        &services, &user, vec![version], DocumentPermissions::TOOLS)?;

    queue_page_count(&services, &versions, selection.next())
}

/// Queue recalculation of page count of selected versions.
///
/// ## Method
///
/// ```text
/// POST /documents/versions/multiple/page_count?id_list=:id&id_list=:id
/// ```
pub fn do_page_count_multiple(
    req: HttpRequest,
    services: Data<Services>,
    selection: Selection,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let versions = Version::by_ids(&*services.store, &selection.ids()?)?;
    let versions = filter_permitted(
        &services, &user, versions, DocumentPermissions::TOOLS)?;

    queue_page_count(&services, &versions, selection.next())
}

fn queue_page_count(services: &Services, versions: &[Version], next: Option<&str>)
-> Result<HttpResponse> {
    for version in versions {
        services.tasks.update_page_count(version.id)?;
    }

    let message = match versions.len() {
        1 => "1 document version queued for page count recalculation".to_string(),
        n => format!("{} document versions queued for page count recalculation", n),
    };

    let location = match next {
        Some(next) => next.to_string(),
        None => versions_url(versions[0].document),
    };

    Ok(redirect(&location, &[Message::success(message)]))
}
