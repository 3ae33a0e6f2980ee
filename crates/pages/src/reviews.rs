//! Views over document reviews.

use actix_web::{
    HttpRequest,
    HttpResponse,
    web::{Data, Form, Path},
};
use archivarr_error::ApiError;
use archivarr_models::{
    Document,
    DocumentPermissions,
    Model,
    Review,
    SaveReviewError,
    User,
};
use archivarr_web::{FlashMessages, Message, Services, messages::redirect};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::{
    Result,
    common::{Confirm, confirm, require, reviews_url},
    render,
    render_code,
};

#[derive(Serialize)]
struct ListTemplate {
    document: <Document as Model>::Public,
    reviews: Vec<<Review as Model>::Public>,
    can_create: bool,
}

/// List reviews of a document, newest first.
///
/// ## Method
///
/// ```text
/// GET /documents/:id/reviews
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
        &services, &user, document.id, DocumentPermissions::VIEW_REVIEWS)?;

    let reviews = Review::for_document(&*services.store, &document)?;

    render(&user, &flash, "review_list.html", &ListTemplate {
        document: document.get_public(),
        reviews: reviews.iter().map(Model::get_public).collect(),
        can_create: permissions.contains(DocumentPermissions::CREATE_REVIEW),
    })
}

#[derive(Serialize)]
struct FormTemplate<'a> {
    document: <Document as Model>::Public,
    title: &'a str,
    action: &'a str,
    comment: &'a str,
    error: Option<Cow<'a, str>>,
}

#[derive(Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    comment: String,
}

/// Render a form for submitting a new review.
///
/// ## Method
///
/// ```text
/// GET /documents/:id/reviews/new
/// ```
pub fn new(
    req: HttpRequest,
    services: Data<Services>,
    flash: FlashMessages,
    id: Path<i32>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let document = Document::by_id(&*services.store, *id)?;
    require(&services, &user, document.id, DocumentPermissions::CREATE_REVIEW)?;

    render(&user, &flash, "review_form.html", &FormTemplate {
        document: document.get_public(),
        title: "Submit a review",
        action: req.path(),
        comment: "",
        error: None,
    })
}

/// Submit a new review.
///
/// ## Method
///
/// ```text
/// POST /documents/:id/reviews/new
/// ```
pub fn create(
    req: HttpRequest,
    services: Data<Services>,
    flash: FlashMessages,
    id: Path<i32>,
    form: Form<ReviewForm>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let document = Document::by_id(&*services.store, *id)?;
    require(&services, &user, document.id, DocumentPermissions::CREATE_REVIEW)?;

    match Review::create(
        &*services.store, &*services.audit, &document, &user, &form.comment)
    {
        Ok(review) => Ok(redirect(
            &review.url(), &[Message::success("Review submitted successfully")])),
        Err(err) => form_error(&user, &flash, err, FormTemplate {
            document: document.get_public(),
            title: "Submit a review",
            action: req.path(),
            comment: &form.comment,
            error: None,
        }),
    }
}

#[derive(Serialize)]
struct DetailsTemplate {
    document: <Document as Model>::Public,
    review: <Review as Model>::Public,
    can_edit: bool,
    can_delete: bool,
}

/// Show a single review.
///
/// ## Method
///
/// ```text
/// GET /reviews/:id
/// ```
pub fn details(
    req: HttpRequest,
    services: Data<Services>,
    flash: FlashMessages,
    id: Path<i32>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let review = Review::by_id(&*services.store, *id)?;
    let permissions = require(
        &services, &user, review.document, DocumentPermissions::VIEW_REVIEWS)?;
    let document = Document::by_id(&*services.store, review.document)?;

    render(&user, &flash, "review_detail.html", &DetailsTemplate {
        document: document.get_public(),
        review: review.get_public(),
        can_edit: permissions.contains(DocumentPermissions::EDIT_REVIEW),
        can_delete: permissions.contains(DocumentPermissions::DELETE_REVIEW),
    })
}

/// Render a form for editing a review.
///
/// ## Method
///
/// ```text
/// GET /reviews/:id/edit
/// ```
pub fn edit(
    req: HttpRequest,
    services: Data<Services>,
    flash: FlashMessages,
    id: Path<i32>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let review = Review::by_id(&*services.store, *id)?;
    require(&services, &user, review.document, DocumentPermissions::EDIT_REVIEW)?;
    let document = Document::by_id(&*services.store, review.document)?;

    render(&user, &flash, "review_form.html", &FormTemplate {
        document: document.get_public(),
        title: "Edit review",
        action: req.path(),
        comment: &review.comment,
        error: None,
    })
}

/// Change a review's comment.
///
/// ## Method
///
/// ```text
/// POST /reviews/:id/edit
/// ```
pub fn do_edit(
    req: HttpRequest,
    services: Data<Services>,
    flash: FlashMessages,
    id: Path<i32>,
    form: Form<ReviewForm>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let mut review = Review::by_id(&*services.store, *id)?;
    require(&services, &user, review.document, DocumentPermissions::EDIT_REVIEW)?;

    match review.edit(&*services.store, &*services.audit, &user, &form.comment) {
        Ok(()) => Ok(redirect(
            &review.url(), &[Message::success("Review edited successfully")])),
        Err(err) => {
            let document = Document::by_id(&*services.store, review.document)?;
            form_error(&user, &flash, err, FormTemplate {
                document: document.get_public(),
                title: "Edit review",
                action: req.path(),
                comment: &form.comment,
                error: None,
            })
        }
    }
}

/// Show a review form again, with an error explaining why it was rejected.
/// Errors which can't be explained to the user are propagated instead.
fn form_error(
    user: &User,
    flash: &FlashMessages,
    err: SaveReviewError,
    template: FormTemplate,
) -> Result<HttpResponse> {
    match err.code().map(Cow::into_owned) {
        Some(code) => render_code(
            user, flash, err.status(), "review_form.html", &FormTemplate {
                error: Some(Cow::Owned(code)),
                ..template
            }),
        None => Err(err.into()),
    }
}

/// Ask for confirmation before deleting a review.
///
/// ## Method
///
/// ```text
/// GET /reviews/:id/delete
/// ```
pub fn delete(
    req: HttpRequest,
    services: Data<Services>,
    flash: FlashMessages,
    id: Path<i32>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let review = Review::by_id(&*services.store, *id)?;
    require(&services, &user, review.document, DocumentPermissions::DELETE_REVIEW)?;

    confirm(&user, &flash, &Confirm {
        title: "Delete the review?",
        message: None,
        object: Some(format!("Review by {}", review.author().label())),
        action: req.path(),
        cancel: &review.url(),
    })
}

/// Delete a review.
///
/// ## Method
///
/// ```text
/// POST /reviews/:id/delete
/// ```
pub fn do_delete(
    req: HttpRequest,
    services: Data<Services>,
    id: Path<i32>,
) -> Result<HttpResponse> {
    let user = services.authenticate(&req)?;
    let review = Review::by_id(&*services.store, *id)?;
    require(&services, &user, review.document, DocumentPermissions::DELETE_REVIEW)?;

    let document = review.document;
    review.delete(&*services.store, &*services.audit, &user)?;

    Ok(redirect(
        &reviews_url(document), &[Message::success("Review deleted successfully")]))
}
