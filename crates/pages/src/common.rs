//! Capabilities shared by views: permission checks over single objects and
//! selections, and confirmation pages.

use actix_web::HttpResponse;
use archivarr_models::{
    DocumentPermissions,
    User,
    Version,
    permissions::RequirePermissionsError,
};
use archivarr_web::{FlashMessages, Services};
use serde::Serialize;

use crate::{Result, render};

/// Verify that `user` holds `required` permissions over `document`,
/// returning all permissions they hold.
pub fn require(
    services: &Services,
    user: &User,
    document: i32,
    required: DocumentPermissions,
) -> Result<DocumentPermissions> {
    let permissions = services.permissions.effective(user, document)?;
    permissions.require(required)?;
    Ok(permissions)
}

/// Drop from a selection all versions over whose documents `user` lacks
/// `required` permissions.
///
/// It is an error for no version to remain.
pub fn filter_permitted(
    services: &Services,
    user: &User,
    versions: Vec<Version>,
    required: DocumentPermissions,
) -> Result<Vec<Version>> {
    let mut permitted = Vec::with_capacity(versions.len());

    for version in versions {
        if services.permissions.allows(user, version.document, required)? {
            permitted.push(version);
        } else {
            log::debug!("User {} may not access version {}, skipping",
                user.id, version.id);
        }
    }

    if permitted.is_empty() {
        return Err(RequirePermissionsError(required).into());
    }

    Ok(permitted)
}

/// Contents of a confirmation page.
#[derive(Serialize)]
pub struct Confirm<'a> {
    pub title: &'a str,
    /// Additional explanation shown below the title.
    pub message: Option<&'a str>,
    /// Object the action concerns.
    pub object: Option<String>,
    /// URL to which the confirmation form is posted.
    pub action: &'a str,
    /// Where to go when the action is cancelled.
    pub cancel: &'a str,
}

/// Render a page asking the user to confirm an action.
pub fn confirm(user: &User, flash: &FlashMessages, confirm: &Confirm)
-> Result<HttpResponse> {
    render(user, flash, "confirm.html", confirm)
}

/// Path to the list of versions of a document.
pub fn versions_url(document: i32) -> String {
    format!("/documents/{}/versions", document)
}

/// Path to the list of reviews of a document.
pub fn reviews_url(document: i32) -> String {
    format!("/documents/{}/reviews", document)
}
