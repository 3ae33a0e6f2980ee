use actix_web::{
    HttpResponse,
    http::StatusCode,
    web::{self, ServiceConfig},
};
use archivarr_models::{Model, User};
use archivarr_web::{FlashMessages, Message};
use lazy_static::lazy_static;
use serde::Serialize;
use tera::{Tera, compile_templates};

mod common;
mod documents;
mod reviews;
mod versions;

lazy_static! {
    static ref TEMPLATES: Tera = compile_templates!(
        concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*"));
}

type Result<T, E=archivarr_error::Error> = std::result::Result<T, E>;

/// Configure routes
pub fn configure(app: &mut ServiceConfig) {
    app
        .route("/documents/recent", web::get().to(documents::recent))
        .route("/documents/{id}/versions", web::get().to(versions::list))
        .route("/documents/versions/multiple/download",
            web::to(versions::download_multiple))
        .service(web::resource("/documents/versions/multiple/page_count")
            .route(web::get().to(versions::page_count_multiple))
            .route(web::post().to(versions::do_page_count_multiple))
        )
        .route("/documents/versions/{id}", web::get().to(versions::preview))
        .service(web::resource("/documents/versions/{id}/download/form")
            .route(web::get().to(versions::download_form))
            .route(web::post().to(versions::do_download_form))
        )
        .route("/documents/versions/{id}/download", web::to(versions::download))
        .service(web::resource("/documents/versions/{id}/revert")
            .route(web::get().to(versions::revert))
            .route(web::post().to(versions::do_revert))
        )
        .service(web::resource("/documents/versions/{id}/page_count")
            .route(web::get().to(versions::page_count))
            .route(web::post().to(versions::do_page_count))
        )
        .route("/documents/{id}/reviews", web::get().to(reviews::list))
        .service(web::resource("/documents/{id}/reviews/new")
            .route(web::get().to(reviews::new))
            .route(web::post().to(reviews::create))
        )
        .route("/reviews/{id}", web::get().to(reviews::details))
        .service(web::resource("/reviews/{id}/edit")
            .route(web::get().to(reviews::edit))
            .route(web::post().to(reviews::do_edit))
        )
        .service(web::resource("/reviews/{id}/delete")
            .route(web::get().to(reviews::delete))
            .route(web::post().to(reviews::do_delete))
        )
    ;
}

/// Data available to every page.
#[derive(Serialize)]
struct Page<'a, T> {
    user: <User as Model>::Public,
    messages: Vec<&'a Message>,
    #[serde(flatten)]
    content: &'a T,
}

/// Render a named template with a given context.
///
/// Messages left by the previous request are shown on the rendered page and
/// then discarded.
fn render<T>(user: &User, flash: &FlashMessages, name: &str, context: &T)
-> Result<HttpResponse>
where
    T: Serialize,
{
    render_code(user, flash, StatusCode::OK, name, context)
}

/// Render a named template with a given context and given status code.
fn render_code<T>(
    user: &User,
    flash: &FlashMessages,
    code: StatusCode,
    name: &str,
    context: &T,
) -> Result<HttpResponse>
where
    T: Serialize,
{
    let body = TEMPLATES.render(name, &Page {
        user: user.get_public(),
        messages: flash.iter().collect(),
        content: context,
    })?;

    let mut rsp = HttpResponse::build(code);
    flash.clear(&mut rsp);

    Ok(rsp.content_type("text/html; charset=utf-8").body(body))
}
