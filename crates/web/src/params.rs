//! Request parameters shared by document version views.

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use archivarr_error::{ApiError, Error, StatusCode};
use failure::Fail;
use futures::future::{self, FutureResult};
use serde::Deserialize;
use std::borrow::Cow;
use url::form_urlencoded;

/// Name of the archive used when none was given.
pub const DEFAULT_ZIP_FILENAME: &str = "Documents";

/// Parse a boolean flag passed as a request parameter.
///
/// Only `true` and `True` are considered set.
pub fn parse_flag(value: Option<&str>) -> bool {
    match value {
        Some("true") | Some("True") => true,
        _ => false,
    }
}

/// Is `path` a path on this site (as opposed to an absolute URL, or
/// a protocol-relative one)?
pub fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control)
}

/// Selection of objects, passed in the `id_list` parameter.
///
/// The parameter may be repeated (as submitted by a list of checkboxes), and
/// each of its values may itself be a comma-separated list of IDs.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    pub id_list: Vec<String>,
    /// Where to go after the action completes.
    pub next: Option<String>,
}

impl Selection {
    /// Read selection from a URL-encoded query string.
    pub fn from_query(query: &str) -> Selection {
        let mut selection = Selection::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "id_list" => selection.id_list.push(value.into_owned()),
                "next" => selection.next = Some(value.into_owned()),
                _ => {}
            }
        }

        selection
    }

    /// Parse the list of selected IDs.
    ///
    /// Empty items are ignored, and so are duplicates.
    pub fn ids(&self) -> Result<Vec<i32>, InvalidSelectionError> {
        let mut ids = Vec::new();

        let items = self.id_list.iter()
            .flat_map(|list| list.split(','))
            .map(str::trim);

        for item in items {
            if item.is_empty() {
                continue;
            }

            let id = item.parse::<i32>()
                .map_err(|_| InvalidSelectionError(item.to_string()))?;

            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        Ok(ids)
    }

    /// Local path to redirect to after the action completes, if one was
    /// requested.
    pub fn next(&self) -> Option<&str> {
        self.next.as_ref()
            .map(String::as_str)
            .filter(|next| is_local_path(next))
    }
}

impl FromRequest for Selection {
    type Error = Error;
    type Future = FutureResult<Selection, Error>;
    type Config = ();

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        future::ok(Selection::from_query(req.query_string()))
    }
}

#[derive(Debug, Fail)]
#[fail(display = "Invalid object ID: {:?}", _0)]
pub struct InvalidSelectionError(String);

impl ApiError for InvalidSelectionError {
    fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn code(&self) -> Option<Cow<str>> {
        Some(Cow::Borrowed("selection:invalid"))
    }
}

/// Options of a version download.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DownloadParams {
    pub compressed: Option<String>,
    pub zip_filename: Option<String>,
    pub preserve_extension: Option<String>,
}

impl DownloadParams {
    /// Combine parameters from the query string with those from the request
    /// body. Values from the query string take precedence.
    pub fn merge(query: DownloadParams, form: Option<DownloadParams>)
    -> DownloadParams {
        let form = form.unwrap_or_default();

        DownloadParams {
            compressed: query.compressed.or(form.compressed),
            zip_filename: query.zip_filename.or(form.zip_filename),
            preserve_extension: query.preserve_extension
                .or(form.preserve_extension),
        }
    }

    pub fn compressed(&self) -> bool {
        parse_flag(self.compressed.as_ref().map(String::as_str))
    }

    pub fn preserve_extension(&self) -> bool {
        parse_flag(self.preserve_extension.as_ref().map(String::as_str))
    }

    /// Name of the archive to send, always ending with `.zip`.
    pub fn zip_filename(&self) -> String {
        let name = self.zip_filename.as_ref()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_ZIP_FILENAME);

        if name.ends_with(".zip") {
            name.to_string()
        } else {
            format!("{}.zip", name)
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;
    use futures::Future;
    use super::*;

    #[test]
    fn flags_are_set_only_by_true() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("True")));
        assert!(!parse_flag(Some("TRUE")));
        assert!(!parse_flag(Some("1")));
        assert!(!parse_flag(Some("on")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn selection_parses_id_list() {
        let selection = Selection::from_query("id_list=3,%201,,3,7");
        assert_eq!(selection.ids().unwrap(), [3, 1, 7]);

        let selection = Selection::from_query("id_list=1,two");
        let err = selection.ids().unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn selection_accepts_repeated_id_list() {
        let selection = Selection::from_query(
            "id_list=4&compressed=true&id_list=2,9&id_list=4&next=%2Fdocuments%2Frecent");

        assert_eq!(selection.ids().unwrap(), [4, 2, 9]);
        assert_eq!(selection.next(), Some("/documents/recent"));
    }

    #[test]
    fn selection_is_extracted_from_request() {
        let req = TestRequest::with_uri(
            "/documents/versions/multiple/download?id_list=1&id_list=3")
            .to_http_request();
        let selection = Selection::extract(&req).wait().unwrap();

        assert_eq!(selection.ids().unwrap(), [1, 3]);
        assert_eq!(selection.next(), None);
    }

    #[test]
    fn only_local_next_is_accepted() {
        let next = |next: &str| Selection {
            id_list: Vec::new(),
            next: Some(next.to_string()),
        };

        assert_eq!(next("/documents/1/versions").next(), Some("/documents/1/versions"));
        assert_eq!(next("https://evil.example/").next(), None);
        assert_eq!(next("//evil.example/").next(), None);
        assert_eq!(next("/\\evil.example/").next(), None);
    }

    #[test]
    fn query_takes_precedence_over_form() {
        let query = DownloadParams {
            preserve_extension: Some("False".to_string()),
            ..DownloadParams::default()
        };
        let form = DownloadParams {
            compressed: Some("true".to_string()),
            preserve_extension: Some("true".to_string()),
            ..DownloadParams::default()
        };

        let params = DownloadParams::merge(query, Some(form));
        assert!(params.compressed());
        assert!(!params.preserve_extension());
    }

    #[test]
    fn zip_filename_defaults_and_gets_extension() {
        assert_eq!(DownloadParams::default().zip_filename(), "Documents.zip");

        let params = DownloadParams {
            zip_filename: Some("Reports".to_string()),
            ..DownloadParams::default()
        };
        assert_eq!(params.zip_filename(), "Reports.zip");

        let params = DownloadParams {
            zip_filename: Some("Reports.zip".to_string()),
            ..DownloadParams::default()
        };
        assert_eq!(params.zip_filename(), "Reports.zip");
    }
}
