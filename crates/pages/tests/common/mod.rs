//! Client for testing interactions with the pages.

#![allow(dead_code)]

use actix_web::{
    App,
    http::{
        Cookie,
        HeaderMap,
        StatusCode,
        header::{CONTENT_TYPE, HeaderValue, SET_COOKIE},
    },
    test::{self, TestRequest},
};
use archivarr_models::{
    AclPermissions,
    DocumentPermissions,
    db::models as db,
    testing::{MemoryAuditLog, MemoryStore, RecordingQueue},
};
use archivarr_web::Services;
use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;

/// Timestamp on `day` of January 2019, at `hour`.
pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd(2019, 1, day).and_hms(hour, 0, 0)
}

/// In-memory collaborators behind a test application.
pub struct Client {
    pub store: Arc<MemoryStore>,
    pub audit: Arc<MemoryAuditLog>,
    pub tasks: Arc<RecordingQueue>,
    services: Services,
    user: Option<String>,
    cookies: Vec<Cookie<'static>>,
}

impl Client {
    pub fn new() -> Client {
        let store = Arc::new(MemoryStore::new());
        let audit = Arc::new(MemoryAuditLog::new());
        let tasks = Arc::new(RecordingQueue::new());
        let services = Services::new(
            store.clone(),
            Arc::new(AclPermissions::new(store.clone())),
            audit.clone(),
            tasks.clone(),
        );

        Client {
            store,
            audit,
            tasks,
            services,
            user: None,
            cookies: Vec::new(),
        }
    }

    /// Create a user and make all further requests on their behalf.
    pub fn login(&mut self, username: &str) -> db::User {
        let user = self.store.add_user(username, "");
        self.user = Some(username.to_string());
        user
    }

    /// Make all further requests anonymously.
    pub fn logout(&mut self) {
        self.user = None;
    }

    /// Grant the current user permissions over a document.
    pub fn grant(&self, user: &db::User, document: i32, permissions: DocumentPermissions) {
        self.store.grant(user.id, document, permissions);
    }

    /// Send cookies set by `response` with the next request.
    pub fn keep_cookies(&mut self, response: &Response) {
        self.cookies.extend(response.cookies());
    }

    pub fn get(&mut self, path: &str) -> Response {
        self.execute(TestRequest::get().uri(path))
    }

    pub fn post(&mut self, path: &str) -> Response {
        self.execute(TestRequest::post().uri(path))
    }

    /// Send a POST request with a urlencoded form as its body.
    pub fn post_form(&mut self, path: &str, form: &str) -> Response {
        self.execute(TestRequest::post()
            .uri(path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .set_payload(form.to_string()))
    }

    fn execute(&mut self, mut request: TestRequest) -> Response {
        if let Some(ref user) = self.user {
            request = request.header("X-Remote-User", user.as_str());
        }

        for cookie in self.cookies.drain(..) {
            request = request.cookie(cookie);
        }

        let mut app = test::init_service(App::new()
            .data(self.services.clone())
            .configure(archivarr_pages::configure));
        let response = test::call_service(&mut app, request.to_request());
        let status = response.status();
        let headers = response.headers().clone();
        let body = test::read_body(response);

        Response { status, headers, body }
    }
}

pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Assert that this response uses specified code.
    pub fn assert_status(self, code: StatusCode) -> Self {
        assert_eq!(self.status, code, "Bad status code");
        self
    }

    /// Assert that this response is a success.
    pub fn assert_success(self) -> Self {
        assert!(self.status.is_success(), "Expected success, not {}", self.status);
        self
    }

    /// Assert that this response redirects to `location`.
    pub fn assert_redirect(self, location: &str) -> Self {
        assert_eq!(self.status, StatusCode::SEE_OTHER, "Expected redirection");
        assert_eq!(self.header("location").to_str().unwrap(), location);
        self
    }

    /// Get value of a header.
    ///
    /// This function will panic if header was not set.
    pub fn header(&self, name: &str) -> &HeaderValue {
        match self.headers.get(name) {
            Some(h) => h,
            None => panic!("Expected header {} to be set", name),
        }
    }

    pub fn cookies(&self) -> Vec<Cookie<'static>> {
        self.headers.get_all(SET_COOKIE)
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(value.to_string()).ok())
            .collect()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body of this response as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Assert that this response is an API error with specified HTTP status
    /// code and error code string.
    pub fn assert_error(self, status: StatusCode, code: &str) {
        assert_eq!(self.status, status);

        let data: serde_json::Value = serde_json::from_slice(&self.body)
            .expect("Expected a JSON error");
        assert_eq!(data["error"], code);
    }
}
