//! One-time messages shown to the user on the next rendered page.
//!
//! Messages are carried between requests in a cookie holding base64-encoded
//! JSON. A redirect sets the cookie, and the page rendered after it shows the
//! messages and removes the cookie.

use actix_web::{
    FromRequest,
    HttpMessage,
    HttpRequest,
    HttpResponse,
    dev::{HttpResponseBuilder, Payload},
    http::{Cookie, header::LOCATION},
};
use archivarr_error::Error;
use futures::future::{self, FutureResult};
use log::warn;
use serde::{Deserialize, Serialize};
use time::Duration;

/// Name of the cookie carrying messages.
const COOKIE: &str = "messages";

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

impl Message {
    pub fn success<T: Into<String>>(text: T) -> Message {
        Message { level: Level::Success, text: text.into() }
    }

    pub fn error<T: Into<String>>(text: T) -> Message {
        Message { level: Level::Error, text: text.into() }
    }

    pub fn info<T: Into<String>>(text: T) -> Message {
        Message { level: Level::Info, text: text.into() }
    }
}

/// Messages left for this request by a previous one.
#[derive(Debug, Default)]
pub struct FlashMessages(Vec<Message>);

impl FlashMessages {
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<Message> {
        self.0
    }

    /// Read messages from a request's cookies.
    pub fn from_http_request(req: &HttpRequest) -> FlashMessages {
        let cookie = match req.cookie(COOKIE) {
            Some(cookie) => cookie,
            None => return FlashMessages::default(),
        };

        match decode(cookie.value()) {
            Some(messages) => FlashMessages(messages),
            None => {
                warn!("Discarding malformed messages cookie");
                FlashMessages::default()
            }
        }
    }

    /// Remove the messages cookie, if it was present, so that messages are
    /// not shown again.
    pub fn clear(&self, rsp: &mut HttpResponseBuilder) {
        if !self.0.is_empty() {
            rsp.cookie(Cookie::build(COOKIE, "")
                .path("/")
                .max_age_time(Duration::zero())
                .expires(time::now() - Duration::days(365))
                .finish());
        }
    }
}

impl FromRequest for FlashMessages {
    type Error = Error;
    type Future = FutureResult<FlashMessages, Error>;
    type Config = ();

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        future::ok(FlashMessages::from_http_request(req))
    }
}

/// Build a 303 See Other redirect carrying `messages` to the next page.
pub fn redirect(location: &str, messages: &[Message]) -> HttpResponse {
    let mut rsp = HttpResponse::SeeOther();
    rsp.header(LOCATION, location);

    if !messages.is_empty() {
        rsp.cookie(Cookie::build(COOKIE, encode(messages))
            .path("/")
            .http_only(true)
            .finish());
    }

    rsp.finish()
}

fn encode(messages: &[Message]) -> String {
    // Serializing plain strings and enums cannot fail.
    let json = serde_json::to_vec(messages).unwrap_or_default();
    base64::encode_config(&json, base64::URL_SAFE)
}

fn decode(value: &str) -> Option<Vec<Message>> {
    let json = base64::decode_config(value, base64::URL_SAFE).ok()?;
    serde_json::from_slice(&json).ok()
}

#[cfg(test)]
mod tests {
    use actix_web::{http::{StatusCode, header::SET_COOKIE}, test::TestRequest};
    use super::*;

    #[test]
    fn redirect_sets_cookie_read_by_next_request() {
        let messages = [
            Message::success("Document version reverted successfully"),
            Message::error("Something; went \"wrong\""),
        ];

        let rsp = redirect("/documents/1/versions", &messages);
        assert_eq!(rsp.status(), StatusCode::SEE_OTHER);
        assert_eq!(rsp.headers().get(LOCATION).unwrap(), "/documents/1/versions");

        let cookie = rsp.cookies().find(|c| c.name() == COOKIE).unwrap();
        let req = TestRequest::default()
            .cookie(cookie.into_owned())
            .to_http_request();

        let flash = FlashMessages::from_http_request(&req);
        assert_eq!(flash.into_inner(), messages.to_vec());
    }

    #[test]
    fn redirect_without_messages_sets_no_cookie() {
        let rsp = redirect("/", &[]);
        assert!(rsp.headers().get(SET_COOKIE).is_none());
    }

    #[test]
    fn malformed_cookie_is_ignored() {
        let req = TestRequest::default()
            .cookie(Cookie::new(COOKIE, "not base64!"))
            .to_http_request();

        assert!(FlashMessages::from_http_request(&req).is_empty());
    }

    #[test]
    fn clearing_removes_cookie_only_when_messages_were_shown() {
        let empty = FlashMessages::default();
        let mut rsp = HttpResponse::Ok();
        empty.clear(&mut rsp);
        assert!(rsp.finish().headers().get(SET_COOKIE).is_none());

        let shown = FlashMessages(vec![Message::info("hello")]);
        let mut rsp = HttpResponse::Ok();
        shown.clear(&mut rsp);
        let rsp = rsp.finish();
        let cookie = rsp.cookies().find(|c| c.name() == COOKIE).unwrap();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::zero()));
        assert!(cookie.expires().unwrap() < time::now());
    }
}
