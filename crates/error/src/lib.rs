use actix_web::{HttpResponse, ResponseError};
use failure::Fail;
use log::error;
use serde::Serialize;
use std::borrow::Cow;

pub use actix_web::http::StatusCode;

/// Auto-implement [`From`] for a type.
#[macro_export]
macro_rules! impl_from {
    { for $type:ty ;
        $(
            $from:ty => | $pat:pat | $value:expr
        ),+
        $(,)*
    } => {
        $(
            impl From<$from> for $type {
                fn from(f: $from) -> $type {
                    let $pat = f;
                    $value
                }
            }
        )+
    };
}

/// An error that occurred while handling a request.
pub trait ApiError: Fail {
    /// HTTP response status code.
    fn status(&self) -> StatusCode;

    /// Internal code describing this error.
    ///
    /// This code is used to identify this error outside the system, and thus
    /// should only be present for errors which are intended to be reported
    /// to the user in detail.
    fn code(&self) -> Option<Cow<str>>;
}

/// A wrapper around many types of errors, including user-facing [`ApiError`]s
/// as well as many other errors that should not be reported to the user, such
/// as database connection errors.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{}", _0)]
    Api(Box<dyn ApiError>),
    /// Generic system error.
    #[fail(display = "{}", _0)]
    System(#[cause] std::io::Error),
    /// Error communicating with the database.
    ///
    /// Note that this variant also includes errors related to missing record,
    /// you may want to turn them into [`ApiError`]s instead.
    #[fail(display = "{}", _0)]
    Db(#[cause] diesel::result::Error),
    /// Error obtaining database connection for the pool.
    #[fail(display = "{}", _0)]
    DbPool(#[cause] r2d2::Error),
    /// Error rendering template.
    ///
    /// Note that due to [`tera::Error`] being `!Send + !Sync` it cannot be
    /// stored in this enum. Instead we keep its message.
    #[fail(display = "{}", _0)]
    Template(String),
}

impl<T: ApiError> From<T> for Error {
    fn from(error: T) -> Error {
        Error::Api(Box::new(error))
    }
}

impl_from! { for Error ;
    std::io::Error => |e| Error::System(e),
    diesel::result::Error => |e| Error::Db(e),
    r2d2::Error => |e| Error::DbPool(e),
}

impl From<tera::Error> for Error {
    fn from(e: tera::Error) -> Self {
        let mut msg = String::new();
        for (inx, err) in e.iter().enumerate() {
            if inx > 0 {
                msg.push_str(": ");
            }
            msg.push_str(&err.to_string());
        }
        Error::Template(msg)
    }
}

impl Error {
    /// Public code of this error, if it has one.
    pub fn code(&self) -> Option<Cow<str>> {
        match self {
            Error::Api(err) => err.code(),
            _ => None,
        }
    }

    /// HTTP status this error will be reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Api(err) => err.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        match self {
            Error::Api(err) => match err.code() {
                Some(code) => HttpResponse::build(err.status())
                    .json(ErrorResponse {
                        error: code,
                        raw: err.to_string(),
                    }),
                None => {
                    error!("{}", err);
                    HttpResponse::new(err.status())
                }
            },
            _ => {
                error!("{}", self);
                HttpResponse::InternalServerError()
                    .finish()
            }
        }
    }

    fn render_response(&self) -> HttpResponse {
        self.error_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse<'s> {
    error: Cow<'s, str>,
    raw: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Fail)]
    #[fail(display = "No such thing")]
    struct NotFound;

    impl ApiError for NotFound {
        fn status(&self) -> StatusCode {
            StatusCode::NOT_FOUND
        }

        fn code(&self) -> Option<Cow<str>> {
            Some(Cow::Borrowed("thing:not-found"))
        }
    }

    #[test]
    fn api_errors_keep_status_and_code() {
        let err = Error::from(NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code().as_ref().map(|c| &**c), Some("thing:not-found"));
        assert_eq!(err.error_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_errors_are_opaque() {
        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::Other, "disk on fire"));
        assert_eq!(err.code(), None);
        assert_eq!(err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn database_errors_are_opaque() {
        let err = Error::from(diesel::result::Error::NotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), None);
        assert_eq!(err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR);
    }
}
