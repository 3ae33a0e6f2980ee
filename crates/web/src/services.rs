use actix_web::HttpRequest;
use archivarr_error::{ApiError, Error, StatusCode};
use archivarr_models::{
    PermissionCheck,
    Store,
    User,
    audit::AuditLog,
    processing::TaskQueue,
};
use failure::Fail;
use log::debug;
use std::{borrow::Cow, sync::Arc};

/// Name of the header carrying username of the authenticated user, unless
/// configured otherwise.
pub const DEFAULT_USER_HEADER: &str = "X-Remote-User";

/// Collaborators shared by all request handlers.
///
/// This structure is designed to work with [`actix_web::web::Data`].
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn Store>,
    pub permissions: Arc<dyn PermissionCheck>,
    pub audit: Arc<dyn AuditLog>,
    pub tasks: Arc<dyn TaskQueue>,
    /// Header in which the authenticating proxy passes username.
    pub user_header: String,
}

impl Services {
    pub fn new(
        store: Arc<dyn Store>,
        permissions: Arc<dyn PermissionCheck>,
        audit: Arc<dyn AuditLog>,
        tasks: Arc<dyn TaskQueue>,
    ) -> Services {
        Services {
            store,
            permissions,
            audit,
            tasks,
            user_header: DEFAULT_USER_HEADER.to_string(),
        }
    }

    pub fn with_user_header(self, user_header: String) -> Services {
        Services { user_header, ..self }
    }

    /// Find the user on whose behalf a request was made.
    ///
    /// Users are authenticated by an upstream proxy, which passes their
    /// username in a header.
    pub fn authenticate(&self, req: &HttpRequest) -> Result<User, Error> {
        let username = req.headers()
            .get(self.user_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(NotAuthenticatedError)?;

        match User::by_name(&*self.store, username)? {
            Some(user) => Ok(user),
            None => {
                debug!("Request made on behalf of unknown user {:?}", username);
                Err(NotAuthenticatedError.into())
            }
        }
    }
}

#[derive(Debug, Fail)]
#[fail(display = "Authentication required")]
pub struct NotAuthenticatedError;

impl ApiError for NotAuthenticatedError {
    fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn code(&self) -> Option<Cow<str>> {
        Some(Cow::Borrowed("user:not-authenticated"))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;
    use archivarr_models::{
        AclPermissions,
        testing::{MemoryAuditLog, MemoryStore, RecordingQueue},
    };
    use super::*;

    fn services() -> (Arc<MemoryStore>, Services) {
        let store = Arc::new(MemoryStore::new());
        let services = Services::new(
            store.clone(),
            Arc::new(AclPermissions::new(store.clone())),
            Arc::new(MemoryAuditLog::new()),
            Arc::new(RecordingQueue::new()),
        );
        (store, services)
    }

    #[test]
    fn known_user_is_authenticated() {
        let (store, services) = services();
        let jdoe = store.add_user("jdoe", "Jane Doe");

        let req = TestRequest::with_header("X-Remote-User", "jdoe").to_http_request();
        let user = services.authenticate(&req).unwrap();

        assert_eq!(user.id, jdoe.id);
    }

    #[test]
    fn missing_or_unknown_user_is_rejected() {
        let (_, services) = services();

        let req = TestRequest::default().to_http_request();
        let err = services.authenticate(&req).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let req = TestRequest::with_header("X-Remote-User", "nobody")
            .to_http_request();
        let err = services.authenticate(&req).unwrap_err();
        assert_eq!(err.code().as_ref().map(|c| &**c), Some("user:not-authenticated"));
    }

    #[test]
    fn user_header_is_configurable() {
        let (store, services) = services();
        store.add_user("jdoe", "");
        let services = services.with_user_header("X-Forwarded-User".to_string());

        let req = TestRequest::with_header("X-Remote-User", "jdoe").to_http_request();
        assert!(services.authenticate(&req).is_err());

        let req = TestRequest::with_header("X-Forwarded-User", "jdoe")
            .to_http_request();
        assert!(services.authenticate(&req).is_ok());
    }
}
