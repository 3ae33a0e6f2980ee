mod file_ext;
mod services;

pub mod messages;
pub mod params;

pub use self::{
    file_ext::{FileExt, zip_response},
    messages::{FlashMessages, Message},
    params::{DownloadParams, Selection},
    services::{DEFAULT_USER_HEADER, NotAuthenticatedError, Services},
};
