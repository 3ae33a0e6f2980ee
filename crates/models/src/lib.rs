#[macro_use] extern crate diesel;

#[cfg(not(debug_assertions))]
#[macro_use]
extern crate diesel_migrations;

mod config;

pub mod audit;
pub mod db;
pub mod models;
pub mod permissions;
pub mod processing;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use self::{
    config::{Config, InvalidStorageError, Storage},
    models::*,
    permissions::{AclPermissions, DocumentPermissions, PermissionCheck},
    store::{PgStore, Store, StoreError, StoreResult},
};
