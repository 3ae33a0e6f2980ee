//! Server administration.

use actix::System;
use actix_web::{App, HttpServer, middleware::{Compress, Logger}};
use archivarr_models::{
    AclPermissions,
    PgStore,
    Store,
    audit::DbAuditLog,
    db,
    processing::PageCountUpdater,
};
use archivarr_web::Services;
use failure::Error;
use log::info;
use std::sync::Arc;
use structopt::StructOpt;

use crate::Config;

#[derive(StructOpt)]
pub struct Opts {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Start the server
    #[structopt(name = "start")]
    Start,
}

pub fn main(cfg: Config, opts: Opts) -> Result<(), Error> {
    match opts.command {
        Command::Start => start(cfg),
    }
}

pub fn start(config: Config) -> Result<(), Error> {
    let system = System::new("archivarr");

    let pool = db::configure_pool(config.model.database.as_ref())?;
    let store: Arc<dyn Store> = Arc::new(
        PgStore::new(pool.clone(), config.model.storage.clone()));
    let page_counter = PageCountUpdater::start(store.clone());

    let services = Services::new(
        store.clone(),
        Arc::new(AclPermissions::new(store)),
        Arc::new(DbAuditLog::new(pool)),
        Arc::new(page_counter),
    ).with_user_header(config.server.user_header.clone());

    let address = config.server.address;
    let domain = config.server.domain.clone();

    let server = HttpServer::new(move ||
        App::new()
            .hostname(&config.server.domain)
            .data(services.clone())
            .wrap(Logger::default())
            .wrap(Compress::default())
            .configure(archivarr_pages::configure)
    );

    let server = if let Some(fd) = listenfd::ListenFd::from_env().take_tcp_listener(0)? {
        server.listen(fd)?
    } else {
        server.bind(address)?
    };

    info!("Serving {} on {}", domain, address);

    server
        .server_hostname(domain)
        .start();

    system.run()?;

    Ok(())
}
