//! Commands for managing users.

use archivarr_models::{DocumentPermissions, Store};
use failure::{Error, format_err};
use structopt::StructOpt;

use crate::{Config, Result};
use super::util::{connect, parse_permissions_arg};

#[derive(StructOpt)]
pub struct Opts {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Add a new user
    #[structopt(name = "add")]
    Add(AddOpts),
    /// Grant permissions to a user
    #[structopt(name = "grant")]
    Grant(GrantOpts),
}

pub fn main(cfg: &Config, opts: Opts) -> Result<(), Error> {
    match opts.command {
        Command::Add(opts) => add_user(cfg, opts),
        Command::Grant(opts) => grant(cfg, opts),
    }
}

#[derive(StructOpt)]
pub struct AddOpts {
    /// Username, as passed by the authenticating proxy
    username: String,
    /// User's full name
    #[structopt(long = "full-name", short = "n", default_value = "")]
    full_name: String,
    /// This user is an administrator
    #[structopt(long = "super")]
    is_super: bool,
}

pub fn add_user(cfg: &Config, opts: AddOpts) -> Result<()> {
    let store = connect(cfg)?;
    let user = store.create_user(&opts.username, &opts.full_name, opts.is_super)?;

    println!("Created user {}", user.id);

    Ok(())
}

#[derive(StructOpt)]
pub struct GrantOpts {
    /// Username of the user to grant permissions to
    username: String,
    /// Comma-separated list of permissions, such as
    /// `version:view,document:download`
    #[structopt(parse(try_from_str = parse_permissions_arg))]
    permissions: DocumentPermissions,
    /// Grant permissions over just this document instead of all documents
    #[structopt(long = "document", short = "d")]
    document: Option<i32>,
}

pub fn grant(cfg: &Config, opts: GrantOpts) -> Result<()> {
    let store = connect(cfg)?;
    let user = store.user_by_name(&opts.username)?
        .ok_or_else(|| format_err!("No such user: {}", opts.username))?;

    if let Some(document) = opts.document {
        store.document(document)?
            .ok_or_else(|| format_err!("No such document: {}", document))?;
    }

    store.grant(user.id, opts.document, opts.permissions)?;

    match opts.document {
        Some(document) => println!("Granted {:?} over document {} to {}",
            opts.permissions, document, user.username),
        None => println!("Granted {:?} over all documents to {}",
            opts.permissions, user.username),
    }

    Ok(())
}
