//! Commands for managing documents and their versions.

use archivarr_models::{
    Document,
    Model,
    Version,
    audit::{DbAuditLog, Object},
    version::TIMESTAMP_FORMAT,
};
use failure::Error;
use std::{fs::File, path::{Path, PathBuf}};
use structopt::StructOpt;

use crate::{Config, Result};
use super::util::{connect, print_table};

#[derive(StructOpt)]
pub struct Opts {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Create a new document from a file
    #[structopt(name = "add")]
    Add(AddOpts),
    /// Add a new version to a document
    #[structopt(name = "add-version")]
    AddVersion(AddVersionOpts),
    /// List all versions of a document
    #[structopt(name = "versions")]
    Versions(DocumentOpts),
    /// Show audit trail of a document
    #[structopt(name = "events")]
    Events(DocumentOpts),
}

pub fn main(cfg: &Config, opts: Opts) -> Result<(), Error> {
    match opts.command {
        Command::Add(opts) => add(cfg, opts),
        Command::AddVersion(opts) => add_version(cfg, opts),
        Command::Versions(opts) => versions(cfg, opts),
        Command::Events(opts) => events(cfg, opts),
    }
}

#[derive(StructOpt)]
pub struct DocumentOpts {
    /// Document ID
    document: i32,
}

#[derive(StructOpt)]
pub struct AddOpts {
    /// Document's label
    label: String,
    /// File containing the first version
    #[structopt(parse(from_os_str))]
    file: PathBuf,
    /// Comment describing the first version
    #[structopt(long = "comment", short = "c", default_value = "")]
    comment: String,
}

fn add(cfg: &Config, opts: AddOpts) -> Result<()> {
    let store = connect(cfg)?;
    let file = File::open(&opts.file)?;

    let document = store.create_document(&opts.label)?;
    let version = store.add_version(
        document.id, &file_name(&opts.file), file, &opts.comment)?;

    println!("Created document {} with version {}", document.id, version.id);

    Ok(())
}

#[derive(StructOpt)]
pub struct AddVersionOpts {
    /// Document ID
    document: i32,
    /// File containing the new version
    #[structopt(parse(from_os_str))]
    file: PathBuf,
    /// Comment describing the new version
    #[structopt(long = "comment", short = "c", default_value = "")]
    comment: String,
}

fn add_version(cfg: &Config, opts: AddVersionOpts) -> Result<()> {
    let store = connect(cfg)?;
    let document = Document::by_id(&store, opts.document)?;
    let file = File::open(&opts.file)?;

    let version = store.add_version(
        document.id, &file_name(&opts.file), file, &opts.comment)?;

    println!("Created version {} of {}", version.id, document.label);

    Ok(())
}

fn versions(cfg: &Config, opts: DocumentOpts) -> Result<()> {
    let store = connect(cfg)?;
    let document = Document::by_id(&store, opts.document)?;
    let versions = Version::for_document(&store, &document)?;

    let rows = versions.iter()
        .map(|version| (
            version.id.to_string(),
            version.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            version.filename.as_str(),
            version.mime.as_str(),
            version.page_count.map_or_else(String::new, |c| c.to_string()),
            version.comment.as_str(),
        ))
        .collect::<Vec<_>>();

    print_table(("ID", "Timestamp", "File", "Type", "Pages", "Comment"), &rows);

    Ok(())
}

fn events(cfg: &Config, opts: DocumentOpts) -> Result<()> {
    let store = connect(cfg)?;
    let document = Document::by_id(&store, opts.document)?;
    let audit = DbAuditLog::new(store.pool().clone());
    let events = audit.for_target(Object::Document(document.id()))?;

    let rows = events.iter()
        .map(|event| (
            event.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            event.actor.map_or_else(|| "system".to_string(), |id| id.to_string()),
            event.kind.as_str(),
            match (&event.action_object_kind, event.action_object_id) {
                (Some(kind), Some(id)) => format!("{} {}", kind, id),
                _ => String::new(),
            },
        ))
        .collect::<Vec<_>>();

    print_table(("Timestamp", "Actor", "Event", "Object"), &rows);

    Ok(())
}

/// Name under which a file is stored, without its directory.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
