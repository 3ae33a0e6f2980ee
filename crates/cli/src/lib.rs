use failure::Error;
use structopt::StructOpt;

mod config;
mod document;
mod server;
mod user;
mod util;

use self::config::Config;

pub type Result<T, E=Error> = std::result::Result<T, E>;

#[derive(StructOpt)]
#[structopt(name = "archivarr")]
struct Opts {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Manage server
    #[structopt(name = "server")]
    Server(server::Opts),
    /// Manage documents
    #[structopt(name = "document")]
    Document(document::Opts),
    /// Manage users
    #[structopt(name = "user")]
    User(user::Opts),
}

pub fn main() -> Result<(), Error> {
    let opts = Opts::from_args();
    let config = config::load()?;

    setup_logging(&config.logging)?;

    // Validate after logging is set up so that problems are logged too.
    config.validate()?;

    match opts.command {
        Command::Server(opts) => server::main(config, opts),
        Command::Document(opts) => document::main(&config, opts),
        Command::User(opts) => user::main(&config, opts),
    }
}

fn setup_logging(config: &config::Logging) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(config.level);

    if let Some(level) = config.network {
        builder.filter_module("actix_web", level);
    }

    for (module, level) in &config.filters {
        builder.filter_module(&module, *level);
    }

    builder.try_init()?;

    Ok(())
}
