use std::process::exit;

use clap::Parser;
use log::{debug, error, info};

use sagenote::{App, Cli, Config, FileBackend, NoteStore, Result};

pub fn initialize_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    debug!("Logger initialized");
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let backend = FileBackend::new(config.store_path());
    let store = NoteStore::open(backend)?;
    info!("Opened note store at {}", config.store_path().display());

    let mut app = App::new(store, config, cli.verbose);
    app.run(cli.command)
}

fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        exit(1);
    }
}
