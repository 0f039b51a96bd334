use crate::render;
use anyhow::{Context, Result, bail};
use dbrev_core::{
    DataMap, ReverseEngineeringConfig, ReverseEngineeringConfigStore, ReverseEngineeringSession,
};
use dbrev_driver_sqlite::SqliteMetadataLoader;
use std::path::PathBuf;

const USAGE: &str = "usage: dbrev <sqlite-file> [--config <json>] [--json] [--no-procedures]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub database: PathBuf,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub skip_procedures: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(CliArgs),
    Help,
}

pub fn run(args: &[String]) -> i32 {
    let command = match parse_args(args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            return 1;
        }
    };

    let args = match command {
        Command::Help => {
            println!("{}", USAGE);
            return 0;
        }
        Command::Run(args) => args,
    };

    match execute(&args) {
        Ok(output) => {
            print!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

/// Parses `args` as given by `std::env::args` (program name first).
pub fn parse_args(args: &[String]) -> Result<Command> {
    let mut database = None;
    let mut config = None;
    let mut json = false;
    let mut skip_procedures = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--json" => json = true,
            "--no-procedures" => skip_procedures = true,
            "--config" => {
                let path = iter.next().context("--config needs a file argument")?;
                config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            path => {
                if database.is_some() {
                    bail!("unexpected argument {}", path);
                }
                database = Some(PathBuf::from(path));
            }
        }
    }

    let database = database.context("missing database file")?;

    Ok(Command::Run(CliArgs {
        database,
        config,
        json,
        skip_procedures,
    }))
}

fn load_config(args: &CliArgs) -> Result<ReverseEngineeringConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            ReverseEngineeringConfigStore::with_path(path)
                .load()
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => match ReverseEngineeringConfigStore::new() {
            Ok(store) => store
                .load()
                .with_context(|| format!("failed to load config {}", store.path().display()))?,
            Err(e) => {
                log::debug!("No user config directory ({}), using defaults", e);
                ReverseEngineeringConfig::default()
            }
        },
    };

    if args.skip_procedures {
        config.skip_procedures = true;
    }

    Ok(config)
}

fn execute(args: &CliArgs) -> Result<String> {
    let config = load_config(args)?;

    let loader = SqliteMetadataLoader::open(&args.database)
        .with_context(|| format!("failed to open {}", args.database.display()))?;

    let key = args.database.display().to_string();
    let mut session = ReverseEngineeringSession::new(key.clone());
    let mut data_map = DataMap::new(key);

    let report = session
        .run(&loader, &mut data_map, &config)
        .context("reverse engineering failed")?;

    let mut output = if args.json {
        render::render_json(session.model())?
    } else {
        render::render_outline(session.model())
    };

    output.push_str(&format!("{}\n", report));
    Ok(output)
}
