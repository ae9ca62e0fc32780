//! config-router command line.
//!
//! Compiles route configuration files without serving them:
//!
//! ```text
//! config-router [--settings settings.toml] check api.yaml
//!     → load settings (defaults when omitted)
//!     → Parser::parse_from_file (relative to parser.config_dir)
//!     → print the route tree, or the first error
//!
//! config-router routes api.yaml
//!     → same compilation
//!     → print one line per registration: VERB /full/path -> controller
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};

use config_router::config::{load_settings, Settings};
use config_router::observability::logging;
use config_router::{Dispatcher, Parser};

#[derive(ClapParser)]
#[command(name = "config-router")]
#[command(about = "Compile and inspect YAML route configurations", long_about = None)]
struct Cli {
    /// TOML settings file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a configuration file and print its tree
    Check { file: PathBuf },
    /// List the routes a configuration file registers
    Routes { file: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => match load_settings(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };
    if let Err(e) = logging::init(&settings.logging) {
        eprintln!("Warning: logging not initialized: {e}");
    }

    let mut parser = Parser::new(Dispatcher::new(), settings.parser.clone());
    let file = match &cli.command {
        Commands::Check { file } | Commands::Routes { file } => file,
    };
    if let Err(e) = parser.parse_from_file(file) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Commands::Check { .. } => println!("{parser}"),
        Commands::Routes { .. } => {
            for route in parser.routes() {
                println!("{route}");
            }
        }
    }
    ExitCode::SUCCESS
}
