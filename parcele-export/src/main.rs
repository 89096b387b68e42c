//! Point d'entrée CLI pour parcele-export

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Variable de filtre des logs, prioritaire sur `RUST_LOG`
const LOG_ENV: &str = "CF_LOG";

/// Charge le premier `.env` trouvé (répertoire courant et parents, puis
/// répertoire du binaire) et renvoie son chemin
fn load_env() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        return Some(path);
    }
    let path = std::env::current_exe().ok()?.parent()?.join(".env");
    dotenvy::from_path(&path).ok().map(|()| path)
}

mod cli;

use cli::Commands;

/// Exporter les extraits de carte funciară vers JSON, GeoJSON et KML
#[derive(Parser)]
#[command(name = "parcele-export")]
#[command(author, version)]
#[command(about = "Exporter les extraits de carte funciară vers JSON, GeoJSON et KML")]
#[command(long_about = "Convertit des résultats d'extraction de parcelles (coordonnées Stereo 70) en JSON brut, GeoJSON WGS84 et KML.\n\nLes parcelles de moins de 3 sommets restent dans le JSON brut mais sont exclues des sorties géométriques.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Les CF_* du .env doivent être visibles avant la résolution de la config
    let env_file = load_env();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    match &env_file {
        Some(path) => debug!(file = %path.display(), "Loaded environment file"),
        None => debug!("No .env file found"),
    }

    match cli.command {
        Commands::Export(args) => {
            info!(inputs = args.input.len(), output = ?args.output, "Export");
            cli::cmd_export(args).await?;
        }
        Commands::Schema => {
            cli::cmd_schema()?;
        }
    }

    Ok(())
}

/// Niveau de log selon `-q` / `-v`
fn log_level(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::from_default_env())
        .add_directive(log_level(verbose, quiet).into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0, false), Level::INFO);
        assert_eq!(log_level(1, false), Level::DEBUG);
        assert_eq!(log_level(3, false), Level::TRACE);
        assert_eq!(log_level(2, true), Level::WARN);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["parcele-export", "schema", "-vv"]).unwrap();
        assert_eq!(log_level(cli.verbose, cli.quiet), Level::TRACE);
        assert!(matches!(cli.command, Commands::Schema));

        let cli = Cli::try_parse_from(["parcele-export", "-q", "export", "-i", "a.json"]).unwrap();
        assert_eq!(log_level(cli.verbose, cli.quiet), Level::WARN);
        match cli.command {
            Commands::Export(args) => assert_eq!(args.input, vec![PathBuf::from("a.json")]),
            Commands::Schema => panic!("Expected export"),
        }
    }
}
