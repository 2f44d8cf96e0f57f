//! Binario `chemsim`: búsqueda de similitud desde la terminal.
//!
//! Subcomandos:
//! - `search <SMILES>`: una consulta, imprime la tabla (o JSON).
//! - `shell`: bucle interactivo; `:reload` reconstruye la biblioteca,
//!   `:info` muestra el índice vigente, `:quit` sale.
//! - `info`: estadísticas del índice construido.

use chem_adapters::{ResultTable, TableColumns};
use chem_core::{Fingerprinter, SearchEngine};
use chemengine::SmilesParser;
use chemsim::{load_configured_dataset, load_library, AppConfig, BuildReport, BuildSettings, CoreError, LibraryHandle,
              LibraryIndex, CONFIG};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chemsim", version)]
#[command(about = "Búsqueda de moléculas similares por fingerprint y Tanimoto")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Busca las moléculas más similares a un SMILES.
    Search {
        smiles: String,
        /// CSV de la biblioteca (por defecto CHEMSIM_DATASET).
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Número de resultados (por defecto CHEMSIM_TOP_K).
        #[arg(short = 'k', long = "top-k")]
        k: Option<usize>,
        /// Salida JSON.
        #[arg(long)]
        json: bool,
    },
    /// Bucle interactivo de consultas.
    Shell {
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
    /// Muestra información del índice.
    Info {
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Salida JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env())
                             .with_writer(io::stderr)
                             .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn config_with(dataset: Option<PathBuf>) -> Result<AppConfig, CoreError> {
    let mut config = CONFIG.as_ref().map_err(|e| CoreError::Config(e.clone()))?.clone();
    if dataset.is_some() {
        config.dataset = dataset;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<(), CoreError> {
    match cli.command {
        Command::Search { smiles, dataset, k, json } => {
            let config = config_with(dataset)?;
            let (index, _) = load_library(&config)?;
            let engine = SearchEngine::with_options(SmilesParser, config.search_options());
            let response = engine.search(&smiles, &index, k.unwrap_or(config.top_k), true);
            let table = ResultTable::from_response(&response, &TableColumns::default());
            let mut out = io::stdout().lock();
            if json {
                writeln!(out, "{}", table.to_json()?)?;
            } else {
                write!(out, "{table}")?;
                writeln!(out, "Time taken: {}", table.time_taken())?;
            }
            Ok(())
        }
        Command::Shell { dataset } => shell(config_with(dataset)?),
        Command::Info { dataset, json } => {
            let config = config_with(dataset)?;
            let (index, report) = load_library(&config)?;
            let info = IndexInfo::new(&index, &report);
            let mut out = io::stdout().lock();
            if json {
                let text = serde_json::to_string_pretty(&info).map_err(|e| CoreError::Internal(e.to_string()))?;
                writeln!(out, "{text}")?;
            } else {
                info.print(&mut out)?;
            }
            Ok(())
        }
    }
}

/// Resumen del índice vigente.
#[derive(Debug, Serialize)]
struct IndexInfo {
    id: String,
    built_at: String,
    entries: usize,
    skipped: usize,
    fingerprint: serde_json::Value,
    content_hash: String,
}

impl IndexInfo {
    fn new(index: &LibraryIndex, report: &BuildReport) -> Self {
        Self { id: index.id().to_string(),
               built_at: index.built_at().to_rfc3339(),
               entries: index.size(),
               skipped: report.skipped_count(),
               fingerprint: index.fingerprinter().params(),
               content_hash: index.content_hash().to_string() }
    }

    fn print(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "index:        {}", self.id)?;
        writeln!(out, "built at:     {}", self.built_at)?;
        writeln!(out, "entries:      {}", self.entries)?;
        writeln!(out, "skipped:      {}", self.skipped)?;
        writeln!(out, "fingerprint:  {}", self.fingerprint)?;
        writeln!(out, "content hash: {}", self.content_hash)
    }
}

fn reload(config: &AppConfig, handle: &LibraryHandle) -> Result<BuildReport, CoreError> {
    let settings = BuildSettings::from_config(&config.fingerprint)?;
    let loaded = load_configured_dataset(config)?;
    let report = handle.rebuild(loaded.dataset.into_rows(), &SmilesParser, settings.fingerprinter);
    info!("biblioteca recargada ({} descartadas)", report.skipped_count());
    Ok(report)
}

fn shell(config: AppConfig) -> Result<(), CoreError> {
    let (index, report) = load_library(&config)?;
    let handle = LibraryHandle::new(index);
    let engine = SearchEngine::with_options(SmilesParser, config.search_options());
    let columns = TableColumns::default();
    let mut last_report = report;

    let stdin = io::stdin();
    let mut out = io::stdout();
    write!(out, "> ")?;
    out.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        match line.trim() {
            ":quit" | ":q" => break,
            ":info" => IndexInfo::new(&handle.current(), &last_report).print(&mut out)?,
            ":reload" => match reload(&config, &handle) {
                Ok(report) => {
                    writeln!(out, "reloaded: {} entries", handle.current().size())?;
                    last_report = report;
                }
                // el índice anterior sigue publicado
                Err(e) => {
                    error!("recarga fallida: {e}");
                    writeln!(out, "reload failed: {e}")?;
                }
            },
            "" => {}
            query => {
                let index = handle.current();
                let response = engine.search(query, &index, config.top_k, true);
                let table = ResultTable::from_response(&response, &columns);
                write!(out, "{table}")?;
                writeln!(out, "Time taken: {}", table.time_taken())?;
            }
        }
        write!(out, "> ")?;
        out.flush()?;
    }
    Ok(())
}
