mod cli;
mod definition;
mod error;
mod paths;

use std::fs;
use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use gridlist_lib::ActionResponse;
use gridlist_lib::ListWidget;
use gridlist_lib::executor::MemoryExecutor;
use gridlist_lib::storage::MemoryBackend;
use gridlist_lib::storage::PreferenceStore;
use gridlist_lib::storage::SessionStore;
use gridlist_lib::storage::SqliteBackend;
use gridlist_lib::storage::StorageBackend;
use log::debug;
use log::info;
use log::warn;
use simplelog::ColorChoice;
use simplelog::Config;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

use crate::cli::Action;
use crate::cli::Cli;
use crate::error::CliError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let result = match &cli.log_file {
        Some(path) => match File::create(path) {
            Ok(file) => WriteLogger::init(cli.log_level, Config::default(), file),
            Err(e) => {
                eprintln!("Failed to create log file '{}': {e}", path.display());
                return;
            }
        },
        None => TermLogger::init(
            cli.log_level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
    };
    if let Err(e) = result {
        eprintln!("Failed to initialize logger: {e}");
    }
}

fn open_backend(cli: &Cli) -> Result<Arc<dyn StorageBackend>, CliError> {
    if cli.ephemeral {
        return Ok(Arc::new(MemoryBackend::new()));
    }

    let Some(path) = cli.db.clone().or_else(paths::preferences_db) else {
        warn!("No data directory available, keeping preferences in memory");
        return Ok(Arc::new(MemoryBackend::new()));
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CliError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    info!("Using preference database {}", path.display());
    Ok(Arc::new(SqliteBackend::open(&path)?))
}

fn run(cli: Cli) -> Result<String, CliError> {
    let definition = definition::load_definition(&cli.definition)?;
    let records = definition::load_records(&cli.records, &definition.model)?;
    debug!(
        "Loaded {} records for model '{}'",
        records.len(),
        definition.model.name
    );

    let backend = open_backend(&cli)?;
    let mut list = ListWidget::builder(definition.id.clone())
        .model(definition.model)
        .config(definition.list)
        .preferences(PreferenceStore::new(
            Arc::clone(&backend),
            &cli.user,
            &definition.id,
        ))
        .session(SessionStore::new(backend, &cli.session, &definition.id))
        .executor(MemoryExecutor::new(records))
        .build()?;

    list.set_search_options(cli.search_mode.map(Into::into), cli.search_scope);
    if let Some(term) = cli.search {
        list.set_search_term(term, false);
    }
    if !cli.checked.is_empty() {
        list.set_checked_rows(cli.checked);
    }

    let response: ActionResponse = match cli.action {
        Action::Refresh => list.on_refresh()?,
        Action::Paginate { page } => list.on_paginate(Some(page))?,
        Action::Filter => list.on_filter()?,
        Action::Sort { column, page } => list.on_sort(&column, page)?,
        Action::LoadSetup => list.on_load_setup()?,
        Action::ApplySetup {
            visible,
            per_page,
            order,
        } => list.on_apply_setup(Some(visible), per_page, Some(order))?,
        Action::ResetSetup => list.on_reset_setup()?,
        Action::Sql { page } => {
            let query = list.prepare_query()?;
            let limit = list.records_per_page().filter(|_| list.show_pagination());
            let offset = limit.map_or(0, |per_page| page.saturating_sub(1) * per_page);
            let statement = query
                .to_sql(limit, offset)
                .map_err(gridlist_lib::error::Error::from)?;
            return Ok(serde_json::to_string_pretty(&serde_json::json!({
                "sql": statement.sql,
                "bindings": statement.bindings,
            }))?);
        }
    };

    Ok(serde_json::to_string_pretty(&response)?)
}
