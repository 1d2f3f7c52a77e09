//! Process startup
//!
//! Parses arguments, layers configuration, starts logging, opens the store
//! and runs the chosen command on a tokio runtime.

use crate::app::cli::args::Args;
use crate::app::cli::config::Settings;
use crate::app::commands::{dispatch, CommandContext};
use crate::app::error::{AppError, AppResult};
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::{init_logging, LogFormat};
use crate::core::time::{SystemTimeProvider, TimeProvider};
use crate::scanner::{ExtractCode, ScanCode, SessionLayout};
use crate::store::SqliteStore;
use std::process::ExitCode;

/// Run the CLI and map the outcome to a process exit code
pub fn startup() -> ExitCode {
    let early_color = {
        use std::io::IsTerminal;
        !std::env::args().any(|a| a == "--no-color") && std::io::stdout().is_terminal()
    };
    let args = Args::parse_with_styles(early_color);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {}", AppError::Runtime(e));
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_graceful() => {
            log::info!("{}", e);
            e.exit_code()
        }
        Err(e) => {
            log_error_with_context(&e, "Command failed");
            e.exit_code()
        }
    }
}

async fn load_settings(args: &Args) -> AppResult<Settings> {
    let mut settings = Settings::load(args.config_file.as_deref()).await?;
    settings.apply_args(args);
    settings.validate()?;
    Ok(settings)
}

async fn run(args: Args) -> AppResult<()> {
    let color = args.use_color();
    let settings = match load_settings(&args).await {
        Ok(settings) => settings,
        Err(e) => {
            // Bad configuration still gets reported through the logger.
            let _ = init_logging("info", LogFormat::Text, None, color);
            return Err(e);
        }
    };

    init_logging(
        &settings.log_level,
        settings.log_format(),
        settings.log_file.as_deref(),
        color,
    )
    .map_err(|e| AppError::Logging(e.to_string()))?;
    log::debug!("Effective settings: {:?}", settings);

    let store = SqliteStore::open(&settings.db_path)?;
    if settings.wrap_in_global_transaction {
        store.begin_global_transaction()?;
    }

    let clock = SystemTimeProvider;
    let layout = SessionLayout::new(&settings.work_root, &clock.now());
    let scanner = match settings.max_concurrency {
        Some(processes) => ScanCode::new(&settings.scancode_binary).with_processes(processes),
        None => ScanCode::new(&settings.scancode_binary),
    };
    let expander = ExtractCode::new(&settings.extractcode_binary);

    let ctx = CommandContext {
        store: &store,
        settings: &settings,
        layout,
        expander: &expander,
        scanner: &scanner,
        clock: &clock,
        color,
    };

    let mut stdout = std::io::stdout();
    let result = dispatch(&ctx, &args.command, &mut stdout).await;
    finish_transaction(&store, &result)?;
    result
}

/// Commit the command's writes when it succeeded or stopped gracefully,
/// otherwise throw them away
pub fn finish_transaction(store: &SqliteStore, result: &AppResult<()>) -> AppResult<()> {
    match result {
        Ok(()) => store.commit()?,
        Err(e) if e.is_graceful() => store.commit()?,
        Err(_) => {
            log::warn!("Command failed, database changes were not saved");
            store.rollback()?;
        }
    }
    Ok(())
}
