//! Command handlers
//!
//! Each subcommand runs against a `CommandContext` and writes its report
//! output to the given writer; progress goes to the log.

use crate::app::cli::args::{AcceptedFormat, AuditArgs, Command, LicensesCommand, PolicyTarget, ScanArgs};
use crate::app::cli::config::Settings;
use crate::app::error::{AppError, AppResult};
use crate::audit::error::AuditError;
use crate::audit::report::{self, frame_content, view_content};
use crate::audit::{self, AuditOptions, Auditor};
use crate::core::styles::StyleRole;
use crate::core::time::TimeProvider;
use crate::scanner::{ArchiveExpander, LicenseScanner, ScanOptions, ScanPipeline, SessionLayout};
use crate::store::{FileStore, LicensePolicy, PolicyKind};
use log::{error, info, warn};
use prettytable::{format, Cell, Row, Table};
use std::io::Write;

/// Everything a command needs: storage, settings, tools and output style
pub struct CommandContext<'a, S: FileStore> {
    pub store: &'a S,
    pub settings: &'a Settings,
    pub layout: SessionLayout,
    pub expander: &'a dyn ArchiveExpander,
    pub scanner: &'a dyn LicenseScanner,
    pub clock: &'a dyn TimeProvider,
    pub color: bool,
}

fn output(result: std::io::Result<()>) -> AppResult<()> {
    result.map_err(AppError::Output)
}

pub async fn dispatch<S: FileStore, W: Write>(
    ctx: &CommandContext<'_, S>,
    command: &Command,
    out: &mut W,
) -> AppResult<()> {
    match command {
        Command::Scan(args) => scan(ctx, args, out).await,
        Command::Audit(args) => run_audit(ctx, args).await,
        Command::View { path } => view(ctx, path, out),
        Command::Accepted { output } => accepted(ctx, *output, out).await,
        Command::Accept { pattern, reason } => accept(ctx, pattern, reason),
        Command::Unaccept { pattern } => unaccept(ctx, pattern),
        Command::Licenses(sub) => licenses(ctx, sub, out),
        Command::Attributions => attributions(ctx, out),
    }
}

pub async fn scan<S: FileStore, W: Write>(
    ctx: &CommandContext<'_, S>,
    args: &ScanArgs,
    out: &mut W,
) -> AppResult<()> {
    let rule = StyleRole::Banner.paint(&"=".repeat(72), ctx.color);
    output(writeln!(out, "{}\n", rule))?;

    let options = ScanOptions {
        pattern: args.pattern.clone(),
        verbose: args.verbose,
        skip_dirty_check: args.force || ctx.settings.skip_dirty_check,
        skip_extract_archives: args.no_extract || ctx.settings.skip_extract_archives,
        max_concurrency: ctx.settings.max_concurrency,
    };
    let pipeline = ScanPipeline::new(
        ctx.store,
        &ctx.settings.source_root,
        ctx.layout.clone(),
        ctx.expander,
        ctx.scanner,
    );
    let outcome = pipeline.run(&options).await?;

    info!(
        "Scanned {} file(s): {} dirty, {} saved ({} with findings).",
        outcome.changes.matched,
        outcome.changes.dirty.len(),
        outcome.ingest.saved,
        outcome.ingest.with_findings
    );
    info!("{}", StyleRole::Banner.paint("Run 'audit' to investigate any findings.", ctx.color));

    if !outcome.warnings.is_empty() {
        error!("Errors during processing:");
        for warning in &outcome.warnings {
            error!("  {}", warning);
        }
    }
    Ok(())
}

pub async fn run_audit<S: FileStore>(ctx: &CommandContext<'_, S>, args: &AuditArgs) -> AppResult<()> {
    let auditor = Auditor::new(ctx.store, ctx.scanner, ctx.layout.clone());
    auditor
        .run(AuditOptions {
            verbose: args.verbose,
            print: args.print,
        })
        .await?;
    Ok(())
}

pub fn view<S: FileStore, W: Write>(
    ctx: &CommandContext<'_, S>,
    path: &str,
    out: &mut W,
) -> AppResult<()> {
    let record = ctx.store.record(path)?;
    match view_content(path, record.as_ref()) {
        Ok(content) => {
            let framed = frame_content(content, ctx.color);
            output(write!(out, "{}", framed))
        }
        Err(problem) => {
            error!("{}", problem);
            Ok(())
        }
    }
}

pub async fn accepted<S: FileStore, W: Write>(
    ctx: &CommandContext<'_, S>,
    format: AcceptedFormat,
    out: &mut W,
) -> AppResult<()> {
    info!("Finding everything that has been manually accepted ...");
    let records = ctx.store.accepted_records()?;

    match format {
        AcceptedFormat::Csv => output(write!(out, "{}", report::accepted_csv(&records))),
        AcceptedFormat::Json => {
            let tree = report::accepted_tree(records);
            if tree.is_empty() {
                info!("Nothing has been manually accepted.");
                return Ok(());
            }
            let path = ctx.layout.accepted_report();
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AuditError::io(parent, e))?;
            }
            let json = tree.to_json().map_err(AuditError::from)?;
            tokio::fs::write(&path, json)
                .await
                .map_err(|e| AuditError::io(&path, e))?;
            info!(
                "Report written to: {}",
                StyleRole::Path.paint(&path.display().to_string(), ctx.color)
            );
            Ok(())
        }
    }
}

/// Unknown exact targets are reported, not fatal
fn report_no_such_file(result: Result<audit::acceptance::Touched, AuditError>) -> AppResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(AuditError::NoSuchFile { path }) => {
            error!("Found no such file: {}", path);
            error!("Did you mean to use the wildcard (%)?");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn accept<S: FileStore>(ctx: &CommandContext<'_, S>, pattern: &str, reason: &str) -> AppResult<()> {
    let policy = ctx.store.load_policy()?;
    let now = ctx.clock.now();
    report_no_such_file(audit::accept(ctx.store, &policy, pattern, reason, now))
}

pub fn unaccept<S: FileStore>(ctx: &CommandContext<'_, S>, pattern: &str) -> AppResult<()> {
    report_no_such_file(audit::unaccept(ctx.store, pattern))
}

pub fn licenses<S: FileStore, W: Write>(
    ctx: &CommandContext<'_, S>,
    command: &LicensesCommand,
    out: &mut W,
) -> AppResult<()> {
    let (allow, target) = match command {
        LicensesCommand::List => return print_policy(ctx, out),
        LicensesCommand::Allow(target) => (true, target),
        LicensesCommand::Unallow(target) => (false, target),
    };
    let (kind, name) = match target {
        PolicyTarget::Specific { name } => (PolicyKind::Specific, name.as_str()),
        PolicyTarget::Category { name } => (PolicyKind::Category, name.as_str()),
    };

    if allow {
        info!("Globally accepting {}: {}", kind, name);
        ctx.store.allow_license(kind, name)?;
    } else {
        info!("No longer globally accepting {}: {}", kind, name);
        if !ctx.store.unallow_license(kind, name)? {
            warn!("{} was not on the allowed list.", name);
        }
    }
    print_policy(ctx, out)
}

/// One single-column table per allow-list
pub fn policy_tables(policy: &LicensePolicy, color: bool) -> Vec<Table> {
    let header_spec = if color {
        StyleRole::Header.to_prettytable_spec().map(|spec| format!("b{}", spec))
    } else {
        None
    };

    [
        ("Allowed specific licenses", &policy.specific),
        ("Allowed license categories", &policy.categories),
    ]
    .into_iter()
    .map(|(title, names)| {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_CLEAN);
        let mut title_cell = Cell::new(title);
        if let Some(spec) = &header_spec {
            title_cell = title_cell.style_spec(spec);
        }
        table.set_titles(Row::new(vec![title_cell]));
        for name in names {
            table.add_row(Row::new(vec![Cell::new(name)]));
        }
        if names.is_empty() {
            table.add_row(Row::new(vec![Cell::new("(none)")]));
        }
        table
    })
    .collect()
}

fn print_policy<S: FileStore, W: Write>(ctx: &CommandContext<'_, S>, out: &mut W) -> AppResult<()> {
    let policy = ctx.store.load_policy()?;
    for table in policy_tables(&policy, ctx.color) {
        output(table.print(out).map(|_| ()))?;
        output(writeln!(out))?;
    }
    Ok(())
}

pub fn attributions<S: FileStore, W: Write>(ctx: &CommandContext<'_, S>, out: &mut W) -> AppResult<()> {
    info!("Finding everything that seems to mention licenses requiring attribution ...");
    let records = ctx.store.records_with_findings()?;
    let found = report::attributions(&records);
    output(write!(out, "{}", found))
}
