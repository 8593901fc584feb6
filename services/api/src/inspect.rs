use chrono::SecondsFormat;
use clap::Args;
use job_tracker::config::DatabaseConfig;
use job_tracker::error::AppError;
use job_tracker::tracker::{
    ApplicationId, ApplicationService, ApplicationWithHistory, JobApplication, SortSpec,
    SqliteStore, StatusHistory, StatusSummary,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct ListArgs {
    /// Column to order by (company_name, job_role, applied_date, status, last_updated)
    #[arg(long)]
    pub(crate) sort: Option<String>,
    /// asc or desc
    #[arg(long)]
    pub(crate) order: Option<String>,
    /// Include each application's status history
    #[arg(long)]
    pub(crate) history: bool,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
    /// SQLite database file (defaults to the configured path)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct HistoryArgs {
    /// Application id
    pub(crate) id: i64,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
    /// SQLite database file (defaults to the configured path)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SummaryArgs {
    /// Emit JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
    /// SQLite database file (defaults to the configured path)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

pub(crate) fn run_list(args: ListArgs) -> Result<(), AppError> {
    let service = open_service(args.database)?;
    let sort = SortSpec::from_params(args.sort.as_deref(), args.order.as_deref());

    if args.history {
        let applications = service.list_with_history(sort)?;
        if args.json {
            print_json(&applications)?;
        } else {
            print!("{}", render_with_history(&applications));
        }
    } else {
        let applications = service.list(sort)?;
        if args.json {
            print_json(&applications)?;
        } else {
            print!("{}", render_applications(&applications));
        }
    }
    Ok(())
}

pub(crate) fn run_history(args: HistoryArgs) -> Result<(), AppError> {
    let service = open_service(args.database)?;
    let id = ApplicationId(args.id);
    let application = service.get(id)?;
    let history = service.history(id)?;

    if args.json {
        print_json(&ApplicationWithHistory {
            application,
            status_history: history,
        })?;
    } else {
        println!(
            "#{} {} - {} ({})",
            application.id, application.company_name, application.job_role, application.status
        );
        print!("{}", render_history(&history));
    }
    Ok(())
}

pub(crate) fn run_summary(args: SummaryArgs) -> Result<(), AppError> {
    let service = open_service(args.database)?;
    let summary = service.summary()?;
    if args.json {
        print_json(&summary)?;
    } else {
        print!("{}", render_summary(&summary));
    }
    Ok(())
}

fn open_service(database: Option<PathBuf>) -> Result<ApplicationService<SqliteStore>, AppError> {
    let path = database.unwrap_or_else(|| DatabaseConfig::load().path);
    let store = SqliteStore::open(&path)?;
    Ok(ApplicationService::new(Arc::new(store)))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
    println!("{json}");
    Ok(())
}

pub(crate) fn render_applications(applications: &[JobApplication]) -> String {
    if applications.is_empty() {
        return "No applications recorded.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<24} {:<24} {:<10}  {:<24} {}",
        "ID", "COMPANY", "ROLE", "APPLIED", "STATUS", "LAST UPDATED"
    );
    for application in applications {
        let _ = writeln!(
            out,
            "{:>4}  {:<24} {:<24} {:<10}  {:<24} {}",
            application.id.0,
            truncate(&application.company_name, 24),
            truncate(&application.job_role, 24),
            application.applied_date.to_string(),
            truncate(&application.status, 24),
            application
                .last_updated
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }
    out
}

pub(crate) fn render_with_history(applications: &[ApplicationWithHistory]) -> String {
    if applications.is_empty() {
        return "No applications recorded.\n".to_string();
    }

    let mut out = String::new();
    for entry in applications {
        let application = &entry.application;
        let _ = writeln!(
            out,
            "#{} {} - {} (applied {}, now {})",
            application.id,
            application.company_name,
            application.job_role,
            application.applied_date,
            application.status
        );
        out.push_str(&render_history(&entry.status_history));
    }
    out
}

pub(crate) fn render_history(history: &StatusHistory) -> String {
    if history.is_empty() {
        return "  (no status changes recorded)\n".to_string();
    }

    let mut out = String::new();
    for change in history {
        let _ = writeln!(
            out,
            "  {}  {}",
            change.changed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            change.status
        );
    }
    out
}

pub(crate) fn render_summary(summary: &StatusSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total applications: {}", summary.total);
    for (status, count) in &summary.by_status {
        let _ = writeln!(out, "  {status}: {count}");
    }
    out
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut shortened: String = value.chars().take(width.saturating_sub(1)).collect();
    shortened.push('~');
    shortened
}
