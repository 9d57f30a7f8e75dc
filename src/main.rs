// ==========================================
// 员工假期追踪系统 - 命令行入口
// ==========================================
// 用法:
//   leave-tracker [db_path] import <file> [--no-update] [--year Y]
//   leave-tracker [db_path] template <out>
//   leave-tracker [db_path] overview [year]
//   leave-tracker [db_path] refresh [year]
// ==========================================

use anyhow::{anyhow, bail, Context};
use chrono::{Datelike, Local};
use leave_tracker::api::ImportRequest;
use leave_tracker::app::{get_default_db_path, AppState};
use leave_tracker::config::TrackerConfigReader;
use leave_tracker::{i18n, logging, LeaveCategory};

const COMMANDS: [&str; 4] = ["import", "template", "overview", "refresh"];

fn usage() -> String {
    "usage: leave-tracker [db_path] <import <file> [--no-update] [--year Y] | template <out> | overview [year] | refresh [year]>"
        .to_string()
}

fn current_year() -> String {
    Local::now().year().to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let db_path = match args.first() {
        Some(first) if !COMMANDS.contains(&first.as_str()) => args.remove(0),
        _ => get_default_db_path(),
    };
    if args.is_empty() {
        bail!(usage());
    }
    let command = args.remove(0);

    tracing::info!(version = leave_tracker::VERSION, db_path = %db_path, command = %command, "{}", leave_tracker::APP_NAME);
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;
    i18n::set_locale(&state.config_manager.get_locale().await?);

    match command.as_str() {
        "import" => run_import(&state, &args).await,
        "template" => run_template(&state, &args),
        "overview" => run_overview(&state, &args),
        "refresh" => run_refresh(&state, &args),
        _ => bail!(usage()),
    }
}

async fn run_import(state: &AppState, args: &[String]) -> anyhow::Result<()> {
    let mut file: Option<&str> = None;
    let mut request = ImportRequest::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--no-update" => request.update_existing = Some(false),
            "--year" => {
                let value = iter.next().ok_or_else(|| anyhow!("--year requires a value"))?;
                let year = value
                    .trim()
                    .parse::<i32>()
                    .with_context(|| format!("invalid year: {}", value))?;
                request.year = Some(year);
            }
            other => file = Some(other),
        }
    }
    let file = file.ok_or_else(|| anyhow!(usage()))?;

    let response = state.import_api.import_file(file, request).await?;
    println!("{}", response.summary);
    Ok(())
}

fn run_template(state: &AppState, args: &[String]) -> anyhow::Result<()> {
    let template = state.import_api.download_template()?;
    let out = args.first().cloned().unwrap_or_else(|| template.file_name.clone());
    std::fs::write(&out, &template.content).with_context(|| format!("cannot write {}", out))?;
    println!("{}", out);
    Ok(())
}

fn run_overview(state: &AppState, args: &[String]) -> anyhow::Result<()> {
    let year = args.first().cloned().unwrap_or_else(current_year);
    let rows = state.overview_api.list_overview(&year)?;

    let mut header = vec!["employee".to_string(), "department".to_string()];
    header.extend(LeaveCategory::ALL.iter().map(|c| format!("{}_balance", c.key())));
    println!("{}", header.join("\t"));

    for row in rows {
        let mut cells = vec![
            format!("{} ({})", row.employee_name, row.employee_number),
            row.department_name.clone().unwrap_or_default(),
        ];
        cells.extend(
            LeaveCategory::ALL
                .iter()
                .map(|c| format!("{}", row.figures(*c).balance)),
        );
        println!("{}", cells.join("\t"));
    }
    Ok(())
}

fn run_refresh(state: &AppState, args: &[String]) -> anyhow::Result<()> {
    let year = args.first().cloned().unwrap_or_else(current_year);
    let summary = state.tracker_api.refresh_year(&year)?;
    println!(
        "year={} created={} updated={} unchanged={}",
        summary.year, summary.created, summary.updated, summary.unchanged
    );
    Ok(())
}
