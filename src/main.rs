// ==========================================
// PAC 现金流计划导入系统 - 命令行入口
// ==========================================
// 输出: 结果以 JSON 打印到 stdout,日志写 stderr
// ==========================================

use anyhow::Result;
use clap::{Parser, Subcommand};
use pac_ingest::api::{parse_budget, parse_dataset, parse_flow, ImportApi, ReportApi};
use pac_ingest::config::{ConfigManager, ImportConfigReader};
use pac_ingest::db::{get_default_db_path, init_schema, open_sqlite_connection, DB_PATH_ENV};
use pac_ingest::domain::FundingSource;
use pac_ingest::logging;
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Parser)]
#[command(
    name = "pac-ingest",
    version,
    about = "Classify and import PAC (Programa Anual de Caja) workbooks"
)]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = DB_PATH_ENV)]
    db: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import one dataset from a workbook, replacing the stored records
    Import {
        /// Workbook path (.xlsx/.xlsm/.xls/.ods/.csv)
        file: String,
        /// AIM_INICIAL | PROGRAMADO | EJECUTADO_COMPROMISO | EJECUTADO_PAGO
        #[arg(short, long)]
        dataset: String,
        /// Fiscal year (defaults to the configured one)
        #[arg(short, long)]
        year: Option<i32>,
        /// Who performs the import
        #[arg(short, long)]
        actor: String,
        /// Sheet name fragment (defaults to the configured hint)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Import PROGRAMADO, EJECUTADO_COMPROMISO and EJECUTADO_PAGO from one workbook
    ImportAll {
        file: String,
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long)]
        actor: String,
    },

    /// Income/expense summary of a stored dataset
    Summary {
        #[arg(short, long)]
        dataset: String,
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Planned vs executed comparison per category and month
    Tracking {
        #[arg(long, default_value = "PROGRAMADO")]
        planned: String,
        #[arg(long, default_value = "EJECUTADO_PAGO")]
        executed: String,
        /// INGRESO | GASTO
        #[arg(short, long, default_value = "GASTO")]
        flow: String,
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Category and monthly comparison across all four datasets
    Overview {
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Execution per funding source against its assigned budget
    Sources {
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Register or update a funding source
    SourceSet {
        /// Source name as it appears in the budget codes (e.g. "20")
        name: String,
        /// Assigned budget
        #[arg(short, long)]
        budget: String,
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(long, default_value = "")]
        code: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Mark the source as inactive
        #[arg(long)]
        inactive: bool,
    },

    /// Remove a funding source registration
    SourceRemove {
        name: String,
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Delete every stored record of a dataset and year
    Clear {
        #[arg(short, long)]
        dataset: String,
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long)]
        actor: String,
    },

    /// Recent import batches, newest first
    Batches {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Read or write a configuration value
    Config {
        key: String,
        value: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    tracing::info!(db_path = %db_path, version = pac_ingest::VERSION, "{}", pac_ingest::APP_NAME);

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let config = ConfigManager::from_connection(conn.clone()).map_err(|e| anyhow::anyhow!(e))?;
    let default_year = config
        .get_default_fiscal_year()
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    let import_api = ImportApi::new(conn.clone());
    let report_api = ReportApi::new(conn.clone());

    match cli.command {
        Commands::Import {
            file,
            dataset,
            year,
            actor,
            sheet,
        } => {
            let dataset = parse_dataset(&dataset)?;
            let response = import_api
                .import_file(
                    &file,
                    dataset,
                    year.unwrap_or(default_year),
                    &actor,
                    sheet.as_deref(),
                )
                .await?;
            print_json(&response)?;
        }
        Commands::ImportAll { file, year, actor } => {
            let results = import_api
                .import_all(&file, year.unwrap_or(default_year), &actor)
                .await?;
            print_json(&results)?;
        }
        Commands::Summary { dataset, year } => {
            let dataset = parse_dataset(&dataset)?;
            let summary = report_api
                .dataset_summary(dataset, year.unwrap_or(default_year))
                .await?;
            print_json(&summary)?;
        }
        Commands::Tracking {
            planned,
            executed,
            flow,
            year,
        } => {
            let report = report_api
                .tracking(
                    parse_dataset(&planned)?,
                    parse_dataset(&executed)?,
                    parse_flow(&flow)?,
                    year.unwrap_or(default_year),
                )
                .await?;
            print_json(&report)?;
        }
        Commands::Overview { year } => {
            let overview = report_api.overview(year.unwrap_or(default_year)).await?;
            print_json(&overview)?;
        }
        Commands::Sources { year } => {
            let reports = report_api
                .funding_sources(year.unwrap_or(default_year))
                .await?;
            print_json(&reports)?;
        }
        Commands::SourceSet {
            name,
            budget,
            year,
            code,
            description,
            inactive,
        } => {
            let mut source =
                FundingSource::new(year.unwrap_or(default_year), name, parse_budget(&budget)?);
            source.code = code;
            source.description = description;
            source.active = !inactive;
            let stored = report_api.register_funding_source(source).await?;
            print_json(&stored)?;
        }
        Commands::SourceRemove { name, year } => {
            let fiscal_year = year.unwrap_or(default_year);
            report_api.remove_funding_source(fiscal_year, &name).await?;
            print_json(&serde_json::json!({ "name": name, "fiscal_year": fiscal_year, "removed": true }))?;
        }
        Commands::Clear {
            dataset,
            year,
            actor,
        } => {
            let dataset = parse_dataset(&dataset)?;
            let deleted = import_api
                .clear_dataset(dataset, year.unwrap_or(default_year), &actor)
                .await?;
            print_json(&serde_json::json!({ "dataset": dataset, "deleted": deleted }))?;
        }
        Commands::Batches { limit } => {
            let batches = import_api.list_batches(limit).await?;
            print_json(&batches)?;
        }
        Commands::Config { key, value } => {
            if let Some(value) = value {
                config
                    .set_config_value(&key, &value)
                    .map_err(|e| anyhow::anyhow!(e))?;
            }
            let current = config
                .get_config_value(&key)
                .map_err(|e| anyhow::anyhow!(e))?;
            print_json(&serde_json::json!({ "key": key, "value": current }))?;
        }
    }

    Ok(())
}
