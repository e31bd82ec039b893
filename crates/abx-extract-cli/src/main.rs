use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use abx_extract_core::config::{parse_drain_parameter_id, DRAIN_PARAMETER_ENV};
use abx_extract_core::{Database, Encounter, ExtractConfig, MedicationFiller, SnapshotSource};

#[derive(Parser)]
#[command(name = "abx-extract")]
#[command(about = "Extract antimicrobial administrations and orders for an encounter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the antimicrobial code lists in a code database
    SeedCodes {
        /// SQLite database path (created if missing)
        #[arg(long)]
        db: PathBuf,
        /// JSON file with `antibiotics` and `antifungal_groups` arrays
        #[arg(long)]
        file: PathBuf,
    },
    /// Fill one encounter from a source snapshot and print it as JSON
    Fill {
        /// Source snapshot (JSON)
        #[arg(long)]
        snapshot: PathBuf,
        /// Encounter identifier in the medication system
        #[arg(long)]
        encounter_id: String,
        /// Patient identifier in the medication system
        #[arg(long)]
        patient_id: String,
        /// Encounter start (e.g. 2024-09-01T00:00:00)
        #[arg(long)]
        from: NaiveDateTime,
        /// Encounter end
        #[arg(long)]
        to: NaiveDateTime,
        /// Code database; the snapshot's own code lists are used when absent
        #[arg(long)]
        codes_db: Option<PathBuf>,
        /// Extraction config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Drain parameter identifier
        #[arg(long, env = DRAIN_PARAMETER_ENV)]
        drain_parameter_id: Option<String>,
        /// Print a summary line instead of the encounter
        #[arg(long)]
        summary: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::SeedCodes { db, file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let mut database = Database::open(&db)?;
            let lists = database.import_code_lists_json(&json)?;
            tracing::info!(
                antibiotics = lists.antibiotics.len(),
                antifungal_groups = lists.antifungal_groups.len(),
                db = %db.display(),
                "Seeded code lists"
            );
        }
        Commands::Fill {
            snapshot,
            encounter_id,
            patient_id,
            from,
            to,
            codes_db,
            config,
            drain_parameter_id,
            summary,
        } => {
            let drain = drain_parameter_id
                .as_deref()
                .map(parse_drain_parameter_id)
                .transpose()?;
            let config = ExtractConfig::resolve(config.as_deref(), drain)?;
            let source = SnapshotSource::from_path(&snapshot)?;

            let filler = match codes_db {
                Some(path) => {
                    let db = Database::open(&path)
                        .with_context(|| format!("opening code database {}", path.display()))?;
                    MedicationFiller::from_repository(&source, &db, config)?
                }
                None => MedicationFiller::from_repository(&source, &source, config)?,
            };

            let mut encounter = Encounter::new(encounter_id, patient_id, from, to);
            let report = filler.fill_medications(&mut encounter)?;

            if summary {
                let s = report.summary;
                println!(
                    "episodes={} doses={} orders={} orders_with_reason={}",
                    s.episodes, s.doses, s.orders, s.orders_with_reason
                );
            } else {
                println!("{}", serde_json::to_string_pretty(&encounter)?);
            }
        }
    }

    Ok(())
}
