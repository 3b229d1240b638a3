mod stats;
mod table;

use std::fs::File;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use covidstats_core::{
    load_csv_file, parse_human_date, resolve_data_dir, write_csv, CovidRecord, DailyCounts,
    DuplicateResolution, FileAction, FileRecordRepository, ImportUseCase, RecordRepository,
    ReportConfig, ReportUseCase, Resolution,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "covidstats")]
#[command(about = "Daily COVID-19 case statistics for a region", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding records.json and config.json (default: ~/.covidstats)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Region to report on, e.g. GA
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Count days with more positive cases than this
    #[arg(long, global = true)]
    upper: Option<u32>,

    /// Count days with fewer positive cases than this
    #[arg(long, global = true)]
    lower: Option<u32>,

    /// Histogram bin width
    #[arg(long, global = true)]
    bin_size: Option<u32>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a CSV file into the working collection
    Import {
        file: PathBuf,
        /// Replace the working collection or merge into it
        #[arg(long, value_enum, default_value_t = ActionArg::Merge)]
        action: ActionArg,
        /// How days that already exist are resolved when merging
        #[arg(long, value_enum, default_value_t = DuplicateArg::Replace)]
        on_duplicate: DuplicateArg,
    },
    /// Add a single day (usage: add 2020-10-14 GA --positive 1200 --negative 9000)
    Add {
        date: String,
        region: String,
        #[arg(long, default_value_t = 0)]
        positive: u32,
        #[arg(long, default_value_t = 0)]
        negative: u32,
        #[arg(long, default_value_t = 0)]
        hospitalized_currently: u32,
        #[arg(long, default_value_t = 0)]
        hospitalized: u32,
        #[arg(long, default_value_t = 0)]
        deaths: u32,
        #[arg(long, value_enum, default_value_t = DuplicateArg::Replace)]
        on_duplicate: DuplicateArg,
    },
    /// Remove the first record for a day
    Remove { date: String, region: String },
    /// List stored records
    List {
        /// Show every region instead of only the selected one
        #[arg(long)]
        all: bool,
    },
    /// General statistics for the region
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// Per-month breakdown
    Monthly,
    /// Positive case histogram
    Histogram,
    /// General, histogram and monthly sections together
    Report,
    /// Show the lines of a CSV file that could not be parsed
    Errors { file: PathBuf },
    /// Write the working collection to a CSV file
    Export { file: PathBuf },
    /// Remove every stored record
    Clear,
    /// Show the effective configuration
    Config {
        /// Persist the effective configuration to config.json
        #[arg(long)]
        save: bool,
    },
    /// Open the month browser
    Stats,
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    Replace,
    Merge,
}

#[derive(Clone, Copy, ValueEnum)]
enum DuplicateArg {
    Replace,
    Merge,
}

impl From<DuplicateArg> for DuplicateResolution {
    fn from(arg: DuplicateArg) -> Self {
        match arg {
            DuplicateArg::Replace => DuplicateResolution::Replace,
            DuplicateArg::Merge => DuplicateResolution::Merge,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn effective_config(cli: &Cli, data_dir: &std::path::Path) -> Result<ReportConfig> {
    let mut config = ReportConfig::load(data_dir)?;
    if let Some(region) = &cli.region {
        config.region = region.trim().to_uppercase();
    }
    if let Some(upper) = cli.upper {
        config.upper_threshold = upper;
    }
    if let Some(lower) = cli.lower {
        config.lower_threshold = lower;
    }
    if let Some(bin_size) = cli.bin_size {
        config.bin_size = bin_size;
    }
    config.validate()?;
    debug!(?config, "effective config");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let data_dir = resolve_data_dir(cli.data_dir.clone())?;
    let config = effective_config(&cli, &data_dir)?;
    let repo = FileRecordRepository::new(&data_dir)?;

    match cli.command {
        Some(Commands::Import { file, action, on_duplicate }) => {
            let outcome = load_csv_file(&file)?;
            if !outcome.error_lines.is_empty() {
                println!(
                    "Skipped {} unreadable line(s); run `covidstats errors {}` for details.",
                    outcome.error_lines.len(),
                    file.display()
                );
            }

            let action = match action {
                ActionArg::Replace => FileAction::Replace,
                ActionArg::Merge => FileAction::Merge(on_duplicate.into()),
            };
            let summary = ImportUseCase::new(&repo).import(outcome.into_collection(), action)?;
            println!(
                "Imported {}: {} added, {} replaced, {} merged.",
                file.display(),
                summary.added,
                summary.replaced,
                summary.merged
            );
        }
        Some(Commands::Add {
            date,
            region,
            positive,
            negative,
            hospitalized_currently,
            hospitalized,
            deaths,
            on_duplicate,
        }) => {
            let date = parse_human_date(&date)?;
            let counts = DailyCounts::new(positive, negative, hospitalized_currently, deaths, hospitalized);
            let record = CovidRecord::new(date, region.trim().to_uppercase(), counts)?;
            let label = format!("{} {}", record.region(), record.date());

            match ImportUseCase::new(&repo).add(record, on_duplicate.into())? {
                Resolution::Added => println!("Added {}.", label),
                Resolution::Replaced => println!("Replaced existing {}.", label),
                Resolution::Merged => println!("Merged into existing {}.", label),
            }
        }
        Some(Commands::Remove { date, region }) => {
            let date = parse_human_date(&date)?;
            let region = region.trim().to_uppercase();
            let mut records = repo.load()?;

            let target = records
                .iter()
                .find(|r| r.date() == date && r.region() == region)
                .cloned()
                .ok_or_else(|| anyhow!("No record for {} on {}", region, date))?;
            records.remove(&target);
            repo.save(&records)?;
            info!(%date, region = %region, "removed record");
            println!("Removed {} {}.", region, date);
        }
        Some(Commands::List { all }) => {
            let records = repo.load()?;
            let records = if all { records } else { records.for_region(&config.region) };
            if records.is_empty() {
                println!("No records found.");
            } else {
                table::show_records(&records);
            }
        }
        Some(Commands::Summary { json }) => {
            let records = repo.load()?;
            let usecase = ReportUseCase::new(&records, &config);
            if json {
                println!("{}", serde_json::to_string_pretty(&usecase.summary())?);
            } else {
                print!("{}", usecase.general()?);
            }
        }
        Some(Commands::Monthly) => {
            let records = repo.load()?;
            print!("{}", ReportUseCase::new(&records, &config).monthly()?);
        }
        Some(Commands::Histogram) => {
            let records = repo.load()?;
            let usecase = ReportUseCase::new(&records, &config);
            let segments = usecase.records().histogram(config.bin_size)?;
            table::show_histogram(&segments);
        }
        Some(Commands::Report) => {
            let records = repo.load()?;
            print!("{}", ReportUseCase::new(&records, &config).full_report());
        }
        Some(Commands::Errors { file }) => {
            let outcome = load_csv_file(&file)?;
            if outcome.error_lines.is_empty() {
                println!("No errors in {}.", file.display());
            } else {
                print!("{}", outcome.format_error_lines());
            }
        }
        Some(Commands::Export { file }) => {
            let records = repo.load()?;
            write_csv(&records, File::create(&file)?)?;
            println!("Wrote {} record(s) to {}.", records.len(), file.display());
        }
        Some(Commands::Clear) => {
            let mut records = repo.load()?;
            let count = records.len();
            records.clear();
            repo.save(&records)?;
            println!("Removed {} record(s).", count);
        }
        Some(Commands::Config { save }) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                config.save(&data_dir)?;
                println!("Saved to {}.", data_dir.display());
            }
        }
        Some(Commands::Stats) | None => {
            let records = repo.load()?;
            stats::run(&records, &config)?;
        }
    }
    Ok(())
}
