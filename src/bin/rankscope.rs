use anyhow::Context;
use chrono::Local;
use clap::{Parser, ValueEnum};
use rankscope::codec::{self, SheetFormat};
use rankscope::config::{self, InsightConfig};
use rankscope::export;
use rankscope::insight::{self, AnthropicBackend, InsightReport};
use rankscope::normalizer::RowShape;
use rankscope::pipeline::{self, AnalysisRun};
use rankscope::stats::{AnalyzeOpts, PeakPolicy};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShapeArg {
    Auto,
    Named,
    Positional,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    All,
    Active,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Parser, Debug)]
#[command(name = "rankscope", version, about = "Hourly ad rank analysis")]
struct Cli {
    /// Rank export to analyze (.xlsx, .xls, .ods or .csv)
    input: PathBuf,

    /// Row layout of the input sheet
    #[arg(long = "shape", value_enum, default_value_t = ShapeArg::Auto)] shape: ShapeArg,
    /// Peak hour over all hours (zeros included) or active hours only
    #[arg(long = "peak-policy", value_enum, default_value_t = PolicyArg::All)] peak_policy: PolicyArg,

    /// Export path (.xlsx or .csv). Defaults to 분석결과_<today>.xlsx
    #[arg(long = "output", short = 'o')] output: Option<PathBuf>,
    #[arg(long = "no-export", default_value_t = false)] no_export: bool,

    /// Ask the text-generation service for a narrative insight (needs ANTHROPIC_API_KEY)
    #[arg(long = "insight", default_value_t = false)] insight: bool,
    #[arg(long = "model")] model: Option<String>,
    #[arg(long = "max-tokens")] max_tokens: Option<u32>,

    /// Stdout format: json | table
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Json)] format: OutputFormat,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rankscope=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let shape = match cli.shape {
        ShapeArg::Auto => None,
        ShapeArg::Named => Some(RowShape::Named),
        ShapeArg::Positional => Some(RowShape::Positional),
    };
    let opts = AnalyzeOpts {
        peak_policy: match cli.peak_policy {
            PolicyArg::All => PeakPolicy::AllHours,
            PolicyArg::Active => PeakPolicy::ActiveOnly,
        },
    };

    let run = pipeline::run_file(&cli.input, shape, &opts)
        .with_context(|| format!("analyzing {}", cli.input.display()))?;

    if !cli.no_export {
        let path = cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(export::export_file_name(Local::now().date_naive())));
        let format = SheetFormat::from_path(&path)?;
        let bytes = codec::write_sheet(&export::to_rows(&run.results), format)?;
        std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), rows = run.results.len(), "export written");
    }

    let report = if cli.insight {
        config::load_dotenv();
        let mut cfg = InsightConfig::from_env()?;
        if let Some(model) = cli.model.clone() { cfg.model = model; }
        if let Some(max_tokens) = cli.max_tokens { cfg.max_tokens = max_tokens; }
        let backend = AnthropicBackend::new(cfg)?;
        Some(insight::synthesize(&backend, &run.records).await?)
    } else {
        None
    };

    match cli.format {
        OutputFormat::Json => {
            let mut doc = serde_json::to_value(&run)?;
            if let Some(r) = &report {
                doc["insight"] = serde_json::to_value(r)?;
            }
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Table => print_table(&run, report.as_ref()),
    }
    Ok(())
}

fn print_table(run: &AnalysisRun, report: Option<&InsightReport>) {
    let o = &run.overview;
    println!(
        "records={} pc={} mobile={} mean_active_hours={:.2} quietest_hour={}",
        o.total_records, o.pc_records, o.mobile_records, o.mean_active_hours, o.quietest_hour
    );
    println!(
        "{:<20} {:<7} {:<16} {:>7} {:>10} {:>10} {:>8} {:>6}",
        "KEYWORD", "AREA", "ADVERTISER", "AVG", "PEAK", "LOWEST", "VAR", "ACTIVE"
    );
    for r in &run.results {
        println!(
            "{:<20} {:<7} {:<16} {:>7.2} {:>4}:{:<5} {:>4}:{:<5} {:>8.2} {:>6}",
            r.keyword, r.ad_area, r.advertiser, r.average,
            r.peak_hour, r.peak_value, r.lowest_hour, r.lowest_value,
            r.variance, r.active_hours
        );
    }
    if let Some(report) = report {
        for (title, text) in report.sections() {
            println!("\n## {}\n{}", title, text);
        }
    }
}
