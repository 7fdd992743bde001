//! CLI entry point for the retail record cleaning pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use retail_cleaning::{
    CleanedBatch, CleaningConfig, CleaningPipeline, Entity, HISTORICAL_MEAN_WEIGHT_KG,
    WeightImputation, entities, frame_from_json, write_outputs,
};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// CLI-compatible weight imputation policy
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliWeightImputation {
    /// Mean of the converted weights in this batch
    Mean,
    /// The value given by --fixed-weight
    Fixed,
    /// Leave unconvertible weights missing
    Leave,
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Cleans raw retail feeds into warehouse-ready tables",
    long_about = "Cleans one raw batch of a retail entity into a typed, validated table.\n\n\
                  ENTITIES:\n  \
                  users, cards, stores, products, orders, date-events\n\n\
                  EXAMPLES:\n  \
                  # Clean the store feed\n  \
                  retail-cleaning --entity stores -i stores.csv -o cleaned/\n\n  \
                  # Clean date events published as JSON\n  \
                  retail-cleaning --entity date-events -i date_details.json\n\n  \
                  # Show the schema without cleaning\n  \
                  retail-cleaning --entity products -i products.csv --dry-run"
)]
struct Args {
    /// Entity the input batch belongs to
    #[arg(short, long)]
    entity: Entity,

    /// Path to the raw batch (.csv, or .json with rows or columns)
    #[arg(short, long, required_unless_present = "dry_run")]
    input: Option<String>,

    /// Output directory for the cleaned batch and manifest
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Policy for weights that cannot be converted to kilograms
    #[arg(long, value_enum, default_value = "mean")]
    weight_imputation: CliWeightImputation,

    /// Fill value in kilograms used with --weight-imputation fixed
    #[arg(long, default_value_t = HISTORICAL_MEAN_WEIGHT_KG)]
    fixed_weight: f64,

    /// Print the entity schema and required columns without cleaning
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,

    /// Print the manifest as JSON to stdout instead of a summary
    ///
    /// Disables all logs so stdout carries only the manifest.
    #[arg(long)]
    json: bool,

    /// Keep results in memory; do not write the cleaned batch or manifest
    #[arg(long)]
    no_save: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if args.dry_run {
        print_schema(args.entity);
        return Ok(());
    }

    let input = args
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("--input is required unless --dry-run is set"))?;
    if !Path::new(input).exists() {
        return Err(anyhow!("Input file not found: {}", input));
    }

    info!("Loading {} batch from: {}", args.entity, input);
    let raw = load_batch(input)?;
    info!("Batch loaded: {:?}", raw.shape());

    let weight_imputation = match args.weight_imputation {
        CliWeightImputation::Mean => WeightImputation::BatchMean,
        CliWeightImputation::Fixed => WeightImputation::Fixed(args.fixed_weight),
        CliWeightImputation::Leave => WeightImputation::Leave,
    };

    let config = CleaningConfig::builder()
        .weight_imputation(weight_imputation)
        .output_dir(&args.output)
        .save_to_disk(!args.no_save)
        .build()?;

    let mut builder = CleaningPipeline::builder().config(config);
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            debug!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    let pipeline = builder.build()?;

    let batch = match pipeline.run(args.entity, &raw) {
        Ok(batch) => batch,
        Err(e) => {
            error!("Cleaning failed: {}", e);
            return Err(anyhow!("Cleaning failed: {}", e));
        }
    };

    let written = if pipeline.config().save_to_disk {
        Some(write_outputs(&batch, &pipeline.config().output_dir)?)
    } else {
        None
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&batch.manifest)?);
        return Ok(());
    }

    print_summary(&batch, input, written.as_ref().map(|w| w.data.as_path()));
    Ok(())
}

/// Load a raw batch, dispatching on file extension.
fn load_batch(path: &str) -> Result<DataFrame> {
    let is_json = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let content = std::fs::read_to_string(path)?;
        let document: serde_json::Value = serde_json::from_str(&content)?;
        return Ok(frame_from_json(&document)?);
    }

    // Read every field as text; typing is the cleaner's job.
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()?;
    Ok(df)
}

/// Print the declared schema of an entity.
///
/// Uses `println!` intentionally: this is the whole output of --dry-run.
fn print_schema(entity: Entity) {
    let schema = entities::schema_for(entity);

    println!("\n{}", "=".repeat(80));
    println!("SCHEMA: {}", entity);
    println!("{}\n", "=".repeat(80));

    println!(
        "{:<24} {:<24} {:<12} {:<8} {}",
        "Column", "Source", "Type", "Max len", "Rules"
    );
    println!("{}", "-".repeat(80));
    for spec in &schema.columns {
        let mut rules = Vec::new();
        if let Some(list) = spec.allow_list {
            rules.push(format!("one of {:?}", list));
        }
        if spec.unit_bearing {
            rules.push("converted to kg".to_string());
        }
        if !spec.repairs.is_empty() {
            rules.push(format!("{} repairs", spec.repairs.len()));
        }
        if !spec.strip_chars.is_empty() {
            rules.push(format!("strip {:?}", spec.strip_chars));
        }
        if let Some((min, max)) = spec.bounds {
            rules.push(format!("{min}..={max}"));
        }
        if spec.uppercase {
            rules.push("uppercase".to_string());
        }
        if spec.derived {
            rules.push("derived".to_string());
        }

        println!(
            "{:<24} {:<24} {:<12} {:<8} {}",
            spec.name,
            if spec.derived { "-" } else { spec.source },
            format!("{:?}", spec.semantic_type).to_lowercase(),
            spec.max_len.map_or("-".to_string(), |n| n.to_string()),
            rules.join(", ")
        );
    }
    println!();

    println!("REQUIRED RAW COLUMNS");
    println!("{}", "-".repeat(40));
    println!("  {}", schema.required_columns().join(", "));
    if !schema.drop_columns.is_empty() {
        println!("  Dropped if present: {}", schema.drop_columns.join(", "));
    }
    println!("{}", "=".repeat(80));
}

fn print_summary(batch: &CleanedBatch, input: &str, written: Option<&Path>) {
    let m = &batch.manifest;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE: {}", m.entity);
    println!("{}", "=".repeat(80));
    println!();
    println!("Input:  {} ({} rows)", input, m.rows_in);
    match written {
        Some(path) => println!("Output: {} ({} rows)", path.display(), m.rows_out),
        None => println!("Output: in memory only ({} rows)", m.rows_out),
    }
    println!("Retention: {:.1}%", m.retention_percentage());
    println!();

    println!("ROWS REMOVED");
    println!("{}", "-".repeat(40));
    println!("  Category rejections: {}", m.rows_rejected_by_category);
    for (column, count) in m.category_rejections_by_column.iter().filter(|(_, c)| **c > 0) {
        println!("    {column}: {count}");
    }
    println!("  Null rows:           {}", m.rows_dropped_null);
    println!("  Sentinel rows:       {}", m.rows_dropped_sentinel);
    println!("  Failed coercion:     {}", m.rows_failed_coercion);
    println!();

    println!("VALUES");
    println!("{}", "-".repeat(40));
    println!("  Corrected:           {}", m.values_corrected);
    println!("  Coerced to missing:  {}", m.values_coerced_to_missing);
    for (column, count) in &m.missing_by_column {
        println!("    {column}: {count}");
    }
    match m.imputed_value {
        Some(value) => println!("  Imputed:             {} (with {:.4})", m.values_imputed, value),
        None => println!("  Imputed:             {}", m.values_imputed),
    }
    println!();
    println!("Completed in {}ms", m.duration_ms);
    println!("{}", "=".repeat(80));
}
