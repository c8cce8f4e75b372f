use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use genotypeload::bulk::{BulkLoader, CommandBulkLoader};
use genotypeload::config::ConfigLoader;
use genotypeload::error::LoadError;
use genotypeload::output::{JsonOutput, OutputMode, TracingSink};
use genotypeload::pipeline::{GenotypeLoad, ProgressSink, RunPaths, RunSummary};
use genotypeload::store::SnapshotStore;

#[derive(Parser)]
#[command(name = "genotypeload")]
#[command(about = "Load new genotypes, their allele pairs and accession IDs as bulk-load files")]
#[command(version, author)]
struct Cli {
    /// Tab-delimited genotype input (16 columns, optionally gzipped)
    #[arg(long, env = "GENOTYPE_INPUT_FILE")]
    input: Utf8PathBuf,

    /// Directory for bulk-load files, diagnostics and error logs
    #[arg(long, env = "OUTPUTDIR")]
    output_dir: Utf8PathBuf,

    /// Echo of the input rows with the genotype ID appended
    #[arg(long, env = "GENOTYPELOAD_OUTPUT")]
    echo_file: Utf8PathBuf,

    /// Processing mode: `load` or `preview`
    #[arg(long, env = "GENOTYPELOAD_MODE")]
    mode: String,

    /// Reference store snapshot (JSON)
    #[arg(long, env = "GENOTYPELOAD_STORE")]
    store: Utf8PathBuf,

    /// Loader settings (JSON); defaults apply when omitted
    #[arg(long, env = "GENOTYPELOAD_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Bulk-copy program invoked once per table in load mode
    #[arg(long, env = "GENOTYPELOAD_BCP")]
    bulk_command: Option<String>,

    /// Print the run summary as JSON
    #[arg(long)]
    non_interactive: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<LoadError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &LoadError) -> u8 {
    match error {
        LoadError::InvalidMode(_)
        | LoadError::MissingConfig(_)
        | LoadError::ConfigRead(_)
        | LoadError::ConfigParse(_) => 2,
        LoadError::StoreRead(_)
        | LoadError::StoreParse(_)
        | LoadError::Seed(_)
        | LoadError::StorePersist(_)
        | LoadError::BulkLoad(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let settings = ConfigLoader::resolve(cli.config.as_deref())?;
    let store = SnapshotStore::open(&cli.store)?;
    let loader = cli
        .bulk_command
        .as_deref()
        .map(CommandBulkLoader::locate)
        .transpose()?;

    let paths = RunPaths {
        input: cli.input,
        output_dir: cli.output_dir,
        echo: cli.echo_file,
    };
    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Interactive => &TracingSink,
        OutputMode::NonInteractive => &JsonOutput,
    };

    let mut load = GenotypeLoad::new(store, settings);
    let summary = load.run(
        &paths,
        &cli.mode,
        loader.as_ref().map(|loader| loader as &dyn BulkLoader),
        sink,
    )?;

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_summary(&summary).into_diagnostic()?,
        OutputMode::Interactive => print_summary(&summary),
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let rows = &summary.rows;
    let emitted = &summary.emitted;
    println!("genotypeload summary ({})", summary.mode);
    println!("  lines read:        {}", rows.lines_read);
    println!("  rows created:      {}", rows.rows_created);
    println!("  rows existing:     {}", rows.rows_existing);
    println!("  rows rejected:     {}", rows.rows_rejected);
    println!("  genotypes:         {}", emitted.genotypes);
    println!("  allele pairs:      {}", emitted.allele_pairs);
    println!("  accessions:        {}", emitted.accessions);
    println!("  notes:             {}", emitted.notes);
    if let (Some(first), Some(last)) = (&rows.first_accession, &rows.last_accession) {
        println!("  accession IDs:     {first} .. {last}");
    }
    match summary.accession_max_advanced_by {
        Some(by) => println!("  accession max:     advanced by {by}"),
        None => println!("  accession max:     unchanged"),
    }
    println!(
        "  bulk load:         {}",
        if summary.bulk_loaded { "done" } else { "skipped" }
    );
}
