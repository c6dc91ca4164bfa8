use std::path::PathBuf;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use geo_series_tools::app::{AnnotationResult, App, FetchOptions, SampleIndexResult};
use geo_series_tools::config::{ConfigLoader, ResolvedConfig, SeriesRequest};
use geo_series_tools::domain::{
    AnnotationQuery, ArchiveKind, DiseaseMode, SampleAccession, SeriesAccession,
};
use geo_series_tools::error::GeoError;
use geo_series_tools::geo::{GeoClient, GeoHttpClient};
use geo_series_tools::output::JsonOutput;

#[derive(Parser)]
#[command(name = "geo-tools")]
#[command(about = "Fetch GEO series and read series matrix tables and sample annotations")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    data_root: Option<Utf8PathBuf>,

    #[arg(long, global = true)]
    cache_root: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download and extract GEO series archives")]
    Fetch(FetchArgs),
    #[command(about = "Show the expression table of a series")]
    Series(SeriesArgs),
    #[command(about = "Extract an annotation field for one sample")]
    Annotation(AnnotationArgs),
    #[command(about = "List per-sample file positions of a family")]
    Samples(SamplesArgs),
    #[command(about = "Split a two-column sample file into valid and rejected lines")]
    Clean(CleanArgs),
    #[command(about = "Remove cached tables")]
    ClearCache(ClearCacheArgs),
}

#[derive(Args)]
struct FetchArgs {
    accessions: Vec<String>,

    #[arg(long, value_enum)]
    kind: Option<ArchiveKind>,

    #[arg(long)]
    no_extract: bool,

    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct SeriesArgs {
    accession: String,

    #[arg(long, default_value_t = 5)]
    head: usize,
}

#[derive(Args)]
struct AnnotationArgs {
    accession: String,
    sample: String,
    field: String,

    #[arg(long, value_enum)]
    mode: Option<DiseaseMode>,
}

#[derive(Args)]
struct SamplesArgs {
    accession: String,
}

#[derive(Args)]
struct CleanArgs {
    path: PathBuf,

    #[arg(long, default_value_t = 5)]
    head: usize,
}

#[derive(Args)]
struct ClearCacheArgs {
    accession: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<GeoError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &GeoError) -> u8 {
    match error {
        GeoError::DatasetNotFound(_)
        | GeoError::SampleNotFound { .. }
        | GeoError::SectionNotFound { .. }
        | GeoError::MissingConfig => 2,
        GeoError::GeoHttp(_) | GeoError::GeoStatus { .. } => 3,
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
    let mut resolved = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(root) = cli.data_root {
        resolved.data_root = root;
    }
    if let Some(root) = cli.cache_root {
        resolved.cache_root = root;
    }
    let store = resolved.store();

    match cli.command {
        Commands::Fetch(args) => {
            let app = App::new(store, GeoHttpClient::new()?);
            run_fetch(args, &resolved, app)
        }
        Commands::Series(args) => {
            let app = App::new(store, OfflineGeo);
            let accession: SeriesAccession = args.accession.parse()?;
            let summary = app.series_summary(&accession, args.head)?;
            JsonOutput::print_series(&summary).into_diagnostic()
        }
        Commands::Annotation(args) => {
            let app = App::new(store, OfflineGeo);
            let accession: SeriesAccession = args.accession.parse()?;
            let sample: SampleAccession = args.sample.parse()?;
            let query = args
                .field
                .parse::<AnnotationQuery>()?
                .with_disease_mode(args.mode);
            let value = app.annotation(&accession, &sample, query)?;
            JsonOutput::print_annotation(&AnnotationResult {
                dataset: accession.to_string(),
                sample: sample.to_string(),
                value,
            })
            .into_diagnostic()
        }
        Commands::Samples(args) => {
            let app = App::new(store, OfflineGeo);
            let accession: SeriesAccession = args.accession.parse()?;
            let samples = app.sample_index(&accession)?;
            JsonOutput::print_samples(&SampleIndexResult {
                dataset: accession.to_string(),
                samples,
            })
            .into_diagnostic()
        }
        Commands::Clean(args) => {
            let app = App::new(store, OfflineGeo);
            let result = app.clean_sample_file(&args.path, args.head)?;
            JsonOutput::print_clean(&result).into_diagnostic()
        }
        Commands::ClearCache(args) => {
            let app = App::new(store, OfflineGeo);
            let accession = args
                .accession
                .map(|value| value.parse::<SeriesAccession>())
                .transpose()?;
            let result = app.clear_cache(accession.as_ref())?;
            JsonOutput::print_clear(&result).into_diagnostic()
        }
    }
}

fn run_fetch<G: GeoClient>(
    args: FetchArgs,
    resolved: &ResolvedConfig,
    app: App<G>,
) -> miette::Result<()> {
    let FetchArgs {
        accessions,
        kind,
        no_extract,
        force,
    } = args;

    let requests = if accessions.is_empty() {
        if resolved.series.is_empty() {
            return Err(GeoError::MissingConfig.into());
        }
        resolved
            .series
            .iter()
            .map(|request| SeriesRequest {
                accession: request.accession.clone(),
                kind: kind.unwrap_or(request.kind),
            })
            .collect()
    } else {
        accessions
            .iter()
            .map(|value| {
                Ok(SeriesRequest {
                    accession: value.parse()?,
                    kind: kind.unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, GeoError>>()?
    };

    let options = FetchOptions {
        extract: !no_extract,
        force,
    };
    let result = app.fetch(&requests, options)?;
    JsonOutput::print_fetch(&result).into_diagnostic()
}

struct OfflineGeo;

impl GeoClient for OfflineGeo {
    fn download_archive(
        &self,
        _accession: &SeriesAccession,
        _kind: ArchiveKind,
        _destination: &std::path::Path,
    ) -> Result<(), GeoError> {
        Err(GeoError::GeoHttp("GEO client not configured".to_string()))
    }
}
