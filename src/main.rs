use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use androidx_tracker::api::Api;
use androidx_tracker::config::{self, TrackerConfig};
use androidx_tracker::source::{
    ArtifactBrowserSource, BrowserSession, LibraryIndex, PackageMetadataSource,
    ReleaseNotesSource, VersionSource,
};
use androidx_tracker::store::SqliteRepository;
use androidx_tracker::sync::{Coordinator, Reconciler};

#[derive(Parser)]
#[command(name = "androidx-tracker")]
#[command(version, about = "Tracks AndroidX library versions across upstream sources")]
struct Cli {
    /// Database file (defaults to the XDG data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full sync over every trackable library
    Sync,
    /// List tracked libraries
    List,
    /// Show one library's full record
    Show { name: String },
    /// Analyze a dependency manifest against the tracked data
    Analyze { file: PathBuf },
    /// Generate a version catalog for the named libraries (all when empty)
    Catalog { names: Vec<String> },
    /// Delete all tracked records
    Clear,
    /// Print the release-notes URL for a library
    ReleaseNotes {
        name: String,
        #[arg(long)]
        version: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<TrackerConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(TrackerConfig::default()),
    }
}

fn init_tracing() -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_path = config::log_path();
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file_appender = tracing_appender::rolling::never(
        log_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        log_path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("androidx-tracker.log")),
    );
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .json()
        .init();

    Ok(guard)
}

fn build_sources(
    tracker_config: &TrackerConfig,
) -> (Arc<dyn LibraryIndex>, Vec<Arc<dyn VersionSource>>) {
    let release_notes = Arc::new(ReleaseNotesSource::new(config::RELEASE_NOTES_BASE_URL));

    let session = BrowserSession::load(&config::session_path())
        .unwrap_or_else(BrowserSession::anonymous);

    let mut sources: Vec<Arc<dyn VersionSource>> = Vec::new();
    if tracker_config.sources.package_metadata.enabled {
        sources.push(Arc::new(PackageMetadataSource::new(
            config::PACKAGE_METADATA_BASE_URL,
        )));
    }
    if tracker_config.sources.artifact_browser.enabled {
        sources.push(Arc::new(ArtifactBrowserSource::new(
            config::ARTIFACT_BROWSER_BASE_URL,
            session,
        )));
    }

    // The release-notes page itself is not in the chain: the reconciler
    // already falls back to the version table embedded on the detail page
    // it fetches through the index.
    (release_notes as Arc<dyn LibraryIndex>, sources)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let tracker_config = load_config(cli.config.as_ref())?;

    let db_path = cli.db.unwrap_or_else(config::db_path);
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let repository = Arc::new(SqliteRepository::new(&db_path)?);

    let (index, sources) = build_sources(&tracker_config);
    let reconciler = Arc::new(Reconciler::new(
        repository.clone(),
        index.clone(),
        sources,
        &tracker_config.sync.detailed_artifacts,
    ));

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc_handler(move || cancel.store(true, Ordering::Relaxed));
    }

    let coordinator = Arc::new(Coordinator::new(
        reconciler,
        index,
        tracker_config.sync.clone(),
        cancel,
    ));
    let api = Api::new(repository, coordinator);

    match cli.command {
        Command::Sync => {
            let stats = api.run_sync().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::List => {
            let summaries = api.list_libraries()?;
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Command::Show { name } => {
            let record = api.get_library(&name)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Analyze { file } => {
            let manifest = std::fs::read_to_string(&file)?;
            let report = api.analyze_manifest(&manifest)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Catalog { names } => {
            print!("{}", api.generate_catalog(&names)?);
        }
        Command::Clear => {
            let deleted = api.clear_libraries()?;
            info!("Cleared {} libraries", deleted);
            println!("{}", deleted);
        }
        Command::ReleaseNotes { name, version } => {
            let lookup = api.release_notes_lookup(&name, version.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&lookup)?);
        }
    }

    Ok(())
}

/// Flips the cancellation flag on SIGINT so an in-flight sync finishes the
/// current library and stops cleanly.
fn ctrlc_handler(on_interrupt: impl Fn() + Send + 'static) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt();
        }
    });
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
