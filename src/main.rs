use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use url::Url;

mod config;
mod download;
mod engine;
mod search;
mod utils;

use config::{ApiCredentials, Config};
use download::{DownloadEvent, Resolver, YtDlpResolver};
use engine::Engine;
use search::{ApiSearch, PageDirection, SearchBackend, SearchPage, VideoRef, YtDlpSearch};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the catalog for videos matching a keyword
    Search {
        keyword: String,

        /// Search backend to use
        #[arg(long, value_enum, default_value_t = BackendKind::Api)]
        backend: BackendKind,

        /// Walk forward through up to this many result pages
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Download a video into a local folder, reporting progress
    Download {
        url: String,

        /// Destination directory (must already exist)
        #[arg(long)]
        dest: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendKind {
    /// Token-paginated catalog API (needs an API key)
    Api,
    /// Flat single-batch extraction via yt-dlp
    Ytdlp,
}

fn get_config_path(args: &Args) -> Option<String> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }

    if let Ok(path) = std::env::var("VIDGRAB_CONFIG") {
        return Some(path);
    }

    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let config_path = format!("{}/vidgrab/config.toml", xdg_config_home);
        if Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let config_path = format!("{}/.config/vidgrab/config.toml", home.display());
        if Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let config = match get_config_path(&args) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => Config::default(),
    };

    if config.logging_format() == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    info!("Starting vidgrab...");

    match args.command {
        Command::Search {
            keyword,
            backend,
            pages,
        } => run_search(&config, &keyword, backend, pages).await,
        Command::Download { url, dest } => run_download(&url, &dest).await,
    }
}

async fn run_search(
    config: &Config,
    keyword: &str,
    backend: BackendKind,
    pages: u32,
) -> Result<()> {
    let backend: Box<dyn SearchBackend> = match backend {
        BackendKind::Api => {
            let credentials = ApiCredentials::from_config(config).context(
                "No catalog API key configured; set [catalog] api_key in the config file \
                 or the YOUTUBE_API_KEY environment variable",
            )?;
            Box::new(ApiSearch::new(credentials))
        }
        BackendKind::Ytdlp => {
            if !YtDlpSearch::test_availability().await {
                anyhow::bail!("The ytdlp backend requires yt-dlp. Please install yt-dlp.");
            }
            Box::new(YtDlpSearch::new())
        }
    };

    let resolver = Arc::new(YtDlpResolver::new()?);
    let mut engine = Engine::new(backend, resolver);

    engine.search(keyword).await?;
    print_page(engine.page_number(), engine.current_page());

    for _ in 1..pages {
        let before = engine.page_number();
        engine.page(PageDirection::Forward).await?;
        if engine.page_number() == before {
            info!("No further result pages");
            break;
        }
        println!();
        print_page(engine.page_number(), engine.current_page());
    }

    Ok(())
}

async fn run_download(url: &str, dest: &Path) -> Result<()> {
    Url::parse(url).with_context(|| format!("Invalid video URL: {url}"))?;

    if !YtDlpResolver::test_availability().await {
        anyhow::bail!("Downloading requires yt-dlp. Please install yt-dlp.");
    }

    let resolver = Arc::new(YtDlpResolver::new()?);
    let mut engine = Engine::new(Box::new(YtDlpSearch::new()), resolver);

    let mut events = engine.download(VideoRef::from_url(url), dest)?;
    while let Some(event) = events.recv().await {
        match event {
            DownloadEvent::Progress(percent) => {
                print!("\rDownloading... {percent:3}%");
                let _ = std::io::stdout().flush();
            }
            DownloadEvent::Completed(message) => {
                println!();
                println!("{message}");
            }
            DownloadEvent::Failed(message) => {
                println!();
                anyhow::bail!("Download failed: {message}");
            }
        }
    }

    Ok(())
}

fn print_page(number: u32, page: &SearchPage) {
    if page.is_empty() {
        println!("No videos found for the given search query.");
        return;
    }

    println!("Page {number}");
    for (idx, video) in page.results.iter().enumerate() {
        println!("{:2}. {} ({})", idx + 1, video.title, video.url);
    }
}
