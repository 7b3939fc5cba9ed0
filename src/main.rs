//! Vidloader - command-line client for a remote video download service
//!
//! Extracts a video's formats, starts backend downloads and follows their
//! progress live until they finish.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use vidloader::catalog::VideoCatalog;
use vidloader::gateway::{ApiClient, Gateway};
use vidloader::session::{DownloadRecord, DownloadView};
use vidloader::utils::{format_eta, format_file_size, format_speed};
use vidloader::{ClientSettings, HistoryReconciler, SessionActor, SessionCommand, SessionEvent, SessionStore};

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Backend origin (overrides the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Settings file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the formats available for a video
    Extract { url: String },
    /// Start a download and follow it until it finishes
    Download {
        url: String,
        /// Format id; defaults to the first video format
        #[arg(long)]
        format: Option<String>,
    },
    /// Show the download history
    History,
    /// Delete a download on the backend
    Delete { id: String },
    /// Open a finished download's file address in the system handler
    Open { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let config_path = args.config.unwrap_or_else(ClientSettings::default_path);
    let mut settings = ClientSettings::load(&config_path)?;
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
        settings.validate()?;
    }

    match args.command {
        Command::Extract { url } => extract(&settings, &url).await,
        Command::Download { url, format } => download(&settings, url, format).await,
        Command::History => history(&settings).await,
        Command::Delete { id } => delete(&settings, &id).await,
        Command::Open { id } => {
            let client = ApiClient::new(&settings)?;
            let address = client.endpoints().file_address(&id);
            println!("Opening {}", address);
            open::that(&address)?;
            Ok(())
        }
    }
}

async fn extract(settings: &ClientSettings, url: &str) -> Result<()> {
    let client = Arc::new(ApiClient::new(settings)?);
    let mut store = SessionStore::new(client.clone(), client, settings.update_buffer);

    if store.extract(url).await.is_err() {
        return Err(anyhow!(store.extract_error().unwrap_or("Extraction failed").to_string()));
    }
    if let Some(catalog) = store.catalog() {
        print_catalog(catalog);
    }
    Ok(())
}

async fn download(settings: &ClientSettings, url: String, format: Option<String>) -> Result<()> {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (event_tx, mut event_rx) = mpsc::channel(100);
    let actor = SessionActor::new(settings, cmd_rx, event_tx).await?;
    let actor_task = tokio::spawn(actor.run());

    if format.is_none() {
        cmd_tx.send(SessionCommand::Extract { url: url.clone() }).await?;
    } else {
        cmd_tx
            .send(SessionCommand::StartDownload {
                url: url.clone(),
                variant_id: format,
            })
            .await?;
    }

    let mut download_id: Option<String> = None;
    let outcome = loop {
        let event = tokio::select! {
            event = event_rx.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopped following; the backend keeps downloading.");
                break Ok(());
            }
        };
        let Some(event) = event else {
            break Err(anyhow!("session ended unexpectedly"));
        };

        match event {
            SessionEvent::ExtractionCompleted(Ok(catalog)) => {
                let partition = catalog.partition();
                let Some(variant) = partition.video.first().or(partition.audio_only.first()) else {
                    break Err(anyhow!("No downloadable formats for {}", url));
                };
                println!("Using format {} ({} {})", variant.variant_id, variant.quality_label, variant.container_ext);
                cmd_tx.send(SessionCommand::SelectVariant(variant.variant_id.clone())).await?;
                cmd_tx
                    .send(SessionCommand::StartDownload {
                        url: url.clone(),
                        variant_id: None,
                    })
                    .await?;
            }
            SessionEvent::ExtractionCompleted(Err(e)) | SessionEvent::Error(e) => {
                break Err(anyhow!(e));
            }
            SessionEvent::DownloadStarted(view) => {
                println!("Download {} started", view.id);
                download_id = Some(view.id);
            }
            SessionEvent::DownloadProgress(view) if download_id.as_deref() == Some(view.id.as_str()) => {
                print_progress(&view);
            }
            SessionEvent::DownloadFinished(view) if download_id.as_deref() == Some(view.id.as_str()) => {
                println!();
                print_view(&view);
                break Ok(());
            }
            _ => {}
        }
    };

    let _ = cmd_tx.send(SessionCommand::Shutdown).await;
    let _ = actor_task.await;
    outcome
}

async fn history(settings: &ClientSettings) -> Result<()> {
    let client = Arc::new(ApiClient::new(settings)?);
    let history = HistoryReconciler::load(client).await;

    if history.is_empty() {
        println!("No downloads yet.");
    }
    for record in history.entries() {
        print_record(record);
    }
    Ok(())
}

async fn delete(settings: &ClientSettings, id: &str) -> Result<()> {
    let client = Arc::new(ApiClient::new(settings)?);
    client.delete_download(id).await?;
    println!("Deleted {}", id);
    Ok(())
}

fn print_catalog(catalog: &VideoCatalog) {
    println!("{}", catalog.title);
    if let Some(uploader) = &catalog.uploader {
        println!("  by {}", uploader);
    }

    let partition = catalog.partition();
    for (label, group) in [("Video", &partition.video), ("Audio Only", &partition.audio_only)] {
        if group.is_empty() {
            continue;
        }
        println!("{}:", label);
        for v in group.iter() {
            println!(
                "  {:<12} {:<10} {:<5} {}",
                v.variant_id,
                v.quality_label,
                v.container_ext,
                format_file_size(v.approx_size_bytes)
            );
        }
    }
}

fn print_progress(view: &DownloadView) {
    let (speed, eta) = view
        .transfer
        .as_ref()
        .map(|t| (format_speed(t.speed_bytes_per_sec), format_eta(t.eta_seconds)))
        .unwrap_or_default();
    print!(
        "\r{:<11} {:>5.1}%  {:>10}  {:>8}",
        view.status, view.progress_percent, speed, eta
    );
    let _ = std::io::stdout().flush();
}

fn print_view(view: &DownloadView) {
    println!("{}  {}  {:.1}%", view.id, view.status, view.progress_percent);
    if let Some(filename) = &view.filename {
        println!("  file: {}", filename);
    }
    if let Some(error) = &view.error_message {
        println!("  error: {}", error);
    }
}

fn print_record(record: &DownloadRecord) {
    println!(
        "{}  {:<11} {:>5.1}%  {}  {}",
        record.id,
        record.status,
        record.progress_percent,
        record.title.as_deref().unwrap_or(&record.source_url),
        format_file_size(record.filesize_bytes)
    );
    if let Some(error) = &record.error_message {
        println!("  error: {}", error);
    }
}
