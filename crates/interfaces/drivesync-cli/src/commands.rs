use crate::DownloadFlags;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use drivesync_config::SyncConfig;
use drivesync_infra::net::{default_http_client, DownloadEvent};
use drivesync_infra::AccessToken;
use drivesync_pipeline::{SyncEngine, SyncRequest, SyncResult};
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

fn load_engine(config: &SyncConfig) -> Result<SyncEngine> {
    let token = AccessToken::load(&config.token)
        .with_context(|| format!("Failed to load token from {}", config.token))?;
    let client = default_http_client().context("Failed to build HTTP client")?;
    Ok(drivesync_pipeline::default_engine(client, token))
}

/// Build the run request for `config`. Missing `MD5File` means every file
/// is fetched and nothing is saved.
pub fn sync_request(config: &SyncConfig, flags: DownloadFlags) -> SyncRequest {
    SyncRequest {
        root_folder: config.root_folder.clone(),
        root_id: config.root_id.clone(),
        overrides: config.mappings.clone(),
        manifest_path: config.md5_file.clone(),
        options: flags.into(),
    }
}

pub async fn cmd_download(config_path: Utf8PathBuf, flags: DownloadFlags) -> Result<SyncResult> {
    let config = SyncConfig::load(&config_path)?;
    let engine = load_engine(&config)?;
    download_with(engine, &config, flags).await
}

pub async fn download_with(
    engine: SyncEngine,
    config: &SyncConfig,
    flags: DownloadFlags,
) -> Result<SyncResult> {
    println!(":: Synchronizing...");
    println!("   Remote: {}", config.root_id);
    println!("   Target: {}", config.root_folder);

    let req = sync_request(config, flags);
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);
    let engine_handle = tokio::spawn(async move { engine.sync(&req, Some(tx)).await });

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Searching folders...");

    let mut downloaded_bytes = 0u64;
    let mut files_done = 0u64;
    let mut files_started = 0u64;
    let mut current = String::new();

    while let Some(ev) = rx.recv().await {
        match ev {
            DownloadEvent::Started { name, .. } => {
                files_started = files_started.saturating_add(1);
                current = name;
            }
            DownloadEvent::Progress { bytes_delta, .. } => {
                downloaded_bytes = downloaded_bytes.saturating_add(bytes_delta);
            }
            DownloadEvent::Completed { .. } => {
                files_done = files_done.saturating_add(1);
            }
        }
        pb.set_message(format!(
            "{}/{} files ({}) {}",
            files_done,
            files_started,
            format_size(downloaded_bytes, DECIMAL),
            current
        ));
    }

    let result = engine_handle.await??;
    pb.finish_with_message("Sync complete");

    let report = &result.report;
    println!("\n:: Sync Result");
    println!("   Folders:    {}", report.folders_visited);
    println!("   Downloaded: {} ({})", report.files_downloaded, format_size(report.bytes_downloaded, DECIMAL));
    println!("   Unchanged:  {}", report.files_unchanged);
    println!("   No hash:    {}", report.files_unhashed);
    if !result.failures.is_empty() {
        println!("   Failed:     {}", result.failures.len());
        for failure in &result.failures {
            println!("     - {failure}");
        }
    }

    Ok(result)
}

pub async fn cmd_upload(
    config_path: Utf8PathBuf,
    file: Option<Utf8PathBuf>,
    folder: Option<String>,
) -> Result<String> {
    let config = SyncConfig::load(&config_path)?;
    let engine = load_engine(&config)?;
    upload_with(&engine, &config, file, folder).await
}

/// Upload `file` (default `TargetFile`) into `folder` (default `RootId`).
pub async fn upload_with(
    engine: &SyncEngine,
    config: &SyncConfig,
    file: Option<Utf8PathBuf>,
    folder: Option<String>,
) -> Result<String> {
    let local = file
        .or_else(|| config.target_file.clone())
        .context("No file to upload: pass --file or set TargetFile")?;
    let folder = folder.unwrap_or_else(|| config.root_id.clone());

    println!(":: Uploading {local} into {folder}...");
    let id = engine.upload(&local, &folder).await?;
    println!("   Created: {id}");
    Ok(id)
}
