use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::api::http_client;
use crate::cases::CaseDataset;
use crate::cli::DatasetArgs;
use crate::constants::CASES_FILE_NAME;
use crate::storage::{StoragePaths, file_present_nonempty};

/// Makes sure a case CSV exists locally and returns its path.
pub async fn ensure_cases_csv(opts: &DatasetArgs) -> anyhow::Result<PathBuf> {
    if let Some(p) = opts.cases_file.as_ref() {
        return Ok(PathBuf::from(p));
    }

    let paths = StoragePaths::new(&opts.data_dir);
    let dest = paths.cases_csv();
    if !opts.force_download && file_present_nonempty(&dest) {
        return Ok(dest);
    }

    if opts.offline {
        return Err(anyhow!(
            "Missing case CSV at {} (use --cases-file or run without --offline).",
            dest.display()
        ));
    }

    paths.ensure_dirs().context("create data directory")?;
    fetch_cases_csv(&opts.cases_url, &dest).await?;
    Ok(dest)
}

pub async fn load_cases(opts: &DatasetArgs) -> anyhow::Result<CaseDataset> {
    let path = ensure_cases_csv(opts).await?;
    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    let dataset = CaseDataset::load(&text);
    tracing::info!(
        "Loaded {} case rows ({} years) from {}",
        dataset.len(),
        dataset.years().len(),
        path.display()
    );
    Ok(dataset)
}

/// Streams `url` into `<dest>.part` and renames it into place. Returns the byte count.
async fn fetch_cases_csv(url: &str, dest: &Path) -> anyhow::Result<u64> {
    let part = partial_path(dest);
    tracing::info!("Fetching case data {} -> {}", url, dest.display());

    let resp = http_client()?
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {url}"))?;
    if !resp.status().is_success() {
        return Err(anyhow!("Download failed ({}): {}", resp.status(), url));
    }

    let mut file = tokio::fs::File::create(&part)
        .await
        .with_context(|| format!("create {}", part.display()))?;
    let mut written: u64 = 0;
    let mut body = resp.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.with_context(|| format!("read case data from {url}"))?;
        written += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);

    if written == 0 {
        tokio::fs::remove_file(&part).await.ok();
        return Err(anyhow!("Download failed (empty body): {url}"));
    }

    tokio::fs::rename(&part, dest)
        .await
        .with_context(|| format!("rename {} -> {}", part.display(), dest.display()))?;
    tracing::info!("Saved {written} bytes of case data");
    Ok(written)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| CASES_FILE_NAME.into());
    name.push(".part");
    dest.with_file_name(name)
}
