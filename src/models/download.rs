// Artifact download helper.
//
// Fetches the three ONNX classifiers from a configured base URL into the
// model directory. Skips files that already exist. The base URL comes
// from SAFESPACE_MODEL_BASE_URL — there is no default because the
// artifacts are project-specific exports, not public models.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::registry::ModelKind;

/// Default directory for model artifacts
/// (~/.local/share/safespace/models/ on Linux).
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("safespace")
        .join("models")
}

/// Check whether all three artifacts are present.
pub fn model_files_present(dir: &Path) -> bool {
    ModelKind::ALL.iter().all(|k| dir.join(k.file_name()).exists())
}

/// Download any missing artifacts from `base_url` into `dir`.
pub async fn download_models(base_url: &str, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    let base = base_url.trim_end_matches('/');

    for kind in ModelKind::ALL {
        let dest = dir.join(kind.file_name());
        if dest.exists() {
            info!(file = kind.file_name(), "Artifact already exists, skipping");
            println!("  {} (already exists)", kind.file_name());
            continue;
        }

        println!("  Downloading {}...", kind.file_name());
        download_file(&format!("{}/{}", base, kind.file_name()), &dest).await?;
    }

    Ok(())
}

/// Download a single file with a progress bar.
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        }
    };

    let bytes = response
        .bytes()
        .await
        .context("Failed to read response body")?;
    pb.set_position(bytes.len() as u64);

    std::fs::write(dest, &bytes).with_context(|| format!("Failed to write {}", dest.display()))?;
    pb.finish_and_clear();

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_dir_is_under_safespace() {
        let dir = default_model_dir();
        let path = dir.to_string_lossy();
        assert!(
            path.contains("safespace") && path.contains("models"),
            "Expected path containing safespace/models, got: {path}"
        );
    }

    #[test]
    fn model_files_present_false_when_empty() {
        let dir = std::env::temp_dir().join("safespace-test-nonexistent");
        assert!(!model_files_present(&dir));
    }

    #[test]
    fn model_files_present_requires_all_three() {
        let dir = std::env::temp_dir().join("safespace-download-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("threat.onnx"), b"fake").unwrap();
        std::fs::write(dir.join("sentiment.onnx"), b"fake").unwrap();
        assert!(!model_files_present(&dir));

        std::fs::write(dir.join("context.onnx"), b"fake").unwrap();
        assert!(model_files_present(&dir));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
