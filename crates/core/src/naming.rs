//! Output file naming.
//!
//! Converted files are named after a short digest of the input's contents so
//! that renaming or moving a source file still finds its earlier conversion.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};

/// Number of hex digits of the content digest used in output names.
pub const DIGEST_LEN: usize = 10;

/// Strategy used to name output files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputNaming {
    /// `<first 10 hex digits of the SHA-256 of the input>.<extension>`
    #[default]
    Hash,
    /// `<input file stem>.<extension>`
    Stem,
}

/// Output location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub naming: OutputNaming,

    /// Extension given to converted files.
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    "ome".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            naming: OutputNaming::default(),
            extension: default_extension(),
        }
    }
}

/// Computes the short content digest of a file.
pub async fn content_digest(path: &Path) -> std::io::Result<String> {
    let file = File::open(path).await?;
    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];

    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    let hex = format!("{:x}", hasher.finalize());
    Ok(hex[..DIGEST_LEN].to_string())
}

/// Derives the output path of `input` inside `output_dir`.
pub async fn output_path_for(
    input: &Path,
    output_dir: &Path,
    config: &OutputConfig,
) -> std::io::Result<PathBuf> {
    let name = match config.naming {
        OutputNaming::Hash => content_digest(input).await?,
        OutputNaming::Stem => input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{} has no file name", input.display()),
                )
            })?,
    };

    Ok(output_dir.join(format!("{}.{}", name, config.extension)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_content_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.oib");
        tokio::fs::write(&path, b"hello").await.unwrap();

        // sha256("hello") = 2cf24dba5fb0a30e26e83b2ac5b9e29e...
        assert_eq!(content_digest(&path).await.unwrap(), "2cf24dba5f");
    }

    #[tokio::test]
    async fn test_hash_naming_ignores_file_name() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.oib");
        let b = dir.path().join("renamed.oib");
        tokio::fs::write(&a, b"same bytes").await.unwrap();
        tokio::fs::write(&b, b"same bytes").await.unwrap();

        let config = OutputConfig::default();
        let out = Path::new("/converted");
        let pa = output_path_for(&a, out, &config).await.unwrap();
        let pb = output_path_for(&b, out, &config).await.unwrap();

        assert_eq!(pa, pb);
        assert_eq!(pa.extension().unwrap(), "ome");
        assert_eq!(pa.file_stem().unwrap().len(), DIGEST_LEN);
    }

    #[tokio::test]
    async fn test_stem_naming() {
        let config = OutputConfig {
            naming: OutputNaming::Stem,
            extension: "ome.tiff".to_string(),
        };
        let out = output_path_for(Path::new("/data/Image0035.oib"), Path::new("/out"), &config)
            .await
            .unwrap();
        assert_eq!(out, PathBuf::from("/out/Image0035.ome.tiff"));
    }

    #[tokio::test]
    async fn test_hash_naming_missing_input() {
        let err = output_path_for(
            Path::new("/nonexistent/input.oib"),
            Path::new("/out"),
            &OutputConfig::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
