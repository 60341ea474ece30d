use std::path::{Path, PathBuf};

use tracing::debug;

pub const OBJECTS_FILE: &str = "objects.jpg";
pub const THUMBNAIL_FILE: &str = "thumbnail.png";

/// Where one session writes its images.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub objects: PathBuf,
    pub thumbnail: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            objects: dir.join(OBJECTS_FILE),
            thumbnail: dir.join(THUMBNAIL_FILE),
        }
    }
}

/// Replace `path` with `bytes`. The data lands in a sibling temp file first,
/// so a failed write never leaves a truncated output behind.
pub async fn replace_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".part");
    let tmp = path.with_file_name(tmp_name);

    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    tokio::fs::rename(&tmp, path).await?;
    debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replace_overwrites_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::in_dir(dir.path());
        std::fs::write(&paths.thumbnail, b"old").unwrap();

        replace_file(&paths.thumbnail, b"new contents").await.unwrap();

        assert_eq!(std::fs::read(&paths.thumbnail).unwrap(), b"new contents");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::in_dir(&dir.path().join("absent"));
        assert!(replace_file(&paths.objects, b"x").await.is_err());
    }
}
