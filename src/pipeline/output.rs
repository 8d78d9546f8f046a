use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{OutputError, Result};

/// A fresh output path under `directory`; no two calls share a name
pub fn unique_output_path(directory: &Path, extension: &str) -> PathBuf {
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");
    directory.join(format!("meme-{}-{}.{}", stamp, Uuid::new_v4().simple(), extension))
}

/// Write `bytes` to `path` via a temporary sibling, so readers never see a half-written image
pub async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_failed = |e: std::io::Error| OutputError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| OutputError::WriteFailed {
            path: path.display().to_string(),
            reason: "not a file path".to_string(),
        })?;
    let partial = path.with_file_name(format!(".{}.{}.partial", file_name, Uuid::new_v4().simple()));

    tokio::fs::write(&partial, bytes).await.map_err(write_failed)?;
    if let Err(e) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(write_failed(e).into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_unique_paths_differ() {
        let dir = Path::new("output");
        let a = unique_output_path(dir, "jpg");
        let b = unique_output_path(dir, "jpg");

        assert_ne!(a, b);
        assert!(a.starts_with("output"));
        assert_eq!(a.extension().unwrap(), "jpg");
    }

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.png");

        write_output(&path, b"png-ish").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"png-ish");

        // No temporary files left behind
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }
}
