use std::path::PathBuf;

use uuid::Uuid;

use crate::core::config::Settings;

/// Persists uploaded files under a local directory and hands back the
/// relative path that becomes the item's `image_url`.
#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    root: PathBuf,
}

impl StorageService {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let root = PathBuf::from(&settings.storage().upload_dir);
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub(crate) async fn store(&self, filename: &str, bytes: Vec<u8>) -> anyhow::Result<String> {
        let name = format!("{}_{}", Uuid::new_v4(), sanitized_filename(filename));
        let path = self.root.join(&name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Keeps only the final path component and flattens anything that is not
/// alphanumeric, dot, dash or underscore.
fn sanitized_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    if cleaned.trim_matches('_').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn sanitized_filename_strips_directories() {
        assert_eq!(sanitized_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitized_filename("C:\\photos\\vase.png"), "vase.png");
    }

    #[test]
    fn sanitized_filename_flattens_odd_characters() {
        assert_eq!(sanitized_filename("my photo (1).png"), "my_photo__1_.png");
        assert_eq!(sanitized_filename("???"), "upload");
    }

    #[tokio::test]
    async fn store_writes_file_and_returns_path() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = crate::core::config::Settings::load().expect("settings");
        let storage = StorageService::from_settings(&settings).await.expect("storage");

        let path = storage.store("vase.png", b"not-really-a-png".to_vec()).await.expect("store");

        assert!(path.ends_with("_vase.png"));
        let on_disk = tokio::fs::read(&path).await.expect("read back");
        assert_eq!(on_disk, b"not-really-a-png");
    }
}
