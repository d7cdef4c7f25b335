use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::models::{DefaultsUpdate, Manifest, ManifestDefaults, ManifestOverride};

/// Reads and rewrites the `media.json` manifest.
///
/// Writers hold `lock` for the whole read-modify-write so concurrent
/// requests in this process never drop each other's changes.
pub struct ManifestService {
    path: PathBuf,
    default_tz: String,
    lock: Mutex<()>,
}

impl ManifestService {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, default_tz: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default_tz: default_tz.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current manifest; a missing or unreadable file yields the default.
    pub async fn read(&self) -> Manifest {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Manifest not readable, using defaults");
                return Manifest::with_timezone(&self.default_tz);
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Manifest is not valid JSON, using defaults");
            Manifest::with_timezone(&self.default_tz)
        })
    }

    pub async fn set_defaults(&self, update: DefaultsUpdate) -> Result<ManifestDefaults> {
        let _guard = self.lock.lock().await;

        let mut manifest = self.read().await;
        manifest.defaults.apply(update);
        self.save(&manifest).await?;

        Ok(manifest.defaults)
    }

    pub async fn set_override(&self, update: ManifestOverride) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut manifest = self.read().await;
        manifest.upsert_override(update);
        self.save(&manifest).await
    }

    /// Returns true when an override for `src` existed.
    pub async fn delete_override(&self, src: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;

        let mut manifest = self.read().await;
        let removed = manifest.remove_override(src);
        self.save(&manifest).await?;

        Ok(removed)
    }

    async fn save(&self, manifest: &Manifest) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(manifest).context("Failed to encode manifest")?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(path = %self.path.display(), "Manifest saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn temp_service() -> (ManifestService, PathBuf) {
        let dir = std::env::temp_dir().join(format!("signdesk-manifest-{}", uuid::Uuid::new_v4()));
        (ManifestService::new(dir.join("media.json"), "UTC"), dir)
    }

    #[tokio::test]
    async fn missing_file_reads_as_default() {
        let (service, _dir) = temp_service();
        let manifest = service.read().await;
        assert_eq!(manifest, Manifest::with_timezone("UTC"));
    }

    #[tokio::test]
    async fn garbage_file_reads_as_default() {
        let (service, dir) = temp_service();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(service.path(), "{not json").unwrap();

        assert_eq!(service.read().await, Manifest::with_timezone("UTC"));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn defaults_and_overrides_persist() {
        let (service, dir) = temp_service();

        let defaults = service
            .set_defaults(DefaultsUpdate {
                image_duration_ms: Some(5000),
                ..DefaultsUpdate::default()
            })
            .await
            .unwrap();
        assert_eq!(defaults.image_duration_ms, 5000);

        service
            .set_override(ManifestOverride {
                src: "/media/a.png".to_string(),
                mute: Some(false),
                ..ManifestOverride::default()
            })
            .await
            .unwrap();

        let raw = std::fs::read_to_string(service.path()).unwrap();
        assert!(raw.contains("\n  \"defaults\""), "manifest should be pretty-printed");

        let manifest = service.read().await;
        assert_eq!(manifest.defaults.image_duration_ms, 5000);
        assert_eq!(manifest.overrides.len(), 1);

        assert!(service.delete_override("/media/a.png").await.unwrap());
        assert!(service.read().await.overrides.is_empty());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn concurrent_overrides_are_all_kept() {
        let (service, dir) = temp_service();
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for i in 0..10 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .set_override(ManifestOverride {
                        src: format!("/media/{i}.png"),
                        ..ManifestOverride::default()
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(service.read().await.overrides.len(), 10);
        let _ = std::fs::remove_dir_all(dir);
    }
}
