use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::media::{FileDescriptor, MediaCatalog};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    items: Vec<String>,
}

/// The ordered list of grid members that survives an app restart.
///
/// Loaded once at startup and rewritten on every membership change. Entries
/// naming files the catalog no longer lists are dropped during hydration
/// without complaint; they disappear from disk on the next save.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    enabled: bool,
    entries: Vec<String>,
    /// The in-memory list diverged from disk (ghosts dropped at hydration).
    dirty: bool,
}

impl SessionStore {
    pub fn load(path: PathBuf, enabled: bool) -> Self {
        let entries = if enabled {
            Self::read_entries(&path)
        } else {
            Vec::new()
        };

        Self {
            path,
            enabled,
            entries,
            dirty: false,
        }
    }

    fn read_entries(path: &Path) -> Vec<String> {
        if !path.exists() {
            log::info!("No session file at {}, starting empty", path.display());
            return Vec::new();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Failed to read session file at {}: {}", path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<SessionFile>(&content) {
            Ok(session) => {
                log::info!(
                    "Loaded session with {} entries from {}",
                    session.items.len(),
                    path.display()
                );
                session.items
            }
            Err(e) => {
                log::warn!("Session file has issues ({}), starting empty", e);
                Vec::new()
            }
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Reconcile the stored list against an authoritative catalog, returning
    /// the descriptors to put back on the grid in their stored order.
    ///
    /// Ghost entries are dropped from memory only; the file is rewritten when
    /// the next membership change saves.
    pub fn hydrate(&mut self, catalog: &MediaCatalog) -> Vec<FileDescriptor> {
        let mut survivors = Vec::new();
        let mut descriptors = Vec::new();

        for name in &self.entries {
            match catalog.find(name) {
                Some(descriptor) => {
                    survivors.push(name.clone());
                    descriptors.push(descriptor.clone());
                }
                None => {
                    log::info!("Dropping session entry {}: no longer in the catalog", name);
                    self.dirty = true;
                }
            }
        }

        self.entries = survivors;
        descriptors
    }

    /// Persist the current member list. Skips the write when nothing changed
    /// or persistence is disabled; failures are logged, never fatal.
    pub fn record(&mut self, names: Vec<String>) {
        if self.entries == names && !self.dirty {
            return;
        }
        self.entries = names;
        self.dirty = false;

        if !self.enabled {
            return;
        }
        if let Err(e) = self.save() {
            log::warn!("Failed to save session to {}: {}", self.path.display(), e);
        }
    }

    fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&SessionFile {
            items: self.entries.clone(),
        })?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::media::MediaKind;

    fn catalog_with(names: &[(&str, MediaKind)]) -> MediaCatalog {
        let mut catalog = MediaCatalog::new();
        catalog.replace(
            "/media".to_string(),
            names
                .iter()
                .map(|(n, k)| FileDescriptor::new(*n, *k))
                .collect(),
        );
        catalog
    }

    #[test]
    fn test_load_without_a_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::load(dir.path().join("session.json"), true);
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_corrupt_session_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SessionStore::load(path, true);
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_record_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = SessionStore::load(path.clone(), true);
        store.record(vec!["a.mp4".to_string(), "b.html".to_string()]);

        let reloaded = SessionStore::load(path, true);
        assert_eq!(reloaded.entries(), ["a.mp4", "b.html"]);
    }

    #[test]
    fn test_hydration_drops_ghost_entries_silently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            serde_json::to_string(&SessionFile {
                items: vec!["a.mp4".to_string(), "ghost.mp4".to_string()],
            })
            .unwrap(),
        )
        .unwrap();

        let catalog = catalog_with(&[("a.mp4", MediaKind::Video)]);
        let mut store = SessionStore::load(path, true);
        let descriptors = store.hydrate(&catalog);

        let names: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.mp4"]);
        assert_eq!(store.entries(), ["a.mp4"]);
    }

    #[test]
    fn test_next_save_rewrites_the_file_without_ghosts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            serde_json::to_string(&SessionFile {
                items: vec!["a.mp4".to_string(), "ghost.mp4".to_string()],
            })
            .unwrap(),
        )
        .unwrap();

        let catalog = catalog_with(&[("a.mp4", MediaKind::Video)]);
        let mut store = SessionStore::load(path.clone(), true);
        let survivors: Vec<String> = store
            .hydrate(&catalog)
            .into_iter()
            .map(|d| d.name)
            .collect();

        // Hydration alone does not touch the file.
        let on_disk: SessionFile =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.items, vec!["a.mp4", "ghost.mp4"]);

        // The next membership save drops the ghost, even though the member
        // list matches the hydrated survivors.
        store.record(survivors);

        let on_disk: SessionFile =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.items, vec!["a.mp4"]);
    }

    #[test]
    fn test_disabled_store_never_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = SessionStore::load(path.clone(), false);
        store.record(vec!["a.mp4".to_string()]);

        assert!(!path.exists());
    }
}
