//! Published setups, one JSON file per setup in a library directory.

pub mod record;

pub use record::{demo_setups, SetupDetails, SetupRecord};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Subdirectory holding each user's saved-setup collection
const COLLECTIONS_DIR: &str = "collections";

/// Ids a user saved from the community library, in the order they were saved
#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    setups: Vec<String>,
}

pub struct SetupLibrary {
    dir: PathBuf,
}

impl SetupLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{}.json", id)))
    }

    /// Create the directory and seed the demo setups if it holds none.
    /// Returns how many setups were seeded.
    pub fn install(&self) -> Result<usize> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        if self.record_paths()?.next().is_some() {
            log::info!("library at {} already installed", self.dir.display());
            return Ok(0);
        }
        let demos = demo_setups();
        for record in &demos {
            self.write(record)?;
        }
        log::info!("seeded {} setups into {}", demos.len(), self.dir.display());
        Ok(demos.len())
    }

    fn record_paths(&self) -> Result<impl Iterator<Item = PathBuf>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read {}", self.dir.display()))?;
        Ok(entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json")))
    }

    /// Every readable setup, newest first. Broken files are skipped.
    pub fn list(&self) -> Result<Vec<SetupRecord>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        for path in self.record_paths()? {
            match read_record(&path) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("skipping {}: {:#}", path.display(), e),
            }
        }
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    pub fn get(&self, id: &str) -> Result<SetupRecord> {
        let path = self.path_for(id)?;
        if !path.exists() {
            bail!("No setup with id '{}'", id);
        }
        read_record(&path)
    }

    /// Store a new setup. Ids are never overwritten.
    pub fn publish(&self, record: &SetupRecord) -> Result<()> {
        let path = self.path_for(&record.id)?;
        if path.exists() {
            bail!("Setup '{}' already exists", record.id);
        }
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        self.write(record)?;
        log::info!("published setup {} ({})", record.id, record.title);
        Ok(())
    }

    /// An id not yet taken in this library
    pub fn next_id(&self, now_ms: u64) -> String {
        let base = format!("setup-{}", now_ms);
        let taken = |id: &str| self.dir.join(format!("{}.json", id)).exists();
        if !taken(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let id = format!("{}-{}", base, n);
            if !taken(&id) {
                return id;
            }
            n += 1;
        }
    }

    fn collection_path(&self, user: &str) -> PathBuf {
        self.dir
            .join(COLLECTIONS_DIR)
            .join(format!("{}.json", collection_key(user)))
    }

    fn read_collection(&self, user: &str) -> Result<Collection> {
        let path = self.collection_path(user);
        if !path.exists() {
            return Ok(Collection::default());
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Add a published setup to `user`'s collection. Returns false if it was
    /// already there.
    pub fn save(&self, user: &str, id: &str) -> Result<bool> {
        let path = self.path_for(id)?;
        if !path.exists() {
            bail!("No setup with id '{}'", id);
        }
        let mut collection = self.read_collection(user)?;
        if collection.setups.iter().any(|s| s == id) {
            return Ok(false);
        }
        collection.setups.push(id.to_string());

        let path = self.collection_path(user);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json =
            serde_json::to_string_pretty(&collection).context("Failed to serialize collection")?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("{} saved setup {}", user, id);
        Ok(true)
    }

    /// `user`'s saved setups in the order they were saved. Setups that can no
    /// longer be read are left out.
    pub fn saved(&self, user: &str) -> Result<Vec<SetupRecord>> {
        let collection = self.read_collection(user)?;
        let mut records = Vec::with_capacity(collection.setups.len());
        for id in &collection.setups {
            match self.get(id) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("saved setup {} unavailable: {:#}", id, e),
            }
        }
        Ok(records)
    }

    fn write(&self, record: &SetupRecord) -> Result<()> {
        let path = self.path_for(&record.id)?;
        let json = serde_json::to_string_pretty(record).context("Failed to serialize setup")?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
    }
}

fn read_record(path: &Path) -> Result<SetupRecord> {
    let json =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    SetupRecord::from_json(&json).with_context(|| format!("Failed to load {}", path.display()))
}

/// File name for a user's collection: display names may hold anything
fn collection_key(user: &str) -> String {
    let key: String = user
        .trim()
        .chars()
        .take(64)
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if key.is_empty() {
        "_".to_string()
    } else {
        key
    }
}

/// Ids become file names, so keep them to a safe alphabet
fn validate_id(id: &str) -> Result<()> {
    let ok = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !ok {
        bail!("Invalid setup id '{}'", id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserIdentity;
    use crate::rig::{Amplifier, Chain};

    fn record(id: &str, updated_at: u64) -> SetupRecord {
        let chain = Chain::new(Amplifier::from_template(crate::catalog::default_amp()));
        let details = SetupDetails {
            title: format!("Tone {}", id),
            ..Default::default()
        };
        SetupRecord::from_chain(id.to_string(), &chain, &details, &UserIdentity::default(), updated_at)
    }

    #[test]
    fn install_seeds_once() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = SetupLibrary::new(tmp.path().join("lib"));
        assert_eq!(lib.install().unwrap(), 3);
        assert_eq!(lib.install().unwrap(), 0);
        assert_eq!(lib.list().unwrap().len(), 3);
    }

    #[test]
    fn list_is_newest_first_and_skips_broken() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = SetupLibrary::new(tmp.path());
        lib.publish(&record("a", 10)).unwrap();
        lib.publish(&record("b", 30)).unwrap();
        lib.publish(&record("c", 20)).unwrap();
        fs::write(tmp.path().join("broken.json"), "{ nope").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let ids: Vec<String> = lib.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn publish_rejects_duplicates_and_bad_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = SetupLibrary::new(tmp.path());
        lib.publish(&record("dup", 1)).unwrap();
        assert!(lib.publish(&record("dup", 2)).is_err());
        assert_eq!(lib.get("dup").unwrap().updated_at, 1);
        assert!(lib.publish(&record("../escape", 1)).is_err());
        assert!(lib.get("missing").is_err());
    }

    #[test]
    fn next_id_avoids_collisions() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = SetupLibrary::new(tmp.path());
        let first = lib.next_id(42);
        assert_eq!(first, "setup-42");
        lib.publish(&record(&first, 42)).unwrap();
        assert_eq!(lib.next_id(42), "setup-42-2");
    }

    #[test]
    fn saved_collection_is_per_user_and_ordered() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = SetupLibrary::new(tmp.path());
        lib.publish(&record("old", 10)).unwrap();
        lib.publish(&record("new", 20)).unwrap();

        assert!(lib.saved("Musician").unwrap().is_empty());
        assert!(lib.save("Musician", "old").unwrap());
        assert!(lib.save("Musician", "new").unwrap());
        assert!(!lib.save("Musician", "old").unwrap());
        assert!(lib.save("Musician", "missing").is_err());
        assert!(lib.save("Musician", "../escape").is_err());

        let ids: Vec<String> = lib.saved("Musician").unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["old", "new"]);
        assert!(lib.saved("Someone Else").unwrap().is_empty());

        // The collection file does not show up as a setup
        assert_eq!(lib.list().unwrap().len(), 2);
    }

    #[test]
    fn saved_skips_setups_that_vanished() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = SetupLibrary::new(tmp.path());
        lib.publish(&record("keep", 1)).unwrap();
        lib.publish(&record("gone", 2)).unwrap();
        lib.save("Musician", "keep").unwrap();
        lib.save("Musician", "gone").unwrap();
        fs::remove_file(tmp.path().join("gone.json")).unwrap();

        let ids: Vec<String> = lib.saved("Musician").unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["keep"]);
    }

    #[test]
    fn collection_keys_are_file_safe() {
        assert_eq!(collection_key("Kevin S."), "kevin_s_");
        assert_eq!(collection_key("../../etc"), "______etc");
        assert_eq!(collection_key("   "), "_");
    }

    #[test]
    fn missing_directory_lists_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = SetupLibrary::new(tmp.path().join("absent"));
        assert!(lib.list().unwrap().is_empty());
    }
}
