/*
 * Tagsistant
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use crate::common::constants::DELIM;
use log::{debug, trace};
use std::path::{Path, PathBuf};

const TAG: &str = "archive";

/// The Archive Store: a single flat root directory holding every object's
/// content under `<inode><DELIM><objectname>`. It owns no metadata of its
/// own — the Metadata Store is the source of truth for which inodes exist —
/// and performs no private caching, so its state is always visible to the
/// Deduplicator's next scan.
pub struct ArchiveStore {
    root: PathBuf,
}

impl ArchiveStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The on-disk path for a given inode/objectname pair.
    pub fn path_for(&self, inode: i64, objectname: &str) -> PathBuf {
        self.root.join(format!("{}{}{}", inode, DELIM, objectname))
    }

    pub fn create(&self, inode: i64, objectname: &str) -> std::io::Result<PathBuf> {
        let path = self.path_for(inode, objectname);
        trace!(target: TAG, "creating {}", path.display());
        std::fs::File::create(&path)?;
        Ok(path)
    }

    pub fn unlink(&self, inode: i64, objectname: &str) -> std::io::Result<()> {
        let path = self.path_for(inode, objectname);
        debug!(target: TAG, "unlinking {}", path.display());
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            // a stale archive file whose row is already gone is tolerated
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Lists every archived filename currently on disk, for Deduplicator
    /// agreement checks and directory listings under `/archive`.
    pub fn list(&self) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_for_uses_inode_delim_objectname() {
        let store = ArchiveStore::new(PathBuf::from("/tmp/whatever"));
        let path = store.path_for(42, "cat.jpg");
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), format!("42{}cat.jpg", DELIM));
    }

    #[test]
    fn create_and_unlink_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().to_path_buf());
        let path = store.create(1, "x").unwrap();
        assert!(path.exists());
        store.unlink(1, "x").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn unlink_missing_file_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().to_path_buf());
        assert!(store.unlink(999, "missing").is_ok());
    }
}
