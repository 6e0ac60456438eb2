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

use crate::common::constants;
use log::debug;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};

pub mod config;
pub mod dirs;
pub mod permissions;

const TAG: &str = "settings";

#[must_use]
fn ensure_dir(path: impl AsRef<Path>) -> std::io::Result<()> {
    if !path.as_ref().exists() {
        debug!(target: TAG, "creating dir {}", path.as_ref().display());
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Settings bundles everything the design's §6 "Configuration inputs" list
/// names: `repository_root`, `mountpoint`, `db_options`,
/// `deduplication_interval_secs`, `enable_deduplicator`, `verbose_logging`.
/// It's built once at startup and handed to [`crate::context::Context`] as an
/// immutable, read-mostly value, rather than kept as process-global state.
pub struct Settings {
    repository_root: PathBuf,
    mountpoint: PathBuf,
    db_options: String,
    config: RwLock<config::Config>,
}

impl Settings {
    pub fn new(
        repository_root: PathBuf,
        mountpoint: PathBuf,
        db_options: String,
        cli_overrides: config::HashMapSource,
    ) -> std::io::Result<Self> {
        ensure_dir(&repository_root)?;
        ensure_dir(repository_root.join(constants::ARCHIVE_DIR_NAME))?;
        ensure_dir(repository_root.join("logs"))?;

        let config_file = dirs::config_file(&repository_root);
        let merged = config::build(cli_overrides, &config_file);
        let config: config::Config = merged
            .try_into()
            .expect("merged configuration doesn't match the expected shape");

        Ok(Self {
            repository_root,
            mountpoint,
            db_options,
            config: RwLock::new(config),
        })
    }

    pub fn repository_root(&self) -> &Path {
        &self.repository_root
    }

    pub fn mountpoint(&self) -> &Path {
        &self.mountpoint
    }

    pub fn db_options(&self) -> &str {
        &self.db_options
    }

    pub fn db_file(&self) -> PathBuf {
        self.repository_root.join(constants::DB_FILE_NAME)
    }

    pub fn archive_root(&self) -> PathBuf {
        self.repository_root.join(constants::ARCHIVE_DIR_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.repository_root.join("logs")
    }

    pub fn deduplication_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.config.read().dedup.interval_secs)
    }

    pub fn enable_deduplicator(&self) -> bool {
        self.config.read().dedup.enabled
    }

    pub fn verbose_logging(&self) -> bool {
        self.config.read().logging.verbose
    }

    pub fn mount_permissions(&self) -> permissions::Permissions {
        self.config.read().mount.permissions.clone()
    }
}
