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
use directories::ProjectDirs;
use std::path::PathBuf;

/// Default `repository_root` when the user doesn't pass `--repository`,
/// resolved from the platform's standard data directory.
pub fn default_repository_root() -> PathBuf {
    ProjectDirs::from("", "", constants::ORG)
        .map(|pd| pd.data_dir().join("default"))
        .unwrap_or_else(|| PathBuf::from(".tagsistant"))
}

pub fn config_file(repository_root: &std::path::Path) -> PathBuf {
    repository_root.join("tagsistant.toml")
}
