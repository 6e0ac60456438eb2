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

pub const VERSION: (&str, &str, &str) = (
    env!("CARGO_PKG_VERSION_MAJOR"),
    env!("CARGO_PKG_VERSION_MINOR"),
    env!("CARGO_PKG_VERSION_PATCH"),
);
pub const ENV_PREFIX: &str = "TAGSISTANT";
pub const APP_NAME: &str = "tagsistant";
pub const ORG: &str = "org.tagsistant";

pub const DB_FILE_NAME: &str = "tags.sqlite3";
pub const ARCHIVE_DIR_NAME: &str = "archive";

/// Separator between the leading inode and the objectname in an archived
/// file's on-disk name: `<inode><DELIM><objectname>`.
pub const DELIM: &str = "_";

pub const DEFAULT_DEDUP_INTERVAL_SECS: u64 = 60;

pub const DEFAULT_CONFIG_TOML: &str = r###"
[mount]
permissions = "755"

[dedup]
interval_secs = 60
enabled = true

[logging]
verbose = false
"###;
