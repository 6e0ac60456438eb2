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

use crate::archive::ArchiveStore;
use crate::common::err::TsResult;
use crate::common::settings::Settings;
use crate::plugin::PluginChain;
use crate::sql::Store;

/// Threads the ambient state every operation needs — settings, the
/// Metadata Store's connection pool, the archive root, and the plugin
/// chain — explicitly through the call graph, rather than keeping it as
/// process-global module state. The filesystem adapter owns exactly one
/// `Context` for the lifetime of a mount.
pub struct Context {
    pub settings: Settings,
    pub store: Store,
    pub archive: ArchiveStore,
    pub plugins: PluginChain,
}

impl Context {
    pub fn new(settings: Settings, plugins: PluginChain) -> TsResult<Self> {
        let archive = ArchiveStore::new(settings.archive_root());
        let version = crate::common::version_str();
        let store = Store::open(settings.db_file(), &version, crate::sql::DEFAULT_POOL_SIZE)?;

        Ok(Self {
            settings,
            store,
            archive,
            plugins,
        })
    }
}
