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

use crate::context::Context;
use crate::sql::types::Object;
use log::warn;

/// A single autotagging handler: it claims a MIME type and, when it matches
/// the flushed object, may bind further tags through the Metadata Store. It
/// must not delete objects or mutate checksums — the contract is
/// deliberately narrow so a misbehaving plugin can't corrupt dedup state.
pub trait Plugin: Send + Sync {
    fn mime_type(&self) -> &str;
    fn matches(&self, mime_type: &str) -> bool {
        self.mime_type() == mime_type
    }
    fn process(&self, object: &Object, context: &Context) -> Result<(), String>;
}

/// An ordered, registration-order chain of plugins. Dispatch runs every
/// matching plugin in turn; a plugin's error is logged and swallowed so one
/// misbehaving plugin never fails the flush that triggered it.
#[derive(Default)]
pub struct PluginChain {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginChain {
    pub fn new() -> Self {
        Self { plugins: Vec::new() }
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn dispatch(&self, object: &Object, mime_type: &str, context: &Context) {
        for plugin in &self.plugins {
            if !plugin.matches(mime_type) {
                continue;
            }
            if let Err(e) = plugin.process(object, context) {
                warn!(
                    target: "plugin",
                    "plugin for {} failed on object {}: {}",
                    plugin.mime_type(),
                    object.inode,
                    e
                );
            }
        }
    }
}
