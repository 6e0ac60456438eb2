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

use super::permissions::Permissions;
use crate::common::constants;
use ::config::{ConfigError, Source, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A `config::Source` backed by a plain hashmap, used to layer CLI flags on
/// top of the file/environment config without inventing a second format.
#[derive(Debug, Clone)]
pub struct HashMapSource(pub HashMap<String, config::Value>);

impl config::Source for HashMapSource {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<HashMap<String, Value>, ConfigError> {
        Ok(self.0.clone())
    }
}

#[derive(Serialize, Deserialize, Clone)]
pub struct Mount {
    pub permissions: Permissions,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct Dedup {
    pub interval_secs: u64,
    pub enabled: bool,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct Logging {
    pub verbose: bool,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct Config {
    pub mount: Mount,
    pub dedup: Dedup,
    pub logging: Logging,
}

/// Builds the merged configuration: built-in defaults, then the repository's
/// `tagsistant.toml`, then environment variables, then CLI overrides.
pub fn build<T>(cli_source: T, repo_config_file: &std::path::Path) -> ::config::Config
where
    T: config::Source + Send + Sync + 'static,
{
    let mut merged = config::Config::new();

    merged
        .merge(config::File::from_str(
            constants::DEFAULT_CONFIG_TOML,
            config::FileFormat::Toml,
        ))
        .expect("unable to merge built-in default config")
        .merge(config::File::from(repo_config_file).required(false))
        .expect("unable to merge repository config")
        .merge(config::Environment::with_prefix(constants::ENV_PREFIX))
        .expect("unable to merge settings from environment variables")
        .merge(cli_source)
        .expect("unable to merge CLI overrides");

    merged
}
