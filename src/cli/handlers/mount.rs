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
use super::TAG;
use crate::common::settings::Settings;
use crate::context::Context;
use crate::dedup::Deduplicator;
use crate::fs::TagsistantFs;
use crate::plugin::PluginChain;
use clap::ArgMatches;
use fuser::MountOption;
use log::info;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Mounts the repository and blocks until `fusermount -u` or SIGINT.
/// Drops `nix`/`fork`-based daemonization along with those dependencies;
/// `--foreground` is accepted for CLI compatibility but mounting always
/// blocks the calling process.
pub fn handle(_args: &ArgMatches, settings: Settings) -> Result<(), Box<dyn Error>> {
    info!(
        target: TAG,
        "mounting {} at {}",
        settings.repository_root().display(),
        settings.mountpoint().display()
    );

    let ctx = Arc::new(Context::new(settings, PluginChain::new())?);

    let dedup = if ctx.settings.enable_deduplicator() {
        Some(Deduplicator::spawn(Arc::clone(&ctx)))
    } else {
        None
    };

    let options = vec![MountOption::FSName("tagsistant".to_string())];
    let mountpoint = ctx.settings.mountpoint().to_path_buf();
    let session = fuser::spawn_mount2(TagsistantFs::new(Arc::clone(&ctx)), &mountpoint, &options)?;

    let sigint = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::SIGINT, Arc::clone(&sigint))?;
    signal_hook::flag::register(signal_hook::SIGTERM, Arc::clone(&sigint))?;

    while !sigint.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(100));
    }
    info!(target: TAG, "received shutdown signal, unmounting");

    drop(session);

    if let Some(dedup) = dedup {
        dedup.shutdown();
    }

    Ok(())
}
