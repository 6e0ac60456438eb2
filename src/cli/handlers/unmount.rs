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
use clap::ArgMatches;
use log::info;
use std::error::Error;
use std::process::Command;

/// Shells out to `fusermount -u`, the same mechanism `fuser::mount2` uses
/// internally to attach; there's no in-process session to signal once the
/// mounting process has exited.
pub fn handle(args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let mountpoint = args.value_of("mountpoint").expect("mountpoint is required");
    info!(target: TAG, "unmounting {}", mountpoint);

    let status = Command::new("fusermount").arg("-u").arg(mountpoint).status()?;
    if !status.success() {
        return Err(format!("fusermount -u {} exited with {}", mountpoint, status).into());
    }
    Ok(())
}
