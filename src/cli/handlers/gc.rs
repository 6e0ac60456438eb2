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
use crate::plugin::PluginChain;
use crate::sql;
use clap::ArgMatches;
use log::info;
use std::error::Error;

/// Removes tags with no remaining tagging edges. The core never deletes a
/// tag on `untag`, so an external collaborator is expected to reclaim them
/// periodically; this subcommand is that collaborator.
pub fn handle(args: &ArgMatches, settings: Settings) -> Result<(), Box<dyn Error>> {
    let dry_run = args.is_present("dry-run");
    let ctx = Context::new(settings, PluginChain::new())?;

    let conn = ctx.store.conn()?;
    let unused = sql::unused_tags(&conn)?;
    drop(conn);

    if unused.is_empty() {
        info!(target: TAG, "no unused tags");
        return Ok(());
    }

    for tag in &unused {
        println!("{}", tag.tagname);
    }

    if dry_run {
        info!(target: TAG, "dry run: {} unused tag(s) would be removed", unused.len());
        return Ok(());
    }

    let mut conn = ctx.store.conn()?;
    let tx = conn.transaction()?;
    for tag in &unused {
        sql::delete_tag(&tx, tag.tag_id)?;
    }
    tx.commit()?;
    info!(target: TAG, "removed {} unused tag(s)", unused.len());

    Ok(())
}
