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
use super::ArgDefaults;
use clap::{Arg, SubCommand};

/// Tags are never auto-deleted by the core; this is the external collaborator
/// the design names as responsible for reclaiming unused ones.
pub(super) fn add_subcommands<'a, 'b>(app: clap::App<'a, 'b>, defaults: &'a ArgDefaults) -> clap::App<'a, 'b> {
    app.subcommand(
        SubCommand::with_name("gc")
            .about("Removes tags with no remaining tagging edges")
            .arg(
                Arg::with_name("repository")
                    .help("Repository root, holding the archive directory and metadata store.")
                    .default_value(&defaults.repository_root)
                    .long("--repository"),
            )
            .arg(
                Arg::with_name("dry-run")
                    .help("List the tags that would be removed without removing them.")
                    .long("--dry-run"),
            ),
    )
}
