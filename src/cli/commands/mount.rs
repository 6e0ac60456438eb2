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

type ValidatorResult = Result<(), String>;

fn perm_validator(v: String) -> ValidatorResult {
    u32::from_str_radix(&v, 8).map_err(|_| format!("{} is not a valid octal number", v))?;
    Ok(())
}

pub(super) fn add_subcommands<'a, 'b>(app: clap::App<'a, 'b>, defaults: &'a ArgDefaults) -> clap::App<'a, 'b> {
    app.subcommand(
        SubCommand::with_name("mount")
            .about("Mounts a repository's tag query filesystem")
            .arg(
                Arg::with_name("repository")
                    .help("Repository root, holding the archive directory and metadata store.")
                    .default_value(&defaults.repository_root)
                    .long("--repository"),
            )
            .arg(
                Arg::with_name("mountpoint")
                    .help("Where to expose the tag query filesystem.")
                    .required(true)
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("foreground")
                    .help("Don't return until the filesystem is unmounted.")
                    .short("-f")
                    .long("--foreground"),
            )
            .arg(
                Arg::with_name("permissions")
                    .help("Octal permissions used for mounted directories.")
                    .default_value(&defaults.mount_perms)
                    .validator(perm_validator)
                    .long("--permissions"),
            )
            .arg(
                Arg::with_name("verbose")
                    .help("Enable verbose logging.")
                    .short("-v")
                    .long("--verbose"),
            ),
    )
    .subcommand(
        SubCommand::with_name("unmount")
            .about("Unmounts a previously mounted repository")
            .arg(
                Arg::with_name("mountpoint")
                    .help("The mountpoint to unmount.")
                    .required(true)
                    .takes_value(true),
            ),
    )
}
