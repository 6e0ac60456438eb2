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

use clap::App;
use log::LevelFilter;
use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;
use tagsistant::cli::commands::{self, ArgDefaults};
use tagsistant::cli::handlers;
use tagsistant::common::log::{setup_logger, SessionLog};
use tagsistant::common::settings::config::HashMapSource;
use tagsistant::common::settings::dirs;
use tagsistant::common::settings::Settings;

/// Plain `[target][level] message` to stderr, used by every subcommand that
/// doesn't also keep a persistent log file.
fn setup_stderr_logger(level: LevelFilter) -> Result<(), fern::InitError> {
    setup_logger(level, vec![std::io::stderr().into()])
}

fn build_settings(
    repository_root: &str,
    mountpoint: PathBuf,
    permissions: Option<&str>,
    verbose: bool,
) -> std::io::Result<Settings> {
    let mut overrides = HashMap::new();
    if let Some(perms) = permissions {
        overrides.insert("mount.permissions".to_string(), config::Value::from(perms));
    }
    if verbose {
        overrides.insert("logging.verbose".to_string(), config::Value::from(true));
    }

    Settings::new(
        PathBuf::from(repository_root),
        mountpoint,
        String::new(),
        HashMapSource(overrides),
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    let default_root = dirs::default_repository_root();
    let defaults = ArgDefaults {
        repository_root: default_root.to_string_lossy().into_owned(),
        mount_perms: "755".to_string(),
    };

    let app = App::new("tagsistant")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A semantic filesystem that addresses archived files through a tag query language");
    let matches = commands::add_subcommands(app, &defaults).get_matches();

    match matches.subcommand() {
        ("mount", Some(sub)) => {
            let verbose = sub.is_present("verbose");
            let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

            let repository = sub.value_of("repository").expect("has a default value");
            let mountpoint = PathBuf::from(sub.value_of("mountpoint").expect("mountpoint is required"));
            let settings = build_settings(repository, mountpoint, sub.value_of("permissions"), verbose)?;

            // a mount can run for days, so unlike the other subcommands it keeps a
            // persistent, rotating log file next to stderr rather than stderr alone
            let session_log = SessionLog::new(settings.log_dir(), "%Y-%m-%d.log".to_string(), 6, 100)?;
            let file_output = From::<Box<dyn log::Log>>::from(Box::new(session_log));
            setup_logger(level, vec![std::io::stderr().into(), file_output])?;

            handlers::mount::handle(sub, settings)?;
        }
        ("unmount", Some(sub)) => {
            setup_stderr_logger(LevelFilter::Info)?;
            handlers::unmount::handle(sub)?;
        }
        ("gc", Some(sub)) => {
            setup_stderr_logger(LevelFilter::Info)?;

            let repository = sub.value_of("repository").expect("has a default value");
            let settings = build_settings(repository, PathBuf::new(), None, false)?;
            handlers::gc::handle(sub, settings)?;
        }
        _ => {
            eprintln!("no subcommand given, try `tagsistant --help`");
            std::process::exit(1);
        }
    }

    Ok(())
}
