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

//! A mount runs for as long as the filesystem is attached, so its log file
//! can't just be opened once at startup the way a short-lived `gc`/`unmount`
//! invocation's can — left alone it grows without bound for the life of the
//! mount. [`SessionLog`] periodically swaps in a new dated file and forgets
//! about the oldest one it opened, bounding how much of a long mount's
//! history accumulates on disk.

use log::{Metadata, Record};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::prelude::*;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// The file currently being appended to, plus the backlog of earlier files
/// this logger opened and hasn't retired yet.
struct Segment {
    writer: BufWriter<File>,
    path: PathBuf,
    backlog: VecDeque<PathBuf>,
    keep: usize,
}

impl Segment {
    fn swap_in(&mut self, path: PathBuf, file: File) -> std::io::Result<()> {
        self.backlog.push_back(self.path.clone());
        self.path = path;

        // only ever retires a file this logger itself opened in the current
        // run; a file left over from a previous mount of this repository is
        // never touched here.
        if self.backlog.len() > self.keep {
            let retired = self.backlog.pop_front().unwrap();
            std::fs::remove_file(retired)?;
        }

        self.writer.flush()?;
        self.writer = BufWriter::new(file);
        Ok(())
    }
}

/// Appends to a dated log file under a repository's `logs/` directory,
/// opening a fresh one roughly every `check_every` writes once the current
/// date no longer matches the file it's holding open, and dropping the
/// oldest file it created once more than `keep` backlog files accumulate.
pub struct SessionLog {
    check_every: u64,
    writes: AtomicU64,
    segment: Mutex<Segment>,
    log_dir: PathBuf,
    name_fmt: String,
}

impl SessionLog {
    pub fn new(log_dir: PathBuf, name_fmt: String, keep: usize, check_every: u64) -> std::io::Result<Self> {
        let path = Self::segment_path(&log_dir, &name_fmt);
        let file = Self::open_append(&path)?;

        Ok(Self {
            check_every,
            writes: AtomicU64::new(0),
            segment: Mutex::new(Segment {
                writer: BufWriter::new(file),
                path,
                backlog: VecDeque::new(),
                keep,
            }),
            log_dir,
            name_fmt,
        })
    }

    fn segment_path(log_dir: &Path, name_fmt: &str) -> PathBuf {
        log_dir.join(chrono::Utc::now().format(name_fmt).to_string())
    }

    fn open_append(path: &Path) -> std::io::Result<File> {
        OpenOptions::new().write(true).append(true).create(true).open(path)
    }
}

impl log::Log for SessionLog {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let seen = self.writes.fetch_add(1, Ordering::Relaxed);
        let mut segment = self.segment.lock();
        if seen % self.check_every == 0 {
            let candidate = Self::segment_path(&self.log_dir, &self.name_fmt);
            if segment.path != candidate {
                match Self::open_append(&candidate) {
                    Ok(file) => {
                        if let Err(e) = segment.swap_in(candidate, file) {
                            eprintln!("couldn't rotate log: {:?}", e);
                        }
                    }
                    Err(e) => eprintln!("couldn't open new log file: {:?}", e),
                }
            }
        }
        if let Err(e) = writeln!(segment.writer, "{}", record.args()) {
            eprintln!("couldn't write log record: {:?}", e);
        }
        if let Err(e) = segment.writer.flush() {
            eprintln!("couldn't flush log: {:?}", e);
        }
    }

    fn flush(&self) {
        let mut segment = self.segment.lock();
        if let Err(e) = segment.writer.flush() {
            eprintln!("couldn't flush log: {:?}", e);
        }
    }
}

/// Installs the global logger, chaining every given `fern::Output` (stderr,
/// a [`SessionLog`], ...) behind one shared formatter.
pub fn setup_logger(level: log::LevelFilter, outputs: Vec<fern::Output>) -> Result<(), fern::InitError> {
    let mut logger = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{:?}][{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S%.3f]"),
                std::thread::current().id(),
                record.target(),
                record.level(),
                message
            ));
        })
        .level(level);

    for output in outputs {
        logger = logger.chain(output);
    }

    logger.apply()?;
    Ok(())
}
