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

use crate::common::err::TsResult;
use crate::context::Context;
use crate::sql;
use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, error, warn};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

const TAG: &str = "dedup";
const CHUNK_SIZE: usize = 64 * 1024;

enum Signal {
    Wake,
    Shutdown,
}

/// Hashes the object backing `path` with a single fixed digest algorithm,
/// reading at most `CHUNK_SIZE` bytes per chunk as the design requires.
fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut ctx = md5::Context::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        ctx.consume(&buf[..n]);
    }
    Ok(format!("{:x}", ctx.compute()))
}

/// The single-object entry point shared by flush (synchronous) and the
/// sweep (background): hash the object, write its checksum if it's still
/// dirty, and merge it with any earlier object sharing that hash.
pub fn hash_and_merge_one(ctx: &Context, inode: i64) -> TsResult<()> {
    let object = {
        let conn = ctx.store.conn()?;
        sql::object_by_inode(&conn, inode)?
    };
    let object = match object {
        Some(object) => object,
        None => return Ok(()),
    };

    let path = ctx.archive.path_for(object.inode, &object.objectname);
    let meta = match std::fs::symlink_metadata(&path) {
        Ok(meta) => meta,
        Err(_) => return Ok(()), // archive file missing, retried next sweep
    };
    if !(meta.is_file() || meta.file_type().is_symlink()) {
        debug!(target: TAG, "skipping non-regular object {}", inode);
        return Ok(());
    }

    let checksum = hash_file(&path)?;

    let mut conn = ctx.store.conn()?;
    let tx = conn.transaction()?;

    if !sql::set_checksum_if_dirty(&tx, inode, &checksum)? {
        // a concurrent write raced us; it's dirty again, retry next sweep
        tx.rollback()?;
        return Ok(());
    }

    let sibling = sql::object_by_checksum_excluding(&tx, &checksum, inode)?;
    let mut unlinked = None;

    if let Some(sibling) = sibling {
        // main_inode is always the smaller of the two, per the survivor-stable rule
        let (main_inode, loser_inode, loser_name) = if sibling.inode < inode {
            (sibling.inode, inode, object.objectname.clone())
        } else {
            (inode, sibling.inode, sibling.objectname.clone())
        };
        sql::merge_objects(&tx, main_inode, loser_inode)?;
        unlinked = Some((loser_inode, loser_name));
    }

    tx.commit()?;

    if let Some((loser_inode, loser_name)) = unlinked {
        if let Err(e) = ctx.archive.unlink(loser_inode, &loser_name) {
            warn!(target: TAG, "merged inode {} but couldn't unlink its archive file: {}", loser_inode, e);
        }
    }

    Ok(())
}

/// One full pass over every dirty object. A failure on one object is
/// logged and never aborts the rest of the sweep.
pub fn sweep(ctx: &Context) -> TsResult<()> {
    let dirty = {
        let conn = ctx.store.conn()?;
        sql::dirty_inodes(&conn)?
    };
    debug!(target: TAG, "sweep starting, {} dirty object(s)", dirty.len());

    for inode in dirty {
        if let Err(e) = hash_and_merge_one(ctx, inode) {
            error!(target: TAG, "dedup failed for inode {}: {}", inode, e);
        }
    }
    Ok(())
}

/// The background sweep worker: `wait(interval or signal) -> scan dirty
/// inodes -> per inode, transactional hash+merge`. Flush can request an
/// immediate sweep through [`Deduplicator::wake`] instead of polling.
pub struct Deduplicator {
    signal: Sender<Signal>,
    handle: Option<JoinHandle<()>>,
}

impl Deduplicator {
    pub fn spawn(ctx: Arc<Context>) -> Self {
        let (tx, rx) = bounded::<Signal>(8);
        let interval = ctx.settings.deduplication_interval();

        let handle = std::thread::Builder::new()
            .name("dedup".into())
            .spawn(move || loop {
                match rx.recv_timeout(interval) {
                    Ok(Signal::Shutdown) => break,
                    Ok(Signal::Wake) => {
                        if let Err(e) = sweep(&ctx) {
                            error!(target: TAG, "sweep failed: {}", e);
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(e) = sweep(&ctx) {
                            error!(target: TAG, "sweep failed: {}", e);
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .expect("failed to spawn dedup thread");

        Self {
            signal: tx,
            handle: Some(handle),
        }
    }

    /// Requests an immediate sweep without waiting for the interval timer.
    pub fn wake(&self) {
        let _ = self.signal.send(Signal::Wake);
    }

    /// Signals the worker to exit and blocks until it finishes its current
    /// object, per the design's shutdown contract.
    pub fn shutdown(mut self) {
        let _ = self.signal.send(Signal::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
