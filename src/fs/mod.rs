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

//! The filesystem protocol adapter: translates `fuser` requests into
//! query-path parses, resolver dispatches, and archive/mutation calls. It
//! holds no domain logic of its own beyond the path<->inode bookkeeping FUSE
//! requires; everything else is delegated to [`crate::query`],
//! [`crate::resolve`], [`crate::mutate`] and [`crate::archive`].

mod inodes;

use crate::common::err::to_errno;
use crate::context::Context;
use crate::query::parser;
use crate::resolve::{resolve, Listing, RelationListing, Resolution};
use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyOpen, ReplyWrite, Request,
};
use inodes::InodeTable;
use libc::{EBADF, EIO, ENOENT};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

const TAG: &str = "fs";
const TTL: Duration = Duration::from_secs(1);

/// `TagsistantFs` is deliberately thin: almost every method's body is
/// "parse the virtual path, resolve it, translate the result." The
/// interesting logic lives in the modules it delegates to.
pub struct TagsistantFs {
    ctx: Arc<Context>,
    inodes: Mutex<InodeTable>,
    handles: Mutex<HashMap<u64, File>>,
    next_fh: AtomicU64,
}

impl TagsistantFs {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self {
            ctx,
            inodes: Mutex::new(InodeTable::new()),
            handles: Mutex::new(HashMap::new()),
            next_fh: AtomicU64::new(1),
        }
    }

    fn attr_for(&self, ino: u64, path: &str, uid: u32, gid: u32) -> Option<FileAttr> {
        let qt = parser::parse(path);
        let resolution = resolve(&qt, &self.ctx).ok()?;

        match resolution {
            Resolution::Malformed | Resolution::NotFound => None,
            Resolution::Listing(_) | Resolution::Empty => {
                Some(dir_attr(ino, self.ctx.settings.mount_permissions().mode(), uid, gid))
            }
            Resolution::Object { full_path, .. } => {
                let size = std::fs::metadata(&full_path).map(|m| m.len()).unwrap_or(0);
                Some(file_attr(ino, size, self.ctx.settings.mount_permissions().mode(), uid, gid))
            }
        }
    }

    fn children_of(&self, path: &str) -> Result<Vec<(String, FileType)>, i32> {
        let qt = parser::parse(path);
        let resolution = resolve(&qt, &self.ctx).map_err(|e| to_errno(&e))?;

        let entries = match resolution {
            Resolution::Malformed | Resolution::NotFound => return Err(ENOENT),
            Resolution::Object { .. } => return Err(libc::ENOTDIR),
            // a complete tag query with nothing to list, per the design's
            // EBADF-for-empty-filetree rule
            Resolution::Empty => return Err(EBADF),
            Resolution::Listing(Listing::Root) => crate::resolve::ROOT_ENTRIES
                .iter()
                .map(|name| (name.to_string(), FileType::Directory))
                .collect(),
            Resolution::Listing(Listing::Archive(names)) => names
                .into_iter()
                .map(|name| (name, FileType::RegularFile))
                .collect(),
            Resolution::Listing(Listing::TagsIncomplete { tagnames, show_operators }) => {
                let mut entries: Vec<(String, FileType)> = tagnames
                    .into_iter()
                    .map(|name| (name, FileType::Directory))
                    .collect();
                if show_operators {
                    entries.push(("+".to_string(), FileType::Directory));
                    entries.push(("=".to_string(), FileType::Directory));
                }
                entries
            }
            Resolution::Listing(Listing::TagsComplete(objects)) => objects
                .into_iter()
                .map(|o| (o.archive_filename(), FileType::RegularFile))
                .collect(),
            Resolution::Listing(Listing::Relations(listing)) => {
                let names = match listing {
                    RelationListing::AllTags(v) => v,
                    RelationListing::OutgoingRelations(v) => v,
                    RelationListing::RelatedTags(v) => v,
                    RelationListing::Empty => Vec::new(),
                };
                names.into_iter().map(|n| (n, FileType::Directory)).collect()
            }
            Resolution::Listing(Listing::Stats) => Vec::new(),
        };

        Ok(entries)
    }

    fn alloc_fh(&self) -> u64 {
        self.next_fh.fetch_add(1, Ordering::Relaxed)
    }
}

fn dir_attr(ino: u64, mode: u32, uid: u32, gid: u32) -> FileAttr {
    let now = SystemTime::now();
    FileAttr {
        ino,
        size: 0,
        blocks: 0,
        atime: now,
        mtime: now,
        ctime: now,
        crtime: now,
        kind: FileType::Directory,
        perm: (0o111 | mode) as u16,
        nlink: 2,
        uid,
        gid,
        rdev: 0,
        blksize: 512,
        flags: 0,
    }
}

fn file_attr(ino: u64, size: u64, mode: u32, uid: u32, gid: u32) -> FileAttr {
    let now = SystemTime::now();
    FileAttr {
        ino,
        size,
        blocks: (size + 511) / 512,
        atime: now,
        mtime: now,
        ctime: now,
        crtime: now,
        kind: FileType::RegularFile,
        perm: mode as u16,
        nlink: 1,
        uid,
        gid,
        rdev: 0,
        blksize: 512,
        flags: 0,
    }
}

impl Filesystem for TagsistantFs {
    fn lookup(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let name = match name.to_str() {
            Some(n) => n,
            None => return reply.error(ENOENT),
        };

        let child_path = {
            let mut inodes = self.inodes.lock();
            let parent_path = match inodes.path(parent) {
                Some(p) => p,
                None => return reply.error(ENOENT),
            };
            let child_path = join_path(&parent_path, name);
            inodes.assign(child_path.clone())
        };
        let (ino, child_path) = child_path;

        match self.attr_for(ino, &child_path, req.uid(), req.gid()) {
            Some(attr) => reply.entry(&TTL, &attr, 0),
            None => reply.error(ENOENT),
        }
    }

    fn getattr(&mut self, req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        let path = match self.inodes.lock().path(ino) {
            Some(p) => p,
            None => return reply.error(ENOENT),
        };
        match self.attr_for(ino, &path, req.uid(), req.gid()) {
            Some(attr) => reply.attr(&TTL, &attr),
            None => reply.error(ENOENT),
        }
    }

    fn readdir(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, offset: i64, mut reply: ReplyDirectory) {
        let path = match self.inodes.lock().path(ino) {
            Some(p) => p,
            None => return reply.error(ENOENT),
        };

        let children = match self.children_of(&path) {
            Ok(children) => children,
            Err(errno) => return reply.error(errno),
        };

        let mut entries = vec![
            (ino, FileType::Directory, ".".to_string()),
            (ino, FileType::Directory, "..".to_string()),
        ];
        for (name, kind) in children {
            let child_path = join_path(&path, &name);
            let child_ino = self.inodes.lock().assign(child_path).0;
            entries.push((child_ino, kind, name));
        }

        for (i, (ino, kind, name)) in entries.into_iter().enumerate().skip(offset as usize) {
            if reply.add(ino, (i + 1) as i64, kind, &name) {
                break;
            }
        }
        reply.ok();
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        let path = match self.inodes.lock().path(ino) {
            Some(p) => p,
            None => return reply.error(ENOENT),
        };
        let qt = parser::parse(&path);
        match resolve(&qt, &self.ctx) {
            Ok(Resolution::Object { full_path, .. }) => match OpenOptions::new().read(true).write(true).open(&full_path) {
                Ok(file) => {
                    let fh = self.alloc_fh();
                    self.handles.lock().insert(fh, file);
                    reply.opened(fh, 0);
                }
                Err(e) => reply.error(e.raw_os_error().unwrap_or(EIO)),
            },
            Ok(_) => reply.error(EBADF),
            Err(e) => reply.error(to_errno(&e)),
        }
    }

    fn read(&mut self, _req: &Request<'_>, _ino: u64, fh: u64, offset: i64, size: u32, _flags: i32, _lock_owner: Option<u64>, reply: ReplyData) {
        let handles = self.handles.lock();
        let file = match handles.get(&fh) {
            Some(f) => f,
            None => return reply.error(EBADF),
        };
        let mut buf = vec![0u8; size as usize];
        match file.read_at(&mut buf, offset as u64) {
            Ok(n) => reply.data(&buf[..n]),
            Err(e) => reply.error(e.raw_os_error().unwrap_or(EIO)),
        }
    }

    fn write(&mut self, _req: &Request<'_>, ino: u64, fh: u64, offset: i64, data: &[u8], _write_flags: u32, _flags: i32, _lock_owner: Option<u64>, reply: ReplyWrite) {
        {
            let handles = self.handles.lock();
            let file = match handles.get(&fh) {
                Some(f) => f,
                None => return reply.error(EBADF),
            };
            if let Err(e) = file.write_at(data, offset as u64) {
                return reply.error(e.raw_os_error().unwrap_or(EIO));
            }
        }

        let path = match self.inodes.lock().path(ino) {
            Some(p) => p,
            None => return reply.error(ENOENT),
        };
        let qt = parser::parse(&path);
        if let Some(inode) = qt.inode {
            if let Err(e) = crate::mutate::mark_modified(&self.ctx, inode) {
                warn!(target: TAG, "failed to mark inode {} dirty: {}", inode, e);
            }
        }

        reply.written(data.len() as u32);
    }

    fn create(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, _mode: u32, _umask: u32, _flags: i32, reply: ReplyCreate) {
        let name = match name.to_str() {
            Some(n) => n,
            None => return reply.error(ENOENT),
        };

        let parent_path = match self.inodes.lock().path(parent) {
            Some(p) => p,
            None => return reply.error(ENOENT),
        };
        let mut qt = parser::parse(&parent_path);
        if !qt.taggable {
            return reply.error(ENOENT);
        }

        match crate::mutate::create_object(&self.ctx, &mut qt, name, false) {
            Ok(object) => {
                let child_path = join_path(&parent_path, name);
                let (ino, _) = self.inodes.lock().assign(child_path);
                match OpenOptions::new().read(true).write(true).open(self.ctx.archive.path_for(object.inode, &object.objectname)) {
                    Ok(file) => {
                        let fh = self.alloc_fh();
                        self.handles.lock().insert(fh, file);
                        let attr = file_attr(ino, 0, self.ctx.settings.mount_permissions().mode(), req.uid(), req.gid());
                        reply.created(&TTL, &attr, 0, fh, 0);
                    }
                    Err(e) => reply.error(e.raw_os_error().unwrap_or(EIO)),
                }
            }
            Err(e) => {
                debug!(target: TAG, "create failed: {}", e);
                reply.error(to_errno(&e));
            }
        }
    }

    fn mkdir(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, _mode: u32, _umask: u32, reply: ReplyEntry) {
        let name = match name.to_str() {
            Some(n) => n,
            None => return reply.error(ENOENT),
        };

        let parent_path = match self.inodes.lock().path(parent) {
            Some(p) => p,
            None => return reply.error(ENOENT),
        };

        // Under /tags, a new path component just names (and implicitly
        // creates) a tag; there's no directory to create on disk.
        let qt = parser::parse(&parent_path);
        if !qt.tags || qt.complete {
            return reply.error(ENOENT);
        }

        let mut conn = match self.ctx.store.conn() {
            Ok(c) => c,
            Err(e) => return reply.error(to_errno(&e)),
        };
        let tx = match conn.transaction() {
            Ok(tx) => tx,
            Err(e) => return reply.error(to_errno(&crate::common::err::TsError::from(e))),
        };
        if let Err(e) = crate::sql::ensure_tag(&tx, name) {
            return reply.error(to_errno(&e));
        }
        if tx.commit().is_err() {
            return reply.error(EIO);
        }

        let child_path = join_path(&parent_path, name);
        let (ino, child_path) = self.inodes.lock().assign(child_path);
        match self.attr_for(ino, &child_path, req.uid(), req.gid()) {
            Some(attr) => reply.entry(&TTL, &attr, 0),
            None => reply.error(ENOENT),
        }
    }

    fn flush(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
        let path = match self.inodes.lock().path(ino) {
            Some(p) => p,
            None => return reply.error(ENOENT),
        };
        let qt = parser::parse(&path);
        if let Err(e) = crate::mutate::flush(&self.ctx, &qt) {
            warn!(target: TAG, "flush failed for {}: {}", path, e);
        }
        reply.ok();
    }

    fn release(&mut self, _req: &Request<'_>, _ino: u64, fh: u64, _flags: i32, _lock_owner: Option<u64>, _flush: bool, reply: ReplyEmpty) {
        self.handles.lock().remove(&fh);
        reply.ok();
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}
