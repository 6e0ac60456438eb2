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

use log::{debug, error, trace, warn};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, Transaction};
use rusqlite::NO_PARAMS;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub mod migrations;
pub mod pool;
pub mod types;

use crate::common::err::{TsError, TsResult};
use pool::{ConnectionPool, PooledConnection};
use types::{Object, Relation, Tag};

pub const SQL_TAG: &str = "sql";
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Opens a connection with foreign keys enabled and a permissive busy handler,
/// so concurrent writers back off instead of failing outright on contention.
pub fn get_conn<P: AsRef<Path>>(db_path: P) -> SqliteResult<Connection> {
    trace!(target: SQL_TAG, "opening {:?}", db_path.as_ref());
    let conn = Connection::open(&db_path)?;
    conn.execute("PRAGMA foreign_keys = 1", NO_PARAMS)?;
    conn.busy_handler(Some(|num| -> bool {
        if num >= 1000 {
            error!(target: SQL_TAG, "timed out waiting for connection lock");
            false
        } else {
            warn!(target: SQL_TAG, "database contention, retry {}", num + 1);
            std::thread::sleep(std::time::Duration::from_millis(50));
            true
        }
    }))?;
    Ok(conn)
}

/// The Metadata Store: a migrated sqlite database behind a semaphore-guarded
/// connection pool. Every mutating operation below takes an explicit
/// [`Transaction`] so a caller can compose several edits atomically; readers
/// take a plain [`Connection`].
pub struct Store {
    pool: ConnectionPool,
}

impl Store {
    pub fn open(db_path: PathBuf, app_version: &str, pool_size: usize) -> TsResult<Self> {
        let mut bootstrap = get_conn(&db_path)?;
        migrations::migrate(&mut bootstrap, app_version)?;
        drop(bootstrap);
        Ok(Self {
            pool: ConnectionPool::new(db_path, pool_size),
        })
    }

    pub fn conn(&self) -> TsResult<PooledConnection<'_>> {
        Ok(self.pool.acquire()?)
    }
}

fn to_object(row: &Row) -> SqliteResult<Object> {
    Ok(Object {
        inode: row.get(0)?,
        objectname: row.get(1)?,
        checksum: row.get(2)?,
    })
}

fn to_tag(row: &Row) -> SqliteResult<Tag> {
    Ok(Tag {
        tag_id: row.get(0)?,
        tagname: row.get(1)?,
    })
}

fn to_relation(row: &Row) -> SqliteResult<Relation> {
    Ok(Relation {
        tag1_id: row.get(0)?,
        relation: row.get(1)?,
        tag2_id: row.get(2)?,
    })
}

pub fn object_by_inode(conn: &Connection, inode: i64) -> TsResult<Option<Object>> {
    conn.query_row(
        "SELECT inode, objectname, checksum FROM objects WHERE inode=?1",
        params![inode],
        to_object,
    )
    .optional()
    .map_err(TsError::from)
}

pub fn object_by_name(conn: &Connection, objectname: &str) -> TsResult<Option<Object>> {
    conn.query_row(
        "SELECT inode, objectname, checksum FROM objects WHERE objectname=?1",
        params![objectname],
        to_object,
    )
    .optional()
    .map_err(TsError::from)
}

/// Inserts a new dirty object and returns its inode, per §4.E step 2.
pub fn insert_object(tx: &Transaction, objectname: &str) -> TsResult<i64> {
    tx.execute(
        "INSERT INTO objects (objectname, checksum) VALUES (?1, '')",
        params![objectname],
    )?;
    let inode = tx.last_insert_rowid();
    if inode == 0 {
        error!(target: SQL_TAG, "store returned inode 0 for object {}", objectname);
        return Err(TsError::Invariant("insert returned inode 0".into()));
    }
    Ok(inode)
}

/// Marks an object dirty, idempotently, per §4.E's write/truncate rule.
pub fn mark_dirty(tx: &Transaction, inode: i64) -> TsResult<()> {
    tx.execute("UPDATE objects SET checksum='' WHERE inode=?1", params![inode])?;
    Ok(())
}

/// Writes a freshly-computed hash, but only if the object is still dirty —
/// otherwise a concurrent write raced us and the hash would be stale.
pub fn set_checksum_if_dirty(tx: &Transaction, inode: i64, checksum: &str) -> TsResult<bool> {
    let updated = tx.execute(
        "UPDATE objects SET checksum=?2 WHERE inode=?1 AND checksum=''",
        params![inode, checksum],
    )?;
    Ok(updated > 0)
}

pub fn dirty_inodes(conn: &Connection) -> TsResult<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT inode FROM objects WHERE checksum=''")?;
    let rows = stmt
        .query_map(NO_PARAMS, |row| row.get(0))?
        .collect::<SqliteResult<Vec<i64>>>()?;
    Ok(rows)
}

pub fn object_by_checksum_excluding(
    conn: &Connection,
    checksum: &str,
    exclude_inode: i64,
) -> TsResult<Option<Object>> {
    conn.query_row(
        "SELECT inode, objectname, checksum FROM objects
         WHERE checksum=?1 AND checksum != '' AND inode != ?2
         ORDER BY inode ASC LIMIT 1",
        params![checksum, exclude_inode],
        to_object,
    )
    .optional()
    .map_err(TsError::from)
}

pub fn delete_object(tx: &Transaction, inode: i64) -> TsResult<()> {
    tx.execute("DELETE FROM objects WHERE inode=?1", params![inode])?;
    Ok(())
}

/// Ensures a tag exists, returning its id. Tags are created implicitly by any
/// path component naming one, and are never auto-deleted by the core.
pub fn ensure_tag(tx: &Transaction, tagname: &str) -> TsResult<i64> {
    if let Some(existing) = tx
        .query_row(
            "SELECT tag_id FROM tags WHERE tagname=?1",
            params![tagname],
            |row| row.get(0),
        )
        .optional()?
    {
        return Ok(existing);
    }

    debug!(target: SQL_TAG, "creating tag {}", tagname);
    tx.execute("INSERT INTO tags (tagname) VALUES (?1)", params![tagname])?;
    Ok(tx.last_insert_rowid())
}

pub fn get_tag(conn: &Connection, tagname: &str) -> TsResult<Option<Tag>> {
    conn.query_row(
        "SELECT tag_id, tagname FROM tags WHERE tagname=?1",
        params![tagname],
        to_tag,
    )
    .optional()
    .map_err(TsError::from)
}

pub fn all_tagnames(conn: &Connection) -> TsResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT tagname FROM tags ORDER BY tagname")?;
    let rows = stmt
        .query_map(NO_PARAMS, |row| row.get(0))?
        .collect::<SqliteResult<Vec<String>>>()?;
    Ok(rows)
}

/// Tags with no remaining tagging edges, candidates for external GC (the
/// core never deletes a tag on its own).
pub fn unused_tags(conn: &Connection) -> TsResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT tag_id, tagname FROM tags
         WHERE tag_id NOT IN (SELECT DISTINCT tag_id FROM tagging)
         ORDER BY tagname",
    )?;
    let rows = stmt.query_map(NO_PARAMS, to_tag)?.collect::<SqliteResult<Vec<Tag>>>()?;
    Ok(rows)
}

pub fn delete_tag(tx: &Transaction, tag_id: i64) -> TsResult<()> {
    tx.execute("DELETE FROM tags WHERE tag_id=?1", params![tag_id])?;
    Ok(())
}

/// Binds `(inode, tag_id)`, silently ignoring the insert if the edge already
/// exists, per the tagging table's `UNIQUE(inode, tag_id)` invariant.
pub fn bind_tag(tx: &Transaction, inode: i64, tag_id: i64) -> TsResult<()> {
    tx.execute(
        "INSERT OR IGNORE INTO tagging (inode, tag_id) VALUES (?1, ?2)",
        params![inode, tag_id],
    )?;
    Ok(())
}

pub fn unbind_tag(tx: &Transaction, inode: i64, tag_id: i64) -> TsResult<()> {
    tx.execute(
        "DELETE FROM tagging WHERE inode=?1 AND tag_id=?2",
        params![inode, tag_id],
    )?;
    Ok(())
}

pub fn tags_for_inode(conn: &Connection, inode: i64) -> TsResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.tag_id, t.tagname FROM tags t
         JOIN tagging tg ON tg.tag_id = t.tag_id
         WHERE tg.inode=?1
         ORDER BY t.tagname",
    )?;
    let rows = stmt
        .query_map(params![inode], to_tag)?
        .collect::<SqliteResult<Vec<Tag>>>()?;
    Ok(rows)
}

fn inodes_tagged_with_any_of(conn: &Connection, tag_ids: &[i64]) -> TsResult<HashSet<i64>> {
    let mut inodes = HashSet::new();
    for tag_id in tag_ids {
        let mut stmt = conn.prepare("SELECT inode FROM tagging WHERE tag_id=?1")?;
        inodes.extend(stmt.query_map(params![tag_id], |row| row.get::<_, i64>(0))?.collect::<SqliteResult<HashSet<i64>>>()?);
    }
    Ok(inodes)
}

/// Intersects, across AND-nodes, the set of objects tagged with at least one
/// member of that node's `tag_ids` — the per-OR-section AND evaluation
/// described in §4.D. A plain tag-expr resolves to a single-element group;
/// a structured range expr (`namespace:key>value`) resolves to every tag id
/// satisfying the comparison, matched by any of them.
pub fn inodes_tagged_with_all_of_any(conn: &Connection, groups: &[Vec<i64>]) -> TsResult<HashSet<i64>> {
    if groups.is_empty() || groups.iter().any(Vec::is_empty) {
        return Ok(HashSet::new());
    }

    let mut result: Option<HashSet<i64>> = None;
    for group in groups {
        let inodes = inodes_tagged_with_any_of(conn, group)?;
        result = Some(match result {
            None => inodes,
            Some(acc) => acc.intersection(&inodes).copied().collect(),
        });
    }
    Ok(result.unwrap_or_default())
}

/// Every tag whose name starts with `prefix`, for structured range matching:
/// the caller narrows further by parsing each candidate's `namespace:key`
/// back out and comparing it exactly (a `LIKE` prefix alone would also catch
/// e.g. `date:yearly` when looking for `date:year`).
pub fn tags_with_prefix(conn: &Connection, prefix: &str) -> TsResult<Vec<Tag>> {
    let pattern = format!("{}%", prefix.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_"));
    let mut stmt = conn.prepare("SELECT tag_id, tagname FROM tags WHERE tagname LIKE ?1 ESCAPE '\\'")?;
    let rows = stmt.query_map(params![pattern], to_tag)?.collect::<SqliteResult<Vec<Tag>>>()?;
    Ok(rows)
}

pub fn objects_for_inodes(conn: &Connection, inodes: &HashSet<i64>) -> TsResult<Vec<Object>> {
    let mut objects = Vec::with_capacity(inodes.len());
    for inode in inodes {
        if let Some(obj) = object_by_inode(conn, *inode)? {
            objects.push(obj);
        }
    }
    Ok(objects)
}

pub fn relations_from(conn: &Connection, tag1_id: i64) -> TsResult<Vec<Relation>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT tag1_id, relation, tag2_id FROM relations WHERE tag1_id=?1 ORDER BY relation",
    )?;
    let rows = stmt
        .query_map(params![tag1_id], to_relation)?
        .collect::<SqliteResult<Vec<Relation>>>()?;
    Ok(rows)
}

pub fn tags_related_via(conn: &Connection, tag1_id: i64, relation: &str) -> TsResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.tag_id, t.tagname FROM tags t
         JOIN relations r ON r.tag2_id = t.tag_id
         WHERE r.tag1_id=?1 AND r.relation=?2
         ORDER BY t.tagname",
    )?;
    let rows = stmt
        .query_map(params![tag1_id, relation], to_tag)?
        .collect::<SqliteResult<Vec<Tag>>>()?;
    Ok(rows)
}

/// Repoints every `Tagging` row from the losing inode to the surviving one,
/// then deletes the loser's object row, per §4.F's merge policy steps 1-3.
/// The archive file unlink is the caller's responsibility (it needs the
/// archive root, which this store doesn't know about).
pub fn merge_objects(tx: &Transaction, main_inode: i64, loser_inode: i64) -> TsResult<()> {
    debug!(target: SQL_TAG, "merging inode {} into {}", loser_inode, main_inode);

    tx.execute(
        "UPDATE OR IGNORE tagging SET inode=?1 WHERE inode=?2",
        params![main_inode, loser_inode],
    )?;
    tx.execute("DELETE FROM tagging WHERE inode=?1", params![loser_inode])?;
    tx.execute("DELETE FROM objects WHERE inode=?1", params![loser_inode])?;
    Ok(())
}
