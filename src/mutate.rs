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
use crate::query::Querytree;
use crate::sql;
use crate::sql::types::Object;
use log::debug;

const TAG: &str = "mutate";

/// Creates (or reuses) an object under a taggable path and binds every tag
/// named by the querytree's AND-sets, per §4.E steps 1-5. `force_create`
/// skips the by-name lookup so callers that must always create a fresh
/// object (e.g. an explicit `O_EXCL` create) can say so.
pub fn create_object(ctx: &Context, qt: &mut Querytree, objectname: &str, force_create: bool) -> TsResult<Object> {
    let mut conn = ctx.store.conn()?;
    let tx = conn.transaction()?;

    let existing = if force_create {
        None
    } else {
        sql::object_by_name(&tx, objectname)?
    };

    let inode = match existing {
        Some(obj) => obj.inode,
        None => sql::insert_object(&tx, objectname)?,
    };

    for section in &qt.or_sections {
        for expr in section {
            let tag_id = sql::ensure_tag(&tx, &expr.tagname)?;
            sql::bind_tag(&tx, inode, tag_id)?;
        }
    }

    tx.commit()?;
    drop(conn);

    ctx.archive.create(inode, objectname)?;

    qt.inode = Some(inode);
    qt.object_path = Some(objectname.to_string());
    qt.full_archive_path = Some(ctx.archive.path_for(inode, objectname));

    debug!(target: TAG, "created object {} (inode {})", objectname, inode);

    Ok(Object {
        inode,
        objectname: objectname.to_string(),
        checksum: String::new(),
    })
}

/// Marks an object dirty after a write or truncate that changed content.
/// Idempotent: setting an already-empty checksum to empty again is a no-op.
pub fn mark_modified(ctx: &Context, inode: i64) -> TsResult<()> {
    let mut conn = ctx.store.conn()?;
    let tx = conn.transaction()?;
    sql::mark_dirty(&tx, inode)?;
    tx.commit()?;
    Ok(())
}

fn guess_mime_type(objectname: &str) -> &'static str {
    match objectname.rsplit('.').next().unwrap_or("").to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// On flush of a taggable, still-dirty object: run the autotagging hook,
/// then deduplicate it synchronously, per §4.E's flush rule. Scoped to the
/// single inode the flush targets, never the whole dirty set.
pub fn flush(ctx: &Context, qt: &Querytree) -> TsResult<()> {
    if !qt.taggable {
        return Ok(());
    }
    let inode = match qt.inode {
        Some(inode) => inode,
        None => return Ok(()),
    };

    let object = {
        let conn = ctx.store.conn()?;
        sql::object_by_inode(&conn, inode)?
    };
    let object = match object {
        Some(object) => object,
        None => return Ok(()),
    };

    if !object.is_dirty() {
        return Ok(());
    }

    let mime_type = guess_mime_type(&object.objectname);
    ctx.plugins.dispatch(&object, mime_type, ctx);

    crate::dedup::hash_and_merge_one(ctx, inode)?;
    Ok(())
}
