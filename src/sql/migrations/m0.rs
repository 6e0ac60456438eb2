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
use rusqlite::Result as SqliteResult;
use rusqlite::{Transaction, NO_PARAMS};

pub fn migrate(tx: &Transaction) -> SqliteResult<()> {
    tx.execute(
        "CREATE TABLE IF NOT EXISTS tagsistant_meta (
            migration_version INTEGER NOT NULL DEFAULT 0,
            tagsistant_version TEXT NOT NULL
        )",
        NO_PARAMS,
    )?;

    tx.execute(
        "INSERT INTO tagsistant_meta (migration_version, tagsistant_version)
         VALUES (0, '0.0.0')",
        NO_PARAMS,
    )?;

    // objects(inode PK, objectname, checksum). checksum="" means dirty.
    tx.execute(
        "CREATE TABLE IF NOT EXISTS objects (
            inode INTEGER PRIMARY KEY NOT NULL,
            objectname TEXT NOT NULL,
            checksum TEXT NOT NULL DEFAULT ''
        )",
        NO_PARAMS,
    )?;

    tx.execute(
        "CREATE INDEX IF NOT EXISTS idx_objects_checksum ON objects (checksum)",
        NO_PARAMS,
    )?;

    // tags(tag_id PK, tagname UNIQUE)
    tx.execute(
        "CREATE TABLE IF NOT EXISTS tags (
            tag_id INTEGER PRIMARY KEY NOT NULL,
            tagname TEXT NOT NULL UNIQUE
        )",
        NO_PARAMS,
    )?;

    // tagging(inode, tag_id, UNIQUE(inode, tag_id))
    tx.execute(
        "CREATE TABLE IF NOT EXISTS tagging (
            inode INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            UNIQUE (inode, tag_id),
            FOREIGN KEY (inode) REFERENCES objects (inode) ON DELETE CASCADE,
            FOREIGN KEY (tag_id) REFERENCES tags (tag_id) ON DELETE CASCADE
        )",
        NO_PARAMS,
    )?;

    tx.execute(
        "CREATE INDEX IF NOT EXISTS idx_tagging_tag_id ON tagging (tag_id)",
        NO_PARAMS,
    )?;

    // relations(tag1_id, relation, tag2_id)
    tx.execute(
        "CREATE TABLE IF NOT EXISTS relations (
            tag1_id INTEGER NOT NULL,
            relation TEXT NOT NULL,
            tag2_id INTEGER NOT NULL,
            UNIQUE (tag1_id, relation, tag2_id),
            FOREIGN KEY (tag1_id) REFERENCES tags (tag_id) ON DELETE CASCADE,
            FOREIGN KEY (tag2_id) REFERENCES tags (tag_id) ON DELETE CASCADE
        )",
        NO_PARAMS,
    )?;

    Ok(())
}
