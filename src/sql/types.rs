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

/// A stored file plus its metadata row. `checksum` is the empty string while
/// the object is dirty (content may not match any previously computed hash).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub inode: i64,
    pub objectname: String,
    pub checksum: String,
}

impl Object {
    pub fn is_dirty(&self) -> bool {
        self.checksum.is_empty()
    }

    /// The on-disk archive filename: `<inode><DELIM><objectname>`.
    pub fn archive_filename(&self) -> String {
        format!("{}{}{}", self.inode, crate::common::constants::DELIM, self.objectname)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub tag_id: i64,
    pub tagname: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tagging {
    pub inode: i64,
    pub tag_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub tag1_id: i64,
    pub relation: String,
    pub tag2_id: i64,
}
