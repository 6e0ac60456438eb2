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

use std::collections::HashMap;

pub const ROOT_INO: u64 = 1;

/// Maps FUSE inode numbers onto the virtual query-path strings the parser
/// understands. The kernel hands us an `ino` it got from an earlier
/// `lookup`/`readdir` reply; this table is how we recover the path that
/// produced it.
pub struct InodeTable {
    path_to_ino: HashMap<String, u64>,
    ino_to_path: HashMap<u64, String>,
    next: u64,
}

impl InodeTable {
    pub fn new() -> Self {
        let mut table = Self {
            path_to_ino: HashMap::new(),
            ino_to_path: HashMap::new(),
            next: ROOT_INO + 1,
        };
        table.path_to_ino.insert("/".to_string(), ROOT_INO);
        table.ino_to_path.insert(ROOT_INO, "/".to_string());
        table
    }

    pub fn path(&self, ino: u64) -> Option<String> {
        self.ino_to_path.get(&ino).cloned()
    }

    /// Returns the existing inode for `path`, assigning a fresh one on
    /// first sight.
    pub fn assign(&mut self, path: String) -> (u64, String) {
        if let Some(&ino) = self.path_to_ino.get(&path) {
            return (ino, path);
        }
        let ino = self.next;
        self.next += 1;
        self.path_to_ino.insert(path.clone(), ino);
        self.ino_to_path.insert(ino, path.clone());
        (ino, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_preassigned() {
        let table = InodeTable::new();
        assert_eq!(table.path(ROOT_INO).as_deref(), Some("/"));
    }

    #[test]
    fn assign_is_stable() {
        let mut table = InodeTable::new();
        let (a, _) = table.assign("/tags".to_string());
        let (b, _) = table.assign("/tags".to_string());
        assert_eq!(a, b);
    }
}
