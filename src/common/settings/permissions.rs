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

//! The octal permission mode applied to every directory and file the mount
//! synthesizes (`fs::dir_attr`/`fs::file_attr`). Configurable via the
//! `mount.permissions` config key or `--permissions`, and parsed from an
//! octal string either way, so this lives next to the rest of `Settings`
//! rather than under a general-purpose types module.

use crate::common::err::ParseOctalError;
use libc::mode_t;
use rusqlite::types::ToSqlOutput;
use rusqlite::{Error, ToSql};
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct ClassPerms {
    read: bool,
    write: bool,
    execute: bool,
}

impl ClassPerms {
    fn mode(self) -> mode_t {
        (self.read as mode_t) << 2 | (self.write as mode_t) << 1 | self.execute as mode_t
    }
}

impl From<mode_t> for ClassPerms {
    fn from(val: mode_t) -> Self {
        Self {
            read: (val & 0b100) > 0,
            write: (val & 0b010) > 0,
            execute: (val & 0b001) > 0,
        }
    }
}

/// Computed from the process umask at first use. Reading `/proc/self/status`
/// would avoid the read-then-restore race below, but Linux-only; this keeps
/// `Permissions::default()` portable to the other Unixes `fuser` supports.
fn umask_default_mode() -> mode_t {
    unsafe {
        // FIXME race! a concurrent umask() call from another thread between
        // these two calls would observe or install the wrong mask.
        let cur = libc::umask(0);
        libc::umask(cur);
        0o666 & !cur
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Permissions {
    owner: ClassPerms,
    group: ClassPerms,
    others: ClassPerms,
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03o}", self.mode())
    }
}

impl Default for Permissions {
    fn default() -> Self {
        umask_default_mode().into()
    }
}

impl Permissions {
    pub fn mode(&self) -> mode_t {
        (self.owner.mode() << 6) | (self.group.mode() << 3) | self.others.mode()
    }
}

impl From<mode_t> for Permissions {
    fn from(val: mode_t) -> Self {
        Self {
            owner: ((val & libc::S_IRWXU) >> 6).into(),
            group: ((val & libc::S_IRWXG) >> 3).into(),
            others: (val & libc::S_IRWXO).into(),
        }
    }
}

impl ToSql for Permissions {
    fn to_sql(&self) -> Result<ToSqlOutput<'_>, Error> {
        Ok(self.mode().into())
    }
}

impl FromStr for Permissions {
    type Err = ParseOctalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(mode_t::from_str_radix(s, 8).map_err(|_| ParseOctalError {})?.into())
    }
}

struct PermissionsVisitor;

impl<'de> Visitor<'de> for PermissionsVisitor {
    type Value = Permissions;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an octal permissions value")
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        mode_t::from_str_radix(&v, 8)
            .map(Into::into)
            .map_err(|_| E::custom(format!("invalid octal permissions: {}", v)))
    }
}

impl Serialize for Permissions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:o}", self.mode()))
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_string(PermissionsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_perms_round_trip_every_combination() {
        for bits in 0..8u32 {
            let perms: ClassPerms = bits.into();
            assert_eq!(perms.mode(), bits);
        }
    }

    #[test]
    fn permissions_round_trip_mode() {
        let perms: Permissions = 0o664.into();
        assert_eq!(perms.mode(), 0o664);
    }

    #[test]
    fn permissions_split_by_class() {
        let perms: Permissions = 0o754.into();
        assert_eq!(perms.owner.mode(), 0o7);
        assert_eq!(perms.group.mode(), 0o5);
        assert_eq!(perms.others.mode(), 0o4);
    }

    #[test]
    fn from_str_parses_octal() {
        let perms: Permissions = "755".parse().unwrap();
        assert_eq!(perms.mode(), 0o755);
    }

    #[test]
    fn from_str_rejects_non_octal() {
        assert!("abc".parse::<Permissions>().is_err());
    }
}
