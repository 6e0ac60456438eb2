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

use std::error::Error;
use std::path::PathBuf;

pub type TsResult<T> = Result<T, TsError>;

/// The error kinds named in the design's error handling section: malformed
/// query path, missing object, metadata store error, archive I/O error, and
/// internal invariant violation.
pub enum TsError {
    BadQuery(PathBuf),
    NotFound,
    DatabaseError(rusqlite::Error),
    ArchiveIo(std::io::Error),
    Invariant(String),
}

impl From<std::io::Error> for TsError {
    fn from(e: std::io::Error) -> Self {
        TsError::ArchiveIo(e)
    }
}

impl From<rusqlite::Error> for TsError {
    fn from(e: rusqlite::Error) -> Self {
        TsError::DatabaseError(e)
    }
}

impl Error for TsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TsError::DatabaseError(e) => Some(e),
            TsError::ArchiveIo(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for TsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TsError::BadQuery(path) => write!(f, "malformed query path: {}", path.display()),
            TsError::NotFound => write!(f, "no matching object"),
            TsError::DatabaseError(e) => write!(f, "metadata store error: {}", e),
            TsError::ArchiveIo(e) => write!(f, "archive I/O error: {}", e),
            TsError::Invariant(msg) => write!(f, "invariant violation: {}", msg),
        }
    }
}

impl std::fmt::Debug for TsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

#[derive(Debug)]
pub struct ParseOctalError;

impl std::fmt::Display for ParseOctalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid octal permissions value")
    }
}

impl Error for ParseOctalError {}

/// Translates an error into the negative error-number codes the filesystem
/// protocol adapter surfaces to the kernel, per the design's error policy:
/// parser errors become ENOENT, metadata errors become EIO, archive errors
/// propagate their own errno, and invariant violations become EIO.
pub fn to_errno(e: &TsError) -> i32 {
    match e {
        TsError::BadQuery(_) | TsError::NotFound => libc::ENOENT,
        TsError::DatabaseError(_) | TsError::Invariant(_) => libc::EIO,
        TsError::ArchiveIo(io) => io.raw_os_error().unwrap_or(libc::EIO),
    }
}
