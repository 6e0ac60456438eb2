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

use log::trace;
use parking_lot::{Condvar, Mutex};
use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

const TAG: &str = "db_pool";

/// A fixed-size pool of leased connections, guarded by a semaphore rather
/// than the coarse single-flag mutex of the design it's adapted from.
/// Connections are opened lazily up to `size` and handed out by
/// [`ConnectionPool::acquire`], which blocks until one is available.
pub struct ConnectionPool {
    db_path: PathBuf,
    idle: Mutex<Vec<Connection>>,
    available: Condvar,
    size: usize,
    opened: Mutex<usize>,
}

impl ConnectionPool {
    pub fn new(db_path: PathBuf, size: usize) -> Self {
        Self {
            db_path,
            idle: Mutex::new(Vec::with_capacity(size)),
            available: Condvar::new(),
            size,
            opened: Mutex::new(0),
        }
    }

    fn open_one(&self) -> rusqlite::Result<Connection> {
        crate::sql::get_conn(&self.db_path)
    }

    /// Leases a connection, blocking until one is released if the pool is
    /// fully checked out. The connection is returned to the pool when the
    /// guard is dropped, on every exit path including panics during use.
    pub fn acquire(&self) -> rusqlite::Result<PooledConnection<'_>> {
        let mut idle = self.idle.lock();
        loop {
            if let Some(conn) = idle.pop() {
                trace!(target: TAG, "reusing idle connection");
                return Ok(PooledConnection {
                    pool: self,
                    conn: Some(conn),
                });
            }

            let mut opened = self.opened.lock();
            if *opened < self.size {
                *opened += 1;
                drop(opened);
                trace!(target: TAG, "opening new connection ({}/{})", *self.opened.lock(), self.size);
                return Ok(PooledConnection {
                    pool: self,
                    conn: Some(self.open_one()?),
                });
            }
            drop(opened);

            trace!(target: TAG, "pool exhausted, waiting for a release");
            self.available.wait(&mut idle);
        }
    }

    fn release(&self, conn: Connection) {
        let mut idle = self.idle.lock();
        idle.push(conn);
        self.available.notify_one();
    }
}

pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection taken before drop")
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection taken before drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
