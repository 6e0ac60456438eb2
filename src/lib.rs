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

//! Tagsistant is a semantic filesystem: objects live in a flat archive directory
//! and are addressed through a tag query language embedded in the mount path.
//!
//! The modules here split along the same lines as the design's components:
//! [`sql`] is the Metadata Store, [`archive`] is the Archive Store, [`query`]
//! is the path parser, [`resolve`] is the filetree resolver, [`mutate`] is the
//! create/tag/flush path, [`dedup`] is the background deduplicator, and
//! [`plugin`] is the autotagging hook contract. [`context`] threads the
//! ambient state (settings, connection pool, plugin list) through all of them
//! explicitly rather than relying on process globals.

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::similar_names
)]

pub mod archive;
pub mod cli;
pub mod common;
pub mod context;
pub mod dedup;
pub mod fs;
pub mod mutate;
pub mod plugin;
pub mod query;
pub mod resolve;
pub mod sql;
