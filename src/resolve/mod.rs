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

use crate::context::Context;
use crate::query::Querytree;
use crate::sql::types::Object;
use log::trace;
use std::collections::HashSet;
use std::path::PathBuf;

const TAG: &str = "resolve";

pub const ROOT_ENTRIES: [&str; 4] = ["archive", "relations", "stats", "tags"];

pub enum RelationListing {
    /// No `first_tag`: every known tag, as candidates for a relation source.
    AllTags(Vec<String>),
    /// `first_tag` only: every relation label outgoing from it.
    OutgoingRelations(Vec<String>),
    /// `first_tag` + `relation`: every tag reachable via that relation.
    RelatedTags(Vec<String>),
    /// All three present: terminal, lists nothing.
    Empty,
}

pub enum Listing {
    Root,
    Archive(Vec<String>),
    TagsIncomplete {
        tagnames: Vec<String>,
        show_operators: bool,
    },
    TagsComplete(Vec<Object>),
    Relations(RelationListing),
    Stats,
}

pub enum Resolution {
    Listing(Listing),
    Object { full_path: PathBuf, object: Object },
    /// A complete tag query that parsed fine and matches a real tag
    /// combination, but whose filetree is empty. The directory itself still
    /// exists for `stat`/`lookup`; only listing its contents is an error,
    /// recovering the original's `readdir.c` "NULL filetree" check.
    Empty,
    NotFound,
    Malformed,
}

/// Dispatches a parsed querytree to its role-specific resolution, per the
/// design's §4.D table.
pub fn resolve(qt: &Querytree, ctx: &Context) -> crate::common::err::TsResult<Resolution> {
    if qt.malformed {
        return Ok(Resolution::Malformed);
    }

    if qt.root {
        return Ok(Resolution::Listing(Listing::Root));
    }

    if qt.archive {
        return resolve_archive(qt, ctx);
    }

    if qt.tags {
        return resolve_tags(qt, ctx);
    }

    if qt.relations {
        return resolve_relations(qt, ctx);
    }

    if qt.stats {
        return Ok(Resolution::Listing(Listing::Stats));
    }

    Ok(Resolution::Malformed)
}

fn resolve_archive(qt: &Querytree, ctx: &Context) -> crate::common::err::TsResult<Resolution> {
    if !qt.points_to_object {
        let names = ctx.archive.list()?;
        return Ok(Resolution::Listing(Listing::Archive(names)));
    }
    resolve_object_leaf(qt, ctx)
}

fn resolve_tags(qt: &Querytree, ctx: &Context) -> crate::common::err::TsResult<Resolution> {
    if !qt.complete {
        let conn = ctx.store.conn()?;
        let suppressed: HashSet<&str> = qt.last_and_set().iter().map(|t| t.tagname.as_str()).collect();
        let tagnames = crate::sql::all_tagnames(&conn)?
            .into_iter()
            .filter(|name| !suppressed.contains(name.as_str()))
            .collect();

        return Ok(Resolution::Listing(Listing::TagsIncomplete {
            tagnames,
            show_operators: !qt.is_tags_root(),
        }));
    }

    if qt.points_to_object {
        return resolve_object_leaf(qt, ctx);
    }

    let objects = build_filetree(qt, ctx)?;
    if objects.is_empty() {
        return Ok(Resolution::Empty);
    }
    Ok(Resolution::Listing(Listing::TagsComplete(objects)))
}

/// Resolves one AND-node to every tag id it matches: a plain tag-expr
/// resolves to at most its one exact tag, while a structured range expr
/// (`namespace:key<op>value`) resolves to every existing tag sharing that
/// `namespace:key` whose bound value satisfies `op`, since there is no
/// single tag row for "year greater than 2008" — only rows for the actual
/// years objects were tagged with.
fn matching_tag_ids(conn: &rusqlite::Connection, expr: &crate::query::TagExpr) -> crate::common::err::TsResult<Vec<i64>> {
    match &expr.structured {
        None => Ok(crate::sql::get_tag(conn, &expr.tagname)?.map(|t| vec![t.tag_id]).unwrap_or_default()),
        Some(query) => {
            let prefix = format!("{}:{}", query.namespace, query.key);
            let candidates = crate::sql::tags_with_prefix(conn, &prefix)?;
            let ids = candidates
                .into_iter()
                .filter_map(|tag| {
                    let stored = crate::query::parser::parse_structured_tagname(&tag.tagname)?;
                    if stored.namespace == query.namespace
                        && stored.key == query.key
                        && query.operator.matches(&stored.value, &query.value)
                    {
                        Some(tag.tag_id)
                    } else {
                        None
                    }
                })
                .collect();
            Ok(ids)
        }
    }
}

/// Evaluates each OR-section's AND-intersection and unions the results, per
/// §4.D's "TAGS, complete" rule. When the same inode is reachable through
/// multiple OR-sections it still appears exactly once.
fn build_filetree(qt: &Querytree, ctx: &Context) -> crate::common::err::TsResult<Vec<Object>> {
    let conn = ctx.store.conn()?;
    let mut union: HashSet<i64> = HashSet::new();

    for section in &qt.or_sections {
        if section.is_empty() {
            continue;
        }
        let mut groups = Vec::with_capacity(section.len());
        for expr in section {
            let ids = matching_tag_ids(&conn, expr)?;
            if ids.is_empty() {
                // a node with no matching tag at all can't satisfy this AND-set
                groups.clear();
                break;
            }
            groups.push(ids);
        }
        if groups.len() != section.len() {
            continue;
        }
        let matched = crate::sql::inodes_tagged_with_all_of_any(&conn, &groups)?;
        union.extend(matched);
    }

    trace!(target: TAG, "filetree union has {} objects", union.len());
    crate::sql::objects_for_inodes(&conn, &union)
}

fn resolve_object_leaf(qt: &Querytree, ctx: &Context) -> crate::common::err::TsResult<Resolution> {
    let conn = ctx.store.conn()?;

    let object = match qt.inode {
        Some(inode) => crate::sql::object_by_inode(&conn, inode)?,
        None => match &qt.object_path {
            Some(name) => crate::sql::object_by_name(&conn, name)?,
            None => None,
        },
    };

    match object {
        Some(object) => {
            let full_path = ctx.archive.path_for(object.inode, &object.objectname);
            Ok(Resolution::Object { full_path, object })
        }
        None => Ok(Resolution::NotFound),
    }
}

fn resolve_relations(qt: &Querytree, ctx: &Context) -> crate::common::err::TsResult<Resolution> {
    let conn = ctx.store.conn()?;

    let listing = match (&qt.first_tag, &qt.relation, &qt.second_tag) {
        (None, _, _) => RelationListing::AllTags(crate::sql::all_tagnames(&conn)?),
        (Some(_), Some(_), Some(_)) => RelationListing::Empty,
        (Some(first), None, _) => {
            let tag = crate::sql::get_tag(&conn, first)?;
            let names = match tag {
                Some(tag) => crate::sql::relations_from(&conn, tag.tag_id)?
                    .into_iter()
                    .map(|r| r.relation)
                    .collect(),
                None => Vec::new(),
            };
            RelationListing::OutgoingRelations(names)
        }
        (Some(first), Some(relation), None) => {
            let tag = crate::sql::get_tag(&conn, first)?;
            let names = match tag {
                Some(tag) => crate::sql::tags_related_via(&conn, tag.tag_id, relation)?
                    .into_iter()
                    .map(|t| t.tagname)
                    .collect(),
                None => Vec::new(),
            };
            RelationListing::RelatedTags(names)
        }
    };

    Ok(Resolution::Listing(Listing::Relations(listing)))
}
