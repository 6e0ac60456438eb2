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

use super::{Operator, Querytree, StructuredTag, TagExpr};
use crate::common::constants::DELIM;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Splits an archive leaf `<inode><DELIM><objectname>` into its parts.
    /// Compiled once; the whole reason this is a regex rather than a
    /// `find`/`split` pair is that `DELIM` is a repository-wide constant
    /// baked in at compile time, not user input.
    static ref INODE_PREFIX_RE: Regex =
        Regex::new(&format!(r"^([0-9]+){}(.+)$", regex::escape(DELIM))).expect("valid regex");

    /// Matches the structured tag-expr form `namespace:key<op>value`. The
    /// alternation is ordered so multi-character operators are tried before
    /// their single-character prefixes.
    static ref STRUCTURED_RE: Regex =
        Regex::new(r"^([^:/+=<>!]+):([^=<>!]+)(>=|<=|!=|=|<|>)(.+)$").expect("valid regex");
}

/// Splits an object leaf into its resolved `(inode, objectname)`. Leaves
/// without a recognizable `<inode><DELIM>` prefix return `None` for the
/// inode; the caller is responsible for consulting the alias map.
pub fn split_leaf(leaf: &str) -> (Option<i64>, String) {
    match INODE_PREFIX_RE.captures(leaf) {
        Some(caps) => {
            let inode = caps[1].parse::<i64>().ok();
            (inode, caps[2].to_string())
        }
        None => (None, leaf.to_string()),
    }
}

fn parse_operator(s: &str) -> Option<Operator> {
    match s {
        "=" => Some(Operator::Eq),
        "<" => Some(Operator::Lt),
        ">" => Some(Operator::Gt),
        "<=" => Some(Operator::Le),
        ">=" => Some(Operator::Ge),
        "!=" => Some(Operator::Ne),
        _ => None,
    }
}

fn parse_tag_expr(s: &str) -> Option<TagExpr> {
    if s.is_empty() {
        return None;
    }
    if let Some(structured) = parse_structured_tagname(s) {
        return Some(TagExpr {
            tagname: s.to_string(),
            structured: Some(structured),
        });
    }
    Some(TagExpr::plain(s))
}

/// Parses a raw tagname — whether it came off a path component or out of
/// the `tags` table — into its `namespace:key<op>value` parts, if it has
/// that shape. Shared by the path parser and the resolver's range matching,
/// which re-parses every stored tag sharing a `namespace:key` prefix to
/// recover the value it was bound with.
pub fn parse_structured_tagname(s: &str) -> Option<StructuredTag> {
    let caps = STRUCTURED_RE.captures(s)?;
    let operator = parse_operator(&caps[3])?;
    Some(StructuredTag {
        namespace: caps[1].to_string(),
        key: caps[2].to_string(),
        operator,
        value: caps[4].to_string(),
    })
}

/// Parses a mount-point path into a [`Querytree`], per the grammar in
/// the design's query-path section. Every path classifies into exactly one
/// top-level role, or is marked malformed.
pub fn parse(path: &str) -> Querytree {
    let mut qt = Querytree::default();
    let trimmed = path.trim_start_matches('/');

    if trimmed.is_empty() {
        qt.root = true;
        return qt;
    }

    let mut parts = trimmed.split('/').filter(|s| !s.is_empty());
    let head = match parts.next() {
        Some(h) => h,
        None => {
            qt.root = true;
            return qt;
        }
    };

    match head {
        "archive" => parse_archive(parts, &mut qt),
        "tags" => {
            qt.tags = true;
            parse_tag_query(parts, &mut qt);
        }
        "relations" => {
            qt.relations = true;
            parse_relation_path(parts, &mut qt);
        }
        "stats" => {
            qt.stats = true;
        }
        _ => {
            qt.malformed = true;
        }
    }

    qt
}

fn parse_archive<'a>(mut parts: impl Iterator<Item = &'a str>, qt: &mut Querytree) {
    qt.archive = true;
    if let Some(leaf) = parts.next() {
        qt.points_to_object = true;
        let (inode, name) = split_leaf(leaf);
        qt.inode = inode;
        qt.object_path = Some(name);
    }
    if parts.next().is_some() {
        // more components after the leaf don't classify into the grammar
        qt.archive = false;
        qt.points_to_object = false;
        qt.malformed = true;
    }
}

fn parse_tag_query<'a>(parts: impl Iterator<Item = &'a str>, qt: &mut Querytree) {
    qt.or_sections.push(Vec::new());
    let mut it = parts.peekable();

    while let Some(part) = it.next() {
        match part {
            "+" => qt.or_sections.push(Vec::new()),
            "=" => {
                qt.complete = true;
                if let Some(leaf) = it.next() {
                    qt.points_to_object = true;
                    let (inode, name) = split_leaf(leaf);
                    qt.inode = inode;
                    qt.object_path = Some(name);
                }
                if it.next().is_some() {
                    qt.malformed = true;
                }
                break;
            }
            tag_expr => match parse_tag_expr(tag_expr) {
                Some(expr) => qt.or_sections.last_mut().expect("pushed above").push(expr),
                None => qt.malformed = true,
            },
        }
    }

    qt.taggable = qt.complete && qt.or_sections.iter().any(|section| !section.is_empty());
}

fn parse_relation_path<'a>(mut parts: impl Iterator<Item = &'a str>, qt: &mut Querytree) {
    qt.first_tag = parts.next().map(str::to_string);
    qt.relation = parts.next().map(str::to_string);
    qt.second_tag = parts.next().map(str::to_string);
    if parts.next().is_some() {
        qt.malformed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path() {
        let qt = parse("/");
        assert!(qt.root);
        assert!(!qt.malformed);
    }

    #[test]
    fn bare_tags_is_not_complete() {
        let qt = parse("/tags");
        assert!(qt.tags);
        assert!(qt.is_tags_root());
        assert!(!qt.complete);
    }

    #[test]
    fn complete_query_with_or_sections() {
        let qt = parse("/tags/photo/+/2009/=");
        assert!(qt.tags);
        assert!(qt.complete);
        assert!(qt.taggable);
        assert_eq!(qt.or_sections.len(), 2);
        assert_eq!(qt.or_sections[0][0].tagname, "photo");
        assert_eq!(qt.or_sections[1][0].tagname, "2009");
    }

    #[test]
    fn complete_query_resolves_leaf() {
        let qt = parse("/tags/photo/=/42_cat.jpg");
        assert_eq!(qt.inode, Some(42));
        assert_eq!(qt.object_path.as_deref(), Some("cat.jpg"));
        assert!(qt.points_to_object);
    }

    #[test]
    fn leaf_without_inode_prefix_has_no_inode() {
        let (inode, name) = split_leaf("cat.jpg");
        assert_eq!(inode, None);
        assert_eq!(name, "cat.jpg");
    }

    #[test]
    fn malformed_top_level() {
        let qt = parse("/bogus/thing");
        assert!(qt.malformed);
    }

    #[test]
    fn archive_with_leaf() {
        let qt = parse("/archive/7_dog.png");
        assert!(qt.archive);
        assert_eq!(qt.inode, Some(7));
        assert_eq!(qt.object_path.as_deref(), Some("dog.png"));
    }

    #[test]
    fn relation_path_shapes() {
        let qt = parse("/relations/photo/includes/vacation");
        assert!(qt.relations);
        assert_eq!(qt.first_tag.as_deref(), Some("photo"));
        assert_eq!(qt.relation.as_deref(), Some("includes"));
        assert_eq!(qt.second_tag.as_deref(), Some("vacation"));
    }

    #[test]
    fn structured_tag_expr() {
        let qt = parse("/tags/date:year=2009/=");
        let expr = &qt.or_sections[0][0];
        let structured = expr.structured.as_ref().expect("structured tag");
        assert_eq!(structured.namespace, "date");
        assert_eq!(structured.key, "year");
        assert_eq!(structured.operator, Operator::Eq);
        assert_eq!(structured.value, "2009");
    }

    #[test]
    fn or_commutativity_produces_same_sections_either_order() {
        let a = parse("/tags/A/+/B/=");
        let b = parse("/tags/B/+/A/=");
        let mut a_names: Vec<_> = a.or_sections.iter().flatten().map(|t| t.tagname.clone()).collect();
        let mut b_names: Vec<_> = b.or_sections.iter().flatten().map(|t| t.tagname.clone()).collect();
        a_names.sort();
        b_names.sort();
        assert_eq!(a_names, b_names);
    }
}
