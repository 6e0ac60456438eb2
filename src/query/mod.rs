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

pub mod parser;

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    Ne,
}

impl Operator {
    fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Ge => ">=",
            Operator::Ne => "!=",
        }
    }

    /// Evaluates `stored <op> query`, where `stored` is the value a tag was
    /// actually bound with (e.g. the `2009` in `date:year=2009`) and `query`
    /// is the value named in the query path (e.g. the `2008` in
    /// `date:year>2008`). Numeric when both sides parse as a number,
    /// lexicographic otherwise — see DESIGN.md for why.
    pub fn matches(self, stored: &str, query: &str) -> bool {
        let ordering = match (stored.parse::<f64>(), query.parse::<f64>()) {
            (Ok(a), Ok(b)) => a.partial_cmp(&b),
            _ => stored.partial_cmp(query),
        };
        let ordering = match ordering {
            Some(o) => o,
            None => return false,
        };
        match self {
            Operator::Eq => ordering == std::cmp::Ordering::Equal,
            Operator::Ne => ordering != std::cmp::Ordering::Equal,
            Operator::Lt => ordering == std::cmp::Ordering::Less,
            Operator::Gt => ordering == std::cmp::Ordering::Greater,
            Operator::Le => ordering != std::cmp::Ordering::Greater,
            Operator::Ge => ordering != std::cmp::Ordering::Less,
        }
    }
}

/// The optional `namespace:key<op>value` structured form of a tag-expr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredTag {
    pub namespace: String,
    pub key: String,
    pub operator: Operator,
    pub value: String,
}

/// A single AND-node: either a plain tag name or a structured tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagExpr {
    pub tagname: String,
    pub structured: Option<StructuredTag>,
}

impl TagExpr {
    pub fn plain(tagname: impl Into<String>) -> Self {
        Self {
            tagname: tagname.into(),
            structured: None,
        }
    }
}

impl std::fmt::Display for TagExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.structured {
            Some(s) => write!(f, "{}:{}{}{}", s.namespace, s.key, s.operator.as_str(), s.value),
            None => write!(f, "{}", self.tagname),
        }
    }
}

pub type AndSet = Vec<TagExpr>;

/// Runtime-only parsed form of a mount-point path: an ordered list of
/// OR-sections, each an ordered list of AND-nodes, plus the role flags and
/// resolved fields the resolver consults. No back-pointers; the parser
/// produces it, the resolver consumes it read-only.
#[derive(Debug, Clone, Default)]
pub struct Querytree {
    pub or_sections: Vec<AndSet>,

    pub malformed: bool,
    pub root: bool,
    pub archive: bool,
    pub tags: bool,
    pub relations: bool,
    pub stats: bool,
    pub points_to_object: bool,
    pub taggable: bool,
    pub complete: bool,

    pub inode: Option<i64>,
    pub object_path: Option<String>,
    pub full_archive_path: Option<PathBuf>,

    pub first_tag: Option<String>,
    pub relation: Option<String>,
    pub second_tag: Option<String>,
}

impl Querytree {
    /// True for the bare `/tags` query: no AND-nodes at all, not complete.
    pub fn is_tags_root(&self) -> bool {
        self.tags
            && !self.complete
            && (self.or_sections.is_empty() || (self.or_sections.len() == 1 && self.or_sections[0].is_empty()))
    }

    /// The last OR-section's AND-set, used for AND-suppression when listing
    /// tag names under a non-complete `/tags/...` path.
    pub fn last_and_set(&self) -> &[TagExpr] {
        self.or_sections.last().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_tag_ids_flat<'a>(&'a self) -> impl Iterator<Item = &'a str> {
        self.or_sections.iter().flatten().map(|t| t.tagname.as_str())
    }
}
