#[path = "common/mod.rs"]
mod common;

use common::fixture;
use std::collections::HashSet;
use tagsistant::dedup;
use tagsistant::mutate;
use tagsistant::query::parser;
use tagsistant::resolve::{resolve, Listing, Resolution};
use tagsistant::sql;

fn listed_inodes(ctx: &tagsistant::context::Context, path: &str) -> HashSet<i64> {
    match resolve(&parser::parse(path), ctx).unwrap() {
        Resolution::Listing(Listing::TagsComplete(objects)) => objects.into_iter().map(|o| o.inode).collect(),
        _ => panic!("expected a complete tags listing at {}", path),
    }
}

/// Property 2: repeated listings of the same non-complete path return the
/// same set, independent of how many times it's asked.
#[test]
fn listing_stability() {
    let f = fixture();
    let mut qt = parser::parse("/tags/cat/=/a");
    mutate::create_object(&f.ctx, &mut qt, "a", false).unwrap();

    let first = listed_inodes(&f.ctx, "/tags/cat/=");
    let second = listed_inodes(&f.ctx, "/tags/cat/=");
    assert_eq!(first, second);
}

/// Property 3: OR is commutative — `/tags/A/+/B/=` and `/tags/B/+/A/=` list
/// the same objects.
#[test]
fn filetree_or_is_commutative() {
    let f = fixture();
    let mut qt_x = parser::parse("/tags/A/=/x");
    mutate::create_object(&f.ctx, &mut qt_x, "x", false).unwrap();
    let mut qt_a_only = parser::parse("/tags/A/=/y");
    mutate::create_object(&f.ctx, &mut qt_a_only, "y", false).unwrap();
    let mut qt_b_only = parser::parse("/tags/B/=/z");
    mutate::create_object(&f.ctx, &mut qt_b_only, "z", false).unwrap();

    let forward = listed_inodes(&f.ctx, "/tags/A/+/B/=");
    let backward = listed_inodes(&f.ctx, "/tags/B/+/A/=");
    assert_eq!(forward, backward);
    assert_eq!(forward.len(), 3);
}

/// Property 4: listing `/tags/A/` never contains `A` itself among the
/// candidate tag names to refine by.
#[test]
fn and_suppression_excludes_own_tag() {
    let f = fixture();
    let mut qt = parser::parse("/tags/A/=/x");
    mutate::create_object(&f.ctx, &mut qt, "x", false).unwrap();

    match resolve(&parser::parse("/tags/A"), &f.ctx).unwrap() {
        Resolution::Listing(Listing::TagsIncomplete { tagnames, .. }) => {
            assert!(!tagnames.iter().any(|n| n == "A"));
        }
        _ => panic!("expected an incomplete tags listing"),
    }
}

/// Property 5: after any number of flushes followed by one sweep, no two
/// objects share a non-empty checksum.
#[test]
fn dedup_convergence() {
    let f = fixture();
    let mut inodes = Vec::new();
    for name in ["p", "q", "r"] {
        let mut qt = parser::parse(&format!("/tags/dup/=/{}", name));
        let object = mutate::create_object(&f.ctx, &mut qt, name, false).unwrap();
        std::fs::write(f.ctx.archive.path_for(object.inode, name), b"SAME").unwrap();
        inodes.push(object.inode);
    }

    dedup::sweep(&f.ctx).unwrap();

    let conn = f.ctx.store.conn().unwrap();
    let mut checksums = HashSet::new();
    let mut surviving = 0;
    for inode in &inodes {
        if let Some(obj) = sql::object_by_inode(&conn, *inode).unwrap() {
            assert!(checksums.insert(obj.checksum), "two surviving objects share a checksum");
            surviving += 1;
        }
    }
    assert_eq!(surviving, 1);
}

/// Property 6: a merge's survivor carries the union of both sides' tags.
#[test]
fn tag_preservation_under_merge() {
    let f = fixture();
    let mut qt_a = parser::parse("/tags/red/=/x");
    let a = mutate::create_object(&f.ctx, &mut qt_a, "x", false).unwrap();
    let mut qt_b = parser::parse("/tags/blue/=/x");
    let b = mutate::create_object(&f.ctx, &mut qt_b, "x", false).unwrap();

    std::fs::write(f.ctx.archive.path_for(a.inode, "x"), b"SAME").unwrap();
    std::fs::write(f.ctx.archive.path_for(b.inode, "x"), b"SAME").unwrap();
    dedup::sweep(&f.ctx).unwrap();

    let survivor = a.inode.min(b.inode);
    let conn = f.ctx.store.conn().unwrap();
    let mut tagnames: Vec<String> = sql::tags_for_inode(&conn, survivor)
        .unwrap()
        .into_iter()
        .map(|t| t.tagname)
        .collect();
    tagnames.sort();
    assert_eq!(tagnames, vec!["blue".to_string(), "red".to_string()]);
}

/// Property 7: a write that changes content leaves the checksum empty until
/// the next successful hash.
#[test]
fn dirty_monotonicity() {
    let f = fixture();
    let mut qt = parser::parse("/tags/draft/=/note.txt");
    let object = mutate::create_object(&f.ctx, &mut qt, "note.txt", false).unwrap();
    let path = f.ctx.archive.path_for(object.inode, "note.txt");
    std::fs::write(&path, b"A").unwrap();
    dedup::hash_and_merge_one(&f.ctx, object.inode).unwrap();

    mutate::mark_modified(&f.ctx, object.inode).unwrap();

    let conn = f.ctx.store.conn().unwrap();
    let stored = sql::object_by_inode(&conn, object.inode).unwrap().unwrap();
    assert!(stored.is_dirty());
}

/// Property 8: after a sweep, every archive file's inode prefix corresponds
/// to an existing object row.
#[test]
fn archive_and_metadata_agree_after_sweep() {
    let f = fixture();
    for name in ["m", "n"] {
        let mut qt = parser::parse(&format!("/tags/keep/=/{}", name));
        let object = mutate::create_object(&f.ctx, &mut qt, name, false).unwrap();
        std::fs::write(f.ctx.archive.path_for(object.inode, name), name.as_bytes()).unwrap();
    }
    dedup::sweep(&f.ctx).unwrap();

    let conn = f.ctx.store.conn().unwrap();
    for filename in f.ctx.archive.list().unwrap() {
        let inode_str = filename.split('_').next().unwrap();
        let inode: i64 = inode_str.parse().unwrap();
        assert!(sql::object_by_inode(&conn, inode).unwrap().is_some());
    }
}
