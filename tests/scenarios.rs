#[path = "common/mod.rs"]
mod common;

use common::fixture;
use tagsistant::dedup;
use tagsistant::mutate;
use tagsistant::query::parser;
use tagsistant::resolve::{resolve, Listing, Resolution};
use tagsistant::sql;

/// S1: create an object through a taggable path, then find it in a listing
/// of the tag that created it.
#[test]
fn s1_create_then_list() {
    let f = fixture();
    let mut qt = parser::parse("/tags/photo/=/cat.jpg");
    let object = mutate::create_object(&f.ctx, &mut qt, "cat.jpg", false).unwrap();

    assert_eq!(object.objectname, "cat.jpg");
    assert_eq!(object.checksum, "");

    let conn = f.ctx.store.conn().unwrap();
    let tags: Vec<String> = sql::tags_for_inode(&conn, object.inode)
        .unwrap()
        .into_iter()
        .map(|t| t.tagname)
        .collect();
    assert_eq!(tags, vec!["photo".to_string()]);
    drop(conn);

    let listing_qt = parser::parse("/tags/photo/=");
    match resolve(&listing_qt, &f.ctx).unwrap() {
        Resolution::Listing(Listing::TagsComplete(objects)) => {
            assert_eq!(objects.len(), 1);
            assert_eq!(objects[0].archive_filename(), format!("{}_cat.jpg", object.inode));
        }
        _ => panic!("expected a complete tags listing"),
    }
}

/// S2: two distinct objects with identical content converge into one after
/// a sweep, retaining the union of both tag sets.
#[test]
fn s2_dedup_merges_identical_content() {
    let f = fixture();

    let mut qt_a = parser::parse("/tags/a/=/x");
    let a = mutate::create_object(&f.ctx, &mut qt_a, "x", false).unwrap();
    let mut qt_b = parser::parse("/tags/b/=/x");
    let b = mutate::create_object(&f.ctx, &mut qt_b, "x", false).unwrap();
    assert_ne!(a.inode, b.inode);

    std::fs::write(f.ctx.archive.path_for(a.inode, "x"), b"HELLO").unwrap();
    std::fs::write(f.ctx.archive.path_for(b.inode, "x"), b"HELLO").unwrap();

    dedup::sweep(&f.ctx).unwrap();

    let survivor = a.inode.min(b.inode);
    let loser = a.inode.max(b.inode);

    let conn = f.ctx.store.conn().unwrap();
    assert!(sql::object_by_inode(&conn, survivor).unwrap().is_some());
    assert!(sql::object_by_inode(&conn, loser).unwrap().is_none());

    let mut tagnames: Vec<String> = sql::tags_for_inode(&conn, survivor)
        .unwrap()
        .into_iter()
        .map(|t| t.tagname)
        .collect();
    tagnames.sort();
    assert_eq!(tagnames, vec!["a".to_string(), "b".to_string()]);
    drop(conn);

    assert_eq!(f.ctx.archive.list().unwrap().len(), 1);

    for path in ["/tags/a/=", "/tags/b/="] {
        match resolve(&parser::parse(path), &f.ctx).unwrap() {
            Resolution::Listing(Listing::TagsComplete(objects)) => {
                assert_eq!(objects.len(), 1);
                assert_eq!(objects[0].inode, survivor);
            }
            _ => panic!("expected a complete tags listing at {}", path),
        }
    }
}

/// S3: the root directory lists exactly the four top-level roots (`.`/`..`
/// are the FUSE adapter's concern, not the resolver's).
#[test]
fn s3_root_listing() {
    let f = fixture();
    match resolve(&parser::parse("/"), &f.ctx).unwrap() {
        Resolution::Listing(Listing::Root) => {}
        _ => panic!("expected the root listing"),
    }
    let mut roots = tagsistant::resolve::ROOT_ENTRIES.to_vec();
    roots.sort_unstable();
    assert_eq!(roots, ["archive", "relations", "stats", "tags"]);
}

/// S4: `/tags` never shows the `+`/`=` operators; `/tags/foo` does.
#[test]
fn s4_operators_shown_only_below_tags_root() {
    let f = fixture();

    match resolve(&parser::parse("/tags"), &f.ctx).unwrap() {
        Resolution::Listing(Listing::TagsIncomplete { show_operators, .. }) => assert!(!show_operators),
        _ => panic!("expected an incomplete tags listing"),
    }

    match resolve(&parser::parse("/tags/foo"), &f.ctx).unwrap() {
        Resolution::Listing(Listing::TagsIncomplete { show_operators, .. }) => assert!(show_operators),
        _ => panic!("expected an incomplete tags listing"),
    }
}

/// S5: a path under no recognized top-level root is malformed, which the
/// FUSE adapter turns into ENOENT at the single errno-translation boundary.
#[test]
fn s5_bogus_path_is_malformed() {
    let f = fixture();
    match resolve(&parser::parse("/bogus/thing"), &f.ctx).unwrap() {
        Resolution::Malformed => {}
        _ => panic!("expected a malformed resolution"),
    }
}

/// S6: the checksum after a second write-then-sweep cycle reflects the
/// latest content, never a stale hash from the first write.
#[test]
fn s6_checksum_reflects_latest_write() {
    let f = fixture();
    let mut qt = parser::parse("/tags/draft/=/note.txt");
    let object = mutate::create_object(&f.ctx, &mut qt, "note.txt", false).unwrap();
    let path = f.ctx.archive.path_for(object.inode, "note.txt");

    std::fs::write(&path, b"A").unwrap();
    dedup::hash_and_merge_one(&f.ctx, object.inode).unwrap();

    mutate::mark_modified(&f.ctx, object.inode).unwrap();
    std::fs::write(&path, b"B").unwrap();
    dedup::hash_and_merge_one(&f.ctx, object.inode).unwrap();

    let conn = f.ctx.store.conn().unwrap();
    let stored = sql::object_by_inode(&conn, object.inode).unwrap().unwrap();
    let expected = format!("{:x}", md5::compute(b"B"));
    assert_eq!(stored.checksum, expected);
}

/// A complete tag query is a real, existing tag with nothing tagged under
/// it — the filetree is legitimately empty, not a parse failure.
#[test]
fn s7_complete_query_with_no_matches_is_empty_not_a_listing() {
    let f = fixture();
    let mut conn = f.ctx.store.conn().unwrap();
    let tx = conn.transaction().unwrap();
    sql::ensure_tag(&tx, "lonely").unwrap();
    tx.commit().unwrap();
    drop(conn);

    match resolve(&parser::parse("/tags/lonely/="), &f.ctx).unwrap() {
        Resolution::Empty => {}
        _ => panic!("expected an empty resolution"),
    }
}

/// S8: structured tag range operators actually filter by the bound value,
/// not just by exact literal match on `=`.
#[test]
fn s8_structured_range_operators_filter_by_value() {
    let f = fixture();
    for year in ["2007", "2008", "2009", "2010"] {
        let mut qt = parser::parse(&format!("/tags/date:year={}/=/{}.jpg", year, year));
        mutate::create_object(&f.ctx, &mut qt, &format!("{}.jpg", year), false).unwrap();
    }

    let gt = listed_inodes(&f.ctx, "/tags/date:year>2008/=");
    assert_eq!(names_of(&f.ctx, &gt), vec!["2009.jpg", "2010.jpg"]);

    let ge = listed_inodes(&f.ctx, "/tags/date:year>=2008/=");
    assert_eq!(names_of(&f.ctx, &ge), vec!["2008.jpg", "2009.jpg", "2010.jpg"]);

    let lt = listed_inodes(&f.ctx, "/tags/date:year<2009/=");
    assert_eq!(names_of(&f.ctx, &lt), vec!["2007.jpg", "2008.jpg"]);

    let ne = listed_inodes(&f.ctx, "/tags/date:year!=2009/=");
    assert_eq!(names_of(&f.ctx, &ne), vec!["2007.jpg", "2008.jpg", "2010.jpg"]);
}

fn listed_inodes(ctx: &tagsistant::context::Context, path: &str) -> Vec<i64> {
    match resolve(&parser::parse(path), ctx).unwrap() {
        Resolution::Listing(Listing::TagsComplete(objects)) => objects.into_iter().map(|o| o.inode).collect(),
        _ => panic!("expected a complete tags listing at {}", path),
    }
}

fn names_of(ctx: &tagsistant::context::Context, inodes: &[i64]) -> Vec<String> {
    let conn = ctx.store.conn().unwrap();
    let mut names: Vec<String> = inodes
        .iter()
        .map(|inode| sql::object_by_inode(&conn, *inode).unwrap().unwrap().objectname)
        .collect();
    names.sort();
    names
}
