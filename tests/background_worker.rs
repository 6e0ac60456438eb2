#[path = "common/mod.rs"]
mod common;

use common::fixture_with_fast_dedup;
use std::sync::Arc;
use tagsistant::dedup::Deduplicator;
use tagsistant::mutate;
use tagsistant::query::parser;
use tagsistant::sql;

/// The background worker merges duplicate content on its own, without the
/// caller ever touching `dedup::sweep` directly.
#[test]
fn background_sweep_merges_without_manual_trigger() {
    let f = fixture_with_fast_dedup();
    let ctx = Arc::new(f.ctx);

    let mut qt_a = parser::parse("/tags/a/=/x");
    let a = mutate::create_object(&ctx, &mut qt_a, "x", false).unwrap();
    let mut qt_b = parser::parse("/tags/b/=/x");
    let b = mutate::create_object(&ctx, &mut qt_b, "x", false).unwrap();

    std::fs::write(ctx.archive.path_for(a.inode, "x"), b"SAME").unwrap();
    std::fs::write(ctx.archive.path_for(b.inode, "x"), b"SAME").unwrap();

    let worker = Deduplicator::spawn(Arc::clone(&ctx));
    worker.wake();

    // give the worker a moment to pick up the wake signal and run a pass.
    spin_sleep::sleep(std::time::Duration::from_millis(200));
    worker.shutdown();

    let survivor = a.inode.min(b.inode);
    let loser = a.inode.max(b.inode);

    let conn = ctx.store.conn().unwrap();
    assert!(sql::object_by_inode(&conn, survivor).unwrap().is_some());
    assert!(sql::object_by_inode(&conn, loser).unwrap().is_none());
}
