use std::collections::HashMap;
use tagsistant::common::settings::config::HashMapSource;
use tagsistant::common::settings::Settings;
use tagsistant::context::Context;
use tagsistant::plugin::PluginChain;

/// A throwaway repository root plus an in-process `Context` built on it.
/// Never mounts FUSE — `/dev/fuse` and the privileges it needs aren't a
/// given in a CI sandbox, and every operation under test here goes through
/// the query parser / resolver / mutation path directly.
pub struct Fixture {
    _dir: tempfile::TempDir,
    pub ctx: Context,
}

pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let repository_root = dir.path().join("repo");
    let mountpoint = dir.path().join("mnt");

    let settings = Settings::new(repository_root, mountpoint, String::new(), HashMapSource(HashMap::new()))
        .expect("settings");
    let ctx = Context::new(settings, PluginChain::new()).expect("context");

    Fixture { _dir: dir, ctx }
}

/// Same as [`fixture`] but with the background sweep interval cut down to a
/// few milliseconds, for tests that exercise `Deduplicator::spawn` itself
/// rather than calling `dedup::sweep` inline.
pub fn fixture_with_fast_dedup() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let repository_root = dir.path().join("repo");
    let mountpoint = dir.path().join("mnt");

    let mut overrides = HashMap::new();
    overrides.insert("dedup.interval_secs".to_string(), 0i64.into());
    overrides.insert("dedup.enabled".to_string(), true.into());

    let settings = Settings::new(repository_root, mountpoint, String::new(), HashMapSource(overrides)).expect("settings");
    let ctx = Context::new(settings, PluginChain::new()).expect("context");

    Fixture { _dir: dir, ctx }
}
