#![allow(missing_docs)]

use std::fs;

use ttree::{
    ByKey, MemoryNodeStore, MemoryStoreOptions, ObjectId, Persistent, Result, SortedIndex,
    TtreeError, TtreeOptions,
};
use tempfile::tempdir;

#[derive(Clone, Debug)]
struct Tag(u64);

impl Persistent for Tag {
    fn oid(&self) -> ObjectId {
        ObjectId(self.0)
    }
}

#[test]
fn options_load_from_toml_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("index.toml");
    fs::write(&path, "max_items = 16\nmin_items = 4\n")?;

    let opts = TtreeOptions::from_path(&path)?;
    assert_eq!(opts.max_items, 16);
    assert_eq!(opts.min_items, 4);

    let rendered = opts.to_toml_string()?;
    assert_eq!(TtreeOptions::from_toml_str(&rendered)?, opts);
    Ok(())
}

#[test]
fn invalid_options_are_rejected() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("bad.toml");
    fs::write(&path, "max_items = 4\nmin_items = 4\n")?;
    assert!(matches!(
        TtreeOptions::from_path(&path),
        Err(TtreeError::Invalid(_))
    ));

    fs::write(&path, "max_items = \"many\"\n")?;
    assert!(matches!(
        TtreeOptions::from_path(&path),
        Err(TtreeError::Config(_))
    ));

    assert!(matches!(
        TtreeOptions::from_path(dir.path().join("missing.toml")),
        Err(TtreeError::Io(_))
    ));

    let bad = TtreeOptions::with_max_items(1);
    assert!(SortedIndex::<Tag, _>::new(ByKey(|t: &Tag| t.0), bad).is_err());
    Ok(())
}

#[test]
fn page_size_drives_capacity() -> Result<()> {
    let small = TtreeOptions::for_page_size(256);
    assert_eq!(small.max_items, (256 - 8 - 16) / 4);
    assert!(small.validate().is_ok());

    let mut store = MemoryNodeStore::with_options(&MemoryStoreOptions::default().cache_nodes(8))?;
    let mut index = SortedIndex::<Tag, _>::new(ByKey(|t: &Tag| t.0), small)?;
    for id in (0..1_000u64).rev() {
        index.add(&mut store, Tag(id))?;
    }
    let report = index.verify(&mut store)?;
    assert!(report.success);
    assert_eq!(report.counts.members, 1_000);
    assert!(report.counts.nodes >= 1_000 / 58);
    Ok(())
}

#[test]
fn store_options_parse_with_defaults() -> Result<()> {
    let opts: MemoryStoreOptions =
        toml::from_str("").map_err(|err| TtreeError::Config(err.to_string()))?;
    assert_eq!(opts.cache_nodes, 1024);
    assert!(MemoryNodeStore::<Tag>::with_options(&opts.cache_nodes(0)).is_err());
    Ok(())
}
