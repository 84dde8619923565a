//! Index directories on disk.

use std::fs;

use fieldex::{
    open_index_dir, segment_file_name, Clause, FieldexConfig, Operator, Query, SearchService,
    SortField, SortKind, User, CONFIG_FILE_NAME,
};
use tempfile::TempDir;

use crate::common::{build_segment, TrackerRegistry};

#[test]
fn test_search_reopened_directory() {
    let dir = TempDir::new().unwrap();
    build_segment(2, &[("Open", "Minor", Some("1"))])
        .write_to_file(&dir.path().join(segment_file_name(2)))
        .unwrap();
    build_segment(1, &[("Open", "Major", Some("21")), ("Closed", "Major", Some("2"))])
        .write_to_file(&dir.path().join(segment_file_name(1)))
        .unwrap();

    let service = SearchService::open(dir.path(), TrackerRegistry::new()).unwrap();
    assert_eq!(service.config(), &FieldexConfig::default());
    assert_eq!(service.index().max_doc(), 3);

    let fred = User::new("fred");
    let query = Query::all().and(Clause::new("status", Operator::Equals, ["Open"]));
    let sort = SortField::ascending("customfield_10001", SortKind::Number);
    let results = service.search(Some(&fred), &query, Some(&sort), 10).unwrap();
    // segment 1 comes first regardless of file creation order
    assert_eq!(results.docs, vec![2, 0]);
}

#[test]
fn test_config_file_is_honoured() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[sort]\nsample_ratio = 1\n\n[handlers]\ncache_permission_lookups = false\n",
    )
    .unwrap();

    let (config, _) = open_index_dir(dir.path()).unwrap();
    assert_eq!(config.sort.sample_ratio, 1);
    assert_eq!(config.sort.initial_slot_capacity, 256);
    assert!(!config.handlers.cache_permission_lookups);
}
