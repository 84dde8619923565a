//! Handler manager behaviour as seen by the search service.

use std::sync::Arc;

use fieldex::{
    CacheEvent, CacheEventBus, Clause, Error, FieldexConfig, ModuleKind, Operator, Query,
    SearchContext, SearchHandlerManager, SearchService, SearcherGroupType, SegmentedIndex, User,
};

use crate::common::{build_segment, custom_field, readers, TrackerRegistry};

#[test]
fn test_searcher_groups_in_display_order() {
    let manager = SearchHandlerManager::new(TrackerRegistry::new());
    let groups = manager.searcher_groups();
    let types: Vec<SearcherGroupType> = groups.iter().map(|g| g.group_type()).collect();
    assert_eq!(types, SearcherGroupType::ALL.to_vec());

    let issue = groups
        .iter()
        .find(|g| g.group_type() == SearcherGroupType::Issue)
        .unwrap();
    let ids: Vec<&str> = issue.searchers().iter().map(|s| s.information().id()).collect();
    assert_eq!(ids, vec!["status", "priority"]);

    // custom searchers are ordered by display name
    let custom = groups
        .iter()
        .find(|g| g.group_type() == SearcherGroupType::Custom)
        .unwrap();
    let names: Vec<&str> = custom.searchers().iter().map(|s| s.information().name()).collect();
    assert_eq!(names, vec!["Business Value", "Story Points"]);
}

#[test]
fn test_searchers_filtered_by_context() {
    let manager = SearchHandlerManager::new(TrackerRegistry::new());
    let shown = |ctx: &SearchContext| {
        manager
            .searchers(None, ctx)
            .iter()
            .any(|s| s.information().id() == "component")
    };
    assert!(!shown(&SearchContext::global()));
    assert!(shown(&SearchContext::new([10000], Vec::new())));

    let by_clause = manager.searchers_by_clause_name(None, "Status");
    assert_eq!(by_clause.len(), 1);
    assert!(manager.searcher("customfield_10002").is_some());
}

#[test]
fn test_plugin_lifecycle_refreshes_search() {
    let registry = TrackerRegistry::new();
    let manager = Arc::new(SearchHandlerManager::new(registry.clone()));
    let bus = CacheEventBus::new();
    bus.subscribe(manager.clone());

    let service = SearchService::new(
        Arc::clone(&manager),
        SegmentedIndex::new(readers(vec![build_segment(1, &[("Open", "Major", None)])])).unwrap(),
        FieldexConfig::default(),
    )
    .unwrap();

    let wilma = User::new("wilma");
    let query = Query::all().and(Clause::is_empty("Business Value"));
    assert_eq!(service.search(Some(&wilma), &query, None, 10).unwrap().docs, vec![0]);

    registry.custom.lock().retain(|f| f.id() != "customfield_10002");
    // unrelated modules leave the snapshot alone
    bus.publish(&CacheEvent::ModuleDisabled(ModuleKind::JqlFunction));
    assert!(service.search(Some(&wilma), &query, None, 10).is_ok());

    bus.publish(&CacheEvent::ModuleDisabled(ModuleKind::CustomFieldSearcher));
    assert!(matches!(
        service.search(Some(&wilma), &query, None, 10),
        Err(Error::UnknownClause(_))
    ));

    registry.custom.lock().push(custom_field(10002, "Business Value", &["wilma"]));
    bus.publish(&CacheEvent::ClearCache);
    assert!(service.search(Some(&wilma), &query, None, 10).is_ok());
}

#[test]
fn test_visible_clause_names_follow_permissions() {
    let manager = SearchHandlerManager::new(TrackerRegistry::new());
    let fred = User::new("fred");

    let anonymous = manager.visible_clause_names(None);
    let for_fred = manager.visible_clause_names(Some(&fred));
    assert!(anonymous.iter().all(|n| for_fred.contains(n)));
    assert!(for_fred.iter().any(|n| n.contains("story points")));
    assert!(!anonymous.iter().any(|n| n.contains("story points")));

    assert_eq!(manager.field_ids_for(Some(&fred), "cf[10001]"), vec!["customfield_10001"]);
    assert!(manager.field_ids_for(None, "cf[10001]").is_empty());
}
