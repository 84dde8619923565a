//! Search handler manager behaviour across refreshes, events and threads.

use std::sync::Arc;
use std::thread;

use fieldex_core::{
    ClauseHandler, ClauseInformation, ClauseNames, ClausePermissionHandler, FieldRegistry,
    SearchHandler, SearchableField, TermQueryFactory, User,
};
use fieldex_handlers::{CacheEvent, CacheEventBus, ModuleKind, SearchHandlerManager};
use parking_lot::Mutex;
use proptest::prelude::*;

struct CustomField {
    id: String,
    handler: SearchHandler,
}

impl SearchableField for CustomField {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.id
    }
    fn is_custom(&self) -> bool {
        true
    }
    fn custom_field_type_name(&self) -> Option<&str> {
        Some("Select List")
    }
    fn create_search_handler(&self) -> Option<SearchHandler> {
        Some(self.handler.clone())
    }
}

/// Registry whose custom fields can be swapped at runtime.
#[derive(Default)]
struct PluginRegistry {
    custom: Mutex<Vec<Arc<dyn SearchableField>>>,
}

impl FieldRegistry for PluginRegistry {
    fn system_fields(&self) -> Vec<Arc<dyn SearchableField>> {
        Vec::new()
    }
    fn system_clause_handlers(&self) -> Vec<SearchHandler> {
        Vec::new()
    }
    fn custom_fields(&self) -> Vec<Arc<dyn SearchableField>> {
        self.custom.lock().clone()
    }
}

/// Permission granted to users whose name is in the allow list.
struct AllowList(Vec<String>);

impl ClausePermissionHandler for AllowList {
    fn has_permission(&self, user: Option<&User>) -> bool {
        user.map_or(false, |u| self.0.iter().any(|n| n == u.name()))
    }
}

fn custom_field(id: &str, clause: &str, allowed: Vec<String>) -> Arc<dyn SearchableField> {
    let handler = Arc::new(ClauseHandler::new(
        ClauseInformation::for_field(id, ClauseNames::new(clause)),
        Arc::new(AllowList(allowed)),
        Arc::new(TermQueryFactory::new(id)),
    ));
    Arc::new(CustomField {
        id: id.to_string(),
        handler: SearchHandler::clauses_only(vec![handler]),
    })
}

#[test]
fn test_refresh_after_module_disabled() {
    let registry = Arc::new(PluginRegistry::default());
    registry
        .custom
        .lock()
        .push(custom_field("customfield_1", "foo", vec!["fred".into()]));

    let manager = Arc::new(SearchHandlerManager::new(registry.clone()));
    let bus = CacheEventBus::new();
    bus.subscribe(manager.clone());

    let fred = User::new("fred");
    assert!(!manager.clause_handlers_for(Some(&fred), "foo").is_empty());
    assert!(manager.clause_handlers_for(None, "foo").is_empty());
    assert_eq!(manager.clause_handlers("foo").len(), 1);

    registry.custom.lock().clear();
    bus.publish(&CacheEvent::ModuleDisabled(ModuleKind::CustomFieldSearcher));

    assert!(manager.clause_handlers_for(Some(&fred), "foo").is_empty());
    assert!(manager.clause_handlers("foo").is_empty());
}

#[test]
fn test_concurrent_reads_during_refresh() {
    let registry = Arc::new(PluginRegistry::default());
    {
        let mut custom = registry.custom.lock();
        custom.push(custom_field("customfield_1", "size", vec![]));
        custom.push(custom_field("customfield_2", "size", vec![]));
    }
    let manager = Arc::new(SearchHandlerManager::new(registry));

    let mut handles = Vec::new();
    for t in 0..8 {
        let manager = Arc::clone(&manager);
        handles.push(thread::spawn(move || {
            for i in 0..200 {
                if t == 0 && i % 10 == 0 {
                    manager.refresh();
                }
                // every observed snapshot is complete
                assert_eq!(manager.clause_handlers("size").len(), 2);
                assert_eq!(manager.field_ids("SIZE").len(), 2);
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
}

proptest! {
    #[test]
    fn test_permission_filter_is_subset(
        allow in prop::collection::vec(prop::collection::vec("[a-c]", 0..3), 1..5),
        user in prop::option::of("[a-c]"),
    ) {
        let registry = Arc::new(PluginRegistry::default());
        {
            let mut custom = registry.custom.lock();
            for (i, names) in allow.iter().enumerate() {
                custom.push(custom_field(&format!("customfield_{i}"), "shared", names.clone()));
            }
        }
        let manager = SearchHandlerManager::new(registry);
        let user = user.map(User::new);

        let all = manager.clause_handlers("shared");
        let visible = manager.clause_handlers_for(user.as_ref(), "shared");
        prop_assert!(visible.iter().all(|v| all.iter().any(|a| Arc::ptr_eq(a, v))));

        let passes_all = all.iter().all(|h| h.has_permission(user.as_ref()));
        prop_assert_eq!(visible.len() == all.len(), passes_all);
    }
}
