//! Searching with permissions, aliases and sorts.

use std::sync::Arc;

use fieldex::{
    collect_matches, term_values_for_field, AllValuesHandler, Clause, Error, FieldexConfig,
    Operator, Query, SearchHandlerManager, SearchService, SegmentedIndex, SortField, SortKind,
    User,
};

use crate::common::{build_segment, readers, TrackerRegistry};

fn service() -> SearchService {
    let first = build_segment(
        1,
        &[
            ("Open", "Major", Some("5")),
            ("Closed", "Minor", None),
            ("Open", "Blocker", Some("13")),
        ],
    );
    let second = build_segment(2, &[("In Progress", "Major", Some("3")), ("Open", "Minor", Some("8"))]);
    SearchService::new(
        Arc::new(SearchHandlerManager::new(TrackerRegistry::new())),
        SegmentedIndex::new(readers(vec![first, second])).unwrap(),
        FieldexConfig::default(),
    )
    .unwrap()
}

#[test]
fn test_status_scenario() {
    let segment = build_segment(1, &[("Open", "Major", None), ("Closed", "Major", None), ("Open", "Minor", None)]);
    assert_eq!(term_values_for_field(&segment, "status").unwrap(), vec!["Closed", "Open"]);

    let mut handler = AllValuesHandler::new(3);
    collect_matches(&segment, "status", &mut handler).unwrap();
    assert_eq!(handler.promotions(), 0);
    let results = handler.into_results();
    let open0 = results[0].as_ref().unwrap().shared().unwrap();
    let open2 = results[2].as_ref().unwrap().shared().unwrap();
    assert!(Arc::ptr_eq(open0, open2));
    assert_eq!(results[1].as_ref().unwrap().as_slice(), ["Closed".to_string()]);
}

#[test]
fn test_clause_names_are_case_insensitive() {
    let s = service();
    let query = Query::all().and(Clause::new("STATUS", Operator::In, ["Open", "In Progress"]));
    let results = s.search(None, &query, None, 10).unwrap();
    assert_eq!(results.docs, vec![0, 2, 3, 4]);
}

#[test]
fn test_custom_field_requires_permission() {
    let s = service();
    let query = Query::all().and(Clause::is_empty("story points"));

    assert!(matches!(s.search(None, &query, None, 10), Err(Error::UnknownClause(_))));
    let barney = User::new("barney");
    assert!(matches!(
        s.search(Some(&barney), &query, None, 10),
        Err(Error::UnknownClause(_))
    ));

    let fred = User::new("fred");
    assert_eq!(s.search(Some(&fred), &query, None, 10).unwrap().docs, vec![1]);

    // the cf[n] name reaches the same handler
    let query = Query::all().and(Clause::new("cf[10001]", Operator::Equals, ["13"]));
    assert_eq!(s.search(Some(&fred), &query, None, 10).unwrap().docs, vec![2]);
}

#[test]
fn test_sorted_across_segments() {
    let s = service();
    let fred = User::new("fred");
    let sort = SortField::descending("customfield_10001", SortKind::Number);
    let results = s.search(Some(&fred), &Query::all(), Some(&sort), 10).unwrap();
    // the issue without story points sorts last
    assert_eq!(results.docs, vec![2, 4, 0, 3, 1]);
    assert_eq!(results.total_hits, 5);

    let sort = SortField::ascending("priority", SortKind::Text);
    let query = Query::all().and(Clause::new("status", Operator::Equals, ["Open"]));
    let results = s.search(None, &query, Some(&sort), 2).unwrap();
    assert_eq!(results.docs, vec![2, 0]);
    assert_eq!(results.total_hits, 3);
}

#[test]
fn test_conjunction_of_clauses() {
    let s = service();
    let query = Query::all()
        .and(Clause::new("status", Operator::Equals, ["Open"]))
        .and(Clause::new("priority", Operator::In, ["Minor", "Major"]));
    assert_eq!(s.search(None, &query, None, 10).unwrap().docs, vec![0, 4]);

    let query = query.and(Clause::new("priority", Operator::Equals, ["Trivial"]));
    let results = s.search(None, &query, None, 10).unwrap();
    assert!(results.docs.is_empty());
    assert_eq!(results.total_hits, 0);
}
