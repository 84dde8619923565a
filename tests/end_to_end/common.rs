//! Shared fixtures: a field registry resembling a small issue tracker and
//! helpers to build its index.

use std::sync::Arc;

use fieldex::{
    ClauseHandler, ClauseInformation, ClauseNames, Document, FieldRegistry, IndexReader,
    IssueSearcher, SearchContext, SearchHandler, SearchableField, SearcherGroupType,
    SearcherInformation, SearcherRegistration, Segment, SegmentBuilder, TermQueryFactory,
    Unrestricted, User,
};
use parking_lot::Mutex;

#[derive(Debug)]
pub struct Searcher {
    info: SearcherInformation,
}

impl Searcher {
    pub fn new(id: &str, name: &str, group: Option<SearcherGroupType>) -> Arc<Self> {
        Arc::new(Searcher {
            info: SearcherInformation::new(id, name, group),
        })
    }
}

impl IssueSearcher for Searcher {
    fn information(&self) -> &SearcherInformation {
        &self.info
    }

    fn is_shown(&self, _user: Option<&User>, context: &SearchContext) -> bool {
        // project-scoped searchers only make sense in a single project
        self.info.group_type() != Some(SearcherGroupType::Project) || context.is_single_project()
    }
}

pub struct Field {
    id: String,
    name: String,
    custom: bool,
    handler: SearchHandler,
}

impl SearchableField for Field {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn is_custom(&self) -> bool {
        self.custom
    }
    fn custom_field_type_name(&self) -> Option<&str> {
        self.custom.then_some("Number Field")
    }
    fn create_search_handler(&self) -> Option<SearchHandler> {
        Some(self.handler.clone())
    }
}

/// System field searchable by its id, with a searcher in `group`.
pub fn system_field(id: &str, group: SearcherGroupType) -> Arc<dyn SearchableField> {
    let clause = Arc::new(ClauseHandler::new(
        ClauseInformation::for_field(id, ClauseNames::new(id)),
        Arc::new(Unrestricted),
        Arc::new(TermQueryFactory::new(id)),
    ));
    let registration = SearcherRegistration::new(Searcher::new(id, id, Some(group)), vec![clause]);
    Arc::new(Field {
        id: id.to_string(),
        name: id.to_string(),
        custom: false,
        handler: SearchHandler::new(Some(registration), Vec::new()),
    })
}

/// Custom field `cf[n]`, aliased by its display name, visible to `allowed`.
pub fn custom_field(n: u32, name: &str, allowed: &[&str]) -> Arc<dyn SearchableField> {
    let id = format!("customfield_{n}");
    let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
    let clause = Arc::new(ClauseHandler::new(
        ClauseInformation::for_field(
            id.clone(),
            ClauseNames::with_aliases(format!("cf[{n}]"), [name]),
        ),
        Arc::new(move |user: Option<&User>| {
            user.map_or(false, |u| allowed.iter().any(|a| a == u.name()))
        }),
        Arc::new(TermQueryFactory::new(id.clone())),
    ));
    let registration = SearcherRegistration::new(
        Searcher::new(&id, name, Some(SearcherGroupType::Custom)),
        vec![clause],
    );
    Arc::new(Field {
        id,
        name: name.to_string(),
        custom: true,
        handler: SearchHandler::new(Some(registration), Vec::new()),
    })
}

/// Registry with fixed system fields and swappable custom fields.
pub struct TrackerRegistry {
    pub custom: Mutex<Vec<Arc<dyn SearchableField>>>,
}

impl TrackerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(TrackerRegistry {
            custom: Mutex::new(vec![
                custom_field(10001, "Story Points", &["fred"]),
                custom_field(10002, "Business Value", &["fred", "wilma"]),
            ]),
        })
    }
}

impl FieldRegistry for TrackerRegistry {
    fn system_fields(&self) -> Vec<Arc<dyn SearchableField>> {
        vec![
            system_field("project", SearcherGroupType::Context),
            system_field("component", SearcherGroupType::Project),
            system_field("status", SearcherGroupType::Issue),
            system_field("priority", SearcherGroupType::Issue),
        ]
    }

    fn system_clause_handlers(&self) -> Vec<SearchHandler> {
        Vec::new()
    }

    fn custom_fields(&self) -> Vec<Arc<dyn SearchableField>> {
        self.custom.lock().clone()
    }
}

/// One issue: (status, priority, story points)
pub type Issue<'a> = (&'a str, &'a str, Option<&'a str>);

pub fn build_segment(id: u64, issues: &[Issue<'_>]) -> Segment {
    let mut builder = SegmentBuilder::new(id);
    for (status, priority, points) in issues {
        let mut doc = Document::new()
            .field("project", "HSP")
            .field("status", *status)
            .field("priority", *priority);
        if let Some(points) = points {
            doc.add("customfield_10001", *points);
        }
        builder.add_document(doc);
    }
    builder.build().unwrap()
}

pub fn readers(segments: Vec<Segment>) -> Vec<Arc<dyn IndexReader>> {
    segments
        .into_iter()
        .map(|s| Arc::new(s) as Arc<dyn IndexReader>)
        .collect()
}
