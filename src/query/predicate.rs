//! Predicate compiler.
//!
//! Criteria are compiled through an ordered rule table. Each [`Rule`] pairs an
//! "is this filter set" test with the clause it contributes; only rules whose test
//! passes end up in the [`Predicate`], and the surviving clauses are ANDed.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{ContentQuery, FilterState, Listable, StatusFlag};

/// One optional filter of a content type.
pub struct Rule<Q: ContentQuery> {
    pub name: &'static str,
    pub is_set: fn(&Q) -> bool,
    pub clause: fn(&Q, &Q::Record) -> bool,
}

impl<Q: ContentQuery> Rule<Q> {
    pub fn new(
        name: &'static str,
        is_set: fn(&Q) -> bool,
        clause: fn(&Q, &Q::Record) -> bool,
    ) -> Self {
        Self {
            name,
            is_set,
            clause,
        }
    }
}

type Clause<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

/// A compiled conjunctive record filter.
pub struct Predicate<R> {
    clauses: Vec<(&'static str, Clause<R>)>,
}

impl<R> Predicate<R> {
    pub fn matches(&self, record: &R) -> bool {
        self.clauses.iter().all(|(_, clause)| clause(record))
    }

    /// Names of the filters that contributed a clause, in evaluation order.
    pub fn active_filters(&self) -> Vec<&'static str> {
        self.clauses.iter().map(|(name, _)| *name).collect()
    }

    /// True when no filter is active and every record passes.
    pub fn is_identity(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Compile `query` against the current time.
pub fn compile<Q: ContentQuery>(query: &Q) -> Predicate<Q::Record> {
    compile_at(query, Utc::now())
}

/// Compile `query`, resolving named date ranges against `now`.
pub fn compile_at<Q: ContentQuery>(query: &Q, now: DateTime<Utc>) -> Predicate<Q::Record> {
    let mut normalized = query.normalized();
    normalized.base_mut().resolve_dates(now);

    let rules = if normalized.base().is_lookup() {
        vec![Rule::new("id", |_| true, id_clause::<Q>)]
    } else {
        let mut rules = identity_rules::<Q>();
        if normalized.base().advance_filter {
            rules.extend(filter_rules::<Q>());
            rules.extend(Q::rules());
        }
        rules
    };

    let query = Arc::new(normalized);
    let clauses = rules
        .into_iter()
        .filter(|rule| (rule.is_set)(&query))
        .map(|rule| {
            let query = Arc::clone(&query);
            let clause = rule.clause;
            let boxed: Clause<Q::Record> = Box::new(move |record| clause(&query, record));
            (rule.name, boxed)
        })
        .collect();

    Predicate { clauses }
}

/// Filters applied even for lightweight (non-advanced) loads.
fn identity_rules<Q: ContentQuery>() -> Vec<Rule<Q>> {
    vec![
        Rule::new("slug", |q| !q.base().slug.is_empty(), slug_clause::<Q>),
        Rule::new(
            "slugStartedWith",
            |q| !q.base().slug_started_with.is_empty(),
            slug_prefix_clause::<Q>,
        ),
    ]
}

/// Optional filters shared by every content type.
fn filter_rules<Q: ContentQuery>() -> Vec<Rule<Q>> {
    vec![
        Rule::new("isEnabled", |q| q.base().is_enabled.is_set(), |q, r| {
            status_matches(r.status(StatusFlag::Enabled), q.base().is_enabled)
        }),
        Rule::new("isApproved", |q| q.base().is_approved.is_set(), |q, r| {
            status_matches(r.status(StatusFlag::Approved), q.base().is_approved)
        }),
        Rule::new("isDraft", |q| q.base().is_draft.is_set(), |q, r| {
            status_matches(r.status(StatusFlag::Draft), q.base().is_draft)
        }),
        Rule::new("isArchived", |q| q.base().is_archived.is_set(), |q, r| {
            status_matches(r.status(StatusFlag::Archived), q.base().is_archived)
        }),
        Rule::new(
            "dateRange",
            |q| q.base().start_date.is_some() || q.base().end_date.is_some(),
            date_clause::<Q>,
        ),
        Rule::new("term", |q| !q.base().term.is_empty(), term_clause::<Q>),
    ]
}

fn id_clause<Q: ContentQuery>(query: &Q, record: &Q::Record) -> bool {
    record.id() == query.base().id
}

fn slug_clause<Q: ContentQuery>(query: &Q, record: &Q::Record) -> bool {
    record.slug().eq_ignore_ascii_case(&query.base().slug)
}

fn slug_prefix_clause<Q: ContentQuery>(query: &Q, record: &Q::Record) -> bool {
    record
        .slug()
        .to_lowercase()
        .starts_with(&query.base().slug_started_with.to_lowercase())
}

fn date_clause<Q: ContentQuery>(query: &Q, record: &Q::Record) -> bool {
    let created = record.created_at();
    let base = query.base();
    base.start_date.map_or(true, |start| created >= start)
        && base.end_date.map_or(true, |end| created < end)
}

fn term_clause<Q: ContentQuery>(query: &Q, record: &Q::Record) -> bool {
    contains_term(&record.search_columns(), &query.base().term)
}

/// A content type without the flag is not constrained by it.
fn status_matches(value: Option<bool>, filter: FilterState) -> bool {
    match (value, filter.wanted()) {
        (Some(value), Some(wanted)) => value == wanted,
        _ => true,
    }
}

/// Case-insensitive substring match of an already lower-cased `term` across columns.
pub fn contains_term(columns: &[&str], term: &str) -> bool {
    columns
        .iter()
        .any(|column| column.to_lowercase().contains(term))
}
