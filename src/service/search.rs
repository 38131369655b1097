//! Keyword search over ticket titles and descriptions.
//!
//! A query is a list of terms joined by `AND` and `OR`, with `OR` binding
//! loosest: `printer AND toner OR scanner` finds tickets mentioning both
//! "printer" and "toner", plus those mentioning "scanner". Words between
//! keywords form a single phrase. Matching ignores case.

use crate::{
    db::{self, ticket::Filter, Store, Ticket},
    permission::Actor,
    scope::SubScope,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Query {
    /// Alternatives, each a set of lowercase phrases that must all occur.
    groups: Vec<Vec<String>>,
}

impl Query {
    /// `None` when there is nothing to search for.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut groups = Vec::new();
        let mut terms = Vec::new();
        let mut phrase = Vec::new();

        fn end_phrase(phrase: &mut Vec<&str>, terms: &mut Vec<String>) {
            if !phrase.is_empty() {
                terms.push(phrase.join(" ").to_lowercase());
                phrase.clear();
            }
        }

        for word in raw.split_whitespace() {
            if word.eq_ignore_ascii_case("or") {
                end_phrase(&mut phrase, &mut terms);
                if !terms.is_empty() {
                    groups.push(std::mem::take(&mut terms));
                }
            } else if word.eq_ignore_ascii_case("and") {
                end_phrase(&mut phrase, &mut terms);
            } else {
                phrase.push(word);
            }
        }
        end_phrase(&mut phrase, &mut terms);
        if !terms.is_empty() {
            groups.push(terms);
        }

        (!groups.is_empty()).then_some(Self { groups })
    }

    pub fn into_filter(self, filter: Filter) -> Filter {
        filter.with_keywords(self.groups)
    }
}

/// Searches within the actor's scope, newest first. For the service desk
/// "my" tickets also cover everything they handled before.
pub async fn search(
    store: &dyn Store,
    actor: &Actor,
    raw: &str,
    sub: SubScope,
) -> Result<Vec<Ticket>, db::Error> {
    let Some(query) = Query::parse(raw) else {
        return Ok(Vec::new());
    };
    let filter =
        query.into_filter(Filter::new(actor.scope(sub).including_history()));
    store.find_tickets(&filter).await
}
