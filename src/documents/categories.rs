//! Category derivation: groups documents by location for the tab bar.
//!
//! Categories are recomputed from scratch every time the document set is
//! replaced. They are never stored.

use super::types::Document;
use std::borrow::Borrow;
use std::collections::HashMap;

/// Known locations, in the order they are shown.
pub const PREFERRED_ORDER: [&str; 5] = ["new", "later", "archive", "feed", "shortlist"];

/// A counted, display-ready projection of one document location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Raw location tag used for filtering.
    pub location: String,
    /// Human-facing label.
    pub name: String,
    /// Number of valid documents at this location. Always > 0.
    pub count: usize,
}

/// Display label for a location tag.
///
/// Known locations get an emoji label; anything else is title-cased.
pub fn display_name(location: &str) -> String {
    match location {
        "new" => "📥 New".to_string(),
        "later" => "🕐 Later".to_string(),
        "archive" => "📦 Archive".to_string(),
        "feed" => "📰 Feed".to_string(),
        "shortlist" => "⭐ Shortlist".to_string(),
        "" => "📄 Other".to_string(),
        other => title_case(other),
    }
}

/// Uppercase the first letter of each word, lowercase the rest.
///
/// Words follow Unicode word-break rules closely enough for location tags:
/// underscores join words, and an apostrophe or period between letters
/// (`don't`, `v1.2`) does not split one. Anything else is a boundary.
fn title_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for (i, &c) in chars.iter().enumerate() {
        let joins = in_word
            && (c == '_'
                || (matches!(c, '\'' | '.')
                    && chars.get(i + 1).is_some_and(|n| n.is_alphanumeric())));
        if c.is_alphanumeric() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = joins;
        }
    }
    out
}

/// Build the ordered category list for a document set.
///
/// Blank-title documents are skipped. Known locations come first in
/// [`PREFERRED_ORDER`], followed by unknown locations in the order they are
/// first encountered.
pub fn build_categories<D: Borrow<Document>>(documents: &[D]) -> Vec<Category> {
    // first-seen order of every location, plus counts keyed by position
    let mut seen: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in documents {
        let doc: &Document = item.borrow();
        if !doc.is_valid() {
            continue;
        }
        let location = doc.location.as_str();
        match index.get(location) {
            Some(&i) => seen[i].1 += 1,
            None => {
                index.insert(location, seen.len());
                seen.push((location, 1));
            }
        }
    }

    let known = PREFERRED_ORDER
        .iter()
        .filter_map(|loc| index.get(loc).map(|&i| seen[i]));
    let unknown = seen
        .iter()
        .copied()
        .filter(|(loc, _)| !PREFERRED_ORDER.contains(loc));

    let categories: Vec<Category> = known
        .chain(unknown)
        .filter(|(_, count)| *count > 0)
        .map(|(location, count)| Category {
            location: location.to_string(),
            name: display_name(location),
            count,
        })
        .collect();

    tracing::debug!(categories = categories.len(), "Built document categories");
    categories
}

/// Documents whose location equals `location`, in their original order.
pub fn filter_by_location<D>(documents: &[D], location: &str) -> Vec<D>
where
    D: Borrow<Document> + Clone,
{
    documents
        .iter()
        .filter(|item| {
            let doc: &Document = (*item).borrow();
            doc.location == location
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn doc(title: &str, location: &str) -> Document {
        Document {
            id: format!("{}-{}", location, title),
            title: title.to_string(),
            location: location.to_string(),
            ..Default::default()
        }
    }

    fn locations(categories: &[Category]) -> Vec<&str> {
        categories.iter().map(|c| c.location.as_str()).collect()
    }

    #[test]
    fn test_empty_set_has_no_categories() {
        let docs: Vec<Document> = Vec::new();
        assert!(build_categories(&docs).is_empty());
    }

    #[test]
    fn test_preferred_order_then_first_seen() {
        let docs = vec![
            doc("a", "zeta"),
            doc("b", "archive"),
            doc("c", "alpha"),
            doc("d", "new"),
            doc("e", "zeta"),
            doc("f", "feed"),
        ];
        let cats = build_categories(&docs);
        assert_eq!(locations(&cats), vec!["new", "archive", "feed", "zeta", "alpha"]);
        assert_eq!(cats[3].count, 2);
    }

    #[test]
    fn test_blank_titles_not_counted() {
        let docs = vec![doc("a", "new"), doc("  ", "new"), doc("", "later")];
        let cats = build_categories(&docs);
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].location, "new");
        assert_eq!(cats[0].count, 1);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(display_name("new"), "📥 New");
        assert_eq!(display_name("shortlist"), "⭐ Shortlist");
        assert_eq!(display_name("reading_list"), "Reading_list");
        assert_eq!(display_name("to-read"), "To-Read");
        assert_eq!(display_name("don't.skip it"), "Don't.skip It");
        assert_eq!(display_name("v2 pile"), "V2 Pile");
        assert_eq!(display_name("SOMEDAY maybe"), "Someday Maybe");
        assert_eq!(display_name(""), "📄 Other");
    }

    #[test]
    fn test_filter_by_location_keeps_order() {
        let docs = vec![doc("1", "new"), doc("2", "later"), doc("3", "new")];
        let filtered = filter_by_location(&docs, "new");
        let titles: Vec<&str> = filtered.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["1", "3"]);
    }

    #[test]
    fn test_works_with_arc_documents() {
        let docs: Vec<std::sync::Arc<Document>> = vec![
            std::sync::Arc::new(doc("1", "feed")),
            std::sync::Arc::new(doc("2", "feed")),
        ];
        let cats = build_categories(&docs);
        assert_eq!(cats[0].count, 2);
        assert_eq!(filter_by_location(&docs, "feed").len(), 2);
    }

    fn arb_location() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("new".to_string()),
            Just("later".to_string()),
            Just("archive".to_string()),
            Just("feed".to_string()),
            Just("shortlist".to_string()),
            "[a-z]{1,6}",
        ]
    }

    fn arb_docs() -> impl Strategy<Value = Vec<Document>> {
        prop::collection::vec(("[ a-z]{0,5}", arb_location()), 0..40).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(title, location)| doc(&title, &location))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_counts_positive_and_sum_to_valid(docs in arb_docs()) {
            let cats = build_categories(&docs);
            let valid = docs.iter().filter(|d| d.is_valid()).count();
            prop_assert!(cats.iter().all(|c| c.count > 0));
            prop_assert_eq!(cats.iter().map(|c| c.count).sum::<usize>(), valid);
        }

        #[test]
        fn prop_no_duplicate_locations(docs in arb_docs()) {
            let cats = build_categories(&docs);
            let mut locs = locations(&cats);
            locs.sort_unstable();
            locs.dedup();
            prop_assert_eq!(locs.len(), cats.len());
        }

        #[test]
        fn prop_known_order_is_permutation_invariant(docs in arb_docs()) {
            let mut reversed = docs.clone();
            reversed.reverse();

            let known = |cats: Vec<Category>| -> Vec<(String, usize)> {
                cats.into_iter()
                    .filter(|c| PREFERRED_ORDER.contains(&c.location.as_str()))
                    .map(|c| (c.location, c.count))
                    .collect()
            };
            prop_assert_eq!(known(build_categories(&docs)), known(build_categories(&reversed)));
        }

        #[test]
        fn prop_same_input_same_output(docs in arb_docs()) {
            prop_assert_eq!(build_categories(&docs), build_categories(&docs));
        }
    }
}
