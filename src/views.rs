//! Derived Views
//!
//! Sorting and filtering are recomputed from the canonical collection on
//! every render. Nothing here mutates or stores the collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::domain::CollectionItem;

/// Fields a record exposes to sorting and filtering
pub trait Listing {
    fn title(&self) -> &str;

    fn rating(&self) -> Option<f32> {
        None
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn category(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Canonical collection order
    #[default]
    Insertion,
    Newest,
    Oldest,
    /// Highest rating first
    Rating,
    Alphabetical,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    /// Case-insensitive exact match on the record's category
    pub category: Option<String>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
}

impl Filter {
    pub fn matches<R: Listing>(&self, record: &R) -> bool {
        if let Some(category) = self.category.as_deref() {
            match record.category() {
                Some(c) if c.eq_ignore_ascii_case(category) => {}
                _ => return false,
            }
        }
        if let Some(search) = self.search.as_deref() {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() && !record.title().to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// Current sort/filter selection of a view
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSpec {
    pub sort: SortOrder,
    pub filter: Filter,
}

impl ViewSpec {
    pub fn sorted(sort: SortOrder) -> Self {
        Self {
            sort,
            ..Default::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.filter.search = Some(search.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.filter.category = Some(category.into());
        self
    }
}

/// Items with a key sort before items without one, whatever the direction
fn keyed<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare<R: Listing>(order: SortOrder, a: &R, b: &R) -> Ordering {
    match order {
        SortOrder::Insertion => Ordering::Equal,
        SortOrder::Newest => keyed(a.created_at(), b.created_at(), |a, b| b.cmp(a)),
        SortOrder::Oldest => keyed(a.created_at(), b.created_at(), |a, b| a.cmp(b)),
        SortOrder::Rating => keyed(a.rating(), b.rating(), |a, b| b.total_cmp(a)),
        SortOrder::Alphabetical => a.title().to_lowercase().cmp(&b.title().to_lowercase()),
    }
}

/// Filter then stable-sort a collection snapshot
pub fn view<'a, R: Listing>(items: &'a [CollectionItem<R>], spec: &ViewSpec) -> Vec<&'a CollectionItem<R>> {
    let mut out: Vec<_> = items.iter().filter(|item| spec.filter.matches(&item.payload)).collect();
    out.sort_by(|a, b| compare(spec.sort, &a.payload, &b.payload));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, PartialEq)]
    struct Film {
        title: &'static str,
        rating: Option<f32>,
        day: Option<u32>,
        genre: &'static str,
    }

    impl Listing for Film {
        fn title(&self) -> &str {
            self.title
        }
        fn rating(&self) -> Option<f32> {
            self.rating
        }
        fn created_at(&self) -> Option<DateTime<Utc>> {
            self.day.map(|d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap())
        }
        fn category(&self) -> Option<&str> {
            Some(self.genre)
        }
    }

    fn films() -> Vec<CollectionItem<Film>> {
        let raw = [
            ("Magadheera", Some(4.5), Some(3), "Action"),
            ("baahubali", None, Some(1), "Epic"),
            ("Arjun Reddy", Some(3.0), None, "Drama"),
            ("Eega", Some(4.5), Some(2), "Fantasy"),
        ];
        raw.into_iter()
            .enumerate()
            .map(|(i, (title, rating, day, genre))| CollectionItem {
                id: i.to_string().as_str().into(),
                payload: Film { title, rating, day, genre },
            })
            .collect()
    }

    fn titles(items: &[&CollectionItem<Film>]) -> Vec<&'static str> {
        items.iter().map(|i| i.payload.title).collect()
    }

    #[test]
    fn test_insertion_order_is_canonical() {
        let items = films();
        let out = view(&items, &ViewSpec::default());
        assert_eq!(titles(&out), vec!["Magadheera", "baahubali", "Arjun Reddy", "Eega"]);
    }

    #[test]
    fn test_rating_sort_is_stable_and_puts_unrated_last() {
        let items = films();
        let out = view(&items, &ViewSpec::sorted(SortOrder::Rating));
        assert_eq!(titles(&out), vec!["Magadheera", "Eega", "Arjun Reddy", "baahubali"]);
    }

    #[test]
    fn test_recency_sorts() {
        let items = films();
        let newest = view(&items, &ViewSpec::sorted(SortOrder::Newest));
        assert_eq!(titles(&newest), vec!["Magadheera", "Eega", "baahubali", "Arjun Reddy"]);
        let oldest = view(&items, &ViewSpec::sorted(SortOrder::Oldest));
        assert_eq!(titles(&oldest), vec!["baahubali", "Eega", "Magadheera", "Arjun Reddy"]);
    }

    #[test]
    fn test_alphabetical_ignores_case() {
        let items = films();
        let out = view(&items, &ViewSpec::sorted(SortOrder::Alphabetical));
        assert_eq!(titles(&out), vec!["Arjun Reddy", "baahubali", "Eega", "Magadheera"]);
    }

    #[test]
    fn test_filters() {
        let items = films();
        let out = view(&items, &ViewSpec::default().with_search("REDD"));
        assert_eq!(titles(&out), vec!["Arjun Reddy"]);
        let out = view(&items, &ViewSpec::default().with_category("epic"));
        assert_eq!(titles(&out), vec!["baahubali"]);
        let out = view(&items, &ViewSpec::default().with_search("   "));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_sort_is_pure() {
        let items = films();
        let before = items.clone();
        let spec = ViewSpec::sorted(SortOrder::Alphabetical).with_search("a");
        let first: Vec<_> = view(&items, &spec).into_iter().cloned().collect();
        let second: Vec<_> = view(&items, &spec).into_iter().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(items, before);
    }
}
