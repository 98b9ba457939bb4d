use serde::{Deserialize, Serialize};

/// A tag the user can toggle to filter the visible items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterTag {
    pub tag: String,
    pub is_active: bool,
}

impl FilterTag {
    pub fn inactive(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            is_active: false,
        }
    }
}

/// Reconcile the filter state with the current tag universe.
///
/// Entries whose tag is still present keep their position and `is_active`,
/// unseen names are appended inactive, and vanished tags are dropped.
pub fn merge_filter_state(old: &[FilterTag], names: &[String]) -> Vec<FilterTag> {
    let mut merged: Vec<FilterTag> = old
        .iter()
        .filter(|filter| names.contains(&filter.tag))
        .cloned()
        .collect();

    for name in names {
        if !old.iter().any(|filter| &filter.tag == name) {
            merged.push(FilterTag::inactive(name.clone()));
        }
    }
    merged
}

pub fn toggle_by_tag(filters: &mut [FilterTag], tag: &str) {
    for filter in filters.iter_mut().filter(|f| f.tag == tag) {
        filter.is_active = !filter.is_active;
    }
}

pub fn active_tags(filters: &[FilterTag]) -> Vec<&str> {
    filters
        .iter()
        .filter(|f| f.is_active)
        .map(|f| f.tag.as_str())
        .collect()
}
