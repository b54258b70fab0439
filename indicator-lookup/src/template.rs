use std::sync::OnceLock;

use regex::{NoExpand, Regex};

use crate::Entity;

/// Placeholder token substituted with the entity value.
pub const QUERY_PLACEHOLDER: &str = "{{entity}}";

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\{\{entity\}\}").expect("placeholder pattern is valid"))
}

/// Replaces every occurrence of [`QUERY_PLACEHOLDER`] in the template with
/// the entity value, case-insensitively, in one pass. The value is inserted
/// literally.
pub fn bind_query(template: &str, entity: &Entity) -> String {
    placeholder()
        .replace_all(template, NoExpand(&entity.value))
        .into_owned()
}

pub(crate) fn contains_placeholder(template: &str) -> bool {
    placeholder().is_match(template)
}
