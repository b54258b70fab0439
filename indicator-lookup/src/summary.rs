use sumologic::MessagePage;

pub const DEFAULT_TAG_CAP: usize = 3;

// Classification key candidates, in priority order.
const CLASSIFICATION_FIELDS: [&str; 3] = ["_source", "_sourceCategory", "_collector"];

/// Reduces a message page to a short ordered list of display tags: a
/// message-count tag, then one tag per first-seen distinct classification
/// key, capped at `cap` with a `+N more` overflow tag. The count tag does
/// not count against the cap. Output is deterministic for a given page.
pub fn summarize(page: &MessagePage, cap: usize) -> Vec<String> {
    let mut tags = vec![format!("Messages: {}", page.messages.len())];

    let mut seen: Vec<&str> = Vec::new();
    for message in &page.messages {
        let Some(key) = CLASSIFICATION_FIELDS
            .iter()
            .find_map(|field| message.map.get(*field).map(String::as_str))
        else {
            continue;
        };
        if !seen.contains(&key) {
            seen.push(key);
        }
    }

    let shown = seen.len().min(cap);
    tags.extend(seen[..shown].iter().map(|key| format!("Source: {key}")));
    if seen.len() > cap {
        tags.push(format!("+{} more", seen.len() - cap));
    }

    tags
}
