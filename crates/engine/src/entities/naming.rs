//! Story and component naming: export names to display names, titles to ids.

use std::sync::OnceLock;

use storyframe_domain::{ComponentId, StoryId};

static SANITIZE_PUNCTUATION: OnceLock<regex_lite::Regex> = OnceLock::new();
static SANITIZE_DASHES: OnceLock<regex_lite::Regex> = OnceLock::new();

/// Lower-case a title or name and turn punctuation and spaces into dashes.
pub fn sanitize(value: &str) -> String {
    let punctuation = SANITIZE_PUNCTUATION.get_or_init(|| {
        regex_lite::Regex::new(r#"[\s’–—―′¿'`~!@#$%^&*()_|+\-=?;:",.<>{}\[\]\\/]"#)
            .expect("SANITIZE_PUNCTUATION pattern is invalid")
    });
    let dashes = SANITIZE_DASHES.get_or_init(|| {
        regex_lite::Regex::new(r"-+").expect("SANITIZE_DASHES pattern is invalid")
    });

    let lowered = value.to_lowercase();
    let dashed = punctuation.replace_all(&lowered, "-");
    let collapsed = dashes.replace_all(&dashed, "-");
    collapsed.trim_matches('-').to_string()
}

/// `Component One` + `A` → `component-one--a`.
pub fn to_story_id(kind: &str, name: &str) -> StoryId {
    StoryId::new(format!("{}--{}", sanitize(kind), sanitize(name)))
}

pub fn component_id(title: &str, explicit: Option<&str>) -> ComponentId {
    match explicit {
        Some(id) => ComponentId::new(id),
        None => ComponentId::new(sanitize(title)),
    }
}

/// `primaryButton` → `Primary Button`, `story_2` → `Story 2`.
pub fn story_name_from_export(export_name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    for chunk in export_name.split(|c: char| !c.is_alphanumeric()) {
        split_case_words(chunk, &mut words);
    }
    words
        .into_iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_case_words(chunk: &str, words: &mut Vec<String>) {
    let chars: Vec<char> = chunk.chars().collect();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if let Some(&prev) = i.checked_sub(1).and_then(|p| chars.get(p)) {
            let next = chars.get(i + 1).copied();
            let lower_to_upper = prev.is_lowercase() && c.is_uppercase();
            // `HTMLButton`: the `B` starts a new word
            let acronym_end = prev.is_uppercase()
                && c.is_uppercase()
                && next.is_some_and(|n| n.is_lowercase());
            let digit_edge = prev.is_ascii_digit() != c.is_ascii_digit();
            if lower_to_upper || acronym_end || digit_edge {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
}
