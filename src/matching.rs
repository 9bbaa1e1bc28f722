use regex::Regex;

use crate::models::LocationFilters;

/// Whole-word, case-insensitive search. Matched keywords come back in their
/// original spelling and input order, each at most once.
pub fn match_keywords(text: &str, keywords: &[String]) -> Vec<String> {
    if text.is_empty() || keywords.is_empty() {
        return Vec::new();
    }

    let text_lower = text.to_lowercase();
    let mut matched: Vec<String> = Vec::new();

    for keyword in keywords {
        if keyword.trim().is_empty() || matched.contains(keyword) {
            continue;
        }
        let pattern = format!(r"\b{}\b", regex::escape(&keyword.to_lowercase()));
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        if re.is_match(&text_lower) {
            matched.push(keyword.clone());
        }
    }

    matched
}

fn contains_pattern(text_lower: &str, pattern: &str) -> bool {
    !pattern.is_empty() && text_lower.contains(&pattern.to_lowercase())
}

/// Include list is an OR gate, exclude list a veto; a job must clear both.
pub fn should_filter_out(text: &str, filters: Option<&LocationFilters>) -> bool {
    let Some(filters) = filters else {
        return false;
    };

    let text_lower = text.to_lowercase();

    if !filters.include.is_empty()
        && !filters.include.iter().any(|p| contains_pattern(&text_lower, p))
    {
        return true;
    }

    if !filters.exclude.is_empty()
        && filters.exclude.iter().any(|p| contains_pattern(&text_lower, p))
    {
        return true;
    }

    false
}

/// Lowercase and merge keyword lists, keeping first-seen order.
pub fn merge_keywords(universal: &[String], company: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for keyword in universal.iter().chain(company) {
        let lower = keyword.trim().to_lowercase();
        if !lower.is_empty() && !merged.contains(&lower) {
            merged.push(lower);
        }
    }
    merged
}
