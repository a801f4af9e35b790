use std::collections::BTreeMap;

/// Label used for languages folded out of a chart.
pub const OTHER_LABEL: &str = "Other";

/// Languages ordered by record count, most common first; ties by name.
pub fn ranked_languages(languages: &BTreeMap<String, usize>) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = languages
        .iter()
        .map(|(name, count)| (name.clone(), *count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Fold everything past the first `max_entries - 1` entries into one
/// [`OTHER_LABEL`] entry so the result has at most `max_entries` items.
pub fn fold_tail(ranked: &[(String, usize)], max_entries: usize) -> Vec<(String, usize)> {
    if ranked.len() <= max_entries || max_entries == 0 {
        return ranked.to_vec();
    }

    let keep = max_entries - 1;
    let mut folded = ranked[..keep].to_vec();
    let other: usize = ranked[keep..].iter().map(|(_, count)| *count).sum();
    folded.push((OTHER_LABEL.to_string(), other));
    folded
}
