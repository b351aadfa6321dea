use std::collections::BTreeSet;

/// Split a comma-separated list, trimming entries and dropping empties and
/// duplicates.
pub fn parse_strings(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Like [`parse_strings`], with policy-name rules applied: names are
/// lower-cased, `root` replaces everything else, and `default` is always
/// present otherwise.
pub fn parse_policies(input: &str) -> BTreeSet<String> {
    let mut policies: BTreeSet<String> = input
        .split(',')
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();

    if policies.contains("root") {
        return ["root".to_string()].into();
    }
    policies.insert("default".to_string());
    policies
}
