//! Canonical short form of a person's name, used to compare players across sites

/// Reduce a full name to `"Surname I.O."`.
///
/// The first token is kept verbatim as the surname; every following token
/// contributes its first character and a dot. `ё` folds to `е` before
/// splitting, so both sites spell the same person identically. Blank input
/// yields an empty string and a single token is returned alone.
pub fn normalize_name(full_name: &str) -> String {
    let folded: String = full_name
        .chars()
        .map(|c| match c {
            'ё' => 'е',
            'Ё' => 'Е',
            other => other,
        })
        .collect();

    let mut parts = folded.split_whitespace();
    let surname = match parts.next() {
        Some(s) => s,
        None => return String::new(),
    };

    let initials: String = parts
        .filter_map(|p| p.chars().next())
        .map(|c| format!("{}.", c))
        .collect();

    if initials.is_empty() {
        surname.to_string()
    } else {
        format!("{} {}", surname, initials)
    }
}

/// Same as [`normalize_name`] for an optional name, treating `None` as blank
pub fn normalize_opt(full_name: Option<&str>) -> String {
    full_name.map(normalize_name).unwrap_or_default()
}
