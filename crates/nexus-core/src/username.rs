use std::collections::HashSet;

use crate::MAX_NAME_LEN;

/// Longest generated base, leaving room for a numeric suffix under `MAX_NAME_LEN`.
const MAX_BASE_LEN: usize = 40;

/// Lower-cased ASCII alphanumerics of first + last name, e.g. "Ann-Marie", "O'Neil" -> "annmarieoneil".
pub fn username_base(first_name: &str, last_name: &str) -> String {
    let base: String = first_name
        .chars()
        .chain(last_name.chars())
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_BASE_LEN)
        .collect();
    if base.is_empty() {
        "contact".to_string()
    } else {
        base
    }
}

/// Pick `base` if nobody has it, otherwise one past the highest `base{N}` in use.
///
/// The result never exceeds `MAX_NAME_LEN`. When the next suffix would not fit,
/// the lowest unused suffix from 2 up is taken instead.
pub fn next_available_username<'a>(base: &str, taken: impl IntoIterator<Item = &'a str>) -> String {
    let fits = |n: u64| base.len() + n.to_string().len() <= MAX_NAME_LEN;
    let mut base_taken = false;
    let mut used = HashSet::new();
    for name in taken {
        if name == base {
            base_taken = true;
        } else if let Some(n) = name.strip_prefix(base).and_then(|s| s.parse::<u64>().ok()) {
            used.insert(n);
        }
    }
    if !base_taken {
        return base.to_string();
    }

    let highest = used.iter().copied().filter(|&n| fits(n)).max().unwrap_or(1);
    let suffix = highest
        .checked_add(1)
        .filter(|&n| fits(n))
        .unwrap_or_else(|| (2..).find(|n| !used.contains(n)).unwrap_or(2));
    format!("{base}{suffix}")
}
