// Small text helpers shared by anything that renders repositories
use chrono::{DateTime, Utc};

/// `mod-eluna_scripts` -> `Mod Eluna Scripts`
pub fn display_name(name: &str) -> String {
    name.replace(['-', '_'], " ")
        .split(' ')
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

/// `Jan 5, 2025`
pub fn short_date(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// How old a cache entry is, in words
pub fn freshness_label(cached_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - cached_at).num_hours();

    if hours < 1 {
        "a few minutes ago".to_string()
    } else if hours < 24 {
        format!("{} hour{} ago", hours, plural(hours))
    } else {
        let days = hours / 24;
        format!("{} day{} ago", days, plural(days))
    }
}

fn plural(n: i64) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}
