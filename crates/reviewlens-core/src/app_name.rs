//! Display-name derivation from reverse-domain application identifiers.
//!
//! Pure and total: any string resolves to some name without I/O.

use std::sync::LazyLock;

use regex::Regex;

const SEPARATOR: char = '.';

/// Publisher segments that contribute a prefix to the display name.
///
/// Keys are matched against every segment before the trailing one, except
/// a leading TLD-style segment (`com.google.android.youtube` → `google`).
const PUBLISHER_PREFIXES: &[(&str, &str)] = &[
    ("google", "Google"),
    ("spotify", "Spotify"),
    ("microsoft", "Microsoft"),
    ("facebook", "Facebook"),
    ("amazon", "Amazon"),
    ("adobe", "Adobe"),
];

static WORD_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("valid word-break regex"));

/// Resolves an application identifier to a human-readable name.
///
/// ```
/// use reviewlens_core::resolve_app_name;
///
/// assert_eq!(resolve_app_name("com.duolingo"), "Duolingo");
/// assert_eq!(resolve_app_name("com.google.maps"), "Google Maps");
/// assert_eq!(resolve_app_name("simpleapp"), "Simpleapp");
/// ```
#[must_use]
pub fn resolve_app_name(app_id: &str) -> String {
    let Some((publisher_path, trailing)) = app_id.rsplit_once(SEPARATOR) else {
        return capitalize_words(app_id);
    };

    let name = capitalize_words(trailing);
    if name.is_empty() {
        return capitalize_words(app_id);
    }

    let mut publishers: Vec<&str> = publisher_path.split(SEPARATOR).collect();
    if publishers.len() > 1 {
        publishers.remove(0);
    }
    let prefix = publishers
        .iter()
        .find_map(|segment| publisher_prefix(&segment.to_lowercase()));

    match prefix {
        Some(prefix) if !starts_with_word(&name, prefix) => format!("{prefix} {name}"),
        _ => name,
    }
}

/// Whether the first word of `name` is exactly `word`.
fn starts_with_word(name: &str, word: &str) -> bool {
    name.split(' ').next() == Some(word)
}

fn publisher_prefix(publisher: &str) -> Option<&'static str> {
    PUBLISHER_PREFIXES
        .iter()
        .find(|(key, _)| *key == publisher)
        .map(|(_, prefix)| *prefix)
}

/// Splits on runs of non-alphanumeric characters, upper-cases the first
/// character of each word and lower-cases the rest.
fn capitalize_words(raw: &str) -> String {
    WORD_BREAK
        .split(raw)
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
