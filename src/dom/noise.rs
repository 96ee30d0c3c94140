//! Framework-generated identifier detection
//!
//! UI frameworks mint ids and class names at runtime (auto-incrementing component ids,
//! hashed CSS-module classes). Those tokens change between builds and must never become a
//! primary selector. Anything not matched here is treated as potentially stable.

use regex::Regex;
use std::sync::LazyLock;

/// Id shapes produced by component frameworks and CSS-in-JS libraries
static FRAMEWORK_ID_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"^ember\d+$").unwrap(), "Ember view id"),
        (Regex::new(r"^:r[0-9a-z]+:$").unwrap(), "React useId"),
        (Regex::new(r"^react-select-\d+").unwrap(), "react-select instance"),
        (Regex::new(r"^(?:mui|mat-[a-z-]+|cdk-[a-z-]+)-\d+$").unwrap(), "component library auto id"),
        (Regex::new(r"^(?:headlessui|radix)-[\w-]*?\d+$").unwrap(), "headless component id"),
        (
            Regex::new(r"^(?i:component|comp|cmp|el|vue|ng|ext|ext-comp|gwt|yui|j_id|uid|id)[-_]?\d+$").unwrap(),
            "numeric component id",
        ),
        (Regex::new(r"^(?:css|sc|jsx|svelte|emotion)-[0-9a-z]{4,}$").unwrap(), "CSS-in-JS hash"),
        (Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-").unwrap(), "UUID"),
        (Regex::new(r"[_-]\d{10,}$").unwrap(), "timestamp suffix"),
        (Regex::new(r"^[A-Za-z]+\d{5,}$").unwrap(), "random number suffix"),
        (Regex::new(r"^generated[_-]").unwrap(), "explicit generated prefix"),
    ]
});

/// Class shapes produced by CSS modules and CSS-in-JS libraries
static FRAMEWORK_CLASS_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"^css-[0-9a-z]{4,}(?:-[A-Za-z]+)?$").unwrap(), "emotion hash"),
        (Regex::new(r"^sc-[A-Za-z0-9]+$").unwrap(), "styled-components hash"),
        (Regex::new(r"^jsx-\d+$").unwrap(), "styled-jsx scope"),
        (Regex::new(r"^svelte-[0-9a-z]{4,}$").unwrap(), "svelte scope"),
        (Regex::new(r"^[A-Za-z]+(?:_[A-Za-z0-9]+)?__[A-Za-z0-9-]*\d[A-Za-z0-9-]*$").unwrap(), "CSS module hash"),
        (Regex::new(r"^ng-(?:touched|untouched|dirty|pristine|valid|invalid|pending|star-inserted)$").unwrap(), "Angular state class"),
        (Regex::new(r"^_[A-Za-z0-9]*\d[A-Za-z0-9]*$").unwrap(), "underscore hash"),
    ]
});

/// Returns the matching pattern description when `id` looks framework generated
pub fn framework_id_kind(id: &str) -> Option<&'static str> {
    FRAMEWORK_ID_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(id))
        .map(|(_, kind)| *kind)
}

/// Check whether an id was minted by a framework runtime
pub fn is_framework_id(id: &str) -> bool {
    framework_id_kind(id).is_some()
}

/// Check whether a class token was minted by a framework or bundler
pub fn is_framework_class(class: &str) -> bool {
    FRAMEWORK_CLASS_PATTERNS.iter().any(|(pattern, _)| pattern.is_match(class)) || is_hashed_token(class)
}

/// Short alphanumeric tokens interleaving letters and digits ("a1b2c3", "x9k2pq")
fn is_hashed_token(token: &str) -> bool {
    let len = token.chars().count();
    if !(5..=10).contains(&len) || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
    let transitions = token
        .as_bytes()
        .windows(2)
        .filter(|pair| pair[0].is_ascii_digit() != pair[1].is_ascii_digit())
        .count();
    digits >= 2 && transitions >= 3
}

/// Keep the classes that are worth selecting on, in their original order
pub fn stable_classes(classes: &[String]) -> Vec<&str> {
    classes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty() && !is_framework_class(c))
        .collect()
}
