//! Element snapshots and selector resolution
//!
//! This module turns the DOM snapshot attached to a captured interaction into locators
//! that can re-find the element later. It includes:
//! - ElementSnapshot: the element as it looked when the user touched it
//! - SelectorResolver: ranked candidate derivation, shadow-root aware
//! - SelectorSet: the non-empty ranked result, coordinates last
//! - noise: tables of framework-generated ids and class names

pub mod element;
pub mod noise;
pub mod resolver;
pub mod selector_set;

pub use element::{AncestorStep, BoundingBox, ElementSnapshot};
pub use resolver::SelectorResolver;
pub use selector_set::{SelectorCandidate, SelectorSet, SelectorStrategy};

/// Resolve a snapshot with the default resolver
pub fn resolve_selectors(element: &ElementSnapshot) -> SelectorSet {
    SelectorResolver::new().resolve(element)
}
