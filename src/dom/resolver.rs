//! Stable locator derivation
//!
//! Turns an [`ElementSnapshot`] into a ranked [`SelectorSet`]. At most one primary
//! strategy is taken from the chain test attribute → stable id → aria → stable classes;
//! text, XPath and coordinate fallbacks are added underneath it. Elements behind shadow
//! roots also get one candidate per host plus the composed pierce path.

use crate::dom::element::{AncestorStep, ElementSnapshot};
use crate::dom::noise;
use crate::dom::selector_set::{SelectorCandidate, SelectorSet, SelectorStrategy};
use crate::error::CaptureError;

/// Attributes written by test authors for automation, most specific first
const TEST_ATTRIBUTES: [&str; 5] = ["data-testid", "data-test", "data-test-id", "data-cy", "data-qa"];

/// Longest text used in a `:has-text()` selector
const MAX_TEXT_SELECTOR_CHARS: usize = 50;

/// Stateless selector resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorResolver;

impl SelectorResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a snapshot into a non-empty, stability-descending selector set
    pub fn resolve(&self, element: &ElementSnapshot) -> SelectorSet {
        let mut candidates = Vec::with_capacity(5);

        if let Some(primary) = self.primary_candidate(element) {
            candidates.push(primary);
        }
        if let Some(text) = self.text_candidate(element) {
            candidates.push(text);
        }
        let xpath = build_xpath(element);
        candidates.push(SelectorCandidate::new(SelectorStrategy::XPath, xpath.clone(), xpath));

        let mut set = SelectorSet::from_candidates(candidates, &element.bounding_box);

        if element.is_in_shadow_dom() {
            let hosts: Vec<String> = element
                .shadow_path
                .iter()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .collect();
            let (target, stability) = match set.best_stable() {
                Some(c) => (c.selector.clone(), c.stability_score),
                None => (element.tag.clone(), SelectorStrategy::XPath.base_stability()),
            };
            set = set.with_shadow(hosts, &target, stability);
        }

        if !set.is_stable() {
            let err = CaptureError::NoStableSelector(format!(
                "{} resolved only to {}",
                element.describe(),
                set.best().short_repr()
            ));
            log::warn!("{}", err);
        }

        set
    }

    /// First applicable strategy of the primary chain
    fn primary_candidate(&self, element: &ElementSnapshot) -> Option<SelectorCandidate> {
        for attr in TEST_ATTRIBUTES {
            if let Some(value) = element.get_attribute(attr).map(|v| v.trim()).filter(|v| !v.is_empty()) {
                return Some(SelectorCandidate::new(
                    SelectorStrategy::DataAttr,
                    value,
                    format!("[{}={}]", attr, css_string(value)),
                ));
            }
        }

        if let Some(id) = element.non_empty_id() {
            match noise::framework_id_kind(id) {
                Some(kind) => log::debug!("Skipping framework id '{}' ({})", id, kind),
                None => {
                    return Some(SelectorCandidate::new(SelectorStrategy::StableId, id, id_selector(id)));
                }
            }
        }

        if let Some(label) = element
            .get_attribute("aria-label")
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
        {
            return Some(SelectorCandidate::new(
                SelectorStrategy::Aria,
                label,
                format!("[aria-label={}]", css_string(label)),
            ));
        }
        if let Some(role) = element.get_attribute("role").map(|r| r.trim()).filter(|r| !r.is_empty()) {
            return Some(SelectorCandidate::new(
                SelectorStrategy::Aria,
                role,
                format!("{}[role={}]", element.tag, css_string(role)),
            ));
        }

        let classes = noise::stable_classes(&element.class_list);
        if !classes.is_empty() {
            let selector = classes.iter().fold(element.tag.clone(), |mut acc, class| {
                acc.push('.');
                acc.push_str(&css_ident(class));
                acc
            });
            return Some(SelectorCandidate::new(SelectorStrategy::StableClass, classes.join(" "), selector));
        }

        None
    }

    fn text_candidate(&self, element: &ElementSnapshot) -> Option<SelectorCandidate> {
        if !element.is_click_target() {
            return None;
        }
        let text = element.visible_text()?;
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let needle: String = collapsed.chars().take(MAX_TEXT_SELECTOR_CHARS).collect();
        let selector = format!("{}:has-text({})", element.tag, css_string(&needle));
        Some(SelectorCandidate::new(SelectorStrategy::TextContent, needle, selector))
    }
}

/// Structural path from the closest ancestor with a stable id (or the root) to the element
pub fn build_xpath(element: &ElementSnapshot) -> String {
    let own = AncestorStep {
        tag: element.tag.clone(),
        id: element.id.clone(),
        sibling_index: element.sibling_index,
    };
    let chain: Vec<&AncestorStep> = element.ancestors.iter().chain(std::iter::once(&own)).collect();

    let anchor = chain.iter().rposition(|step| {
        step.id
            .as_deref()
            .map(str::trim)
            .is_some_and(|id| !id.is_empty() && !noise::is_framework_id(id))
    });

    let mut path = String::new();
    let start = match anchor {
        Some(index) => {
            let step = chain[index];
            let id = step.id.as_deref().unwrap_or_default().trim();
            path.push_str(&format!("//{}[@id={}]", step.tag.to_lowercase(), xpath_string(id)));
            index + 1
        }
        None if element.ancestors.is_empty() => {
            path.push('/');
            0
        }
        None => 0,
    };

    for step in &chain[start..] {
        path.push('/');
        path.push_str(&step.tag.to_lowercase());
        if let Some(index) = step.sibling_index {
            path.push_str(&format!("[{}]", index));
        }
    }
    path
}

/// Quote a CSS attribute value
fn css_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Escape a token for use as a CSS identifier (`.class`, `#id`)
fn css_ident(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for (i, c) in token.chars().enumerate() {
        let plain = c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii();
        if !plain || (i == 0 && c.is_ascii_digit()) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn id_selector(id: &str) -> String {
    let starts_with_digit = id.chars().next().is_some_and(|c| c.is_ascii_digit());
    if starts_with_digit || id.contains(char::is_whitespace) {
        format!("[id={}]", css_string(id))
    } else {
        format!("#{}", css_ident(id))
    }
}

/// XPath 1.0 has no escapes; switch quote style or fall back to concat()
pub(crate) fn xpath_string(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{}\"", value)
    } else if !value.contains('\'') {
        format!("'{}'", value)
    } else {
        let parts: Vec<String> = value.split('"').map(|p| format!("\"{}\"", p)).collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(element: &ElementSnapshot) -> SelectorSet {
        SelectorResolver::new().resolve(element)
    }

    fn assert_well_formed(set: &SelectorSet) {
        assert!(!set.is_empty());
        let scores: Vec<f64> = set.iter().map(|c| c.stability_score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]), "not descending: {:?}", scores);
        assert_eq!(set.candidates().last().unwrap().strategy, SelectorStrategy::Coordinates);
    }

    #[test]
    fn test_data_testid_beats_framework_id() {
        let element = ElementSnapshot::new("button")
            .with_id("ember901")
            .with_attribute("data-testid", "submit-btn")
            .with_bounding_box(10.0, 10.0, 80.0, 30.0);

        let set = resolve(&element);
        assert_well_formed(&set);
        assert_eq!(set.best().strategy, SelectorStrategy::DataAttr);
        assert_eq!(set.best().value, "submit-btn");
        assert_eq!(set.best().selector, "[data-testid=\"submit-btn\"]");
        assert_eq!(set.best().stability_score, 1.0);
        assert!(set.get(SelectorStrategy::StableId).is_none());
    }

    #[test]
    fn test_stable_id() {
        let element = ElementSnapshot::new("input").with_id("email").input(true);
        let set = resolve(&element);
        assert_well_formed(&set);
        assert_eq!(set.best().strategy, SelectorStrategy::StableId);
        assert_eq!(set.best().selector, "#email");
    }

    #[test]
    fn test_framework_id_falls_through_to_aria() {
        let element = ElementSnapshot::new("button")
            .with_id("component-42781")
            .with_attribute("aria-label", "Close dialog");
        let set = resolve(&element);
        assert_eq!(set.best().strategy, SelectorStrategy::Aria);
        assert_eq!(set.best().selector, "[aria-label=\"Close dialog\"]");
        assert!(set.iter().all(|c| !c.selector.contains("component-42781") || c.strategy == SelectorStrategy::XPath));
    }

    #[test]
    fn test_role_when_no_label() {
        let element = ElementSnapshot::new("div").with_attribute("role", "tab");
        let set = resolve(&element);
        assert_eq!(set.best().selector, "div[role=\"tab\"]");
    }

    #[test]
    fn test_stable_classes_skip_hashes() {
        let element = ElementSnapshot::new("div").with_classes(["css-1a2b3c", "card", "active"]);
        let set = resolve(&element);
        assert_eq!(set.best().strategy, SelectorStrategy::StableClass);
        assert_eq!(set.best().selector, "div.card.active");
        assert_eq!(set.best().value, "card active");
    }

    #[test]
    fn test_only_hashed_classes_yield_no_class_candidate() {
        let element = ElementSnapshot::new("span").with_classes(["css-1a2b3c", "sc-bdVaJa"]);
        let set = resolve(&element);
        assert!(set.get(SelectorStrategy::StableClass).is_none());
        assert_eq!(set.best().strategy, SelectorStrategy::XPath);
        assert!(!set.is_stable());
    }

    #[test]
    fn test_text_candidate_for_click_targets() {
        let element = ElementSnapshot::new("button")
            .with_id("ember482")
            .with_text("  Save   changes ");
        let set = resolve(&element);
        let text = set.get(SelectorStrategy::TextContent).unwrap();
        assert_eq!(text.selector, "button:has-text(\"Save changes\")");
        assert_eq!(set.best().strategy, SelectorStrategy::TextContent);

        let plain = ElementSnapshot::new("p").with_text("Hello");
        assert!(resolve(&plain).get(SelectorStrategy::TextContent).is_none());
    }

    #[test]
    fn test_xpath_uses_sibling_indexes() {
        let element = ElementSnapshot::new("td")
            .with_sibling_index(3)
            .with_ancestors(vec![
                AncestorStep { tag: "html".into(), id: None, sibling_index: None },
                AncestorStep { tag: "body".into(), id: None, sibling_index: None },
                AncestorStep { tag: "tr".into(), id: None, sibling_index: Some(2) },
            ]);
        assert_eq!(build_xpath(&element), "/html/body/tr[2]/td[3]");
    }

    #[test]
    fn test_xpath_anchors_on_stable_ancestor_id() {
        let element = ElementSnapshot::new("button")
            .with_sibling_index(2)
            .with_ancestors(vec![
                AncestorStep { tag: "body".into(), id: None, sibling_index: None },
                AncestorStep { tag: "form".into(), id: Some("login".into()), sibling_index: None },
                AncestorStep { tag: "div".into(), id: Some("ember12".into()), sibling_index: Some(1) },
            ]);
        assert_eq!(build_xpath(&element), "//form[@id=\"login\"]/div[1]/button[2]");
    }

    #[test]
    fn test_xpath_without_ancestors() {
        assert_eq!(build_xpath(&ElementSnapshot::new("button")), "//button");
    }

    #[test]
    fn test_coordinates_only_snapshot() {
        let element = ElementSnapshot::new("canvas").with_bounding_box(0.0, 0.0, 200.0, 100.0);
        let set = resolve(&element);
        assert_well_formed(&set);
        assert_eq!(set.coordinates().unwrap().point(), Some((100, 50)));
    }

    #[test]
    fn test_shadow_piercing() {
        let element = ElementSnapshot::new("button")
            .with_attribute("data-testid", "buy")
            .with_shadow_path(["shop-app", "product-card"]);
        let set = resolve(&element);
        assert!(set.requires_shadow_piercing());
        assert_eq!(set.shadow_hosts(), ["shop-app", "product-card"]);
        assert_eq!(set.pierce_path(), Some("shop-app >> product-card >> [data-testid=\"buy\"]"));

        let pierce = set.get(SelectorStrategy::ShadowPierce).unwrap();
        assert_eq!(pierce.selector, "shop-app >> product-card >> [data-testid=\"buy\"]");
        assert_eq!(pierce.stability_score, 1.0);
        let hosts: Vec<&str> = set
            .iter()
            .filter(|c| c.strategy == SelectorStrategy::ShadowHost)
            .map(|c| c.selector.as_str())
            .collect();
        assert_eq!(hosts, ["shop-app", "product-card"]);

        // The element's own locator still leads; coordinates stay last
        assert_eq!(set.best().strategy, SelectorStrategy::DataAttr);
        assert_eq!(set.candidates().last().unwrap().strategy, SelectorStrategy::Coordinates);
        let scores: Vec<f64> = set.iter().map(|c| c.stability_score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_selector_escaping() {
        assert_eq!(css_string("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(css_ident("md:flex"), "md\\:flex");
        assert_eq!(id_selector("1st"), "[id=\"1st\"]");
        assert_eq!(xpath_string("it's \"x\""), "concat(\"it's \", '\"', \"x\", '\"', \"\")");
    }
}
