use crate::dom::element::BoundingBox;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a candidate locates its element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorStrategy {
    DataAttr,
    StableId,
    Aria,
    StableClass,
    TextContent,
    XPath,

    /// Outer shadow host selector, one per boundary
    ShadowHost,

    /// Host chain joined with `>>`, ending at the element's own selector
    ShadowPierce,
    Coordinates,
}

impl SelectorStrategy {
    /// Default stability assigned by the resolver
    pub fn base_stability(self) -> f64 {
        match self {
            Self::DataAttr => 1.0,
            Self::StableId => 0.9,
            Self::Aria => 0.75,
            Self::StableClass => 0.5,
            Self::TextContent => 0.4,
            Self::XPath => 0.2,
            Self::ShadowHost => 0.1,
            Self::ShadowPierce => 0.4,
            Self::Coordinates => 0.05,
        }
    }

    /// Strategies that survive typical UI refactors
    pub fn is_stable(self) -> bool {
        !matches!(self, Self::XPath | Self::ShadowHost | Self::Coordinates)
    }
}

impl fmt::Display for SelectorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DataAttr => "data-attr",
            Self::StableId => "id",
            Self::Aria => "aria",
            Self::StableClass => "class",
            Self::TextContent => "text",
            Self::XPath => "xpath",
            Self::ShadowHost => "shadow-host",
            Self::ShadowPierce => "shadow-pierce",
            Self::Coordinates => "coordinates",
        };
        f.write_str(name)
    }
}

/// One ranked way of re-finding an element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectorCandidate {
    pub strategy: SelectorStrategy,

    /// Identifying token (attribute value, id, label, text, or "x,y")
    pub value: String,

    /// Rendered locator; candidates are deduplicated on this string
    pub selector: String,

    /// 0..1, higher survives more UI changes
    pub stability_score: f64,
}

impl SelectorCandidate {
    /// Create a candidate with the strategy's base stability
    pub fn new(strategy: SelectorStrategy, value: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
            selector: selector.into(),
            stability_score: strategy.base_stability(),
        }
    }

    /// Builder method: override stability
    pub fn with_stability(mut self, score: f64) -> Self {
        self.stability_score = score.clamp(0.0, 1.0);
        self
    }

    /// Coordinate candidate at the center of a bounding box
    pub fn coordinates(bbox: &BoundingBox) -> Self {
        let (x, y) = bbox.center();
        Self::new(SelectorStrategy::Coordinates, format!("{},{}", x, y), format!("@{},{}", x, y))
    }

    /// Parsed coordinate pair for `Coordinates` candidates
    pub fn point(&self) -> Option<(i64, i64)> {
        if self.strategy != SelectorStrategy::Coordinates {
            return None;
        }
        let (x, y) = self.value.split_once(',')?;
        Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
    }

    /// Get a short representation for comments
    pub fn short_repr(&self) -> String {
        format!("{}={}", self.strategy, self.selector)
    }
}

/// Ordered, non-empty list of candidates, most stable first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "SelectorSetRepr")]
pub struct SelectorSet {
    candidates: Vec<SelectorCandidate>,

    /// Targets that do not pierce shadow roots need explicit host hops
    #[serde(default)]
    requires_shadow_piercing: bool,

    /// One selector per shadow host, outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    shadow_hosts: Vec<String>,

    /// Host selectors and the element selector joined with `>>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pierce_path: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectorSetRepr {
    candidates: Vec<SelectorCandidate>,
    #[serde(default)]
    requires_shadow_piercing: bool,
    #[serde(default)]
    shadow_hosts: Vec<String>,
    #[serde(default)]
    pierce_path: Option<String>,
}

impl TryFrom<SelectorSetRepr> for SelectorSet {
    type Error = String;

    fn try_from(repr: SelectorSetRepr) -> Result<Self, Self::Error> {
        if repr.candidates.is_empty() {
            return Err("selector set must contain at least one candidate".to_string());
        }
        Ok(Self {
            candidates: repr.candidates,
            requires_shadow_piercing: repr.requires_shadow_piercing,
            shadow_hosts: repr.shadow_hosts,
            pierce_path: repr.pierce_path,
        })
    }
}

impl SelectorSet {
    /// Rank candidates: stability descending, ties keep insertion order, duplicate
    /// selector strings keep their most stable entry. The coordinate fallback is always
    /// present.
    pub fn from_candidates(mut candidates: Vec<SelectorCandidate>, fallback: &BoundingBox) -> Self {
        if !candidates.iter().any(|c| c.strategy == SelectorStrategy::Coordinates) {
            candidates.push(SelectorCandidate::coordinates(fallback));
        }

        Self {
            candidates: rank(candidates),
            requires_shadow_piercing: false,
            shadow_hosts: Vec::new(),
            pierce_path: None,
        }
    }

    /// Set holding only the coordinate fallback
    pub fn coordinates_only(bbox: &BoundingBox) -> Self {
        Self::from_candidates(Vec::new(), bbox)
    }

    /// Builder method: add one `ShadowHost` candidate per host and the composed
    /// `ShadowPierce` path ending at `target`, ranked with `stability`
    pub fn with_shadow(mut self, hosts: Vec<String>, target: &str, stability: f64) -> Self {
        if hosts.is_empty() {
            return self;
        }
        let pierce_path = hosts
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(target))
            .collect::<Vec<_>>()
            .join(" >> ");

        let mut candidates = std::mem::take(&mut self.candidates);
        candidates.push(
            SelectorCandidate::new(SelectorStrategy::ShadowPierce, target, pierce_path.clone()).with_stability(stability),
        );
        for host in &hosts {
            candidates.push(SelectorCandidate::new(SelectorStrategy::ShadowHost, host.as_str(), host.as_str()));
        }

        self.candidates = rank(candidates);
        self.requires_shadow_piercing = true;
        self.shadow_hosts = hosts;
        self.pierce_path = Some(pierce_path);
        self
    }

    /// Highest-stability candidate
    pub fn best(&self) -> &SelectorCandidate {
        &self.candidates[0]
    }

    /// Best candidate that is neither XPath nor coordinates
    pub fn best_stable(&self) -> Option<&SelectorCandidate> {
        self.candidates.iter().find(|c| c.strategy.is_stable())
    }

    /// The coordinate fallback
    pub fn coordinates(&self) -> Option<&SelectorCandidate> {
        self.candidates
            .iter()
            .find(|c| c.strategy == SelectorStrategy::Coordinates)
    }

    /// Get candidate for a given strategy
    pub fn get(&self, strategy: SelectorStrategy) -> Option<&SelectorCandidate> {
        self.candidates.iter().find(|c| c.strategy == strategy)
    }

    /// Whether the top candidate is a stable strategy
    pub fn is_stable(&self) -> bool {
        self.best().strategy.is_stable()
    }

    /// Iterate over candidates, most stable first
    pub fn iter(&self) -> impl Iterator<Item = &SelectorCandidate> {
        self.candidates.iter()
    }

    pub fn candidates(&self) -> &[SelectorCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn requires_shadow_piercing(&self) -> bool {
        self.requires_shadow_piercing
    }

    pub fn shadow_hosts(&self) -> &[String] {
        &self.shadow_hosts
    }

    pub fn pierce_path(&self) -> Option<&str> {
        self.pierce_path.as_deref()
    }

    /// Export to JSON for debugging
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Stability descending with stable ties; the first entry per selector string wins
fn rank(mut candidates: Vec<SelectorCandidate>) -> Vec<SelectorCandidate> {
    candidates.sort_by(|a, b| b.stability_score.total_cmp(&a.stability_score));

    let mut unique: IndexMap<String, SelectorCandidate> = IndexMap::new();
    for candidate in candidates {
        unique.entry(candidate.selector.clone()).or_insert(candidate);
    }
    unique.into_values().collect()
}
