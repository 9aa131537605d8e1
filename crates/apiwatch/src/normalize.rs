//! Reconcile scraped endpoint names with an external client's path table.
//!
//! Rules are literal substring replacements applied one after another to
//! the same working string, so a later rule sees the output of earlier
//! ones.

use std::collections::HashSet;

use serde::Serialize;

use crate::types::EndpointRegistry;

/// A literal `from → to` substring replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionRule {
    pub from: String,
    pub to: String,
}

impl SubstitutionRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Default rules, in application order.
pub const DEFAULT_RULES: &[(&str, &str)] = &[
    ("api/widget", "r/{subreddit}/api/widget"),
    ("srname", "subreddit"),
    ("{filterpath}", "user/{user}"),
    ("{username}", "{user}"),
    ("{conversation_id}", "{id}"),
    (":conversation_id", "{id}"),
    ("live/{thread}", "live/{id}"),
];

/// A registry entry whose normalized url is not in the reference set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub identifier: String,
    pub url: String,
}

/// An ordered list of substitution rules.
#[derive(Debug, Clone)]
pub struct Normalizer {
    rules: Vec<SubstitutionRule>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(
            DEFAULT_RULES
                .iter()
                .map(|(from, to)| SubstitutionRule::new(*from, *to))
                .collect(),
        )
    }
}

impl Normalizer {
    /// Create a normalizer applying `rules` in the given order.
    pub fn new(rules: Vec<SubstitutionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[SubstitutionRule] {
        &self.rules
    }

    /// Apply every rule in order to a working copy of `input`.
    pub fn apply(&self, input: &str) -> String {
        let mut working = input.to_string();
        for rule in &self.rules {
            working = working.replace(&rule.from, &rule.to);
        }
        working
    }

    /// Report every entry whose normalized url is absent from `reference`.
    ///
    /// Urls and reference paths are compared with leading and trailing
    /// slashes removed. Rows are sorted by normalized identifier.
    pub fn mismatches<'r, I>(&self, registry: &EndpointRegistry, reference: I) -> Vec<Mismatch>
    where
        I: IntoIterator<Item = &'r str>,
    {
        let known: HashSet<&str> = reference.into_iter().map(|p| p.trim_matches('/')).collect();

        let mut missing: Vec<Mismatch> = registry
            .iter()
            .filter_map(|(identifier, descriptor)| {
                let url = self.apply(descriptor.url_template.trim_matches('/'));
                if known.contains(url.as_str()) {
                    None
                } else {
                    Some(Mismatch {
                        identifier: self.apply(identifier),
                        url,
                    })
                }
            })
            .collect();

        missing.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        tracing::debug!(
            "{} of {} endpoints missing from reference set",
            missing.len(),
            registry.len()
        );
        missing
    }
}
