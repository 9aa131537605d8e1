//! Endpoint extraction from the API documentation page.
//!
//! Walks the parsed document with the `scraper` crate. Each endpoint
//! container has a heading (method marker, path parts, scope marker), an
//! optional URI variants block, and an info section holding the
//! description and parameter table.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Node, Selector};

use crate::types::{ApiWatchError, ApiWatchResult, EndpointDescriptor, EndpointRegistry};

const ENDPOINT_SELECTOR: &str = ".endpoint";
const VARIANTS_CLASS: &str = "uri-variants";
const PLACEHOLDER_CLASS: &str = "placeholder";
const MARKER_TAG: &str = "span";

/// Glyphs trimmed from text parts of a URI variant (`→ /r/[...]`).
const VARIANT_GLYPHS: &[char] = &['→', ' ', '[', ']'];

/// Glyphs trimmed from text parts of an endpoint heading.
const HEADING_GLYPHS: &[char] = &['[', ']'];

/// A child node relevant to the tree walk.
#[derive(Debug, Clone, Copy)]
enum Fragment<'a> {
    Text(&'a str),
    Element(ElementRef<'a>),
}

/// How an endpoint container names its operations.
#[derive(Debug)]
enum EndpointShape {
    /// One operation keyed by the container's own `id`.
    Single { identifier: String },
    /// One operation per URI variant: `(identifier, url template)`.
    Multi { variants: Vec<(String, String)> },
}

/// The named parts of one endpoint container.
struct EndpointParts<'a> {
    heading: ElementRef<'a>,
    shape: EndpointShape,
    info: Option<ElementRef<'a>>,
}

impl<'a> EndpointParts<'a> {
    fn locate(endpoint: ElementRef<'a>) -> ApiWatchResult<Self> {
        let heading = child_elements(endpoint)
            .into_iter()
            .find(|el| is_heading(el))
            .ok_or_else(|| {
                ApiWatchError::Parse(format!(
                    "endpoint {} has no heading",
                    endpoint.value().attr("id").unwrap_or("<unnamed>")
                ))
            })?;

        let mut following = heading.next_siblings().filter_map(ElementRef::wrap);
        let next = following.next();

        match next {
            Some(block) if has_class(&block, VARIANTS_CLASS) => {
                let variants = variant_templates(block)?;
                Ok(Self {
                    heading,
                    shape: EndpointShape::Multi { variants },
                    info: following.next(),
                })
            }
            _ => {
                let identifier = endpoint
                    .value()
                    .attr("id")
                    .ok_or_else(|| ApiWatchError::Parse("endpoint without an id attribute".into()))?
                    .to_string();
                Ok(Self {
                    heading,
                    shape: EndpointShape::Single { identifier },
                    info: next,
                })
            }
        }
    }
}

/// Extract every endpoint on the page into a registry.
///
/// Descriptor-level anomalies (missing description, unknown heading
/// nodes, short parameter rows) are logged and skipped. Structural
/// failures abort the whole extraction.
pub fn extract_endpoints(markup: &str) -> ApiWatchResult<EndpointRegistry> {
    let document = Html::parse_document(markup);
    let selector = Selector::parse(ENDPOINT_SELECTOR)
        .map_err(|e| ApiWatchError::Parse(format!("invalid endpoint selector: {e:?}")))?;

    let mut registry = EndpointRegistry::new();
    let mut containers = 0usize;

    for endpoint in document.select(&selector) {
        containers += 1;
        for (identifier, descriptor) in extract_endpoint(endpoint)? {
            if registry.insert(identifier.clone(), descriptor).is_some() {
                tracing::warn!("Duplicate endpoint identifier {identifier}, keeping the later one");
            }
        }
    }

    if containers == 0 {
        return Err(ApiWatchError::Parse(
            "no endpoint containers found in markup".into(),
        ));
    }

    tracing::debug!(
        "Extracted {} endpoints from {containers} containers",
        registry.len()
    );
    Ok(registry)
}

fn extract_endpoint(endpoint: ElementRef<'_>) -> ApiWatchResult<Vec<(String, EndpointDescriptor)>> {
    let parts = EndpointParts::locate(endpoint)?;

    let shared = EndpointDescriptor {
        description: parts.info.and_then(description),
        params: parts.info.and_then(parameter_table),
        url_template: String::new(),
    };

    match parts.shape {
        EndpointShape::Single { identifier } => {
            let url_template = rewrite_colon_segments(&heading_template(parts.heading)?);
            Ok(vec![(
                identifier,
                EndpointDescriptor {
                    url_template,
                    ..shared
                },
            )])
        }
        EndpointShape::Multi { variants } => Ok(variants
            .into_iter()
            .map(|(identifier, url_template)| {
                let mut descriptor = shared.clone();
                descriptor.url_template = url_template;
                (identifier, descriptor)
            })
            .collect()),
    }
}

/// Build the url template from the heading: every node strictly between
/// the first marker span and the next one (or the end of the heading).
fn heading_template(heading: ElementRef<'_>) -> ApiWatchResult<String> {
    let nodes = fragments(heading);

    let first = nodes.iter().position(is_marker).ok_or_else(|| {
        ApiWatchError::Parse(format!(
            "no <{MARKER_TAG}> marker in endpoint heading: {}",
            heading.text().collect::<String>().trim()
        ))
    })?;
    let end = nodes[first + 1..]
        .iter()
        .position(is_marker)
        .map_or(nodes.len(), |i| first + 1 + i);

    let mut template = String::new();
    for node in &nodes[first + 1..end] {
        match node {
            Fragment::Text(text) => template.push_str(text.trim_matches(HEADING_GLYPHS)),
            Fragment::Element(el) if has_class(el, PLACEHOLDER_CLASS) => {
                template.push_str(&placeholder(el));
            }
            Fragment::Element(el) => {
                tracing::info!(
                    "Skipping unrecognized <{}> in heading (class: {})",
                    el.value().name(),
                    el.value().attr("class").unwrap_or("")
                );
            }
        }
    }
    Ok(template)
}

fn variant_templates(block: ElementRef<'_>) -> ApiWatchResult<Vec<(String, String)>> {
    let mut variants = Vec::new();

    for variant in child_elements(block) {
        let identifier = variant
            .value()
            .attr("id")
            .ok_or_else(|| ApiWatchError::Parse("URI variant without an id attribute".into()))?;

        let mut template = String::new();
        for node in fragments(variant) {
            match node {
                Fragment::Text(text) => template.push_str(text.trim_matches(VARIANT_GLYPHS)),
                Fragment::Element(el) if has_class(&el, PLACEHOLDER_CLASS) => {
                    template.push_str(&placeholder(&el));
                }
                Fragment::Element(_) => {}
            }
        }
        variants.push((identifier.to_string(), rewrite_colon_segments(&template)));
    }

    if variants.is_empty() {
        return Err(ApiWatchError::Parse("empty URI variants block".into()));
    }
    Ok(variants)
}

/// Text of the first node inside the info section's first child.
fn description(info: ElementRef<'_>) -> Option<String> {
    let summary = child_elements(info).into_iter().next()?;
    let first = fragments(summary)
        .into_iter()
        .find(|f| !matches!(f, Fragment::Text(t) if t.trim().is_empty()));

    match first {
        Some(Fragment::Text(text)) => Some(text.to_string()),
        Some(Fragment::Element(el)) => Some(el.text().collect()),
        None => {
            tracing::debug!("Endpoint info section has no description");
            None
        }
    }
}

/// The parameter table is the info section's third child, when present.
///
/// Names are kept verbatim; descriptions are trimmed.
fn parameter_table(info: ElementRef<'_>) -> Option<BTreeMap<String, String>> {
    let table = child_elements(info).into_iter().nth(2)?;

    let mut params = BTreeMap::new();
    for row in table_rows(table) {
        let cells = child_elements(row);
        match (cells.first(), cells.get(1)) {
            (Some(name), Some(desc)) => {
                let name: String = name.text().collect();
                let desc: String = desc.text().collect();
                params.insert(name, desc.trim().to_string());
            }
            _ => tracing::debug!("Skipping parameter row with {} cells", cells.len()),
        }
    }

    (!params.is_empty()).then_some(params)
}

fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in child_elements(table) {
        match child.value().name() {
            "thead" | "tbody" | "tfoot" => rows.extend(
                child_elements(child)
                    .into_iter()
                    .filter(|el| el.value().name() == "tr"),
            ),
            _ => rows.push(child),
        }
    }
    rows
}

/// Rewrite every `:name` path segment to `{name}`.
pub fn rewrite_colon_segments(template: &str) -> String {
    if !template.contains(':') {
        return template.to_string();
    }
    template
        .split('/')
        .map(|segment| {
            if segment.starts_with(':') {
                format!("{{{}}}", segment.trim_matches(':'))
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

// ── Tree helpers ────────────────────────────────────────────────────────────

fn fragments(el: ElementRef<'_>) -> Vec<Fragment<'_>> {
    el.children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(Fragment::Text(&text.text)),
            Node::Element(_) => ElementRef::wrap(child).map(Fragment::Element),
            _ => None,
        })
        .collect()
}

fn child_elements(el: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap).collect()
}

fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
    el.value()
        .attr("class")
        .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

fn is_heading(el: &ElementRef<'_>) -> bool {
    matches!(el.value().name(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn is_marker(fragment: &Fragment<'_>) -> bool {
    matches!(fragment, Fragment::Element(el) if el.value().name() == MARKER_TAG)
}

fn placeholder(el: &ElementRef<'_>) -> String {
    format!("{{{}}}", el.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> String {
        format!("<html><body><div class=\"contents\">{body}</div></body></html>")
    }

    const ME: &str = r#"<div class="endpoint" id="GET_api_v1_me"><a name="GET_api_v1_me"></a><h3><span class="method">GET&nbsp;</span>/api/v1/me<span class="oauth-scope-list"><span class="api-badge oauth-scope">identity</span></span></h3><div class="info"><div class="md"><p>Returns the identity of the user.</p></div></div></div>"#;

    const HOT: &str = r#"<div class="endpoint" id="GET_hot"><a name="GET_hot"></a><h3><span class="method">GET&nbsp;</span>[/r/<em class="placeholder">subreddit</em>]/hot<span class="api-badge">read</span></h3><ul class="uri-variants"><li id="GET_hot">→ /hot</li><li id="GET_r_{subreddit}_hot">→ /r/<em class="placeholder">subreddit</em>/hot</li></ul><div class="info"><div class="md"><p>Hot listing.</p></div><h2>arguments</h2><table class="parameters"><tr><th>after</th><td> fullname of a thing </td></tr><tr><th>limit</th><td>maximum number of items</td></tr></table></div></div>"#;

    #[test]
    fn test_single_variant_endpoint() {
        let registry = extract_endpoints(&page(ME)).unwrap();
        assert_eq!(registry.len(), 1);
        let me = &registry["GET_api_v1_me"];
        assert_eq!(me.url_template, "/api/v1/me");
        assert_eq!(
            me.description.as_deref(),
            Some("Returns the identity of the user.")
        );
        assert!(me.params.is_none());
    }

    #[test]
    fn test_placeholders_and_brackets_in_heading() {
        let html = page(
            r#"<div class="endpoint" id="GET_about_where"><h3><span class="method">GET&nbsp;</span>[/r/<em class="placeholder">subreddit</em>]/about/<em class="placeholder">where</em><span class="api-badge">read</span></h3><div class="info"></div></div>"#,
        );
        let registry = extract_endpoints(&html).unwrap();
        assert_eq!(
            registry["GET_about_where"].url_template,
            "/r/{subreddit}/about/{where}"
        );
    }

    #[test]
    fn test_colon_segments_rewritten() {
        let html = page(
            r#"<div class="endpoint" id="GET_live_thread"><h3><span class="method">GET&nbsp;</span>/live/:thread/about/:other</h3></div>"#,
        );
        let registry = extract_endpoints(&html).unwrap();
        let url = &registry["GET_live_thread"].url_template;
        assert_eq!(url, "/live/{thread}/about/{other}");
        assert!(!url.split('/').any(|s| s.starts_with(':')));
    }

    #[test]
    fn test_multi_variant_endpoint_shares_details() {
        let registry = extract_endpoints(&page(HOT)).unwrap();
        assert_eq!(registry.len(), 2);

        let plain = &registry["GET_hot"];
        let scoped = &registry["GET_r_{subreddit}_hot"];
        assert_eq!(plain.url_template, "/hot");
        assert_eq!(scoped.url_template, "/r/{subreddit}/hot");
        assert_eq!(plain.description, scoped.description);
        assert_eq!(plain.params, scoped.params);

        let params = plain.params.as_ref().unwrap();
        assert_eq!(params["after"], "fullname of a thing");
        assert_eq!(params["limit"], "maximum number of items");
    }

    #[test]
    fn test_two_child_info_has_no_params() {
        let html = page(
            r#"<div class="endpoint" id="POST_api_x"><h3><span class="method">POST&nbsp;</span>/api/x</h3><div class="info"><div class="md"><p>Does x.</p></div><table class="parameters"><tr><th>a</th><td>b</td></tr></table></div></div>"#,
        );
        let registry = extract_endpoints(&html).unwrap();
        assert!(registry["POST_api_x"].params.is_none());
        assert_eq!(registry["POST_api_x"].description.as_deref(), Some("Does x."));
    }

    #[test]
    fn test_missing_description_is_absent() {
        let html = page(
            r#"<div class="endpoint" id="GET_api_y"><h3><span class="method">GET&nbsp;</span>/api/y</h3><div class="info"><div class="md"></div></div></div>"#,
        );
        let registry = extract_endpoints(&html).unwrap();
        assert!(registry["GET_api_y"].description.is_none());
    }

    #[test]
    fn test_unknown_heading_node_is_skipped() {
        let html = page(
            r#"<div class="endpoint" id="GET_api_z"><h3><span class="method">GET&nbsp;</span>/api/<b class="note">new</b>z<span class="api-badge">read</span></h3></div>"#,
        );
        let registry = extract_endpoints(&html).unwrap();
        assert_eq!(registry["GET_api_z"].url_template, "/api/z");
    }

    #[test]
    fn test_heading_without_marker_is_fatal() {
        let html = page(r#"<div class="endpoint" id="GET_api_v1_me"><h3>/api/v1/me</h3></div>"#);
        let err = extract_endpoints(&html).unwrap_err();
        assert!(matches!(err, ApiWatchError::Parse(_)));
    }

    #[test]
    fn test_page_without_endpoints_is_fatal() {
        let err = extract_endpoints("<html><body><p>maintenance</p></body></html>").unwrap_err();
        assert!(matches!(err, ApiWatchError::Parse(_)));
    }

    #[test]
    fn test_every_container_yields_an_entry() {
        let html = page(&format!("{ME}{HOT}"));
        let registry = extract_endpoints(&html).unwrap();
        assert!(registry.contains_key("GET_api_v1_me"));
        assert!(registry.contains_key("GET_hot"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_variant_without_id_is_fatal() {
        let html = page(
            r#"<div class="endpoint" id="GET_hot"><h3><span class="method">GET&nbsp;</span>/hot</h3><ul class="uri-variants"><li>→ /hot</li></ul></div>"#,
        );
        let err = extract_endpoints(&html).unwrap_err();
        assert!(matches!(err, ApiWatchError::Parse(_)));
    }

    #[test]
    fn test_empty_variants_block_is_fatal() {
        let html = page(
            r#"<div class="endpoint" id="GET_hot"><h3><span class="method">GET&nbsp;</span>/hot</h3><ul class="uri-variants"></ul><div class="info"></div></div>"#,
        );
        let err = extract_endpoints(&html).unwrap_err();
        assert!(matches!(err, ApiWatchError::Parse(_)));
    }

    #[test]
    fn test_single_endpoint_without_id_is_fatal() {
        let html = page(
            r#"<div class="endpoint"><h3><span class="method">GET&nbsp;</span>/api/v1/me</h3><div class="info"></div></div>"#,
        );
        let err = extract_endpoints(&html).unwrap_err();
        assert!(matches!(err, ApiWatchError::Parse(_)));
    }

    #[test]
    fn test_duplicate_identifier_keeps_later_entry() {
        let html = page(
            r#"<div class="endpoint" id="GET_dup"><h3><span class="method">GET&nbsp;</span>/first</h3></div><div class="endpoint" id="GET_dup"><h3><span class="method">GET&nbsp;</span>/second</h3></div>"#,
        );
        let registry = extract_endpoints(&html).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry["GET_dup"].url_template, "/second");
    }

    #[test]
    fn test_missing_info_section_degrades() {
        let html = page(
            r#"<div class="endpoint" id="GET_api_bare"><h3><span class="method">GET&nbsp;</span>/api/bare</h3></div>"#,
        );
        let registry = extract_endpoints(&html).unwrap();
        let bare = &registry["GET_api_bare"];
        assert!(bare.description.is_none());
        assert!(bare.params.is_none());
    }

    #[test]
    fn test_short_parameter_row_is_skipped() {
        let html = page(
            r#"<div class="endpoint" id="POST_api_x"><h3><span class="method">POST&nbsp;</span>/api/x</h3><div class="info"><div class="md"><p>Does x.</p></div><h2>arguments</h2><table class="parameters"><tr><th>orphan</th></tr><tr><th>a</th><td> b </td></tr></table></div></div>"#,
        );
        let registry = extract_endpoints(&html).unwrap();
        let params = registry["POST_api_x"].params.as_ref().unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params["a"], "b");
    }

    #[test]
    fn test_parameter_names_kept_verbatim() {
        let html = page(
            r#"<div class="endpoint" id="POST_api_x"><h3><span class="method">POST&nbsp;</span>/api/x</h3><div class="info"><div class="md"><p>Does x.</p></div><h2>arguments</h2><table class="parameters"><tr><th>api_type </th><td> the string json </td></tr></table></div></div>"#,
        );
        let registry = extract_endpoints(&html).unwrap();
        let params = registry["POST_api_x"].params.as_ref().unwrap();
        assert_eq!(params["api_type "], "the string json");
    }

    #[test]
    fn test_rewrite_colon_segments_leaves_others() {
        assert_eq!(rewrite_colon_segments("api/v1/me"), "api/v1/me");
        assert_eq!(
            rewrite_colon_segments("api/mod/conversations/:conversation_id/mute"),
            "api/mod/conversations/{conversation_id}/mute"
        );
    }
}
