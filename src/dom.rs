//! Page document and query helpers
//!
//! Wraps a parsed `scraper::Html` together with the page URL and exposes the
//! queries the parsing rules rely on: CSS selection scoped to a node, a small
//! path-expression dialect for exact attribute matches, and node accessors.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use crate::error::ParseError;

/// A parsed results page
#[derive(Debug)]
pub struct SerpDocument {
    html: Html,
    url: Url,
}

impl SerpDocument {
    /// Parse `html` as served from `url`
    pub fn new(html: &str, url: &str) -> Result<Self, ParseError> {
        let url = Url::parse(url).map_err(|e| ParseError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_html(Html::parse_document(html), url))
    }

    pub fn from_html(html: Html, url: Url) -> Self {
        Self { html, url }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Resolve a possibly relative link against the page URL.
    /// Links that cannot be joined are returned as-is.
    pub fn resolve(&self, href: &str) -> String {
        match self.url.join(href.trim()) {
            Ok(absolute) => absolute.to_string(),
            Err(_) => href.to_string(),
        }
    }

    /// First value of a query-string parameter of the page URL
    pub fn param_value(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Pagination offset read from `param`, 0 when absent or not a number
    pub fn page_offset(&self, param: &str) -> usize {
        self.param_value(param)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Descendants of `scope` matching a CSS selector, in document order
    pub fn css_query<'a>(&'a self, selector: &str, scope: ElementRef<'a>) -> NodeList<'a> {
        match parse_selector(selector) {
            Some(sel) => scope.select(&sel).map(DomNode::Element).collect(),
            None => NodeList::default(),
        }
    }

    /// Elements of the whole page matching a CSS selector
    pub fn css_query_document(&self, selector: &str) -> NodeList<'_> {
        match parse_selector(selector) {
            Some(sel) => self.html.select(&sel).map(DomNode::Element).collect(),
            None => NodeList::default(),
        }
    }

    /// Evaluate a path expression relative to `scope`.
    /// See [`compile_path`] for the supported syntax.
    pub fn path_query<'a>(&'a self, expression: &str, scope: ElementRef<'a>) -> NodeList<'a> {
        match compile_path(expression) {
            Ok(path) => path.evaluate(scope),
            Err(e) => {
                warn!(expression, error = %e, "invalid path query");
                NodeList::default()
            }
        }
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(selector, error = ?e, "invalid CSS selector");
            None
        }
    }
}

/// One entry of a node list. Text and comment nodes are kept so that child
/// enumeration mirrors the page, but carry no data.
#[derive(Debug, Clone, Copy)]
pub enum DomNode<'a> {
    Element(ElementRef<'a>),
    Other,
}

impl<'a> DomNode<'a> {
    pub fn as_element(&self) -> Option<ElementRef<'a>> {
        match self {
            DomNode::Element(el) => Some(*el),
            DomNode::Other => None,
        }
    }
}

/// Ordered, finite list of nodes
#[derive(Debug, Clone, Default)]
pub struct NodeList<'a> {
    nodes: Vec<DomNode<'a>>,
}

impl<'a> NodeList<'a> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DomNode<'a>> {
        self.nodes.iter()
    }

    pub fn first_element(&self) -> Option<ElementRef<'a>> {
        self.nodes.iter().find_map(DomNode::as_element)
    }

    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'a>> + '_ {
        self.nodes.iter().filter_map(DomNode::as_element)
    }
}

impl<'a> FromIterator<DomNode<'a>> for NodeList<'a> {
    fn from_iter<I: IntoIterator<Item = DomNode<'a>>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<ElementRef<'a>> for NodeList<'a> {
    fn from_iter<I: IntoIterator<Item = ElementRef<'a>>>(iter: I) -> Self {
        iter.into_iter().map(DomNode::Element).collect()
    }
}

impl<'a> IntoIterator for NodeList<'a> {
    type Item = DomNode<'a>;
    type IntoIter = std::vec::IntoIter<DomNode<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a, 'l> IntoIterator for &'l NodeList<'a> {
    type Item = &'l DomNode<'a>;
    type IntoIter = std::slice::Iter<'l, DomNode<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Read accessors on page elements
pub trait NodeExt<'a> {
    fn tag_name(&self) -> &'a str;
    fn has_class(&self, name: &str) -> bool;
    /// True when the element carries every class in `names`
    fn has_classes(&self, names: &[&str]) -> bool;
    fn attr(&self, name: &str) -> Option<&'a str>;
    fn text_content(&self) -> String;
    /// Direct children, including text and comment nodes
    fn child_nodes(&self) -> NodeList<'a>;
}

impl<'a> NodeExt<'a> for ElementRef<'a> {
    fn tag_name(&self) -> &'a str {
        self.value().name()
    }

    fn has_class(&self, name: &str) -> bool {
        self.value().classes().any(|c| c == name)
    }

    fn has_classes(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.has_class(name))
    }

    fn attr(&self, name: &str) -> Option<&'a str> {
        self.value().attr(name)
    }

    fn text_content(&self) -> String {
        self.text().collect::<String>()
    }

    fn child_nodes(&self) -> NodeList<'a> {
        self.children()
            .map(|child| match ElementRef::wrap(child) {
                Some(el) => DomNode::Element(el),
                None => DomNode::Other,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug)]
struct PathStep {
    axis: Axis,
    test: Selector,
}

/// A compiled path expression
#[derive(Debug)]
pub struct PathExpr {
    steps: Vec<PathStep>,
}

impl PathExpr {
    pub fn evaluate<'a>(&self, scope: ElementRef<'a>) -> NodeList<'a> {
        let mut context = vec![scope];
        for step in &self.steps {
            let mut seen = HashSet::new();
            let mut next = Vec::new();
            for ctx in &context {
                let matched: Vec<ElementRef<'a>> = match step.axis {
                    Axis::Descendant => ctx.select(&step.test).collect(),
                    Axis::Child => ctx
                        .children()
                        .filter_map(ElementRef::wrap)
                        .filter(|el| step.test.matches(el))
                        .collect(),
                };
                for el in matched {
                    if seen.insert(el.id()) {
                        next.push(el);
                    }
                }
            }
            context = next;
            if context.is_empty() {
                return NodeList::default();
            }
        }

        if self.steps.len() <= 1 {
            return context.into_iter().collect();
        }
        // several contexts may interleave, restore document order
        let found: HashSet<_> = context.iter().map(|el| el.id()).collect();
        scope
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| found.contains(&el.id()))
            .collect()
    }
}

/// Compile a path expression.
///
/// Steps are separated by `/`. Each step is `axis::name` followed by any
/// number of `[@attr='value']` predicates. The axis is `descendant` or
/// `child` (a bare name means `child`), the name a tag or `*`. Predicates
/// compare the whole attribute value, so `[@class='st']` does not match
/// `class="st x"`.
pub fn compile_path(expression: &str) -> Result<PathExpr, ParseError> {
    let invalid = |reason: &str| ParseError::InvalidPathQuery {
        expression: expression.to_string(),
        reason: reason.to_string(),
    };

    let raw_steps = split_steps(expression).ok_or_else(|| invalid("unbalanced brackets or quotes"))?;
    if raw_steps.is_empty() {
        return Err(invalid("empty expression"));
    }

    let mut steps = Vec::with_capacity(raw_steps.len());
    for raw in raw_steps {
        let raw = raw.trim();
        let (axis, rest) = if let Some(rest) = raw.strip_prefix("descendant::") {
            (Axis::Descendant, rest)
        } else if let Some(rest) = raw.strip_prefix("child::") {
            (Axis::Child, rest)
        } else if raw.contains("::") {
            return Err(invalid("unsupported axis"));
        } else {
            (Axis::Child, raw)
        };

        let name_end = rest.find('[').unwrap_or(rest.len());
        let name = &rest[..name_end];
        if name.is_empty()
            || !(name == "*"
                || name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        {
            return Err(invalid("step needs a tag name or *"));
        }

        let mut css = name.to_string();
        let mut predicates = &rest[name_end..];
        while !predicates.is_empty() {
            let close = closing_bracket(predicates).ok_or_else(|| invalid("unterminated predicate"))?;
            let inner = predicates[1..close].trim();
            let (attr, value) = parse_predicate(inner).ok_or_else(|| invalid("predicates must be [@attr='value']"))?;
            css.push_str(&format!(
                "[{}=\"{}\"]",
                attr,
                value.replace('\\', "\\\\").replace('"', "\\\"")
            ));
            predicates = predicates[close + 1..].trim_start();
        }

        let test = Selector::parse(&css).map_err(|e| invalid(&format!("{:?}", e)))?;
        steps.push(PathStep { axis, test });
    }

    Ok(PathExpr { steps })
}

// Split on '/' outside brackets and quotes
fn split_steps(expression: &str) -> Option<Vec<&str>> {
    let mut steps = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in expression.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'') | (None, '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.checked_sub(1)?,
            (None, '/') if depth == 0 => {
                steps.push(&expression[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    steps.push(&expression[start..]);

    if steps.iter().any(|s| s.trim().is_empty()) {
        return Some(Vec::new());
    }
    Some(steps)
}

// Index of the ']' closing the predicate that opens at index 0
fn closing_bracket(s: &str) -> Option<usize> {
    if !s.starts_with('[') {
        return None;
    }
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'') | (None, '"') => quote = Some(c),
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_predicate(inner: &str) -> Option<(&str, &str)> {
    let inner = inner.strip_prefix('@')?;
    let (attr, value) = inner.split_once('=')?;
    let attr = attr.trim();
    if attr.is_empty()
        || !attr
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    let value = value.trim();
    let quote = value.chars().next()?;
    if (quote != '\'' && quote != '"') || value.len() < 2 || !value.ends_with(quote) {
        return None;
    }
    Some((attr, &value[1..value.len() - 1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
    <html>
    <body>
        <div id="main" class="g extra">
            text before
            <!-- comment -->
            <span class="st">Exact</span>
            <span class="st other">Loose</span>
            <g-img class="_ygd"><img src="/thumb.png"></g-img>
            <div><h3>Nested</h3></div>
        </div>
    </body>
    </html>
    "#;

    fn main_node(dom: &SerpDocument) -> ElementRef<'_> {
        dom.css_query_document("#main").first_element().unwrap()
    }

    #[test]
    fn test_resolve_and_page_offset() {
        let dom = SerpDocument::new("<html></html>", "https://www.google.com/search?q=rust&start=20").unwrap();
        assert_eq!(dom.resolve("/x"), "https://www.google.com/x");
        assert_eq!(dom.resolve("https://example.com/a"), "https://example.com/a");
        assert_eq!(dom.param_value("q"), Some("rust".to_string()));
        assert_eq!(dom.page_offset("start"), 20);
        assert_eq!(dom.page_offset("missing"), 0);
    }

    #[test]
    fn test_invalid_url() {
        let err = SerpDocument::new("", "not a url").unwrap_err();
        assert!(matches!(err, ParseError::InvalidUrl { .. }));
    }

    #[test]
    fn test_css_query_scoped() {
        let dom = SerpDocument::new(PAGE, "https://www.google.com/search").unwrap();
        let main = main_node(&dom);
        assert_eq!(dom.css_query(".st", main).len(), 2);
        assert!(dom.css_query("((", main).is_empty());
        // the scope element itself is not part of the result
        assert!(dom.css_query(".g", main).is_empty());
    }

    #[test]
    fn test_node_accessors() {
        let dom = SerpDocument::new(PAGE, "https://www.google.com/search").unwrap();
        let main = main_node(&dom);
        assert!(main.has_class("g"));
        assert!(main.has_classes(&["g", "extra"]));
        assert!(!main.has_classes(&["g", "missing"]));
        assert_eq!(main.attr("id"), Some("main"));
        assert_eq!(main.tag_name(), "div");

        let children = main.child_nodes();
        assert!(children.len() > children.elements().count());
        assert_eq!(children.elements().count(), 4);
    }

    #[test]
    fn test_path_query_exact_attribute() {
        let dom = SerpDocument::new(PAGE, "https://www.google.com/search").unwrap();
        let main = main_node(&dom);

        let exact = dom.path_query("descendant::span[@class='st']", main);
        assert_eq!(exact.len(), 1);
        assert_eq!(exact.first_element().unwrap().text_content(), "Exact");

        let thumb = dom.path_query("descendant::g-img[@class='_ygd']/img", main);
        assert_eq!(thumb.first_element().unwrap().attr("src"), Some("/thumb.png"));

        let heading = dom.path_query("descendant::h3", main);
        assert_eq!(heading.first_element().unwrap().text_content(), "Nested");

        // h3 is a grandchild, not a child
        assert!(dom.path_query("child::h3", main).is_empty());
        assert_eq!(dom.path_query("div/h3", main).len(), 1);
    }

    #[test]
    fn test_compile_path_errors() {
        assert!(compile_path("").is_err());
        assert!(compile_path("ancestor::div").is_err());
        assert!(compile_path("descendant::span[@class='st'").is_err());
        assert!(compile_path("descendant::span[class='st']").is_err());
        assert!(compile_path("div//span").is_err());
        assert!(compile_path("descendant::a[@href='/a/b']").is_ok());
    }
}
