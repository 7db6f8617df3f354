//! Rule-driven matching engine
//!
//! The engine walks candidate element groups in document order and hands
//! each one to the first [`ParsingRule`] that claims it. A rule may claim a
//! node ([`MatchOutcome::Matched`]), decline it ([`MatchOutcome::NoMatch`]),
//! mark it as not extractable ([`MatchOutcome::Stop`]), or point the engine
//! at the nodes that really hold the content ([`MatchOutcome::Redirect`]).
//!
//! A node that no rule handles is treated as a transparent wrapper: the
//! engine descends into its children and keeps matching there. Pages insert
//! anonymous wrapper `div`s often enough that this is the normal path.

use scraper::ElementRef;
use tracing::{debug, info, trace};

use crate::dom::{DomNode, NodeExt, NodeList, SerpDocument};
use crate::error::ParseError;
use crate::result::IndexedResultSet;

/// Answer of a rule probing one node
#[derive(Debug, Clone)]
pub enum MatchOutcome<'a> {
    /// The rule does not own this node
    NoMatch,
    /// The rule owns this node, `extract` will be called
    Matched,
    /// The node holds nothing to extract, do not descend into it
    Stop,
    /// Match these nodes instead of the probed one
    Redirect(NodeList<'a>),
}

/// A recognizer for one page pattern.
///
/// `probe` may update state on the rule (see the classical result rule,
/// which learns wrapper classes), so the engine calls it at most once per
/// node and never speculatively. Rules are not meant to be shared across
/// concurrent parses.
pub trait ParsingRule {
    fn name(&self) -> &'static str;

    fn probe<'a>(&mut self, dom: &'a SerpDocument, node: ElementRef<'a>) -> MatchOutcome<'a>;

    /// Append the records of a node `probe` answered `Matched` for.
    /// A missing required element fails the whole parse.
    fn extract<'a>(
        &self,
        dom: &'a SerpDocument,
        node: ElementRef<'a>,
        results: &mut IndexedResultSet<'a>,
    ) -> Result<(), ParseError>;
}

/// What a page kind provides to the engine: its rules, in priority order,
/// and where matching starts.
pub trait PageLayout {
    fn generate_rules(&self) -> Vec<Box<dyn ParsingRule>>;

    fn parsable_items<'a>(&self, dom: &'a SerpDocument) -> NodeList<'a>;

    /// Number of results on the pages before this one
    fn page_offset(&self, dom: &SerpDocument) -> usize {
        dom.page_offset("start")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeHandling {
    Handled,
    Stopped,
    Unhandled,
}

/// Matching engine for one page layout.
///
/// The rule list is built on first use and kept for the life of the
/// parser, so learning rules carry what they learned into later parses.
pub struct Parser<L: PageLayout> {
    layout: L,
    rules: Option<Vec<Box<dyn ParsingRule>>>,
}

impl<L: PageLayout> Parser<L> {
    pub fn new(layout: L) -> Self {
        Self {
            layout,
            rules: None,
        }
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn rules(&mut self) -> &mut [Box<dyn ParsingRule>] {
        let layout = &self.layout;
        self.rules.get_or_insert_with(|| layout.generate_rules())
    }

    /// Parse a page into ranked records
    pub fn parse<'a>(&mut self, dom: &'a SerpDocument) -> Result<IndexedResultSet<'a>, ParseError> {
        let groups = self.layout.parsable_items(dom);
        let mut results = IndexedResultSet::new(self.layout.page_offset(dom));
        self.match_groups(&groups, &mut results, dom)?;
        info!(
            url = %dom.url(),
            candidates = groups.len(),
            results = results.len(),
            "parsed results page"
        );
        Ok(results)
    }

    /// Match `nodes` against the rules, appending to `results`
    pub fn match_groups<'a>(
        &mut self,
        nodes: &NodeList<'a>,
        results: &mut IndexedResultSet<'a>,
        dom: &'a SerpDocument,
    ) -> Result<(), ParseError> {
        match_groups(self.rules(), nodes, results, dom)
    }
}

impl<L: PageLayout + Default> Default for Parser<L> {
    fn default() -> Self {
        Self::new(L::default())
    }
}

fn match_groups<'a>(
    rules: &mut [Box<dyn ParsingRule>],
    nodes: &NodeList<'a>,
    results: &mut IndexedResultSet<'a>,
    dom: &'a SerpDocument,
) -> Result<(), ParseError> {
    for node in nodes {
        let element = match node {
            DomNode::Element(el) => *el,
            DomNode::Other => continue,
        };

        if match_node(rules, element, results, dom)? == NodeHandling::Unhandled {
            // unidentified wrapper, look inside
            trace!(tag = element.tag_name(), "no rule matched, descending");
            match_groups(rules, &element.child_nodes(), results, dom)?;
        }
    }
    Ok(())
}

fn match_node<'a>(
    rules: &mut [Box<dyn ParsingRule>],
    element: ElementRef<'a>,
    results: &mut IndexedResultSet<'a>,
    dom: &'a SerpDocument,
) -> Result<NodeHandling, ParseError> {
    for i in 0..rules.len() {
        let outcome = rules[i].probe(dom, element);
        match outcome {
            MatchOutcome::NoMatch => continue,
            MatchOutcome::Matched => {
                debug!(rule = rules[i].name(), "matched");
                rules[i].extract(dom, element, results)?;
                return Ok(NodeHandling::Handled);
            }
            MatchOutcome::Redirect(nodes) => {
                debug!(rule = rules[i].name(), nodes = nodes.len(), "redirected");
                match_groups(rules, &nodes, results, dom)?;
                return Ok(NodeHandling::Handled);
            }
            MatchOutcome::Stop => {
                debug!(rule = rules[i].name(), "stopped");
                return Ok(NodeHandling::Stopped);
            }
        }
    }
    Ok(NodeHandling::Unhandled)
}
