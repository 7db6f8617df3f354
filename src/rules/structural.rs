//! Rules that shape the traversal instead of producing records

use scraper::ElementRef;

use crate::dom::{NodeExt, SerpDocument};
use crate::error::ParseError;
use crate::parser::{MatchOutcome, ParsingRule};
use crate::result::IndexedResultSet;

/// Elements that never hold results. Stops descent into them.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoredElement;

const IGNORED_TAGS: &[&str] = &["script", "style", "noscript", "hr"];

impl ParsingRule for IgnoredElement {
    fn name(&self) -> &'static str {
        "ignored_element"
    }

    fn probe<'a>(&mut self, _dom: &'a SerpDocument, node: ElementRef<'a>) -> MatchOutcome<'a> {
        if IGNORED_TAGS.contains(&node.tag_name()) {
            MatchOutcome::Stop
        } else {
            MatchOutcome::NoMatch
        }
    }

    /// Never called: this rule only answers `Stop` or `NoMatch`.
    fn extract<'a>(
        &self,
        _dom: &'a SerpDocument,
        _node: ElementRef<'a>,
        _results: &mut IndexedResultSet<'a>,
    ) -> Result<(), ParseError> {
        Ok(())
    }
}

/// `div.srg` groups several results under one wrapper; match its children
/// as if they were top-level groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultGroup;

impl ParsingRule for ResultGroup {
    fn name(&self) -> &'static str {
        "result_group"
    }

    fn probe<'a>(&mut self, _dom: &'a SerpDocument, node: ElementRef<'a>) -> MatchOutcome<'a> {
        if node.has_class("srg") {
            MatchOutcome::Redirect(node.child_nodes())
        } else {
            MatchOutcome::NoMatch
        }
    }

    /// Never called: this rule only answers `Redirect` or `NoMatch`.
    fn extract<'a>(
        &self,
        _dom: &'a SerpDocument,
        _node: ElementRef<'a>,
        _results: &mut IndexedResultSet<'a>,
    ) -> Result<(), ParseError> {
        Ok(())
    }
}
