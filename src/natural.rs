//! Organic (natural) results page

use tracing::debug;

use crate::config::ParserConfig;
use crate::dom::{NodeList, SerpDocument};
use crate::parser::{PageLayout, Parser, ParsingRule};
use crate::rules::{AnswerBox, ClassicalResult, IgnoredElement, ResultGroup, VideoGroup};

/// Layout of a desktop or mobile organic results page
#[derive(Debug, Clone, Default)]
pub struct NaturalLayout {
    config: ParserConfig,
}

impl NaturalLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }
}

impl PageLayout for NaturalLayout {
    fn generate_rules(&self) -> Vec<Box<dyn ParsingRule>> {
        // most specific first: answer boxes are also `.g` blocks
        vec![
            Box::new(IgnoredElement),
            Box::new(ResultGroup),
            Box::new(AnswerBox),
            Box::new(ClassicalResult::new(
                &self.config.wrapper_class,
                &self.config.web_results_marker,
            )),
            Box::new(VideoGroup),
        ]
    }

    fn parsable_items<'a>(&self, dom: &'a SerpDocument) -> NodeList<'a> {
        for selector in &self.config.candidate_selectors {
            let items = dom.css_query_document(selector);
            if !items.is_empty() {
                debug!(selector = %selector, count = items.len(), "found result groups");
                return items;
            }
        }
        NodeList::default()
    }

    fn page_offset(&self, dom: &SerpDocument) -> usize {
        dom.page_offset(&self.config.pagination_param)
    }
}

pub type NaturalParser = Parser<NaturalLayout>;
