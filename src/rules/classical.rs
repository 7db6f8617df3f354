//! Classical (organic) search results
//!
//! Matches `div.g` blocks. The content wrapper inside them has changed class
//! several times; when the configured class is missing but the block sits
//! under the "Web results" heading, the rule takes the class of the first
//! wrapper `div` it finds and uses it for every later block.

use scraper::ElementRef;
use tracing::debug;

use crate::dom::{NodeExt, SerpDocument};
use crate::error::ParseError;
use crate::media::create_from_src;
use crate::parser::{MatchOutcome, ParsingRule};
use crate::result::{FieldValue, IndexedResultSet, ResultRecord, ResultType};

const NAME: &str = "classical_result";
const SITELINK: &str = "classical_sitelink";

#[derive(Debug, Clone)]
pub struct ClassicalResult {
    wrapper_classes: Vec<String>,
    web_results_marker: String,
    learned: bool,
}

impl ClassicalResult {
    pub fn new(wrapper_class: &str, web_results_marker: &str) -> Self {
        Self {
            wrapper_classes: split_classes(wrapper_class),
            web_results_marker: web_results_marker.to_string(),
            learned: false,
        }
    }

    /// Classes the content wrapper currently carries
    pub fn wrapper_classes(&self) -> &[String] {
        &self.wrapper_classes
    }

    /// True once a wrapper class has been taken from the page
    pub fn has_learned(&self) -> bool {
        self.learned
    }

    // Class membership is tested on the elements directly: learned class
    // names are not always valid CSS identifiers ("1x", "a:b").
    fn is_wrapper(&self, el: &ElementRef<'_>) -> bool {
        !self.wrapper_classes.is_empty() && self.wrapper_classes.iter().all(|c| el.has_class(c))
    }

    fn wrappers<'a>(&self, dom: &'a SerpDocument, node: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        dom.css_query("*", node)
            .elements()
            .filter(|el| self.is_wrapper(el))
            .collect()
    }

    fn under_web_results_heading(&self, dom: &SerpDocument, node: ElementRef<'_>) -> bool {
        dom.css_query("h2", node)
            .first_element()
            .map(|h| h.text_content().trim() == self.web_results_marker)
            .unwrap_or(false)
    }

    // Take the class of the first div child, going through divs without one
    fn learn_wrapper_class(&mut self, node: ElementRef<'_>) -> bool {
        let Some(child) = node.child_nodes().elements().find(|el| el.tag_name() == "div") else {
            return false;
        };

        match child.attr("class").map(str::trim) {
            Some(class) if !class.is_empty() => {
                self.wrapper_classes = split_classes(class);
                self.learned = true;
                debug!(classes = ?self.wrapper_classes, "learned classical result wrapper");
                true
            }
            _ => self.learn_wrapper_class(child),
        }
    }

    fn is_large(dom: &SerpDocument, node: ElementRef<'_>) -> bool {
        dom.css_query(".nrgt", node).len() == 1
    }
}

impl Default for ClassicalResult {
    fn default() -> Self {
        Self::new("rc", "Web results")
    }
}

fn split_classes(class_attr: &str) -> Vec<String> {
    class_attr.split_whitespace().map(String::from).collect()
}

impl ParsingRule for ClassicalResult {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe<'a>(&mut self, dom: &'a SerpDocument, node: ElementRef<'a>) -> MatchOutcome<'a> {
        if !node.has_class("g") || node.has_classes(&["mnr-c", "g-blk"]) {
            return MatchOutcome::NoMatch;
        }

        if self.wrappers(dom, node).len() == 1 {
            return MatchOutcome::Matched;
        }

        if self.under_web_results_heading(dom, node) {
            self.learn_wrapper_class(node);
            return MatchOutcome::Matched;
        }

        MatchOutcome::NoMatch
    }

    fn extract<'a>(
        &self,
        dom: &'a SerpDocument,
        node: ElementRef<'a>,
        results: &mut IndexedResultSet<'a>,
    ) -> Result<(), ParseError> {
        let anchor = dom
            .css_query("a", node)
            .first_element()
            .ok_or(ParseError::missing(NAME, "a"))?;

        let heading = dom
            .path_query("descendant::h3", node)
            .first_element()
            .ok_or(ParseError::missing(NAME, "h3"))?;

        let destination = dom
            .css_query("div.f cite, div.TbwUpd cite", node)
            .first_element()
            .or_else(|| dom.css_query("cite", node).first_element())
            .ok_or(ParseError::missing(NAME, "cite"))?;

        let description = dom
            .path_query("descendant::span[@class='st']", node)
            .first_element()
            .or_else(|| {
                // second child of the wrapper, when it is a div
                self.wrappers(dom, node).into_iter().find_map(|wrapper| {
                    let second = wrapper.child_nodes().elements().nth(1)?;
                    if second.tag_name() != "div" {
                        return None;
                    }
                    dom.css_query("span", second).first_element()
                })
            });

        let mut record = ResultRecord::new(ResultType::Classical)
            .with_text("title", heading.text_content().trim())
            .with_optional(
                "url",
                anchor.attr("href").map(|href| FieldValue::Text(dom.resolve(href))),
            )
            .with_text("destination", destination.text_content().trim())
            // mobile descriptions come with leading whitespace
            .with_optional(
                "description",
                description.map(|d| FieldValue::text(d.text_content().trim())),
            )
            .with_deferred("isAmp", move || {
                Ok(Some(FieldValue::Bool(!dom.css_query(".amp_r", node).is_empty())))
            });

        if Self::is_large(dom, node) {
            record = record
                .with_type(ResultType::ClassicalLarge)
                .with_deferred("sitelinks", move || {
                    Ok(Some(FieldValue::Records(sitelinks(dom, node))))
                });
        }

        if let Some(thumb) = dom
            .path_query("descendant::g-img[@class='_ygd']/img", node)
            .first_element()
        {
            record = record
                .with_type(ResultType::ClassicalIllustrated)
                .with_deferred("thumb", move || {
                    Ok(thumb
                        .attr("src")
                        .map(|src| FieldValue::Media(create_from_src(src))))
                });
        }

        if dom.css_query(".vdur", node).len() == 1 {
            record = record
                .with_type(ResultType::ClassicalVideo)
                .with_value("videoLarge", FieldValue::Bool(false));
        }

        results.push(record);
        Ok(())
    }
}

fn sitelinks<'a>(dom: &'a SerpDocument, node: ElementRef<'a>) -> Vec<ResultRecord<'a>> {
    dom.css_query(".mslg .sld", node)
        .elements()
        .map(|item| {
            ResultRecord::new(ResultType::ClassicalSitelink)
                .with_deferred("title", move || {
                    let link = dom
                        .css_query("h3.r a", item)
                        .first_element()
                        .ok_or(ParseError::missing(SITELINK, "h3.r a"))?;
                    Ok(Some(FieldValue::text(link.text_content().trim())))
                })
                .with_deferred("description", move || {
                    let desc = dom
                        .css_query(".st", item)
                        .first_element()
                        .ok_or(ParseError::missing(SITELINK, ".st"))?;
                    Ok(Some(FieldValue::text(desc.text_content().trim())))
                })
                .with_deferred("url", move || {
                    let link = dom
                        .css_query("h3.r a", item)
                        .first_element()
                        .ok_or(ParseError::missing(SITELINK, "h3.r a"))?;
                    Ok(link.attr("href").map(|href| FieldValue::Text(dom.resolve(href))))
                })
        })
        .collect()
}
