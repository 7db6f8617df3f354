//! Answer boxes (featured snippets)

use scraper::ElementRef;

use crate::dom::{NodeExt, SerpDocument};
use crate::error::ParseError;
use crate::parser::{MatchOutcome, ParsingRule};
use crate::result::{FieldValue, IndexedResultSet, ResultRecord, ResultType};

const NAME: &str = "answer_box";

#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerBox;

impl ParsingRule for AnswerBox {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe<'a>(&mut self, dom: &'a SerpDocument, node: ElementRef<'a>) -> MatchOutcome<'a> {
        let is_candidate = !node.has_class("kno-kp")
            && node.has_class("g")
            && !dom.css_query(".g.mnr-c.g-blk", node).is_empty();

        // ._Z7 is the older heading marker
        if is_candidate
            && (dom.css_query(".ifM9O > h2", node).len() == 1
                || dom.css_query("._Z7", node).len() == 1)
        {
            MatchOutcome::Matched
        } else {
            MatchOutcome::NoMatch
        }
    }

    fn extract<'a>(
        &self,
        dom: &'a SerpDocument,
        node: ElementRef<'a>,
        results: &mut IndexedResultSet<'a>,
    ) -> Result<(), ParseError> {
        let record = ResultRecord::new(ResultType::AnswerBox)
            .with_deferred("title", move || {
                let title = dom
                    .css_query(".rc .r a, .rc a", node)
                    .first_element()
                    .or_else(|| dom.css_query("h3", node).first_element());
                Ok(title.map(|el| FieldValue::text(el.text_content().trim())))
            })
            .with_deferred("url", move || {
                let link = dom
                    .css_query(".rc .r a, .rc a, .g a", node)
                    .first_element()
                    .ok_or(ParseError::missing(NAME, "a"))?;
                Ok(link.attr("href").map(|href| FieldValue::Text(dom.resolve(href))))
            })
            .with_deferred("destination", move || {
                let cite = dom
                    .css_query(".rc .r cite, .rc cite, .g cite", node)
                    .first_element()
                    .ok_or(ParseError::missing(NAME, "cite"))?;
                Ok(Some(FieldValue::text(cite.text_content().trim())))
            })
            .with_deferred("description", move || {
                let desc = dom
                    .css_query(
                        ".mod .LGOjhe, .ifM9O .LGOjhe, .mod .Y0NH2b, .mod .Crs1tb, .mod > div",
                        node,
                    )
                    .first_element()
                    .ok_or(ParseError::missing(NAME, "description"))?;
                Ok(Some(FieldValue::text(desc.text_content().trim())))
            });

        results.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"
    <div class="g" id="box">
        <div class="g mnr-c g-blk">
            <div class="ifM9O">
                <h2>Featured snippet from the web</h2>
                <div class="mod"><span class="LGOjhe">Rust is a systems language.</span></div>
            </div>
            <div class="rc">
                <div class="r"><a href="https://www.rust-lang.org/"><h3>Rust</h3></a></div>
                <cite>www.rust-lang.org</cite>
            </div>
        </div>
    </div>
    "#;

    #[test]
    fn test_answer_box() {
        let dom = SerpDocument::new(HTML, "https://www.google.com/search?q=rust").unwrap();
        let node = dom.css_query_document("#box").first_element().unwrap();
        let mut rule = AnswerBox;
        assert!(matches!(rule.probe(&dom, node), MatchOutcome::Matched));

        let mut results = IndexedResultSet::new(0);
        rule.extract(&dom, node, &mut results).unwrap();
        let (_, record) = results.get(0).unwrap();
        assert_eq!(record.types(), &[ResultType::AnswerBox]);
        assert_eq!(record.text("title"), Some("Rust"));
        assert_eq!(record.text("url"), Some("https://www.rust-lang.org/"));
        assert_eq!(record.text("destination"), Some("www.rust-lang.org"));
        assert_eq!(record.text("description"), Some("Rust is a systems language."));
    }

    #[test]
    fn test_inner_block_alone_does_not_match() {
        let dom = SerpDocument::new(HTML, "https://www.google.com/search?q=rust").unwrap();
        let inner = dom.css_query_document(".g.mnr-c").first_element().unwrap();
        assert!(matches!(AnswerBox.probe(&dom, inner), MatchOutcome::NoMatch));
    }

    #[test]
    fn test_missing_fields_read_as_absent() {
        let html = r#"<div class="g" id="box"><div class="g mnr-c g-blk"><div class="_Z7"></div></div></div>"#;
        let dom = SerpDocument::new(html, "https://www.google.com/search").unwrap();
        let node = dom.css_query_document("#box").first_element().unwrap();
        let mut rule = AnswerBox;
        assert!(matches!(rule.probe(&dom, node), MatchOutcome::Matched));

        let mut results = IndexedResultSet::new(0);
        rule.extract(&dom, node, &mut results).unwrap();
        let (_, record) = results.get(0).unwrap();
        assert!(record.get("title").is_none());
        assert!(record.get("url").is_none());
        assert!(record.get("destination").is_none());
        assert!(record.get("description").is_none());
    }
}
