//! Video carousels as shown on mobile result pages

use scraper::ElementRef;

use crate::dom::{NodeExt, SerpDocument};
use crate::error::ParseError;
use crate::media::create_from_src;
use crate::parser::{MatchOutcome, ParsingRule};
use crate::result::{FieldValue, IndexedResultSet, ResultRecord, ResultType};

const NAME: &str = "video_group";

#[derive(Debug, Clone, Copy, Default)]
pub struct VideoGroup;

impl ParsingRule for VideoGroup {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe<'a>(&mut self, dom: &'a SerpDocument, node: ElementRef<'a>) -> MatchOutcome<'a> {
        if dom.css_query(".BFJZOc", node).len() == 1 {
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
        let record = ResultRecord::new(ResultType::VideoGroup).with_deferred("videos", move || {
            Ok(Some(FieldValue::Records(videos(dom, node))))
        });
        results.push(record);
        Ok(())
    }
}

fn videos<'a>(dom: &'a SerpDocument, node: ElementRef<'a>) -> Vec<ResultRecord<'a>> {
    dom.css_query(".P94G9b", node)
        .elements()
        .map(|card| {
            ResultRecord::new(ResultType::VideoGroupVideo)
                .with_deferred("image", move || {
                    let img = dom
                        .css_query("g-img img", card)
                        .first_element()
                        .ok_or(ParseError::missing(NAME, "g-img img"))?;
                    Ok(img
                        .attr("src")
                        .filter(|src| !src.is_empty())
                        .map(|src| FieldValue::Media(create_from_src(src))))
                })
                .with_deferred("title", move || {
                    let title = dom
                        .css_query(".wCIBKb", card)
                        .first_element()
                        .ok_or(ParseError::missing(NAME, ".wCIBKb"))?;
                    Ok(Some(FieldValue::text(title.text_content().trim())))
                })
                .with_deferred("url", move || {
                    let link = dom
                        .css_query("g-inner-card a", card)
                        .first_element()
                        .ok_or(ParseError::missing(NAME, "g-inner-card a"))?;
                    Ok(link.attr("href").map(|href| FieldValue::Text(dom.resolve(href))))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaReference;

    #[test]
    fn test_video_group() {
        let html = r#"
        <div id="group">
            <div class="BFJZOc">Videos</div>
            <div class="P94G9b">
                <g-inner-card><a href="https://youtube.com/watch?v=1">
                    <g-img><img src="https://i.ytimg.com/1.jpg"></g-img>
                    <div class="wCIBKb">First video</div>
                </a></g-inner-card>
            </div>
            <div class="P94G9b">
                <g-inner-card><a href="https://youtube.com/watch?v=2">
                    <div class="wCIBKb">Second video</div>
                </a></g-inner-card>
            </div>
        </div>
        "#;
        let dom = SerpDocument::new(html, "https://www.google.com/search?q=rust").unwrap();
        let node = dom.css_query_document("#group").first_element().unwrap();
        let mut rule = VideoGroup;
        assert!(matches!(rule.probe(&dom, node), MatchOutcome::Matched));

        let mut results = IndexedResultSet::new(0);
        rule.extract(&dom, node, &mut results).unwrap();
        let (_, record) = results.get(0).unwrap();
        assert!(record.is(ResultType::VideoGroup));

        let videos = record.records("videos").unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].text("title"), Some("First video"));
        assert_eq!(videos[0].text("url"), Some("https://youtube.com/watch?v=1"));
        assert_eq!(
            videos[0].media("image"),
            Some(&MediaReference::Url {
                url: "https://i.ytimg.com/1.jpg".to_string()
            })
        );
        assert!(videos[1].get("image").is_none());
        assert_eq!(videos[1].text("title"), Some("Second video"));
    }

    #[test]
    fn test_no_marker_no_match() {
        let dom = SerpDocument::new(r#"<div id="group"><div class="P94G9b"></div></div>"#, "https://www.google.com/").unwrap();
        let node = dom.css_query_document("#group").first_element().unwrap();
        assert!(matches!(VideoGroup.probe(&dom, node), MatchOutcome::NoMatch));
    }
}
