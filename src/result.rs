//! Result records and the ranked result set
//!
//! A [`ResultRecord`] is a set of [`ResultType`] tags plus named fields.
//! Fields are either computed when the record is built or deferred: a
//! producer closure that runs on first read and is memoized from then on.
//! A producer that fails yields an absent field instead of an error, so a
//! consumer reading one optional field is never affected by another.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::unsync::Lazy;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ParseError;
use crate::media::MediaReference;

/// Classification of a result record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    Classical,
    ClassicalLarge,
    ClassicalIllustrated,
    ClassicalVideo,
    ClassicalSitelink,
    AnswerBox,
    VideoGroup,
    VideoGroupVideo,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Classical => "classical",
            ResultType::ClassicalLarge => "classical_large",
            ResultType::ClassicalIllustrated => "classical_illustrated",
            ResultType::ClassicalVideo => "classical_video",
            ResultType::ClassicalSitelink => "classical_sitelink",
            ResultType::AnswerBox => "answer_box",
            ResultType::VideoGroup => "video_group",
            ResultType::VideoGroupVideo => "video_group_video",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a record field
#[derive(Debug)]
pub enum FieldValue<'a> {
    Text(String),
    Bool(bool),
    Media(MediaReference),
    Records(Vec<ResultRecord<'a>>),
}

impl<'a> FieldValue<'a> {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Media(media) => serde_json::to_value(media).unwrap_or(Value::Null),
            FieldValue::Records(records) => {
                Value::Array(records.iter().map(ResultRecord::to_json).collect())
            }
        }
    }
}

type Resolver<'a> = Box<dyn FnOnce() -> Option<FieldValue<'a>> + 'a>;

enum Field<'a> {
    Immediate(Option<FieldValue<'a>>),
    Deferred(Lazy<Option<FieldValue<'a>>, Resolver<'a>>),
}

impl<'a> Field<'a> {
    fn deferred<F>(name: &'static str, producer: F) -> Self
    where
        F: FnOnce() -> Result<Option<FieldValue<'a>>, ParseError> + 'a,
    {
        let resolver: Resolver<'a> = Box::new(move || match producer() {
            Ok(value) => value,
            Err(e) => {
                debug!(field = name, error = %e, "deferred field unavailable");
                None
            }
        });
        Field::Deferred(Lazy::new(resolver))
    }

    fn resolve(&self) -> Option<&FieldValue<'a>> {
        match self {
            Field::Immediate(value) => value.as_ref(),
            Field::Deferred(lazy) => Lazy::force(lazy).as_ref(),
        }
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Immediate(value) => f.debug_tuple("Immediate").field(value).finish(),
            Field::Deferred(lazy) => match Lazy::get(lazy) {
                Some(value) => f.debug_tuple("Deferred").field(value).finish(),
                None => f.write_str("Deferred(<pending>)"),
            },
        }
    }
}

/// One extracted item of the page
#[derive(Debug)]
pub struct ResultRecord<'a> {
    types: Vec<ResultType>,
    fields: BTreeMap<&'static str, Field<'a>>,
}

impl<'a> ResultRecord<'a> {
    pub fn new(result_type: ResultType) -> Self {
        Self {
            types: vec![result_type],
            fields: BTreeMap::new(),
        }
    }

    pub fn with_type(mut self, result_type: ResultType) -> Self {
        self.add_type(result_type);
        self
    }

    pub fn add_type(&mut self, result_type: ResultType) {
        if !self.types.contains(&result_type) {
            self.types.push(result_type);
        }
    }

    pub fn with_value(self, name: &'static str, value: FieldValue<'a>) -> Self {
        self.with_optional(name, Some(value))
    }

    pub fn with_text(self, name: &'static str, value: impl Into<String>) -> Self {
        self.with_value(name, FieldValue::text(value))
    }

    /// Store a field that may be absent
    pub fn with_optional(mut self, name: &'static str, value: Option<FieldValue<'a>>) -> Self {
        self.fields.insert(name, Field::Immediate(value));
        self
    }

    /// Store a field computed on first read
    pub fn with_deferred<F>(mut self, name: &'static str, producer: F) -> Self
    where
        F: FnOnce() -> Result<Option<FieldValue<'a>>, ParseError> + 'a,
    {
        self.fields.insert(name, Field::deferred(name, producer));
        self
    }

    pub fn types(&self) -> &[ResultType] {
        &self.types
    }

    pub fn is(&self, result_type: ResultType) -> bool {
        self.types.contains(&result_type)
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.keys().copied().collect()
    }

    /// True when the record declares the field, whatever its value
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Read a field. Deferred fields are produced here, once.
    pub fn get(&self, name: &str) -> Option<&FieldValue<'a>> {
        self.fields.get(name).and_then(Field::resolve)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn media(&self, name: &str) -> Option<&MediaReference> {
        match self.get(name)? {
            FieldValue::Media(media) => Some(media),
            _ => None,
        }
    }

    pub fn records(&self, name: &str) -> Option<&[ResultRecord<'a>]> {
        match self.get(name)? {
            FieldValue::Records(records) => Some(records),
            _ => None,
        }
    }

    /// Resolve every field into JSON: `{"types": [...], "data": {...}}`
    pub fn to_json(&self) -> Value {
        let mut data = Map::new();
        for (name, field) in &self.fields {
            let value = field.resolve().map(FieldValue::to_json).unwrap_or(Value::Null);
            data.insert(name.to_string(), value);
        }

        let mut out = Map::new();
        out.insert(
            "types".to_string(),
            Value::Array(
                self.types
                    .iter()
                    .map(|t| Value::String(t.as_str().to_string()))
                    .collect(),
            ),
        );
        out.insert("data".to_string(), Value::Object(data));
        Value::Object(out)
    }
}

/// Append-only, ranked list of records. The first record is ranked
/// `page_offset + 1` and each following one is ranked one higher.
#[derive(Debug, Default)]
pub struct IndexedResultSet<'a> {
    page_offset: usize,
    items: Vec<ResultRecord<'a>>,
}

impl<'a> IndexedResultSet<'a> {
    pub fn new(page_offset: usize) -> Self {
        Self {
            page_offset,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, record: ResultRecord<'a>) {
        self.items.push(record);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page_offset(&self) -> usize {
        self.page_offset
    }

    /// Rank given to the first record
    pub fn first_rank(&self) -> usize {
        self.page_offset + 1
    }

    /// Record at a 0-based position, with its rank
    pub fn get(&self, index: usize) -> Option<(usize, &ResultRecord<'a>)> {
        self.items
            .get(index)
            .map(|record| (self.first_rank() + index, record))
    }

    /// `(rank, record)` pairs in rank order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ResultRecord<'a>)> + '_ {
        let first = self.first_rank();
        self.items
            .iter()
            .enumerate()
            .map(move |(i, record)| (first + i, record))
    }

    pub fn ranks(&self) -> Vec<usize> {
        self.iter().map(|(rank, _)| rank).collect()
    }

    pub fn to_json(&self) -> Value {
        Value::Array(
            self.iter()
                .map(|(rank, record)| {
                    let mut item = match record.to_json() {
                        Value::Object(map) => map,
                        _ => Map::new(),
                    };
                    item.insert("rank".to_string(), Value::from(rank));
                    Value::Object(item)
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_deferred_field_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let record = ResultRecord::new(ResultType::Classical).with_deferred("title", move || {
            counter.set(counter.get() + 1);
            Ok(Some(FieldValue::text("Title")))
        });

        assert_eq!(calls.get(), 0);
        assert_eq!(record.text("title"), Some("Title"));
        assert_eq!(record.text("title"), Some("Title"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failing_producer_reads_as_absent() {
        let record = ResultRecord::new(ResultType::AnswerBox)
            .with_deferred("url", || Err(ParseError::missing("answer_box", "a")))
            .with_text("title", "Kept");

        assert!(record.has_field("url"));
        assert_eq!(record.field_names(), vec!["title", "url"]);
        assert!(record.get("url").is_none());
        assert_eq!(record.text("title"), Some("Kept"));
        assert_eq!(record.to_json()["data"]["url"], Value::Null);
    }

    #[test]
    fn test_types_are_deduplicated() {
        let record = ResultRecord::new(ResultType::Classical)
            .with_type(ResultType::ClassicalLarge)
            .with_type(ResultType::Classical);
        assert_eq!(
            record.types(),
            &[ResultType::Classical, ResultType::ClassicalLarge]
        );
        assert!(record.is(ResultType::ClassicalLarge));
        assert!(!record.is(ResultType::AnswerBox));
    }

    #[test]
    fn test_nested_records() {
        let record = ResultRecord::new(ResultType::VideoGroup).with_deferred("videos", || {
            Ok(Some(FieldValue::Records(vec![
                ResultRecord::new(ResultType::VideoGroupVideo).with_text("title", "One"),
                ResultRecord::new(ResultType::VideoGroupVideo).with_text("title", "Two"),
            ])))
        });

        let videos = record.records("videos").unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[1].text("title"), Some("Two"));

        let json = record.to_json();
        assert_eq!(json["types"][0], "video_group");
        assert_eq!(json["data"]["videos"][0]["data"]["title"], "One");
    }

    #[test]
    fn test_ranks_follow_page_offset() {
        let mut results = IndexedResultSet::new(10);
        assert_eq!(results.first_rank(), 11);
        for title in ["a", "b", "c"] {
            results.push(ResultRecord::new(ResultType::Classical).with_text("title", title));
        }

        assert_eq!(results.ranks(), vec![11, 12, 13]);
        let (rank, record) = results.get(1).unwrap();
        assert_eq!(rank, 12);
        assert_eq!(record.text("title"), Some("b"));
        assert!(results.get(3).is_none());

        let json = results.to_json();
        assert_eq!(json[2]["rank"], 13);
        assert_eq!(json[2]["data"]["title"], "c");
    }
}
