//! Search results page parser
//!
//! Extracts ranked records from search engine result pages:
//! - Classical (organic) results, with site links, thumbnails and video markers
//! - Answer boxes
//! - Video groups
//!
//! Records are produced by an ordered list of rules matched against the page
//! tree. Wrappers no rule recognizes are walked through transparently, and
//! most record fields are only computed when read.

pub mod config;
pub mod dom;
pub mod error;
pub mod ffi;
pub mod media;
pub mod natural;
pub mod parser;
pub mod rules;
pub mod result;

pub use config::ParserConfig;
pub use dom::{DomNode, NodeExt, NodeList, SerpDocument};
pub use error::ParseError;
pub use ffi::*;
pub use media::{create_from_src, MediaReference};
pub use natural::{NaturalLayout, NaturalParser};
pub use parser::{MatchOutcome, PageLayout, Parser, ParsingRule};
pub use result::{FieldValue, IndexedResultSet, ResultRecord, ResultType};
