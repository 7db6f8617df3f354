//! Parsing rules
//!
//! Each rule recognizes one page pattern.

mod answer_box;
mod classical;
mod structural;
mod video_group;

pub use answer_box::*;
pub use classical::*;
pub use structural::*;
pub use video_group::*;
