//! Media references (thumbnails, video previews)

use serde::Serialize;

/// An image referenced by a result: either a link or inline base64 data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaReference {
    Url { url: String },
    Embedded { mime: String, data: String },
}

/// Build a media reference from an `img` src attribute.
/// `data:<mime>;base64,<payload>` sources are kept encoded.
pub fn create_from_src(src: &str) -> MediaReference {
    let src = src.trim();
    if let Some(rest) = src.strip_prefix("data:") {
        if let Some((header, payload)) = rest.split_once(',') {
            if let Some(mime) = header.strip_suffix(";base64") {
                return MediaReference::Embedded {
                    mime: mime.to_string(),
                    data: payload.to_string(),
                };
            }
        }
    }
    MediaReference::Url {
        url: src.to_string(),
    }
}
