use serde::{Deserialize, Serialize};

/// A reference to an uploaded media file.
///
/// Only the user-visible parts of a media reference are audited: its
/// location, description, and alternate link. Size, file name, and checksum
/// are storage metadata and change whenever a file is re-processed, so the
/// diff engine's default handler for this type never reports them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Where the file is served from.
    pub url: String,
    /// Human-readable description / alt text.
    pub description: String,
    /// Alternate link (e.g. an external video page).
    pub link: String,
    /// Original upload name.
    pub file_name: String,
    /// Size in bytes.
    pub file_size: u64,
    /// Content checksum used for cache busting.
    pub checksum: Option<String>,
}

impl Media {
    /// Field names compared when auditing a media reference, in report order.
    pub const AUDITED_FIELDS: [&'static str; 3] = ["url", "description", "link"];

    /// A media reference pointing at `url` with no other metadata.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Builder-style description setter.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder-style link setter.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audited_fields_exist_in_serialized_form() {
        let media = Media::new("/a.png").with_description("logo").with_link("https://x");
        let json = serde_json::to_value(&media).unwrap();
        for field in Media::AUDITED_FIELDS {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert_eq!(json["url"], "/a.png");
        assert_eq!(json["description"], "logo");
    }
}
