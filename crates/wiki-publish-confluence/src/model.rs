//! Confluence content API payloads.

use serde::{Deserialize, Serialize};
use wiki_publish_core::{DirectoryError, RemoteDocument};

/// Result page of `GET /rest/api/content/search`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Content>,
}

/// A content entity, as returned with `expand=version,space`.
#[derive(Debug, Deserialize)]
pub struct Content {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: ContentVersion,
    #[serde(default)]
    pub space: ContentSpace,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentVersion {
    pub number: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentSpace {
    pub key: String,
}

impl From<Content> for RemoteDocument {
    fn from(content: Content) -> Self {
        Self {
            id: content.id,
            title: content.title,
            version: content.version.number,
            space_key: content.space.key,
        }
    }
}

/// Body of a page create or update request.
#[derive(Debug, Serialize)]
pub struct PagePayload<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: &'a str,
    pub ancestors: Vec<AncestorRef>,
    pub space: SpaceRef<'a>,
    pub body: PageBody<'a>,
    pub version: VersionRef,
}

#[derive(Debug, Serialize)]
pub struct AncestorRef {
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub struct SpaceRef<'a> {
    pub key: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PageBody<'a> {
    pub storage: StorageValue<'a>,
}

#[derive(Debug, Serialize)]
pub struct StorageValue<'a> {
    pub value: &'a str,
    pub representation: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VersionRef {
    pub number: u32,
}

/// Numeric content id of an ancestor page.
pub fn parse_ancestor(ancestor_id: &str) -> Result<u64, DirectoryError> {
    ancestor_id
        .parse::<u64>()
        .map_err(|_| DirectoryError::InvalidAncestor(ancestor_id.to_string()))
}

impl<'a> PagePayload<'a> {
    /// Page payload in wiki representation. `ancestor_id` must be numeric.
    pub fn new(
        title: &'a str,
        value: &'a str,
        space_key: &'a str,
        ancestor_id: &str,
        version: u32,
    ) -> Result<Self, DirectoryError> {
        let id = parse_ancestor(ancestor_id)?;
        Ok(Self {
            kind: "page",
            title,
            ancestors: vec![AncestorRef { id }],
            space: SpaceRef { key: space_key },
            body: PageBody {
                storage: StorageValue {
                    value,
                    representation: "wiki",
                },
            },
            version: VersionRef { number: version },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let payload = PagePayload::new("README___ab12cd", "h1. Hi & bye", "DOC", "98304", 3).unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "type": "page",
                "title": "README___ab12cd",
                "ancestors": [{"id": 98304}],
                "space": {"key": "DOC"},
                "body": {"storage": {"value": "h1. Hi & bye", "representation": "wiki"}},
                "version": {"number": 3}
            })
        );
    }

    #[test]
    fn test_payload_rejects_non_numeric_ancestor() {
        let err = PagePayload::new("t", "v", "DOC", "abc", 0).unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidAncestor(id) if id == "abc"));
    }

    #[test]
    fn test_parse_ancestor() {
        assert_eq!(parse_ancestor("98304").unwrap(), 98304);
        for bad in ["", "-1", "1 OR 1=1", "12a"] {
            assert!(matches!(
                parse_ancestor(bad),
                Err(DirectoryError::InvalidAncestor(id)) if id == bad
            ));
        }
    }

    #[test]
    fn test_content_into_remote_document() {
        let content: Content = serde_json::from_value(json!({
            "id": "65538",
            "type": "page",
            "status": "current",
            "title": "Install___ab12cd",
            "version": {"number": 7},
            "space": {"key": "DOC"},
            "_links": {"webui": "/display/DOC/Install"}
        }))
        .unwrap();
        assert_eq!(
            RemoteDocument::from(content),
            RemoteDocument {
                id: "65538".to_string(),
                title: "Install___ab12cd".to_string(),
                version: 7,
                space_key: "DOC".to_string(),
            }
        );
    }
}
