//! Confluence `RemoteDirectory` implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};
use wiki_publish_core::{
    unique_attachments, ConvertedDocument, DirectoryError, DocumentFilter, RemoteDirectory,
    RemoteDocument,
};

use crate::client::ConfluenceClient;
use crate::model::{parse_ancestor, Content, PagePayload, SearchResponse};

const SEARCH_LIMIT: &str = "1000";

/// Pages of one Confluence space.
pub struct ConfluenceDirectory {
    client: ConfluenceClient,
    space_key: String,
}

impl ConfluenceDirectory {
    pub fn new(client: ConfluenceClient, space_key: impl Into<String>) -> Self {
        Self {
            client,
            space_key: space_key.into(),
        }
    }

    /// Upload the document's attachments to `content_id` in one multipart request.
    ///
    /// Files sharing a base name are sent once; each file is read right before
    /// its part is added.
    #[instrument(skip(self, doc), level = "debug", fields(count = doc.attachment_paths.len()))]
    async fn upload_attachments(
        &self,
        content_id: &str,
        doc: &ConvertedDocument,
    ) -> Result<(), DirectoryError> {
        if doc.attachment_paths.is_empty() {
            return Ok(());
        }

        let mut form = Form::new();
        for path in unique_attachments(&doc.attachment_paths) {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let resolved = doc.resolve(path);
            let bytes = tokio::fs::read(&resolved)
                .await
                .map_err(|source| DirectoryError::Attachment {
                    path: resolved.clone(),
                    source,
                })?;
            debug!("Attaching {} ({} bytes)", resolved.display(), bytes.len());
            form = form.part("file", Part::bytes(bytes).file_name(file_name));
        }

        self.client
            .post_multipart(
                &format!("/rest/api/content/{}/child/attachment", content_id),
                &[("allowDuplicated", "true")],
                &[("X-Atlassian-Token", "nocheck")],
                form,
            )
            .await
    }
}

/// Escapes a value for use inside a single-quoted CQL string.
fn cql_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[async_trait]
impl RemoteDirectory for ConfluenceDirectory {
    #[instrument(skip(self), level = "debug")]
    async fn find_by_parent(
        &self,
        ancestor_id: &str,
        filter: &DocumentFilter,
    ) -> Result<Vec<RemoteDocument>, DirectoryError> {
        let parent = parse_ancestor(ancestor_id)?;
        let cql = format!("space='{}' AND parent={}", cql_escape(&self.space_key), parent);
        let search: SearchResponse = self
            .client
            .get(
                "/rest/api/content/search",
                &[
                    ("cql", cql.as_str()),
                    ("limit", SEARCH_LIMIT),
                    ("expand", "version,space"),
                    ("start", "0"),
                ],
            )
            .await?;

        let total = search.results.len();
        let docs: Vec<RemoteDocument> = search
            .results
            .into_iter()
            .map(RemoteDocument::from)
            .filter(|doc| filter.matches(doc))
            .collect();

        debug!("{} of {} documents under {} match", docs.len(), total, ancestor_id);
        Ok(docs)
    }

    #[instrument(skip(self, doc), level = "debug")]
    async fn create(
        &self,
        title: &str,
        doc: &ConvertedDocument,
        ancestor_id: &str,
    ) -> Result<RemoteDocument, DirectoryError> {
        let payload = PagePayload::new(title, &doc.body, &self.space_key, ancestor_id, 0)?;
        let created: Content = self.client.post_json("/rest/api/content", &payload).await?;
        let created = RemoteDocument::from(created);

        self.upload_attachments(&created.id, doc).await?;
        Ok(created)
    }

    #[instrument(skip(self, doc), level = "debug")]
    async fn update(
        &self,
        existing: &RemoteDocument,
        doc: &ConvertedDocument,
        ancestor_id: &str,
    ) -> Result<(), DirectoryError> {
        let payload = PagePayload::new(
            &existing.title,
            &doc.body,
            &existing.space_key,
            ancestor_id,
            existing.version + 1,
        )?;
        self.client
            .put_json(&format!("/rest/api/content/{}", existing.id), &payload)
            .await?;

        self.upload_attachments(&existing.id, doc).await
    }
}
