//! Solr client implementation.

use crate::{
    config::SolrConfig,
    cursor::Cursor,
    error::{Result, SolrError},
    query::{QueryParams, build_request, encode_params},
    response::{Document, SolrResponse},
    transport::{HttpRequest, ReqwestTransport, Transport},
    update::{
        CommitOptions, InputType, OptimizeOptions, add_xml, commit_xml, delete_by_id_xml,
        delete_by_query_xml, json_body, optimize_xml, rollback_xml,
    },
    version::ProtocolVersion,
};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use http::Method;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Default request handler for searches.
pub const DEFAULT_RESOURCE: &str = "select";
/// Default request handler for MoreLikeThis queries.
pub const DEFAULT_MLT_RESOURCE: &str = "mlt";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Solr client for queries, updates and index maintenance.
///
/// Cloning is cheap; clones share the transport and configuration.
#[derive(Clone)]
pub struct SolrClient {
    transport: Arc<dyn Transport>,
    config: Arc<SolrConfig>,
    base_url: url::Url,
    version: ProtocolVersion,
}

impl SolrClient {
    /// Create a client backed by the default reqwest transport.
    ///
    /// When the configuration does not pin a version, one `admin/system`
    /// request is made to detect it.
    pub async fn connect(config: SolrConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Create a client on top of an injected transport.
    pub async fn with_transport(config: SolrConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        info!(base_url = %config.base_url, "Initializing Solr client");

        let base_url = config.normalized_base_url()?;
        let configured = config.protocol_version()?;

        let mut client = Self {
            transport,
            config: Arc::new(config),
            base_url,
            version: configured.unwrap_or(ProtocolVersion::Solr4),
        };

        if configured.is_none() {
            client.version = client.detect_version().await?;
        }

        debug!(version = %client.version, "Solr client initialized");
        Ok(client)
    }

    /// Protocol version in use.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Get the configuration.
    pub fn config(&self) -> &SolrConfig {
        &self.config
    }

    /// Normalized base URL.
    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    fn url(&self, resource: &str) -> Result<url::Url> {
        Ok(self.base_url.join(resource)?)
    }

    fn request(&self, method: Method, url: &url::Url) -> HttpRequest {
        HttpRequest::new(method, url.as_str())
            .timeout(self.config.timeout)
            .credentials(self.config.credentials.clone())
    }

    async fn send(&self, request: HttpRequest) -> Result<SolrResponse> {
        let http = self.transport.send(request).await?;
        SolrResponse::decode(http)
    }

    /// Send already-built wire parameters to a search handler.
    pub(crate) async fn execute_query(
        &self,
        url: &url::Url,
        wire: Vec<(String, String)>,
    ) -> Result<SolrResponse> {
        let request = if self.config.use_get {
            self.request(Method::GET, url).query(wire)
        } else {
            let form = serde_urlencoded::to_string(&wire)
                .map_err(|e| SolrError::InvalidQuery(e.to_string()))?;
            self.request(Method::POST, url).body(form, FORM_CONTENT_TYPE)
        };
        self.send(request).await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Query the default `select` handler.
    pub async fn search(&self, params: &QueryParams) -> Result<SolrResponse> {
        self.search_on(DEFAULT_RESOURCE, params).await
    }

    /// Query a specific request handler.
    ///
    /// Fails with [`SolrError::InvalidQuery`] before any request is made when
    /// `q` is missing.
    pub async fn search_on(&self, resource: &str, params: &QueryParams) -> Result<SolrResponse> {
        let wire = build_request(params, self.version)?;
        let url = self.url(resource)?;
        debug!(url = %url, params = wire.len(), "Searching");
        self.execute_query(&url, wire).await
    }

    /// Page through the results of `select` with a cursor.
    pub fn search_cursor(&self, params: QueryParams) -> Result<Cursor> {
        self.search_cursor_on(DEFAULT_RESOURCE, params)
    }

    /// Page through the results of a specific handler with a cursor.
    pub fn search_cursor_on(&self, resource: &str, params: QueryParams) -> Result<Cursor> {
        build_request(&params, self.version)?;
        let url = self.url(resource)?;
        Cursor::new(self.clone(), url, params)
    }

    /// Run independent queries against `select`, at most `pool_size` at once.
    ///
    /// Results come back in input order; one failing query does not affect
    /// the others.
    pub async fn batch_search(
        &self,
        queries: Vec<QueryParams>,
        pool_size: usize,
    ) -> Vec<Result<SolrResponse>> {
        self.batch_search_on(DEFAULT_RESOURCE, queries, pool_size).await
    }

    /// Run independent queries against a specific handler.
    pub async fn batch_search_on(
        &self,
        resource: &str,
        queries: Vec<QueryParams>,
        pool_size: usize,
    ) -> Vec<Result<SolrResponse>> {
        debug!(queries = queries.len(), pool_size, "Running batch search");

        stream::iter(queries)
            .map(|params| async move { self.search_on(resource, &params).await })
            .buffered(pool_size.max(1))
            .collect()
            .await
    }

    /// MoreLikeThis query.
    ///
    /// With `text`, the text is streamed to the handler as the source of
    /// similarity and `q` is optional. Without it this is a plain search on
    /// `resource`.
    pub async fn more_like_this(
        &self,
        resource: &str,
        text: Option<&str>,
        params: &QueryParams,
    ) -> Result<SolrResponse> {
        let Some(text) = text else {
            return self.search_on(resource, params).await;
        };

        let url = self.url(resource)?;
        debug!(url = %url, "MoreLikeThis with streamed text");
        let request = self
            .request(Method::POST, &url)
            .query(encode_params(params, self.version))
            .body(text.to_string(), TEXT_CONTENT_TYPE);
        self.send(request).await
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Post documents, optionally committing afterwards.
    ///
    /// Returns the reply to the update itself.
    pub async fn update<T: Serialize>(
        &self,
        documents: &[T],
        input_type: InputType,
        commit: bool,
    ) -> Result<SolrResponse> {
        let documents = to_documents(documents)?;
        debug!(documents = documents.len(), ?input_type, "Posting documents");

        let response = match input_type {
            InputType::Xml => self.post_xml(add_xml(&documents, true)?).await?,
            InputType::Json => {
                if !self.version.supports_json_update() {
                    return Err(SolrError::Configuration(format!(
                        "JSON updates are not supported by {}",
                        self.version
                    )));
                }
                self.post_json(json_body(&documents)?).await?
            }
        };

        if commit {
            self.commit(CommitOptions::default()).await?;
        }
        Ok(response)
    }

    /// Delete a document by its unique key.
    pub async fn delete_by_key(&self, id: impl ToString, commit: bool) -> Result<SolrResponse> {
        self.delete_by_keys([id.to_string()], commit).await
    }

    /// Delete several documents by unique key in one message.
    ///
    /// An empty key list is a [`SolrError::Validation`] error and sends nothing.
    pub async fn delete_by_keys<I, S>(&self, ids: I, commit: bool) -> Result<SolrResponse>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<S> = ids.into_iter().collect();
        if ids.is_empty() {
            return Err(SolrError::Validation(
                "delete by key needs at least one key".to_string(),
            ));
        }

        let response = self.post_xml(delete_by_id_xml(ids)).await?;
        if commit {
            self.commit(CommitOptions::default()).await?;
        }
        Ok(response)
    }

    /// Delete every document matching a query.
    pub async fn delete_by_query(&self, query: &str, commit: bool) -> Result<SolrResponse> {
        debug!(query, "Deleting by query");
        let response = self.post_xml(delete_by_query_xml(query)).await?;
        if commit {
            self.commit(CommitOptions::default()).await?;
        }
        Ok(response)
    }

    /// Send a commit message.
    pub async fn commit(&self, options: CommitOptions) -> Result<SolrResponse> {
        self.post_xml(commit_xml(&options, self.version)).await
    }

    /// Send an optimize message.
    pub async fn optimize(&self, options: OptimizeOptions) -> Result<SolrResponse> {
        self.post_xml(optimize_xml(&options, self.version)).await
    }

    /// Roll back uncommitted changes.
    pub async fn rollback(&self) -> Result<SolrResponse> {
        self.post_xml(rollback_xml()).await
    }

    async fn post_xml(&self, xml: String) -> Result<SolrResponse> {
        let url = self.url("update")?;
        let request = self
            .request(Method::POST, &url)
            .body(xml.into_bytes(), XML_CONTENT_TYPE);
        self.send(request).await
    }

    async fn post_json(&self, json: Vec<u8>) -> Result<SolrResponse> {
        let url = self.url("update/json")?;
        let request = self.request(Method::POST, &url).body(json, JSON_CONTENT_TYPE);
        self.send(request).await
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Ping the server.
    pub async fn ping(&self) -> Result<SolrResponse> {
        let url = self.url("admin/ping")?;
        let request = self
            .request(Method::GET, &url)
            .query([("wt", self.version.response_format())]);
        self.send(request).await
    }

    /// Whether the ping handler answers with HTTP 200 and Solr status 0.
    pub async fn is_up(&self) -> bool {
        match self.ping().await {
            Ok(response) => response.is_success(),
            Err(e) => {
                debug!(error = %e, "Ping failed");
                false
            }
        }
    }

    /// Fetch `admin/system`.
    pub async fn system_info(&self) -> Result<SolrResponse> {
        let url = self.url("admin/system")?;
        let request = self
            .request(Method::GET, &url)
            .query([("wt", self.version.response_format())]);
        self.send(request).await
    }

    /// Ask the server for its version.
    pub async fn detect_version(&self) -> Result<ProtocolVersion> {
        let info = self.system_info().await?;
        let spec = info
            .body
            .as_ref()
            .and_then(|b| b.pointer("/lucene/solr-spec-version"))
            .and_then(Value::as_str)
            .ok_or_else(|| SolrError::malformed("admin/system without lucene.solr-spec-version"))?;
        ProtocolVersion::from_spec_version(spec)
    }

    /// Fetch `schema.xml`.
    pub async fn schema(&self) -> Result<Bytes> {
        self.get_file("schema.xml").await
    }

    /// Fetch `solrconfig.xml`.
    pub async fn solrconfig(&self) -> Result<Bytes> {
        self.get_file("solrconfig.xml").await
    }

    /// Fetch a configuration file of the core through `admin/file`.
    pub async fn get_file(&self, filename: &str) -> Result<Bytes> {
        let url = self.url("admin/file")?;
        let request = self
            .request(Method::GET, &url)
            .query([("contentType", "text/xml;charset=utf-8"), ("file", filename)]);
        Ok(self.transport.send(request).await?.body)
    }
}

fn to_documents<T: Serialize>(documents: &[T]) -> Result<Vec<Document>> {
    documents
        .iter()
        .map(|doc| match serde_json::to_value(doc)? {
            Value::Object(map) => Ok(map),
            other => Err(SolrError::Validation(format!(
                "document must serialize to an object, got {}",
                other
            ))),
        })
        .collect()
}

impl std::fmt::Debug for SolrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolrClient")
            .field("base_url", &self.base_url.as_str())
            .field("version", &self.version)
            .finish()
    }
}
