//! Offset-based pagination over a search handler.

use crate::{
    client::SolrClient,
    error::{Result, SolrError},
    query::{QueryParams, build_request},
    response::SolrResponse,
};
use futures::Stream;
use tracing::debug;

/// Page size used when neither the cursor nor the query sets `rows`.
pub const DEFAULT_ROWS: u64 = 10;

/// Where a [`Cursor`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Another page may be fetched.
    Ready,
    /// A page request is in flight.
    Fetching,
    /// No further requests will be made.
    Exhausted,
}

/// Pages through a query by advancing `start` one page at a time.
///
/// A page holding fewer documents than the page size ends the iteration, as
/// does a transport or decoding error. An empty page also counts as short, so
/// iteration always terminates.
///
/// ```rust,no_run
/// # use armature_solr::{QueryParams, SolrClient, SolrConfig};
/// # async fn run() -> armature_solr::Result<()> {
/// let client = SolrClient::connect(SolrConfig::default()).await?;
/// let mut cursor = client.search_cursor(QueryParams::query("*:*"))?.with_rows(100)?;
/// while let Some(page) = cursor.next_page().await? {
///     println!("{} documents", page.document_count());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Cursor {
    client: SolrClient,
    url: url::Url,
    params: QueryParams,
    rows: u64,
    start: u64,
    state: CursorState,
}

impl Cursor {
    pub(crate) fn new(client: SolrClient, url: url::Url, params: QueryParams) -> Result<Self> {
        let rows = match params.get("rows") {
            Some(value) => value.as_u64().ok_or_else(|| {
                SolrError::InvalidQuery("rows must be a non-negative integer".to_string())
            })?,
            None => DEFAULT_ROWS,
        };

        Self {
            client,
            url,
            params,
            rows: DEFAULT_ROWS,
            start: 0,
            state: CursorState::Ready,
        }
        .with_rows(rows)
    }

    /// Override the page size.
    pub fn with_rows(mut self, rows: u64) -> Result<Self> {
        if rows == 0 {
            return Err(SolrError::InvalidQuery(
                "cursor page size must be positive".to_string(),
            ));
        }
        self.rows = rows;
        Ok(self)
    }

    /// Current state.
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Offset of the next page.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Page size.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Fetch the next page, or `None` once the cursor is exhausted.
    ///
    /// An HTTP error page carries no documents, so it ends iteration like a
    /// short page and comes back as `Ok`. Check
    /// [`SolrResponse::is_success`] on the last page to tell a truncated
    /// result apart from a complete one.
    pub async fn next_page(&mut self) -> Result<Option<SolrResponse>> {
        if self.state == CursorState::Exhausted {
            return Ok(None);
        }

        self.state = CursorState::Fetching;
        self.params.insert("start", self.start);
        self.params.insert("rows", self.rows);

        debug!(url = %self.url, start = self.start, rows = self.rows, "Fetching page");

        let page = match build_request(&self.params, self.client.version()) {
            Ok(wire) => self.client.execute_query(&self.url, wire).await,
            Err(e) => Err(e),
        };

        match page {
            Ok(page) => {
                if (page.document_count() as u64) < self.rows {
                    self.state = CursorState::Exhausted;
                } else {
                    self.start += self.rows;
                    self.state = CursorState::Ready;
                }
                Ok(Some(page))
            }
            Err(e) => {
                self.state = CursorState::Exhausted;
                Err(e)
            }
        }
    }

    /// Turn the cursor into a stream of pages.
    ///
    /// The stream ends after the first short page or the first error. As with
    /// [`next_page`](Self::next_page), the final page may be an HTTP error
    /// reply and should be checked with [`SolrResponse::is_success`].
    pub fn into_stream(self) -> impl Stream<Item = Result<SolrResponse>> {
        futures::stream::try_unfold(self, |mut cursor| async move {
            let page = cursor.next_page().await?;
            Ok::<_, SolrError>(page.map(|page| (page, cursor)))
        })
    }
}
