//! Internet Archive advanced search API.
//!
//! Documents come back as open JSON maps because the set of metadata fields
//! varies per item and the callers pass most of them through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{api::Client, Error};

const SEARCH_URL: &str = "https://archive.org/advancedsearch.php";

/// Number of documents fetched per search page when the caller does not
/// choose one.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// A search result document, an open map of Internet Archive metadata.
pub type Doc = Map<String, Value>;

/// The media types the searches are scoped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MediaType {
    Collection,
    Texts,
}

impl MediaType {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Texts => "texts",
        }
    }
}

#[derive(Deserialize)]
struct SearchResult {
    response: SearchPage,
}

#[derive(Deserialize)]
struct SearchPage {
    #[serde(rename = "numFound")]
    num_found: usize,
    docs: Vec<Doc>,
}

fn media_query(collection: &str, media_type: MediaType) -> String {
    format!(
        "collection:({collection}) AND mediatype:({})",
        media_type.as_str()
    )
}

// Escapes the characters a query string cannot carry verbatim. IA reads the
// rest as written.
fn encode_query(query: &str) -> String {
    let mut encoded = String::with_capacity(query.len());
    for c in query.chars() {
        match c {
            '%' => encoded.push_str("%25"),
            '&' => encoded.push_str("%26"),
            '#' => encoded.push_str("%23"),
            '+' => encoded.push_str("%2B"),
            ' ' => encoded.push_str("%20"),
            _ => encoded.push(c),
        }
    }
    encoded
}

fn page_url(query: &str, rows: usize, page: usize) -> String {
    let q = encode_query(query);
    format!(
        "{SEARCH_URL}?q={q}&callback=&rows={rows}&page={page}&output=json&sort%5B%5D=__sort%20desc"
    )
}

/// A lazily paged search over the advanced search endpoint.
///
/// One page of documents is held in memory at a time and the next page is
/// only requested once the current one is drained, so arbitrarily large
/// result sets can be streamed.
pub(crate) struct Search<C> {
    client: C,
    query: String,
    rows: usize,
    page: usize,
    docs: std::vec::IntoIter<Doc>,
    more: bool,
}

impl<C: Client> Search<C> {
    pub(crate) fn for_media(collection: &str, media_type: MediaType, page_size: usize) -> Self {
        Self {
            client: C::default(),
            query: media_query(collection, media_type),
            rows: page_size,
            page: 0,
            docs: Vec::new().into_iter(),
            more: true,
        }
    }

    fn fetch_next_page(&mut self) -> Result<(), Error> {
        self.page += 1;
        let result: SearchResult = self
            .client
            .get_json(&page_url(&self.query, self.rows, self.page))?;

        self.docs = result.response.docs.into_iter();
        self.more = result.response.num_found > self.rows * self.page;
        Ok(())
    }
}

impl<C: Client> Iterator for Search<C> {
    type Item = Result<Doc, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.docs.as_slice().is_empty() && self.more {
            if let Err(err) = self.fetch_next_page() {
                self.more = false;
                return Some(Err(err));
            }
        }
        self.docs.next().map(Ok)
    }
}

/// Fetches a single document by its exact identifier.
pub(crate) fn get_document_by_identifier<C: Client>(
    identifier: &str,
) -> Result<Option<Doc>, Error> {
    let url = page_url(&format!("identifier:({identifier})"), 1, 1);
    let result: SearchResult = C::default().get_json(&url)?;
    Ok(result.response.docs.into_iter().next())
}

/// Viewer and download links derived from a document identifier.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Links {
    thumbnail: String,
    poster: String,
    pdf: String,
    iframe: String,
}

impl Links {
    /// Builds the links for the document with the given identifier.
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Self {
        Self {
            thumbnail: format!("https://archive.org/services/img/{identifier}"),
            poster: format!("https://archive.org/download/{identifier}/page/cover_medium.jpg"),
            pdf: format!("https://archive.org/download/{identifier}/{identifier}.pdf"),
            iframe: format!("https://archive.org/stream/{identifier}?ui=full&showNavbar=false"),
        }
    }
}
