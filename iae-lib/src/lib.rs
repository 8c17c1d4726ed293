#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![warn(missing_docs, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]
#![doc = include_str!("../README.md")]

mod api;
mod error;
pub mod marc;

pub use api::archive::{Doc, Links, DEFAULT_PAGE_SIZE};
pub use api::clio::bib_id;
pub use error::{Error, ErrorKind};

use api::archive::{self, MediaType, Search};
use api::{clio, ThreadDelay};
use log::trace;

type Client = reqwest::blocking::Client;

/// Search the ebooks held in an Internet Archive collection.
///
/// Results are streamed a page of `page_size` documents at a time, so the
/// iterator is safe for collections of any size. A failed page fetch is
/// yielded as a single `Err` item and ends the iteration.
#[inline]
pub fn ebooks_in(collection: &str, page_size: usize) -> impl Iterator<Item = Result<Doc, Error>> {
    trace!("Search texts in collection of '{collection}'");
    Search::<Client>::for_media(collection, MediaType::Texts, page_size)
}

/// Search the collections held in an Internet Archive collection.
///
/// Paged and streamed exactly as [`ebooks_in`].
#[inline]
pub fn collections_in(
    collection: &str,
    page_size: usize,
) -> impl Iterator<Item = Result<Doc, Error>> {
    trace!("Search collections in collection of '{collection}'");
    Search::<Client>::for_media(collection, MediaType::Collection, page_size)
}

/// Fetch a single Internet Archive document by its exact identifier.
///
/// Returns `Ok(None)` when the archive holds no such document.
///
/// # Errors
///
/// An `Err` is returned when the search request fails or its response cannot
/// be parsed.
#[inline]
pub fn document_by_identifier(identifier: &str) -> Result<Option<Doc>, Error> {
    trace!("Fetch document with identifier of '{identifier}'");
    archive::get_document_by_identifier::<Client>(identifier)
}

/// Fetch the MARC record for a CLIO bib id.
///
/// When the catalog throttles the request the advertised `Retry-After` wait
/// is honoured once before retrying. A response that still cannot be read as
/// a record degrades to [`marc::Record::default`] rather than an error, so a
/// long enrichment run survives a flaky catalog.
///
/// # Errors
///
/// An `Err` is returned when a request to the catalog fails outright.
#[inline]
pub fn record_by_bib_id(bib_id: &str) -> Result<marc::Record, Error> {
    trace!("Fetch CLIO record with bib id of '{bib_id}'");
    clio::get_record_by_bib_id::<Client, ThreadDelay>(bib_id)
}
