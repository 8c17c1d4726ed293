//! Columbia CLIO catalog API.
//!
//! CLIO serves one binary MARC record per bib id and rate limits aggressively.
//! A throttled response is honoured exactly once per record: wait out the
//! advertised `Retry-After`, try again, and fall back to an empty record if
//! the catalog still will not answer.

use std::borrow::Cow;
use std::sync::LazyLock;
use std::time::Duration;

use log::warn;
use regex::Regex;
use serde_json::Value;

use crate::{
    api::{archive::Doc, Client, Delay, Response},
    marc::Record,
    Error,
};

const CATALOG_URL: &str = "https://clio.columbia.edu/catalog";

/// Matches identifiers minted from CLIO records, such as `ldpd_10570621_000`.
static DERIVED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ldpd_+([0-9A-Za-z]+)_+\d+$").expect("derived id regex"));

/// Matches a quoted CLIO catalog link inside the `stripped_tags` markup.
static CATALOG_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""http://clio\.columbia\.edu/catalog/([0-9A-Za-z]+)""#)
        .expect("catalog link regex")
});

/// The apparent CLIO bib id of an Internet Archive document.
///
/// The id is taken from the document identifier when it was minted from a
/// CLIO record, otherwise from a catalog link in the document's
/// `stripped_tags`. Returns `None` when the document carries neither.
#[must_use]
pub fn bib_id(doc: &Doc) -> Option<String> {
    let identifier = doc.get("identifier").and_then(Value::as_str)?;
    if let Some(caps) = DERIVED_ID.captures(identifier) {
        return Some(caps[1].to_owned());
    }
    CATALOG_LINK
        .captures(&stripped_tags(doc))
        .map(|caps| caps[1].to_owned())
}

// Old items carry the tags as one string, newer ones as an array.
fn stripped_tags(doc: &Doc) -> Cow<'_, str> {
    match doc.get("stripped_tags") {
        Some(Value::String(tags)) => Cow::from(tags.as_str()),
        Some(Value::Array(tags)) => {
            let joined: Vec<&str> = tags.iter().filter_map(Value::as_str).collect();
            Cow::from(joined.join(" "))
        }
        _ => Cow::from(""),
    }
}

/// Fetches the MARC record for a bib id, honouring one throttle wait.
///
/// # Errors
///
/// Transport failures are returned as `IO` errors. A response that is not a
/// MARC record never is an error: a throttled response is retried once after
/// the advertised wait, anything else degrades to [`Record::default`].
pub(crate) fn get_record_by_bib_id<C: Client, D: Delay>(bib_id: &str) -> Result<Record, Error> {
    let client = C::default();
    let url = format!("{CATALOG_URL}/{bib_id}.marc");

    let first = client.get_response(&url)?;
    if let Ok(record) = Record::from_bytes(&first.body) {
        return Ok(record);
    }
    retry_once::<C, D>(&client, &url, &first)
}

fn retry_once<C: Client, D: Delay>(
    client: &C,
    url: &str,
    first: &Response,
) -> Result<Record, Error> {
    let Some(wait) = throttle_wait(first) else {
        return Ok(give_up(first));
    };

    warn!("CLIO rate limiting, waiting {}: {}", wait.as_secs(), first.url);
    if let Ok(headers) = serde_json::to_string(&first.headers) {
        warn!("{headers}");
    }
    D::default().pause(wait);

    let second = client.get_response(url)?;
    Record::from_bytes(&second.body).or_else(|_| Ok(give_up(&second)))
}

// The advertised wait plus a second of margin.
fn throttle_wait(response: &Response) -> Option<Duration> {
    if response.status != 429 {
        return None;
    }
    response
        .retry_after_secs()
        .map(|secs| Duration::from_secs(secs + 1))
}

fn give_up(response: &Response) -> Record {
    warn!("Collegially retrying only once: {}", response.url);
    Record::default()
}
