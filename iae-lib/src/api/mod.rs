use std::{collections::BTreeMap, time::Duration};

use serde::de::DeserializeOwned;

use crate::{Error, ErrorKind};

pub(crate) mod archive;
pub(crate) mod clio;

pub trait Client
where
    Self: Default,
{
    fn get_json<T>(&self, url: &str) -> Result<T, Error>
    where
        T: DeserializeOwned;

    fn get_response(&self, url: &str) -> Result<Response, Error>;
}

/// A fully read HTTP response.
///
/// The MARC endpoint needs more than a deserialized body: throttling is
/// signalled through the status code and headers, and the payload is binary.
pub struct Response {
    pub status: u16,
    /// The URL as reported by the transport, after any redirects.
    pub url: String,
    /// Header names are lowercased by the transport.
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    /// The throttle wait advertised by a `Retry-After` header, in seconds.
    ///
    /// The HTTP-date form of the header is not understood and reads as
    /// absent.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.headers.get("retry-after").and_then(|v| v.trim().parse().ok())
    }
}

impl Client for reqwest::blocking::Client {
    fn get_json<T>(&self, url: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        self.get(url)
            .send()
            .map_err(|e| Error::wrap(ErrorKind::IO, e))
            .and_then(|r| r.json().map_err(|e| Error::wrap(ErrorKind::Deserialize, e)))
    }

    fn get_response(&self, url: &str) -> Result<Response, Error> {
        let resp = self
            .get(url)
            .send()
            .map_err(|e| Error::wrap(ErrorKind::IO, e))?;

        let status = resp.status().as_u16();
        let url = resp.url().to_string();
        let headers = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    value.to_str().unwrap_or_default().to_owned(),
                )
            })
            .collect();
        let body = resp
            .bytes()
            .map_err(|e| Error::wrap(ErrorKind::IO, e))?
            .to_vec();

        Ok(Response {
            status,
            url,
            headers,
            body,
        })
    }
}

/// A seam for the throttle sleep so that backoff is testable.
pub trait Delay
where
    Self: Default,
{
    fn pause(&self, duration: Duration);
}

/// Blocks the current thread for the duration.
#[derive(Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
pub(crate) use test::{
    assert_url, impl_response_producer, MockClient, NetworkErrorProducer, NoDelay, Producer,
    PAUSE_SINK, URL_SINK,
};
