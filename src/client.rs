//! The HTTP client for the GitHub REST API.

use std::fmt;

use reqwest::{
    Response,
    header::{self, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::{
    config::Config,
    error::{Error, Result},
};

/// The `Accept` header of every request.
pub const ACCEPT: &str = "application/vnd.github.v3+json";
/// The REST API version every request pins.
pub const API_VERSION: &str = "2022-11-28";
/// The `User-Agent` header of every request.
pub const USER_AGENT: &str = concat!("artifact-dl/", env!("CARGO_PKG_VERSION"));

/// A bearer credential. Its [`Debug`](fmt::Debug) output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wraps a token.
    pub fn new<S>(token: S) -> Self
    where
        S: Into<String>,
    {
        Self(token.into())
    }

    /// Returns the token in clear text.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// A client that sends authenticated requests to the GitHub REST API.
///
/// Redirects are followed, which the artifact download endpoint relies on. `reqwest` drops the
/// `Authorization` header when a redirect leaves the API host.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    inner: reqwest::Client,
}

impl GitHubClient {
    /// Builds a client carrying the GitHub headers and the timeouts of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredential`] if the token is not a valid header value, or
    /// [`Error::Request`] if the TLS backend fails to initialize.
    pub fn new(config: &Config, token: &Token) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
            .map_err(|_| Error::InvalidCredential)?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(header::AUTHORIZATION, authorization);
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.connect_timeout(timeout).read_timeout(timeout);
        }

        builder
            .build()
            .map(|inner| Self { inner })
            .map_err(|err| Error::request(&config.api_base, err))
    }

    /// Sends a GET request and fails on any non-2xx status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on a non-2xx status, or [`Error::Request`] if the request can't be
    /// sent.
    pub async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        debug!("requesting {url}…");
        let response = self
            .inner
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| Error::request(url, err))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            match status.canonical_reason() {
                Some(reason) => error!("request to {url} failed: {} {reason}", status.as_u16()),
                None => error!("request to {url} failed: {}", status.as_u16()),
            }
            Err(Error::Http {
                url: url.to_owned(),
                status,
            })
        }
    }

    /// Sends a GET request and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// See: [`Self::get`]. Also returns [`Error::Request`] if the body is not the expected JSON.
    pub async fn get_json<T>(&self, url: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.get(url, query).await?;
        response.json::<T>().await.map_err(|err| {
            error!("failed to parse data from {url}: {err}");
            Error::request(url, err)
        })
    }
}
