//! Content delivery client for the brand color extension.
//!
//! This crate provides a lightweight client for reading content items from the
//! content delivery service that stores the brand palette. It focuses on:
//!
//! - Constructing an HTTP client scoped to an account and, optionally, a
//!   staging environment host
//! - Validating `BRAND_COLOR_DELIVERY_BASE` for safety
//! - Building content queries and unwrapping the single item they return
//!
//! The primary entry point is [`ContentClient`]. Consumers that only need to
//! fetch items should depend on the [`ContentSource`] trait so tests can swap in
//! scripted sources.
//!
//! # Example
//!
//! ```ignore
//! use brand_color_api::{ContentClient, ContentClientConfig};
//!
//! async fn fetch() -> Result<(), brand_color_api::ContentError> {
//!     let client = ContentClient::new(ContentClientConfig::new("brandco"))?;
//!     let item = client.get_content_item("7c2e0f4a-1b2c-4d5e-8f90-a1b2c3d4e5f6").await?;
//!     println!("{}", item.body);
//!     Ok(())
//! }
//! ```

use std::env;
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url, header};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding the delivery base URL.
pub const DELIVERY_BASE_ENV: &str = "BRAND_COLOR_DELIVERY_BASE";
/// Public content delivery endpoint used when nothing else is configured.
pub const DEFAULT_DELIVERY_BASE: &str = "https://c1.adis.ws";
/// Namespace content item identifiers are resolved in.
const CONTENT_IRI_PREFIX: &str = "http://content.cms.amplience.com/";

/// Allowed hostnames or base domains for non-local delivery endpoints.
/// Subdomains of these domains are also allowed.
const ALLOWED_DELIVERY_DOMAINS: &[&str] = &["adis.ws", "amplience.net", "amplience.com", "bigcontent.io"];
/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Errors surfaced while fetching content items.
///
/// Display strings carry no prefix of their own so callers can embed them in
/// user-facing messages verbatim.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("invalid delivery base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("{0}")]
    Transport(String),

    #[error("HTTP {status} while fetching content item \"{id}\"")]
    Status { status: u16, id: String },

    #[error("Content item \"{id}\" was not found")]
    NotFound { id: String },

    #[error("malformed content response: {0}")]
    Malformed(String),

    #[error("{0}")]
    Decode(#[from] serde_json::Error),
}

/// Settings used to construct a [`ContentClient`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentClientConfig {
    /// Account (store) whose content is queried.
    pub account: String,
    /// Staging environment host supplied by the editor, if previewing.
    pub staging_environment: Option<String>,
    /// Explicit base URL, taking precedence over every other source.
    pub base_url: Option<String>,
    /// Optional locale filter forwarded with each query.
    pub locale: Option<String>,
    /// Request timeout. `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
}

impl ContentClientConfig {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            ..Default::default()
        }
    }

    pub fn with_staging_environment(mut self, staging_environment: Option<String>) -> Self {
        self.staging_environment = staging_environment.filter(|host| !host.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the base URL for this configuration.
    ///
    /// Resolution order: explicit `base_url`, the staging environment host,
    /// `BRAND_COLOR_DELIVERY_BASE`, then the public endpoint.
    pub fn resolve_base_url(&self) -> String {
        if let Some(base_url) = self.base_url.as_ref() {
            return base_url.trim_end_matches('/').to_string();
        }
        if let Some(host) = self.staging_environment.as_ref() {
            return format!("https://{}", host.trim().trim_end_matches('/'));
        }
        env::var(DELIVERY_BASE_ENV)
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_DELIVERY_BASE.to_string())
    }
}

/// A content item as returned by the delivery service.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    /// The fully inlined body of the item.
    pub body: Value,
}

impl ContentItem {
    /// Deserialize the body into a typed model.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ContentError> {
        Ok(serde_json::from_value(self.body)?)
    }
}

/// Anything that can fetch a content item by identifier.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn get_content_item(&self, id: &str) -> Result<ContentItem, ContentError>;
}

/// Builds content sources scoped to an account and environment.
pub trait ContentSourceFactory: Send + Sync {
    fn create(&self, config: ContentClientConfig) -> Result<Arc<dyn ContentSource>, ContentError>;
}

/// Factory producing [`ContentClient`] instances.
#[derive(Debug, Clone, Default)]
pub struct DeliveryClientFactory {
    /// Timeout applied to every client this factory builds.
    pub timeout: Option<Duration>,
}

impl DeliveryClientFactory {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout: Some(timeout) }
    }
}

impl DeliveryClientFactory {
    /// Apply the factory timeout to `config` unless it carries its own.
    pub fn client_config(&self, config: ContentClientConfig) -> ContentClientConfig {
        if config.timeout.is_none() {
            config.with_timeout(self.timeout)
        } else {
            config
        }
    }
}

impl ContentSourceFactory for DeliveryClientFactory {
    fn create(&self, config: ContentClientConfig) -> Result<Arc<dyn ContentSource>, ContentError> {
        Ok(Arc::new(ContentClient::new(self.client_config(config))?))
    }
}

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client` for content delivery.
pub struct ContentClient {
    pub base_url: String,
    pub account: String,
    pub locale: Option<String>,
    pub http: Client,
    pub user_agent: String,
}

impl ContentClient {
    /// Construct a client from `config`, validating the resolved base URL.
    pub fn new(config: ContentClientConfig) -> Result<Self, ContentError> {
        let base_url = config.resolve_base_url();
        validate_base_url(&base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(default_headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|error| ContentError::Transport(format!("build http client: {}", error_chain(&error))))?;

        Ok(Self {
            base_url,
            account: config.account,
            locale: config.locale,
            http,
            user_agent: format!("brand-color/0.1; {}", env::consts::OS),
        })
    }

    /// Build the query URL that resolves a single content item with its body
    /// fully inlined.
    pub fn content_query_url(&self, id: &str) -> Result<Url, ContentError> {
        let mut url = Url::parse(&format!("{}/cms/content/query", self.base_url)).map_err(|error| ContentError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: error.to_string(),
        })?;
        let query = json!({ "sys.iri": format!("{CONTENT_IRI_PREFIX}{id}") }).to_string();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("query", &query)
                .append_pair("fullBodyObject", "true")
                .append_pair("scope", "tree")
                .append_pair("store", &self.account);
            if let Some(locale) = self.locale.as_deref() {
                pairs.append_pair("locale", locale);
            }
        }
        Ok(url)
    }

    /// Fetch a content item by identifier.
    pub async fn get_content_item(&self, id: &str) -> Result<ContentItem, ContentError> {
        let url = self.content_query_url(id)?;
        debug!(%url, "fetching content item");

        let response = self
            .http
            .get(url)
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|error| ContentError::Transport(error_chain(&error)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                status: status.as_u16(),
                id: id.to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|error| ContentError::Transport(error_chain(&error)))?;
        let payload: Value = serde_json::from_str(&text)?;
        extract_content_item(id, payload)
    }
}

#[async_trait::async_trait]
impl ContentSource for ContentClient {
    async fn get_content_item(&self, id: &str) -> Result<ContentItem, ContentError> {
        ContentClient::get_content_item(self, id).await
    }
}

/// Render an error followed by each of its sources, separated by `: `.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Unwrap the first result of a content query response.
///
/// The expected form is roughly:
///
/// ```text
/// { "results": [ { "content": { ...body... } } ] }
/// ```
pub fn extract_content_item(id: &str, payload: Value) -> Result<ContentItem, ContentError> {
    let Value::Object(mut map) = payload else {
        return Err(ContentError::Malformed("expected a JSON object".into()));
    };
    let results = match map.remove("results") {
        Some(Value::Array(results)) => results,
        Some(_) => return Err(ContentError::Malformed("`results` is not an array".into())),
        None => return Err(ContentError::Malformed("missing `results`".into())),
    };

    let first = results
        .into_iter()
        .next()
        .ok_or_else(|| ContentError::NotFound { id: id.to_string() })?;
    match first {
        Value::Object(mut entry) => entry
            .remove("content")
            .map(|body| ContentItem { body })
            .ok_or_else(|| ContentError::Malformed("result entry has no `content`".into())),
        _ => Err(ContentError::Malformed("result entry is not an object".into())),
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS, and host must be one of the allowed
///   delivery domains or a subdomain thereof
pub fn validate_base_url(base: &str) -> Result<(), ContentError> {
    let invalid = |reason: String| ContentError::InvalidBaseUrl {
        url: base.to_string(),
        reason,
    };
    let parsed_base_url = Url::parse(base).map_err(|error| invalid(error.to_string()))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| invalid("base URL must include a host".into()))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(invalid(format!(
            "must use https for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        )));
    }

    let is_allowed_domain = ALLOWED_DELIVERY_DOMAINS.iter().any(|&allowed_domain| {
        host_name.eq_ignore_ascii_case(allowed_domain) || host_name.ends_with(&format!(".{}", allowed_domain))
    });
    if !is_allowed_domain {
        return Err(invalid(format!(
            "host '{}' is not one of {:?} or a subdomain, or localhost",
            host_name, ALLOWED_DELIVERY_DOMAINS
        )));
    }

    Ok(())
}
