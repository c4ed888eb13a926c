//! HTTP plumbing shared by both clients.

use polar_core::{Error, NodeConfig, Result};
use reqwest::{Method, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

/// One node's REST endpoint and the HTTP client configured for it.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    node: String,
    base_url: Url,
    http: reqwest::Client,
}

impl Transport {
    pub(crate) fn new(node: &NodeConfig, port: u16, http: reqwest::Client) -> Result<Self> {
        let raw = format!(
            "{}://{}:{}/",
            node.effective_scheme().as_str(),
            node.rpc_host,
            port
        );
        let base_url = Url::parse(&raw).map_err(|e| {
            Error::Config(format!("invalid REST address for node '{}': {raw}: {e}", node.name))
        })?;
        Ok(Self {
            node: node.name.clone(),
            base_url,
            http,
        })
    }

    pub(crate) fn node(&self) -> &str {
        &self.node
    }

    pub(crate) const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL for `segments` under the base URL, each segment percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send one request and return the body of a 2xx response.
    pub(crate) async fn send(&self, method: Method, url: &Url, body: Option<&Value>) -> Result<String> {
        let response = self.start(method, url, body).await?;
        let text = response.text().await.map_err(|e| self.connection(url, &e))?;
        trace!(node = %self.node, %url, body = %text, "response");
        Ok(text)
    }

    /// Send one request and return the first line of a streamed 2xx body,
    /// without waiting for the stream to end.
    pub(crate) async fn send_first_line(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<String> {
        let mut response = self.start(method, url, body).await?;
        let mut line = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.connection(url, &e))? {
            line.extend_from_slice(&chunk);
            if let Some(end) = line.iter().position(|b| *b == b'\n') {
                line.truncate(end);
                break;
            }
        }
        let text = String::from_utf8_lossy(&line).into_owned();
        trace!(node = %self.node, %url, body = %text, "first line of response");
        Ok(text)
    }

    async fn start(&self, method: Method, url: &Url, body: Option<&Value>) -> Result<Response> {
        debug!(node = %self.node, %method, %url, "sending request");

        let mut request = self.http.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.connection(url, &e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.map_err(|e| self.connection(url, &e))?;
        Err(Error::Http {
            node: self.node.clone(),
            url: url.to_string(),
            status: status.as_u16(),
            body: text.trim().to_string(),
        })
    }

    /// Decode a response body into `T`.
    pub(crate) fn decode<T: DeserializeOwned>(&self, url: &Url, body: &str) -> Result<T> {
        serde_json::from_str(body).map_err(|e| self.parse(url, &e))
    }

    /// Decode each listing item into `T`, keeping the item's JSON alongside.
    pub(crate) fn decode_items<T: DeserializeOwned>(
        &self,
        url: &Url,
        items: Vec<Value>,
    ) -> Result<Vec<(T, Value)>> {
        items
            .into_iter()
            .map(|item| {
                let typed = serde_json::from_value(item.clone()).map_err(|e| self.parse(url, &e))?;
                Ok((typed, item))
            })
            .collect()
    }

    /// Take the array under `key` out of a listing response; absent means empty.
    pub(crate) fn take_items(&self, url: &Url, mut value: Value, key: &str) -> Result<Vec<Value>> {
        match value.get_mut(key).map(Value::take) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(Error::Parse {
                node: self.node.clone(),
                url: url.to_string(),
                message: format!("expected an array under '{key}', got {other}"),
            }),
        }
    }

    /// Run `operation`, wrapping any failure with the node and operation name.
    pub(crate) async fn scoped<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        fut.await.map_err(|e| e.in_operation(&self.node, operation))
    }

    pub(crate) fn backend(&self, message: impl Into<String>) -> Error {
        Error::Backend {
            node: self.node.clone(),
            message: message.into(),
        }
    }

    fn parse(&self, url: &Url, err: &serde_json::Error) -> Error {
        Error::Parse {
            node: self.node.clone(),
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    fn connection(&self, url: &Url, err: &reqwest::Error) -> Error {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Error::Connection {
            node: self.node.clone(),
            url: url.to_string(),
            message,
        }
    }
}
