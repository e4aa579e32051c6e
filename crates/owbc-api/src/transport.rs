//! The single JSON request helper every backend call goes through.
//!
//! Success bodies are parsed as JSON when they are JSON and kept as raw
//! text otherwise. Non-2xx responses become [`Error::Api`] carrying the
//! status and the body verbatim, so callers can decide whether to show
//! it (manual actions do, background refreshes do not).

use owbc_core::prelude::*;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Thin wrapper around a shared [`reqwest::Client`] and the active base
/// URL. Rebuilding the base is cheap; the client is reused.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
}

impl Transport {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| Error::http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Point the transport at a new base URL (endpoint apply).
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    /// Join the base URL and an endpoint path.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if self.base_url.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url.trim_end_matches('/'), path)
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Request primitives
    // ─────────────────────────────────────────────────────────────

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.execute(self.http.get(self.url(path))).await
    }

    pub async fn get_with_query(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.execute(self.http.get(self.url(path)).query(query))
            .await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.execute(self.http.post(self.url(path)).json(body)).await
    }

    /// POST without a body (cancel/rebuild style actions).
    pub async fn post_empty(&self, path: &str) -> Result<Value> {
        self.execute(self.http.post(self.url(path))).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.execute(self.http.put(self.url(path)).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.execute(self.http.delete(self.url(path))).await
    }

    /// File upload is the one non-JSON request body in the protocol.
    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Value> {
        self.execute(self.http.post(self.url(path)).multipart(form))
            .await
    }

    /// Fetch a binary body (artifact download).
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| Error::http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(status.as_u16(), body));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::http(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::http(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http(e.to_string()))?;
        if !status.is_success() {
            debug!(status = status.as_u16(), "backend returned error body");
            return Err(Error::api(status.as_u16(), text));
        }
        Ok(body_to_value(&text))
    }
}

/// Parse a response body: JSON when it is JSON, raw text otherwise,
/// `Null` when empty.
pub(crate) fn body_to_value(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Decode a parsed body into a typed value.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let transport = Transport::new("http://h/api/v1").unwrap();
        assert_eq!(transport.url("builds"), "http://h/api/v1/builds");
        assert_eq!(transport.url("/builds"), "http://h/api/v1/builds");

        let transport = Transport::new("http://h/api/v1/").unwrap();
        assert_eq!(transport.url("builds"), "http://h/api/v1/builds");
    }

    #[test]
    fn test_url_with_empty_base() {
        let transport = Transport::new("").unwrap();
        assert_eq!(transport.url("/builds"), "builds");
    }

    #[test]
    fn test_body_to_value_json() {
        let value = body_to_value(r#"{"status":"ok"}"#);
        assert_eq!(value["status"], "ok");
    }

    #[test]
    fn test_body_to_value_plain_text() {
        let value = body_to_value("internal server error");
        assert_eq!(value, Value::String("internal server error".to_string()));
    }

    #[test]
    fn test_body_to_value_empty() {
        assert_eq!(body_to_value(""), Value::Null);
        assert_eq!(body_to_value("  \n"), Value::Null);
    }

    #[test]
    fn test_decode_into_typed() {
        let value = body_to_value(r#"[{"build_id":"b1","state":"queued"}]"#);
        let builds: Vec<owbc_core::BuildSummary> = decode(value).unwrap();
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].build_id, "b1");
    }
}
