//! APIC REST client
//!
//! Session-cookie authenticated wrapper around the APIC REST API.

use crate::controller::{login_body, ClassQuery, ConfigRequest, FabricController};
use crate::mo::ManagedObject;
use async_trait::async_trait;
use microseg_common::{MicrosegError, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

const COOKIE_NAME: &str = "APIC-cookie";

fn transport(e: reqwest::Error) -> MicrosegError {
    MicrosegError::transport(e.to_string())
}

/// First `error` entry of an APIC `imdata` payload as `(code, text)`
fn imdata_error(payload: &Value) -> Option<(String, String)> {
    payload
        .get("imdata")?
        .as_array()?
        .iter()
        .find_map(|item| item.get("error"))
        .map(|err| {
            let attrs = err.get("attributes");
            let field = |name: &str| {
                attrs
                    .and_then(|a| a.get(name))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            (field("code"), field("text"))
        })
}

/// APIC REST client
pub struct ApicClient {
    /// API base URL
    base_url: String,
    /// HTTP client
    client: Client,
    /// Session token from `aaaLogin`
    token: RwLock<Option<String>>,
}

impl ApicClient {
    /// Create new APIC client
    pub fn new(base_url: &str, timeout: Duration, verify_tls: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| MicrosegError::config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: RwLock::new(None),
        })
    }

    /// Authenticate and keep the session token
    pub async fn login(&self, login: &str, password: &str) -> Result<()> {
        let url = format!("{}/api/aaaLogin.json", self.base_url);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&login_body(login, password))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let payload: Value = response.json().await.map_err(transport)?;

        if let Some((code, text)) = imdata_error(&payload) {
            return Err(MicrosegError::transport(format!(
                "APIC login failed ({code}): {text}"
            )));
        }
        if !status.is_success() {
            return Err(MicrosegError::transport(format!("APIC login failed: {status}")));
        }

        let token = payload
            .pointer("/imdata/0/aaaLogin/attributes/token")
            .and_then(Value::as_str)
            .ok_or_else(|| MicrosegError::transport("APIC login response carries no token"))?;

        *self.token.write().await = Some(token.to_string());
        info!(login, "Authenticated with APIC");
        Ok(())
    }

    async fn cookie(&self) -> Result<String> {
        let token = self.token.read().await;
        let token = token
            .as_ref()
            .ok_or_else(|| MicrosegError::transport("not authenticated with APIC"))?;
        Ok(format!("{}={}", COOKIE_NAME, token))
    }
}

#[async_trait]
impl FabricController for ApicClient {
    async fn query(&self, query: &ClassQuery) -> Result<Vec<ManagedObject>> {
        let (path, params) = query.to_request();
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::COOKIE, self.cookie().await?)
            .query(&params)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let payload: Value = response.json().await.map_err(transport)?;

        if let Some((code, text)) = imdata_error(&payload) {
            return Err(MicrosegError::transport(format!(
                "query {} failed ({code}): {text}",
                query.class
            )));
        }
        if !status.is_success() {
            return Err(MicrosegError::transport(format!("query {} failed: {status}", query.class)));
        }

        payload
            .get("imdata")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(ManagedObject::from_json).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn commit(&self, request: &ConfigRequest) -> Result<()> {
        let url = format!("{}{}", self.base_url, request.path());
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::COOKIE, self.cookie().await?)
            .json(&request.to_json())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        let payload: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if let Some((code, text)) = imdata_error(&payload) {
            return Err(MicrosegError::CommitRejected { code, text });
        }
        if status.is_success() {
            Ok(())
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(MicrosegError::transport(format!("APIC rejected the session: {status}")))
        } else {
            Err(MicrosegError::CommitRejected {
                code: status.as_u16().to_string(),
                text,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn logged_in(server: &MockServer) -> ApicClient {
        Mock::given(method("POST"))
            .and(path("/api/aaaLogin.json"))
            .and(body_json(json!({"aaaUser": {"attributes": {"name": "admin", "pwd": "secret"}}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalCount": "1",
                "imdata": [{"aaaLogin": {"attributes": {"token": "tok123"}}}]
            })))
            .mount(server)
            .await;

        let client = ApicClient::new(&server.uri(), Duration::from_secs(5), true).unwrap();
        client.login("admin", "secret").await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_query_sends_cookie_and_filter() {
        let server = MockServer::start().await;
        let client = logged_in(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/node/class/fvTenant.json"))
            .and(header("cookie", "APIC-cookie=tok123"))
            .and(query_param("query-target-filter", "eq(fvTenant.name,\"prod\")"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalCount": "1",
                "imdata": [{"fvTenant": {"attributes": {"name": "prod", "dn": "uni/tn-prod"}}}]
            })))
            .mount(&server)
            .await;

        let found = client
            .query(&ClassQuery::new("fvTenant").eq("name", "prod"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("dn"), Some("uni/tn-prod"));
    }

    #[tokio::test]
    async fn test_query_without_login_fails() {
        let client = ApicClient::new("http://127.0.0.1:9", Duration::from_secs(1), true).unwrap();
        let err = client.query(&ClassQuery::new("fvTenant")).await.unwrap_err();
        assert!(matches!(err, MicrosegError::Transport(_)));
    }

    #[tokio::test]
    async fn test_login_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/aaaLogin.json"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "totalCount": "1",
                "imdata": [{"error": {"attributes": {
                    "code": "401",
                    "text": "Username or password is incorrect"
                }}}]
            })))
            .mount(&server)
            .await;

        let client = ApicClient::new(&server.uri(), Duration::from_secs(5), true).unwrap();
        let err = client.login("admin", "bad").await.unwrap_err();
        assert!(matches!(err, MicrosegError::Transport(_)));
        assert!(err.to_string().contains("Username or password is incorrect"));
    }

    #[tokio::test]
    async fn test_commit_posts_tree() {
        let server = MockServer::start().await;
        let client = logged_in(&server).await;

        let request = ConfigRequest::new(
            ManagedObject::new("polUni").child(ManagedObject::new("fvTenant").attr("name", "prod")),
        );
        Mock::given(method("POST"))
            .and(path("/api/mo/uni.json"))
            .and(body_json(request.to_json()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"totalCount": "0", "imdata": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        client.commit(&request).await.unwrap();
    }

    #[tokio::test]
    async fn test_commit_rejection_is_verbatim() {
        let server = MockServer::start().await;
        let client = logged_in(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/mo/uni.json"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "totalCount": "1",
                "imdata": [{"error": {"attributes": {"code": "182", "text": "BD not found"}}}]
            })))
            .mount(&server)
            .await;

        let err = client.commit(&ConfigRequest::default()).await.unwrap_err();
        match err {
            MicrosegError::CommitRejected { code, text } => {
                assert_eq!(code, "182");
                assert_eq!(text, "BD not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
