use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

/// The one error kind a loader can surface. The user sees its text; the
/// variant only matters for logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("API {path} failed: {status} {body}")]
    Status { path: String, status: u16, body: String },
    #[error("API {path} failed: {message}")]
    Transport { path: String, message: String },
    #[error("API {path} returned malformed JSON: {message}")]
    Decode { path: String, message: String },
}

/// A read-only JSON service. `path` includes its query string.
#[async_trait]
pub trait Api: Send + Sync {
    async fn get(&self, path: &str) -> Result<String, ApiError>;
}

/// One GET, decoded into the resource's shape. No retry, no cache.
pub async fn fetch_json<T, A>(api: &A, path: &str) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    A: Api + ?Sized,
{
    tracing::debug!(path, "GET");
    let body = api.get(path).await?;
    serde_json::from_str(&body).map_err(|e| ApiError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

pub struct HttpApi {
    client: Client,
    base: String,
}

impl HttpApi {
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(base)?;
        Ok(Self {
            client: Client::new(),
            base: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }
}

#[async_trait]
impl Api for HttpApi {
    async fn get(&self, path: &str) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base, path);
        let transport = |e: reqwest::Error| ApiError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        };

        let resp = self.client.get(&url).send().await.map_err(transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(transport)?;

        if !status.is_success() {
            return Err(ApiError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[cfg(test)]
pub mod fake {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Canned responses keyed by full path; unknown paths answer 404.
    #[derive(Default)]
    pub struct FakeApi {
        routes: Mutex<HashMap<String, Result<String, ApiError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ok(&self, path: &str, body: serde_json::Value) {
            self.routes
                .lock()
                .unwrap()
                .insert(path.to_string(), Ok(body.to_string()));
        }

        pub fn fail(&self, path: &str, status: u16, body: &str) {
            self.routes.lock().unwrap().insert(
                path.to_string(),
                Err(ApiError::Status {
                    path: path.to_string(),
                    status,
                    body: body.to_string(),
                }),
            );
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Api for FakeApi {
        async fn get(&self, path: &str) -> Result<String, ApiError> {
            self.calls.lock().unwrap().push(path.to_string());
            self.routes
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .unwrap_or_else(|| {
                    Err(ApiError::Status {
                        path: path.to_string(),
                        status: 404,
                        body: "not found".to_string(),
                    })
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeApi;
    use super::*;
    use crate::models::LabelValue;
    use serde_json::json;

    #[test]
    fn status_error_text_carries_status_and_body() {
        let e = ApiError::Status {
            path: "/kpi".into(),
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(e.to_string(), "API /kpi failed: 500 boom");
    }

    #[test]
    fn base_url_is_validated_and_trimmed() {
        assert!(HttpApi::new("not a url").is_err());
        let api = HttpApi::new("http://localhost:8000/").unwrap();
        assert_eq!(api.base(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn fetch_json_decodes_and_reports_shape_errors() {
        let api = FakeApi::new();
        api.ok("/distribution/types", json!([{"label": "drone", "value": 3}]));
        api.ok("/kpi", json!("not an object"));

        let rows: Vec<LabelValue> = fetch_json(&api, "/distribution/types").await.unwrap();
        assert_eq!(rows[0].label, "drone");
        assert_eq!(rows[0].value, 3.0);

        let err = fetch_json::<crate::models::Kpi, _>(&api, "/kpi").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
