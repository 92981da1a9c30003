//! Postal code lookup
//!
//! Resolves street, neighborhood, city and state for a Brazilian postal code
//! (CEP) through a ViaCep-compatible HTTP service:
//!
//! ```text
//! GET {base_url}/ws/{postal_code}/json/
//! ```
//!
//! A 200 body of `{"erro": true}` means the code does not exist. Any other
//! non-success outcome is a hard failure; callers never fall back to partial
//! data.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Error type for postal lookups
#[derive(Debug, thiserror::Error)]
pub enum PostalError {
    /// Connection, timeout or TLS failure
    #[error("Postal lookup request failed: {0}")]
    Transport(String),

    /// Service answered with a non-success status
    #[error("Postal lookup returned status {0}")]
    Status(u16),

    /// Service reported the postal code as unknown
    #[error("Postal code not found")]
    NotFound,

    /// Response body did not have the expected shape
    #[error("Postal lookup response could not be decoded: {0}")]
    Decode(String),
}

/// Address fields resolved from a postal code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalAddress {
    pub postal_code: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// Anything able to resolve a postal code
#[async_trait]
pub trait PostalLookup: Send + Sync {
    async fn lookup(&self, postal_code: &str) -> Result<PostalAddress, PostalError>;
}

/// Wire format of a ViaCep response
#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    erro: Option<serde_json::Value>,
    #[serde(default)]
    cep: Option<String>,
    #[serde(default)]
    logradouro: Option<String>,
    #[serde(default)]
    bairro: Option<String>,
    #[serde(default)]
    localidade: Option<String>,
    #[serde(default)]
    uf: Option<String>,
    #[serde(default)]
    estado: Option<String>,
}

impl ViaCepResponse {
    /// ViaCep has sent both `"erro": true` and `"erro": "true"`
    fn is_not_found(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag == "true",
            _ => false,
        }
    }

    fn into_address(self, requested: &str) -> PostalAddress {
        PostalAddress {
            postal_code: self
                .cep
                .map(|c| c.replace('-', ""))
                .unwrap_or_else(|| requested.to_string()),
            street: self.logradouro.unwrap_or_default(),
            neighborhood: self.bairro.unwrap_or_default(),
            city: self.localidade.unwrap_or_default(),
            state: self.estado.or(self.uf).unwrap_or_default(),
        }
    }
}

/// HTTP client for a ViaCep-compatible service
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    client: Client,
    base_url: String,
}

impl ViaCepClient {
    /// Creates a client with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PostalError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PostalError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, postal_code: &str) -> String {
        format!("{}/ws/{}/json/", self.base_url, postal_code)
    }
}

#[async_trait]
impl PostalLookup for ViaCepClient {
    async fn lookup(&self, postal_code: &str) -> Result<PostalAddress, PostalError> {
        let url = self.url_for(postal_code);
        debug!(postal_code = %postal_code, "Looking up postal code");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PostalError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(postal_code = %postal_code, status = status.as_u16(), "Postal lookup failed");
            return Err(PostalError::Status(status.as_u16()));
        }

        let body: ViaCepResponse = response
            .json()
            .await
            .map_err(|e| PostalError::Decode(e.to_string()))?;

        if body.is_not_found() {
            debug!(postal_code = %postal_code, "Postal code not found");
            return Err(PostalError::NotFound);
        }

        Ok(body.into_address(postal_code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn client(base_url: &str) -> ViaCepClient {
        ViaCepClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/ws/01001000/json/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "cep": "01001-000",
                    "logradouro": "Praça da Sé",
                    "complemento": "lado ímpar",
                    "bairro": "Sé",
                    "localidade": "São Paulo",
                    "uf": "SP",
                    "estado": "São Paulo"
                }"#,
            )
            .create_async()
            .await;

        let address = client(&server.url()).lookup("01001000").await.unwrap();
        mock.assert_async().await;

        assert_eq!(address.postal_code, "01001000");
        assert_eq!(address.street, "Praça da Sé");
        assert_eq!(address.neighborhood, "Sé");
        assert_eq!(address.city, "São Paulo");
        assert_eq!(address.state, "São Paulo");
    }

    #[tokio::test]
    async fn test_lookup_falls_back_to_uf() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/ws/20040002/json/")
            .with_status(200)
            .with_body(r#"{"cep":"20040-002","logradouro":"Rua A","bairro":"Centro","localidade":"Rio de Janeiro","uf":"RJ"}"#)
            .create_async()
            .await;

        let address = client(&server.url()).lookup("20040002").await.unwrap();
        assert_eq!(address.state, "RJ");
    }

    #[tokio::test]
    async fn test_lookup_server_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/ws/01001000/json/")
            .with_status(500)
            .create_async()
            .await;

        let result = client(&server.url()).lookup("01001000").await;
        assert!(matches!(result, Err(PostalError::Status(500))));
    }

    #[tokio::test]
    async fn test_lookup_unknown_code() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/ws/99999999/json/")
            .with_status(200)
            .with_body(r#"{"erro": true}"#)
            .create_async()
            .await;

        let result = client(&server.url()).lookup("99999999").await;
        assert!(matches!(result, Err(PostalError::NotFound)));
    }

    #[tokio::test]
    async fn test_lookup_malformed_body() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/ws/01001000/json/")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let result = client(&server.url()).lookup("01001000").await;
        assert!(matches!(result, Err(PostalError::Decode(_))));
    }

    #[tokio::test]
    async fn test_lookup_unreachable_host() {
        let result = client("http://127.0.0.1:1").lookup("01001000").await;
        assert!(matches!(result, Err(PostalError::Transport(_))));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let c = client("https://viacep.com.br/");
        assert_eq!(c.url_for("01001000"), "https://viacep.com.br/ws/01001000/json/");
    }
}
