/// Common test utilities for integration tests
///
/// Builds the full router over in-memory repositories and a stub postal
/// lookup, so the HTTP surface can be exercised without Postgres or network.

use async_trait::async_trait;
use ava_api::{app::{build_router, AppState}, config::ApiConfig};
use ava_shared::{
    auth::{jwt::TokenCodec, password::hash_password},
    models::{
        account::{Account, NewAccount},
        address::NewAddress,
    },
    postal::{PostalAddress, PostalError, PostalLookup},
    repository::{memory::InMemoryStore, AccountRepository, AddressRepository, Repositories},
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tower::Service as _;

pub const SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery";

/// Postal lookup that answers São Paulo, or fails with 500 when switched off
#[derive(Default)]
pub struct SwitchablePostal {
    pub failing: AtomicBool,
}

#[async_trait]
impl PostalLookup for SwitchablePostal {
    async fn lookup(&self, postal_code: &str) -> Result<PostalAddress, PostalError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PostalError::Status(500));
        }

        Ok(PostalAddress {
            postal_code: postal_code.to_string(),
            street: "Praça da Sé".to_string(),
            neighborhood: "Sé".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
        })
    }
}

/// Test context containing the router and its backing store
pub struct TestContext {
    pub app: Router,
    pub store: Arc<InMemoryStore>,
    pub postal: Arc<SwitchablePostal>,
    pub codec: Arc<TokenCodec>,
    pub admin: Account,
}

impl TestContext {
    /// Seeds roles and one active admin account
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::seeded());
        let postal = Arc::new(SwitchablePostal::default());
        let codec = Arc::new(TokenCodec::new(SECRET));

        let address = AddressRepository::create(
            store.as_ref(),
            NewAddress {
                postal_code: "01001000".to_string(),
                street: "Praça da Sé".to_string(),
                complement: None,
                number: Some("1".to_string()),
                neighborhood: "Sé".to_string(),
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
            },
        )
        .await
        .unwrap();

        let admin = AccountRepository::create(
            store.as_ref(),
            NewAccount {
                name: "Admin".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
                phone: "11999990000".to_string(),
                role_id: 1,
                address_id: address.id,
            },
        )
        .await
        .unwrap();

        let state = AppState::new(
            Repositories::in_memory(store.clone()),
            postal.clone(),
            codec.clone(),
            None,
        );
        let api = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        };

        Self {
            app: build_router(state, &api),
            store,
            postal,
            codec,
            admin,
        }
    }

    /// Authorization header value for the seeded admin
    pub fn auth_header(&self) -> String {
        let claims = self.codec.build_claims(&self.admin);
        format!("Bearer {}", self.codec.encode(&claims).unwrap())
    }

    /// Sends a request and returns status plus parsed JSON body (`Null` when empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    /// Authenticated request as the seeded admin
    pub async fn send_as_admin(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let header = self.auth_header();
        self.send(method, uri, Some(&header), body).await
    }
}
