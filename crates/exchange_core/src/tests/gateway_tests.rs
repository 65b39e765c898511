use super::*;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response as AxumResponse},
    routing::{get, post},
    Json, Router,
};
use shared::domain::Participant;
use tokio::{net::TcpListener, sync::Mutex};

use crate::{ExchangeEngine, ExchangeError};

const TEST_PEM: &str = "-----BEGIN PUBLIC KEY-----\nMIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAtest\n-----END PUBLIC KEY-----\n";

#[derive(Clone, Default)]
struct StubState {
    fail_public_key: bool,
    fail_encrypt: bool,
    fail_decrypt: bool,
    encrypt_bodies: Arc<Mutex<Vec<EncryptRequest>>>,
    decrypt_bodies: Arc<Mutex<Vec<DecryptRequest>>>,
}

fn service_error(status: StatusCode, detail: &str) -> AxumResponse {
    (
        status,
        Json(ServiceErrorBody {
            error: detail.to_string(),
        }),
    )
        .into_response()
}

async fn stub_public_key(State(state): State<StubState>) -> AxumResponse {
    if state.fail_public_key {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    Json(PublicKeyResponse {
        public_key: PublicKeyMaterial::new(TEST_PEM),
    })
    .into_response()
}

async fn stub_encrypt(
    State(state): State<StubState>,
    Json(body): Json<EncryptRequest>,
) -> AxumResponse {
    state.encrypt_bodies.lock().await.push(body.clone());
    if state.fail_encrypt {
        return service_error(StatusCode::BAD_REQUEST, "Plaintext is too long");
    }
    let encrypted = if body.message == "Hello" {
        "AQID".to_string()
    } else {
        format!("enc:{}", body.message)
    };
    Json(EncryptResponse {
        encrypted: Ciphertext::new(encrypted),
    })
    .into_response()
}

async fn stub_decrypt(
    State(state): State<StubState>,
    Json(body): Json<DecryptRequest>,
) -> AxumResponse {
    state.decrypt_bodies.lock().await.push(body.clone());
    if state.fail_decrypt {
        return service_error(StatusCode::BAD_REQUEST, "Decryption failed");
    }
    let decrypted = match body.encrypted.as_str() {
        "AQID" => "Hello".to_string(),
        other => match other.strip_prefix("enc:") {
            Some(plain) => plain.to_string(),
            None => return service_error(StatusCode::BAD_REQUEST, "Incorrect padding"),
        },
    };
    Json(DecryptResponse { decrypted }).into_response()
}

async fn spawn_crypto_service(state: StubState) -> Result<Url> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/public-key", get(stub_public_key))
        .route("/encrypt", post(stub_encrypt))
        .route("/decrypt", post(stub_decrypt))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(Url::parse(&format!("http://{addr}/"))?)
}

#[tokio::test]
async fn fetches_public_key_from_service() {
    let url = spawn_crypto_service(StubState::default())
        .await
        .expect("spawn server");
    let gateway = HttpGateway::new(&url);
    assert!(!gateway.base_url().ends_with('/'));

    let key = gateway.fetch_public_key().await.expect("public key");
    assert_eq!(key.as_str(), TEST_PEM);
}

#[tokio::test]
async fn non_success_public_key_is_an_error() {
    let url = spawn_crypto_service(StubState {
        fail_public_key: true,
        ..StubState::default()
    })
    .await
    .expect("spawn server");

    let err = HttpGateway::new(&url)
        .fetch_public_key()
        .await
        .expect_err("should fail");
    let exception = err
        .downcast_ref::<ServiceException>()
        .expect("service exception");
    assert_eq!(exception.status, 503);
}

#[tokio::test]
async fn encrypt_posts_message_body() {
    let state = StubState::default();
    let url = spawn_crypto_service(state.clone())
        .await
        .expect("spawn server");

    let ciphertext = HttpGateway::new(&url)
        .encrypt("Hello")
        .await
        .expect("encrypt");

    assert_eq!(ciphertext, Ciphertext::new("AQID"));
    let bodies = state.encrypt_bodies.lock().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0].message, "Hello");
}

#[tokio::test]
async fn service_error_detail_is_carried_in_message() {
    let url = spawn_crypto_service(StubState {
        fail_encrypt: true,
        ..StubState::default()
    })
    .await
    .expect("spawn server");

    let err = HttpGateway::new(&url)
        .encrypt("Hello")
        .await
        .expect_err("should fail");

    let message = err.to_string();
    assert!(message.contains("400"), "unexpected error: {message}");
    assert!(message.contains("Plaintext is too long"));
}

#[tokio::test]
async fn decrypt_posts_ciphertext_body() {
    let state = StubState::default();
    let url = spawn_crypto_service(state.clone())
        .await
        .expect("spawn server");

    let plaintext = HttpGateway::new(&url)
        .decrypt(&Ciphertext::new("AQID"))
        .await
        .expect("decrypt");

    assert_eq!(plaintext, "Hello");
    assert_eq!(
        state.decrypt_bodies.lock().await[0].encrypted,
        Ciphertext::new("AQID")
    );
}

#[tokio::test]
async fn closed_port_surfaces_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let url = Url::parse(&format!("http://{addr}")).expect("url");
    let gateway =
        HttpGateway::with_timeout(&url, Duration::from_secs(2)).expect("client");
    assert!(gateway.fetch_public_key().await.is_err());
}

#[tokio::test]
async fn engine_round_trip_over_http() {
    let state = StubState::default();
    let url = spawn_crypto_service(state.clone())
        .await
        .expect("spawn server");
    let engine = ExchangeEngine::new(Arc::new(HttpGateway::new(&url)));

    engine.initialize().await.expect("initialize");
    let receipt = engine
        .send_from(Participant::Alice, "Hello")
        .await
        .expect("send");
    assert_eq!(receipt.ciphertext, Ciphertext::new("AQID"));
    assert_eq!(engine.snapshot().await.completed_steps, 3);

    let plaintext = engine.decrypt_as(Participant::Bob).await.expect("decrypt");
    assert_eq!(plaintext, "Hello");
    assert_eq!(engine.snapshot().await.completed_steps, 4);
}

#[tokio::test]
async fn engine_maps_http_decrypt_failure() {
    let url = spawn_crypto_service(StubState {
        fail_decrypt: true,
        ..StubState::default()
    })
    .await
    .expect("spawn server");
    let engine = ExchangeEngine::new(Arc::new(HttpGateway::new(&url)));
    engine.initialize().await.expect("initialize");
    engine
        .send_from(Participant::Bob, "Hello")
        .await
        .expect("send");

    let err = engine
        .decrypt_as(Participant::Alice)
        .await
        .expect_err("should fail");
    match err {
        ExchangeError::DecryptionFailed(detail) => assert!(detail.contains("Decryption failed")),
        other => panic!("unexpected error: {other:?}"),
    }
}
