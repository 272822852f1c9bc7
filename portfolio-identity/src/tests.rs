//! Tests for the identity client

use super::*;

#[test]
fn test_client_config_creation() {
    let config = IdentityClientConfig::new("https://portfolio.uni.edu");
    assert_eq!(config.base_url, "https://portfolio.uni.edu");
    assert_eq!(config.timeout_seconds, 30);

    let config = IdentityClientConfig::default()
        .with_header("X-Custom-Header".to_string(), "test-value".to_string())
        .with_timeout(60);
    assert_eq!(config.timeout_seconds, 60);
    assert_eq!(
        config.headers.get("X-Custom-Header"),
        Some(&"test-value".to_string())
    );
}

#[test]
fn test_client_config_from_service_settings() {
    let service = portfolio_core::ServiceConfig {
        base_url: "https://backend.onrender.com".to_string(),
        timeout_seconds: 10,
        user_agent: "portfolio/0.1".to_string(),
    };

    let config = IdentityClientConfig::from_service(&service);
    assert_eq!(config.base_url, "https://backend.onrender.com");
    assert_eq!(config.timeout_seconds, 10);
}

#[tokio::test]
async fn test_http_client_creation() {
    let config = IdentityClientConfig::default();
    let client = create_http_client(&config);
    assert!(client.is_ok());

    let client = IdentityClient::new(config);
    assert!(client.is_ok());
}

#[test]
fn test_token_response_parsing() {
    let json = r#"{"accessToken": "abc.def.ghi", "tokenType": "Bearer"}"#;
    let token: TokenResponse = serde_json::from_str(json).unwrap();
    assert_eq!(token.access_token, "abc.def.ghi");
    assert_eq!(token.token_type, "Bearer");

    // tokenType is implied when the service omits it
    let json = r#"{"accessToken": "abc.def.ghi"}"#;
    let token: TokenResponse = serde_json::from_str(json).unwrap();
    assert_eq!(token.token_type, "Bearer");
}

#[test]
fn test_registration_request_wire_format() {
    let request = RegistrationRequest {
        full_name: "Ana Souza".to_string(),
        email: "ana@uni.edu".to_string(),
        password: "secret".to_string(),
        course: Some("Engenharia de Software".to_string()),
        shift: None,
    };

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["nomeCompleto"], "Ana Souza");
    assert_eq!(json["curso"], "Engenharia de Software");
    // absent optionals are omitted, not null
    assert!(json.get("turno").is_none());
}

#[test]
fn test_credential_request_wire_format() {
    let request = CredentialRequest {
        email: "ana@uni.edu".to_string(),
        password: "secret".to_string(),
    };

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["email"], "ana@uni.edu");
    assert_eq!(json["password"], "secret");
}
