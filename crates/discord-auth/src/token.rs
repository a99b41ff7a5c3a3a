//! Authorization code exchange
//!
//! POSTs to Discord's token endpoint with the client credentials and the
//! authorization code from the callback. Transport failures and non-success
//! statuses are distinct error variants because the relay surfaces them as
//! different redirect codes.

use serde::{Deserialize, Serialize};

use crate::constants::TOKEN_PATH;
use crate::error::{Error, Result};

/// Response from the token endpoint.
///
/// Discord also returns `token_type`, `expires_in`, and `scope`; the relay
/// only persists the token pair, so the rest is ignored on deserialization.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Exchange an authorization code for an access/refresh token pair.
///
/// `redirect_uri` must match the one embedded in the authorization URL or
/// Discord rejects the exchange.
pub async fn exchange_code(
    client: &reqwest::Client,
    api_base: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenResponse> {
    let response = client
        .post(format!("{api_base}{TOKEN_PATH}"))
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::TokenExchange(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use tokio::net::TcpListener;

    #[test]
    fn token_response_deserializes() {
        let json = r#"{"access_token":"at_abc","refresh_token":"rt_def","token_type":"Bearer","expires_in":604800,"scope":"identify email"}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "at_abc");
        assert_eq!(token.refresh_token, "rt_def");
    }

    async fn start_token_endpoint(status: StatusCode, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let app = Router::new().route(
                "/oauth2/token",
                post(move || async move {
                    (
                        status,
                        [(axum::http::header::CONTENT_TYPE, "application/json")],
                        body,
                    )
                }),
            );
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn exchange_code_parses_success_response() {
        let base = start_token_endpoint(
            StatusCode::OK,
            r#"{"access_token":"at_1","refresh_token":"rt_1"}"#,
        )
        .await;

        let client = reqwest::Client::new();
        let token = exchange_code(&client, &base, "cid", "secret", "code-1", "http://cb")
            .await
            .unwrap();
        assert_eq!(token.access_token, "at_1");
        assert_eq!(token.refresh_token, "rt_1");
    }

    #[tokio::test]
    async fn exchange_code_rejects_non_success_status() {
        let base =
            start_token_endpoint(StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant"}"#).await;

        let client = reqwest::Client::new();
        let result = exchange_code(&client, &base, "cid", "secret", "bad-code", "http://cb").await;
        match result {
            Err(Error::TokenExchange(msg)) => assert!(msg.contains("400")),
            other => panic!("expected TokenExchange error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn exchange_code_maps_transport_failure_to_http_error() {
        // Nothing listens on port 1, so the connection is refused
        let client = reqwest::Client::new();
        let result = exchange_code(
            &client,
            "http://127.0.0.1:1",
            "cid",
            "secret",
            "code",
            "http://cb",
        )
        .await;
        assert!(matches!(result, Err(Error::Http(_))));
    }
}
