//! Mock storefront endpoints.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// GET `route` answers with a success envelope around `data`.
pub async fn mock_envelope(server: &MockServer, route: &str, data: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": data,
        })))
        .mount(server)
        .await;
}

/// GET `route` fails with `status` for the first `fail_count` requests, then succeeds.
pub async fn mock_flaky(
    server: &MockServer,
    route: &str,
    status: u16,
    fail_count: u64,
    data: Value,
) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .up_to_n_times(fail_count)
        .mount(server)
        .await;

    mock_envelope(server, route, data).await;
}

/// GET `route` always answers with `status` and an error envelope.
pub async fn mock_status(server: &MockServer, route: &str, status: u16, message: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "success": false,
            "message": message,
        })))
        .mount(server)
        .await;
}

/// GET `route` only succeeds with the given bearer token.
pub async fn mock_authenticated(server: &MockServer, route: &str, token: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "email": "shopper@example.com" },
        })))
        .mount(server)
        .await;
}

/// GET `route` answers after `delay`.
pub async fn mock_slow(server: &MockServer, route: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "data": [] }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}
