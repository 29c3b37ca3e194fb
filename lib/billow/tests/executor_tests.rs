//! Retry, deadline and idempotency behaviour against a live mock server.

use std::time::Duration;

use assert2::{check, let_assert};
use billow::{
    ApiRequest, ClientConfig, Error, ErrorKind, Executor, HyperClient, IDEMPOTENCY_KEY_HEADER,
    Method, RetryPolicy,
};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts)
        .with_base_delay(Duration::from_millis(10))
        .with_max_delay(Duration::from_millis(50))
        .with_jitter(false)
}

fn executor(server: &MockServer) -> Executor {
    let base_url = Url::parse(&server.uri()).expect("mock server url");
    Executor::new(HyperClient::new(), base_url).with_retry(fast_retry(3))
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .len()
}

#[tokio::test]
async fn idempotent_get_retries_past_two_503() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites/s1/accounts/a1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sites/s1/accounts/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "a1"})))
        .mount(&server)
        .await;

    let request = ApiRequest::builder(Method::Get, "/sites/s1/accounts/a1").build();
    let executed = executor(&server)
        .execute_json_traced::<serde_json::Value>(&request)
        .await
        .expect("third attempt succeeds");

    check!(executed.value["id"] == "a1");
    check!(executed.attempts == 3);
    check!(executed.retries() == 2);
    check!(request_count(&server).await == 3);
}

#[tokio::test]
async fn keyless_post_without_generated_keys_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sites/s1/accounts"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let request = ApiRequest::builder(Method::Post, "/sites/s1/accounts")
        .json(&serde_json::json!({"code": "bob"}))
        .expect("serializable body")
        .build();
    let result = executor(&server)
        .with_generated_idempotency_keys(false)
        .execute(&request)
        .await;

    let_assert!(Err(Error::Api(api)) = result);
    check!(api.status == 503);
    check!(api.kind == ErrorKind::Server);
    check!(request_count(&server).await == 1);
}

#[tokio::test]
async fn post_reuses_its_idempotency_key_on_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sites/s1/accounts"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sites/s1/accounts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "a9"})))
        .mount(&server)
        .await;

    let request = ApiRequest::builder(Method::Post, "/sites/s1/accounts")
        .json(&serde_json::json!({"code": "bob"}))
        .expect("serializable body")
        .build();
    executor(&server).execute(&request).await.expect("retried POST succeeds");

    let received = server.received_requests().await.expect("recording");
    check!(received.len() == 2);
    let keys: Vec<_> = received
        .iter()
        .map(|request| {
            request
                .headers
                .get(IDEMPOTENCY_KEY_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(ToString::to_string)
        })
        .collect();
    let_assert!(Some(first) = &keys[0]);
    check!(uuid::Uuid::parse_str(first).is_ok());
    check!(keys[0] == keys[1]);
}

#[tokio::test]
async fn persistent_500_stops_at_the_attempt_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites/s1/invoices/i1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let request = ApiRequest::builder(Method::Get, "/sites/s1/invoices/i1").build();
    let result = executor(&server).execute(&request).await;

    let_assert!(Err(Error::RetriesExhausted { attempts, last }) = result);
    check!(attempts == 3);
    check!(last.status() == Some(500));
    check!(request_count(&server).await == 3);
}

#[tokio::test]
async fn validation_errors_keep_their_params() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/sites/s1/accounts/a1"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "error": {
                "type": "validation",
                "message": "Email is invalid",
                "params": [{"param": "email", "message": "is invalid"}]
            }
        })))
        .mount(&server)
        .await;

    let request = ApiRequest::builder(Method::Put, "/sites/s1/accounts/a1")
        .json(&serde_json::json!({"email": "nope"}))
        .expect("serializable body")
        .build();
    let result = executor(&server).execute(&request).await;

    let_assert!(Err(error) = result);
    check!(error.kind() == ErrorKind::Validation);
    check!(error.status() == Some(422));
    check!(error.params().len() == 1);
    check!(error.params()[0].param == "email");
    check!(request_count(&server).await == 1);
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let request = ApiRequest::builder(Method::Get, "/sites/s1/plans/gold").build();
    let result = executor(&server).execute(&request).await;

    let_assert!(Err(error) = result);
    check!(error.is_not_found());
    check!(request_count(&server).await == 1);
}

#[tokio::test]
async fn slow_response_hits_the_call_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let request = ApiRequest::builder(Method::Get, "/sites/s1/accounts/a1").build();
    let result = executor(&server)
        .with_timeout(Duration::from_millis(200))
        .execute(&request)
        .await;

    let_assert!(Err(Error::Timeout { attempts }) = result);
    check!(attempts == 1);
}

#[tokio::test]
async fn rate_limited_call_honours_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;

    let request = ApiRequest::builder(Method::Get, "/sites/s1/coupons/c1").build();
    let executed = executor(&server)
        .execute_traced(&request)
        .await
        .expect("second attempt succeeds");

    check!(executed.attempts == 2);
}

#[tokio::test]
async fn wire_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Accept", "application/json"))
        .and(header("Content-Type", "application/json"))
        .and(header("User-Agent", "billow-tests/1"))
        .and(header(IDEMPOTENCY_KEY_HEADER, "order-7"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let request = ApiRequest::builder(Method::Post, "/sites/s1/accounts/a1/line_items")
        .json(&serde_json::json!({"amount": 10}))
        .expect("serializable body")
        .idempotency_key("order-7")
        .build();
    executor(&server)
        .with_user_agent("billow-tests/1")
        .execute(&request)
        .await
        .expect("headers match");
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    // Nothing listens on port 9 locally.
    let base_url = Url::parse("http://127.0.0.1:9").expect("url");
    let executor = Executor::new(HyperClient::new(), base_url).with_retry(fast_retry(2));

    let request = ApiRequest::builder(Method::Get, "/sites/s1").build();
    let result = executor.execute(&request).await;

    let_assert!(Err(Error::RetriesExhausted { attempts, last }) = result);
    check!(attempts == 2);
    check!(last.kind() == ErrorKind::Transport);
}

#[test]
fn executor_from_config_uses_the_config_base_url() {
    let config = ClientConfig::builder()
        .base_url(Url::parse("https://billing.example.com/api").expect("url"))
        .retry(fast_retry(4))
        .build();

    let executor = Executor::from_config(HyperClient::new(), &config).expect("base url set");
    check!(executor.base_url().as_str() == "https://billing.example.com/api");
    check!(executor.retry_policy().max_attempts() == 4);
}
