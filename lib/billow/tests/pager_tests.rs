//! Cursor pagination against a live mock server.

use std::time::Duration;

use assert2::{check, let_assert};
use billow::{BillingClient, Error, ListParams, RetryPolicy};
use futures_util::TryStreamExt;
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param, query_param_is_missing},
};

fn client(server: &MockServer) -> BillingClient {
    BillingClient::builder()
        .base_url(server.uri())
        .api_key("test-key")
        .site_id("s1")
        .retry(RetryPolicy::none())
        .timeout(Duration::from_secs(5))
        .build()
        .expect("valid client")
}

fn records(page: usize, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"id": format!("p{page}-{i}")}))
        .collect()
}

async fn mount_page(server: &MockServer, cursor: Option<&str>, body: Value) {
    let mock = Mock::given(method("GET")).and(path("/sites/s1/accounts"));
    let mock = match cursor {
        Some(cursor) => mock.and(query_param("cursor", cursor)),
        None => mock.and(query_param_is_missing("cursor")),
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_three_pages(server: &MockServer) {
    mount_page(
        server,
        None,
        json!({
            "object": "list",
            "has_more": true,
            "next": "/sites/s1/accounts?cursor=c2&limit=200",
            "data": records(1, 200),
        }),
    )
    .await;
    mount_page(
        server,
        Some("c2"),
        json!({
            "object": "list",
            "has_more": true,
            "next": "/sites/s1/accounts?cursor=c3&limit=200",
            "data": records(2, 200),
        }),
    )
    .await;
    mount_page(
        server,
        Some("c3"),
        json!({
            "object": "list",
            "has_more": false,
            "next": null,
            "data": records(3, 47),
        }),
    )
    .await;
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .len()
}

#[tokio::test]
async fn pager_follows_links_across_three_pages() {
    let server = MockServer::start().await;
    mount_three_pages(&server).await;

    let params: ListParams = ListParams::filtered().limit(200).into();
    let mut pager = client(&server)
        .list_accounts::<Value>(&params)
        .expect("pager");

    let mut seen = Vec::new();
    while let Some(record) = pager.next().await.expect("page fetch") {
        seen.push(record);
    }

    check!(seen.len() == 447);
    check!(seen[0]["id"] == "p1-0");
    check!(seen[446]["id"] == "p3-46");
    check!(pager.is_exhausted());
    check!(pager.pages_fetched() == 3);
    check!(request_count(&server).await == 3);

    // An exhausted pager makes no further requests.
    check!(pager.advance().await.expect("no fetch").is_none());
    check!(request_count(&server).await == 3);
}

#[tokio::test]
async fn pager_is_lazy_until_first_pull() {
    let server = MockServer::start().await;
    mount_three_pages(&server).await;

    let params: ListParams = ListParams::filtered().limit(200).into();
    let mut pager = client(&server)
        .list_accounts::<Value>(&params)
        .expect("pager");
    check!(request_count(&server).await == 0);

    let_assert!(Some(first) = pager.advance().await.expect("first page"));
    check!(first.len() == 200);
    check!(request_count(&server).await == 1);
}

#[tokio::test]
async fn first_request_carries_list_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites/s1/accounts"))
        .and(query_param("limit", "50"))
        .and(query_param("sort", "updated_at"))
        .and(query_param("order", "asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "has_more": false,
            "data": [],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params: ListParams = ListParams::filtered()
        .limit(50)
        .sort(billow::SortField::UpdatedAt)
        .order(billow::Order::Asc)
        .into();
    let records = client(&server)
        .list_accounts::<Value>(&params)
        .expect("pager")
        .collect_all()
        .await
        .expect("single page");

    check!(records.is_empty());
}

#[tokio::test]
async fn ids_lookup_returns_a_single_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites/s1/accounts"))
        .and(query_param("ids", "a1,a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{"id": "a1"}, {"id": "a2"}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params = ListParams::ids(["a1", "a2"]);
    let mut pager = client(&server)
        .list_accounts::<Value>(&params)
        .expect("pager");

    let_assert!(Some(page) = pager.advance().await.expect("page"));
    check!(page.len() == 2);
    check!(pager.is_exhausted());
    check!(pager.advance().await.expect("exhausted").is_none());
}

#[tokio::test]
async fn link_header_advertises_the_next_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites/s1/plans"))
        .and(query_param_is_missing("cursor"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", r#"</sites/s1/plans?cursor=next1>; rel="next""#)
                .set_body_json(json!({"object": "list", "data": [{"id": "gold"}]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sites/s1/plans"))
        .and(query_param("cursor", "next1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"object": "list", "data": [{"id": "silver"}]})),
        )
        .mount(&server)
        .await;

    let ids: Vec<String> = client(&server)
        .list_plans::<Value>(&ListParams::default())
        .expect("pager")
        .into_stream()
        .map_ok(|plan| plan["id"].as_str().unwrap_or_default().to_string())
        .try_collect()
        .await
        .expect("two pages");

    check!(ids == ["gold", "silver"]);
}

#[tokio::test]
async fn failed_page_ends_iteration_for_good() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        None,
        json!({
            "object": "list",
            "has_more": true,
            "next": "/sites/s1/accounts?cursor=c2",
            "data": records(1, 3),
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/sites/s1/accounts"))
        .and(query_param("cursor", "c2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut pager = client(&server)
        .list_accounts::<Value>(&ListParams::default())
        .expect("pager");

    let_assert!(Some(first) = pager.advance().await.expect("first page"));
    check!(first.len() == 3);

    let_assert!(Err(Error::Api(api)) = pager.advance().await);
    check!(api.status == 500);
    check!(pager.is_failed());

    check!(pager.advance().await.expect("failed pager").is_none());
    check!(pager.next().await.expect("failed pager").is_none());
    check!(request_count(&server).await == 2);
}

#[tokio::test]
async fn stream_yields_the_error_once_then_ends() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let items: Vec<_> = futures_util::StreamExt::collect(
        client(&server)
            .list_invoices::<Value>(&ListParams::default())
            .expect("pager")
            .into_stream(),
    )
    .await;

    check!(items.len() == 1);
    let_assert!(Err(error) = &items[0]);
    check!(error.kind() == billow::ErrorKind::Authorization);
}

#[tokio::test]
async fn links_under_a_prefixed_base_url_keep_one_prefix() {
    let server = MockServer::start().await;
    let client = BillingClient::builder()
        .base_url(format!("{}/api", server.uri()))
        .api_key("test-key")
        .site_id("s1")
        .retry(RetryPolicy::none())
        .build()
        .expect("valid client");

    Mock::given(method("GET"))
        .and(path("/api/sites/s1/accounts"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "has_more": true,
            "next": "/api/sites/s1/accounts?cursor=c2",
            "data": records(1, 2),
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sites/s1/accounts"))
        .and(query_param("cursor", "c2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "Link",
                    format!(r#"<{}/api/sites/s1/accounts?cursor=c3>; rel="next""#, server.uri())
                        .as_str(),
                )
                .set_body_json(json!({"object": "list", "data": records(2, 2)})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sites/s1/accounts"))
        .and(query_param("cursor", "c3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "has_more": false,
            "data": records(3, 1),
        })))
        .mount(&server)
        .await;

    let accounts = client
        .list_accounts::<Value>(&ListParams::default())
        .expect("pager")
        .collect_all()
        .await
        .expect("three pages");

    check!(accounts.len() == 5);
    check!(request_count(&server).await == 3);
}

#[tokio::test]
async fn page_with_unparseable_next_link_is_still_delivered() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        None,
        json!({
            "object": "list",
            "has_more": true,
            "next": "http://[::1",
            "data": records(1, 2),
        }),
    )
    .await;

    let mut pager = client(&server)
        .list_accounts::<Value>(&ListParams::default())
        .expect("pager");

    let_assert!(Some(page) = pager.advance().await.expect("first page arrives"));
    check!(page.len() == 2);
    check!(pager.pages_fetched() == 1);
    check!(!pager.is_failed());

    let_assert!(Err(Error::InvalidUrl(_)) = pager.advance().await);
    check!(pager.is_failed());
    check!(pager.advance().await.expect("failed pager").is_none());
    check!(request_count(&server).await == 1);
}

#[tokio::test]
async fn record_pull_yields_the_page_before_a_bad_link_error() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        None,
        json!({
            "object": "list",
            "has_more": true,
            "next": "http://[::1",
            "data": records(1, 2),
        }),
    )
    .await;

    let mut pager = client(&server)
        .list_accounts::<Value>(&ListParams::default())
        .expect("pager");

    let_assert!(Some(first) = pager.next().await.expect("first record"));
    let_assert!(Some(second) = pager.next().await.expect("second record"));
    check!(first["id"] == "p1-0");
    check!(second["id"] == "p1-1");
    let_assert!(Err(Error::InvalidUrl(_)) = pager.next().await);
    check!(pager.next().await.expect("failed pager").is_none());
}
