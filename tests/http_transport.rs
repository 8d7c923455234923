//! HTTP transport against a mock catalog server. The transport is blocking,
//! so every call runs on a blocking task while the mock server keeps serving.

use std::time::Duration;

use bookshelf::transport::HttpTransport;
use bookshelf::{
    Book, CatalogClient, CatalogError, CatalogResult, CatalogTransport, NewBook, ViewState,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_books() -> Value {
    json!([
        {"id": 1, "name": "Milk and honey", "author": "Rupi Kaur", "date": "2014", "category": "Poetry"},
        {"id": 2, "name": "Tulips", "author": "Sylvia Plath", "date": 1965, "category": "Poetry"}
    ])
}

/// Run `work` against a fresh transport on a blocking thread.
async fn with_transport<T, F>(base: String, timeout: Duration, work: F) -> T
where
    T: Send + 'static,
    F: FnOnce(HttpTransport) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let transport = HttpTransport::new(&base, timeout).unwrap();
        work(transport)
    })
    .await
    .unwrap()
}

async fn call<T, F>(server: &MockServer, work: F) -> CatalogResult<T>
where
    T: Send + 'static,
    F: FnOnce(&HttpTransport) -> CatalogResult<T> + Send + 'static,
{
    with_transport(server.uri(), Duration::from_secs(5), move |transport| {
        work(&transport)
    })
    .await
}

#[tokio::test(flavor = "multi_thread")]
async fn list_sends_category_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .and(query_param("category", "Poetry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_books()))
        .expect(1)
        .mount(&server)
        .await;

    let books = call(&server, |t| t.list(Some("Poetry"))).await.unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[1].date, "1965");
}

#[tokio::test(flavor = "multi_thread")]
async fn unfiltered_list_omits_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .and(query_param_is_missing("category"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let books = call(&server, |t| t.list(None)).await.unwrap();
    assert!(books.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn search_posts_name_term() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/books/search"))
        .and(body_json(json!({"name": "tulips"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2, "name": "Tulips", "author": "Sylvia Plath", "date": "1965", "category": "Poetry"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let books = call(&server, |t| t.search("tulips")).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].name, "Tulips");
}

#[tokio::test(flavor = "multi_thread")]
async fn add_posts_record_and_reads_wrapped_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/books"))
        .and(body_json(json!({
            "name": "Dune", "author": "Herbert", "date": "1965", "category": "SciFi"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "book": {"id": 24, "name": "Dune", "author": "Herbert", "date": "1965", "category": "SciFi"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = call(&server, |t| t.add(&NewBook::new("Dune", "Herbert", "1965", "SciFi")))
        .await
        .unwrap();
    assert_eq!(
        created,
        Book {
            id: 24,
            name: "Dune".into(),
            author: "Herbert".into(),
            date: "1965".into(),
            category: "SciFi".into(),
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_maps_missing_record() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/books/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/books/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let missing = call(&server, |t| t.delete(999)).await;
    assert!(matches!(missing, Err(CatalogError::NotFound(999))));
    call(&server, |t| t.delete(2)).await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = call(&server, |t| t.list(None)).await;
    assert!(matches!(result, Err(CatalogError::Rejected { status: 500 })));
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let result = with_transport(server.uri(), Duration::from_millis(300), |t| t.list(None)).await;
    match result {
        Err(err @ CatalogError::Timeout { .. }) => assert!(err.is_retryable()),
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_a_transport_failure() {
    let result = with_transport(
        "http://127.0.0.1:1".to_string(),
        Duration::from_secs(2),
        |t| t.list(None),
    )
    .await;
    assert!(matches!(result, Err(CatalogError::Transport(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_reload_leaves_view_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_books()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let uri = server.uri();
    let (first, second) = tokio::task::spawn_blocking(move || {
        let transport = HttpTransport::new(&uri, Duration::from_secs(5)).unwrap();
        let client = CatalogClient::new(Box::new(transport));
        let mut view = ViewState::default();
        client.list(&mut view, None).unwrap();
        view.toggle_selection(2);
        let before = view.clone();

        let failed = client.list(&mut view, Some("Novel"));
        assert!(matches!(failed, Err(CatalogError::Rejected { status: 503 })));
        (before, view)
    })
    .await
    .unwrap();

    assert_eq!(first, second);
    assert_eq!(second.selected(), Some(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_add_leaves_view_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_books()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/books"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad book"})))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let (before, after) = tokio::task::spawn_blocking(move || {
        let transport = HttpTransport::new(&uri, Duration::from_secs(5)).unwrap();
        let client = CatalogClient::new(Box::new(transport));
        let mut view = ViewState::default();
        client.list(&mut view, None).unwrap();
        view.set_search("tulips");
        let before = view.clone();

        let rejected = client.add(&mut view, &NewBook::new("Dune", "Herbert", "1965", "SciFi"));
        assert!(matches!(rejected, Err(CatalogError::Rejected { status: 400 })));
        (before, view)
    })
    .await
    .unwrap();

    assert_eq!(before, after);
    assert_eq!(after.search(), "tulips");
}

#[tokio::test(flavor = "multi_thread")]
async fn erase_posts_to_erase_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/books/erase"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/books/erase"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    call(&server, |t| t.erase_all()).await.unwrap();
    let second = call(&server, |t| t.erase_all()).await;
    assert!(matches!(second, Err(CatalogError::Rejected { status: 500 })));
}
