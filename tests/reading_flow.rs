//! End-to-end reading flow: documents fetched from a mock Reader API are
//! loaded into the state machine, browsed by category, and opened.
//!
//! Each test starts its own mock server for isolation.

use reader_tui::api::ReaderClient;
use reader_tui::app::{App, ContentState, Task, View};
use reader_tui::content;
use reader_tui::keybindings::KeybindingRegistry;
use reader_tui::ui::reader::MarkdownRenderer;
use secrecy::SecretString;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ReaderClient {
    ReaderClient::new(SecretString::from("flow-token".to_string()))
        .unwrap()
        .with_base_url(&server.uri())
        .unwrap()
        .with_retry_delay(Duration::ZERO)
}

fn new_app() -> App {
    let mut app = App::new(KeybindingRegistry::new(), Box::new(MarkdownRenderer::new(60)));
    app.resize(60, 24);
    app
}

fn load_generation(app: &mut App) -> u64 {
    match app.begin_document_load() {
        Task::LoadDocuments { generation } => generation,
        other => panic!("unexpected task: {:?}", other),
    }
}

async fn mount_library(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/list/"))
        .and(query_param("pageCursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "nextPageCursor": null,
            "results": [
                {
                    "id": "arch-1",
                    "title": "Archived essay",
                    "author": null,
                    "location": "archive",
                    "summary": "An essay worth keeping",
                    "html_content": null,
                    "published_date": 1_700_000_000_000i64
                },
                {
                    "id": "blank",
                    "title": "   ",
                    "location": "archive"
                }
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3,
            "nextPageCursor": "page-2",
            "results": [
                {
                    "id": "later-1",
                    "title": "Read me later",
                    "author": "Ann Writer",
                    "location": "later",
                    "html_content": "<h2>Intro</h2><p>Some <strong>bold</strong> words.</p>",
                    "word_count": 900
                },
                {
                    "id": "new-1",
                    "title": "Fresh arrival",
                    "location": "new",
                    "html_content": "<p>Fresh arrival</p><p>Already titled.</p>"
                },
                {
                    "id": "odd-1",
                    "title": "Somewhere else",
                    "location": "reading_pile"
                }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_load_browse_and_read() {
    let server = MockServer::start().await;
    mount_library(&server).await;

    let mut app = new_app();
    let generation = load_generation(&mut app);
    let documents = client(&server).fetch_all_documents().await.unwrap();
    assert_eq!(documents.len(), 5);
    assert!(app.apply_documents(generation, documents));

    // blank titles dropped, known locations first, unknown last
    let locations: Vec<&str> = app.categories.iter().map(|c| c.location.as_str()).collect();
    assert_eq!(locations, vec!["new", "later", "archive", "reading_pile"]);
    assert_eq!(app.categories[2].count, 1);
    assert_eq!(app.categories[3].name, "Reading_pile");

    // switch to "later" and open the only document
    app.next_category();
    assert_eq!(app.visible.len(), 1);
    let Some(Task::LoadContent {
        generation,
        document,
    }) = app.open_selected()
    else {
        panic!("expected a content load");
    };
    assert_eq!(app.view, View::Reader);

    let body = content::compose(&document);
    assert!(body.starts_with("# Read me later\n\n*by Ann Writer*\n\n## Intro"));
    assert!(app.apply_content(generation, &document.id, body));

    let lines: Vec<String> = app.content_lines().iter().map(|l| l.to_string()).collect();
    assert_eq!(lines[0], "Read me later");
    assert!(lines.contains(&"by Ann Writer".to_string()));
    assert!(lines.contains(&"Some bold words.".to_string()));

    app.close_reader();
    assert_eq!(app.view, View::List);
    assert_eq!(app.selected_category, 1);
}

#[tokio::test]
async fn test_summary_and_dates_from_sparse_documents() {
    let server = MockServer::start().await;
    mount_library(&server).await;

    let mut app = new_app();
    let generation = load_generation(&mut app);
    let documents = client(&server).fetch_all_documents().await.unwrap();
    app.apply_documents(generation, documents);

    app.next_category();
    app.next_category();
    let document = app.selected_document().unwrap().clone();
    assert_eq!(document.id, "arch-1");
    assert_eq!(document.published_date, "2023-11-14");
    assert_eq!(
        content::compose(&document),
        "# Archived essay\n\nAn essay worth keeping"
    );
}

#[tokio::test]
async fn test_title_already_in_body_is_not_repeated() {
    let server = MockServer::start().await;
    mount_library(&server).await;

    let mut app = new_app();
    let generation = load_generation(&mut app);
    app.apply_documents(generation, client(&server).fetch_all_documents().await.unwrap());

    let document = app.selected_document().unwrap().clone();
    assert_eq!(document.id, "new-1");
    assert_eq!(content::compose(&document), "Fresh arrival\n\nAlready titled.");
}

#[tokio::test]
async fn test_failed_refresh_keeps_documents_and_reports() {
    let server = MockServer::start().await;
    mount_library(&server).await;

    let mut app = new_app();
    let generation = load_generation(&mut app);
    app.apply_documents(generation, client(&server).fetch_all_documents().await.unwrap());
    let before = app.documents.len();

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/list/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let generation = load_generation(&mut app);
    assert!(app.loading);
    let error = client(&server).fetch_all_documents().await.unwrap_err();
    assert!(app.apply_load_failure(generation, error.to_string()));

    assert!(!app.loading);
    assert!(app.error.as_deref().unwrap().contains("403"));
    assert_eq!(app.documents.len(), before);
}

#[tokio::test]
async fn test_overlapping_refreshes_latest_wins() {
    let server = MockServer::start().await;
    mount_library(&server).await;
    let documents = client(&server).fetch_all_documents().await.unwrap();

    let mut app = new_app();
    let first = load_generation(&mut app);
    let second = load_generation(&mut app);

    assert!(app.apply_documents(second, documents.clone()));
    let kept = app.documents.len();

    assert!(!app.apply_documents(first, Vec::new()));
    assert_eq!(app.documents.len(), kept);
    assert!(!app.loading);
}

#[tokio::test]
async fn test_empty_library() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 0,
            "nextPageCursor": null,
            "results": []
        })))
        .mount(&server)
        .await;

    let mut app = new_app();
    let generation = load_generation(&mut app);
    app.apply_documents(generation, client(&server).fetch_all_documents().await.unwrap());

    assert!(app.categories.is_empty());
    assert!(app.open_selected().is_none());
    assert!(matches!(app.content_state, ContentState::Idle));
}
