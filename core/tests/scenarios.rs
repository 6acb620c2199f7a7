//! End-to-end tool scenarios against an in-process `AppState`, mocking the
//! upstream HTTP server with `wiremock`.

use procontext_cache::Cache;
use procontext_core::tools::{get_library_docs, read_page};
use procontext_core::AppState;
use procontext_fetcher::{build_allowlist, build_http_client, AllowlistHandle, Fetcher};
use procontext_types::{
    Config, GetLibraryDocsInput, ReadPageInput, RegistryEntry, RegistryIndexes, RegistryPackages,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn state_with_entry(server: &MockServer, llms_txt_path: &str) -> AppState {
    let entry = RegistryEntry {
        id: "langchain".to_string(),
        name: "LangChain".to_string(),
        docs_url: None,
        repo_url: None,
        languages: vec!["python".to_string()],
        packages: RegistryPackages {
            pypi: vec!["langchain-openai".to_string()],
            npm: vec![],
        },
        aliases: vec![],
        llms_txt_url: format!("{}{}", server.uri(), llms_txt_path),
    };
    let entries = vec![entry];
    let (registry_indexes, _) = RegistryIndexes::build(&entries);

    let allowlist = build_allowlist(&entries, &[]);
    let client = build_http_client().unwrap();
    let fetcher = Fetcher::new(client.clone(), true);

    AppState::new(
        Config::default(),
        registry_indexes,
        "test".to_string(),
        client,
        Cache::open_in_memory().unwrap(),
        fetcher,
        AllowlistHandle::new(allowlist),
    )
}

#[tokio::test]
async fn get_library_docs_cold_then_warm() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/llms.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# L"))
        .mount(&server)
        .await;

    let state = state_with_entry(&server, "/llms.txt").await;

    let cold = get_library_docs(
        &state,
        GetLibraryDocsInput {
            library_id: "langchain".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(!cold.cached);
    assert_eq!(cold.content, "# L");

    let warm = get_library_docs(
        &state,
        GetLibraryDocsInput {
            library_id: "langchain".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(warm.cached);
    assert!(!warm.stale);
    assert_eq!(warm.content, "# L");
}

#[tokio::test]
async fn get_library_docs_unknown_id_fails() {
    let server = MockServer::start().await;
    let state = state_with_entry(&server, "/llms.txt").await;

    let err = get_library_docs(
        &state,
        GetLibraryDocsInput {
            library_id: "doesnotexist".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, procontext_types::ErrorCode::LibraryNotFound);
}

#[tokio::test]
async fn read_page_window_returns_requested_slice() {
    let server = MockServer::start().await;
    let body = (1..=500)
        .map(|n| format!("line{n}"))
        .collect::<Vec<_>>()
        .join("\n");
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let state = state_with_entry(&server, "/llms.txt").await;
    let url = format!("{}/page", server.uri());

    let output = read_page(
        &state,
        ReadPageInput {
            url: url.clone(),
            offset: 100,
            limit: 50,
        },
    )
    .await
    .unwrap();

    assert_eq!(output.total_lines, 500);
    assert_eq!(output.offset, 100);
    assert_eq!(output.limit, 50);
    let lines: Vec<&str> = output.content.lines().collect();
    assert_eq!(lines.len(), 50);
    assert_eq!(lines[0], "line100");
    assert_eq!(lines[49], "line149");
}

#[tokio::test]
async fn ssrf_redirect_to_private_ip_is_blocked_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "http://127.0.0.1/x"))
        .mount(&server)
        .await;

    let state = state_with_entry(&server, "/llms.txt").await;
    let url = format!("{}/r", server.uri());

    let err = read_page(
        &state,
        ReadPageInput {
            url,
            offset: 1,
            limit: 10,
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.code, procontext_types::ErrorCode::UrlNotAllowed);
    assert!(!state.allowlist.snapshot().contains_domain("127.0.0.1"));
}
