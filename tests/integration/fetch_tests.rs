//! Integration tests for the fetcher and session
//!
//! These tests use wiremock to create mock HTTP servers and exercise
//! fetching, rotation, truncation and the login/logout cycle end-to-end.

use futures::StreamExt;
use std::time::Duration;
use sumi_fetcher::config::{FetcherConfig, UserAgentSource};
use sumi_fetcher::session::Cookie;
use sumi_fetcher::{
    fetch_all, Fetcher, Resource, ResourceStatus, Session, SessionError, SessionState,
};
use wiremock::matchers::{body_string, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = r#"<html><body>
<form action="/login" method="post">
  <input type="hidden" name="csrf" value="t0k3n">
  <input type="text" name="user">
  <input type="password" name="pass">
  <input type="submit" value="Log in">
</form>
</body></html>"#;

/// Creates a fetcher config with the given user agents
fn create_test_config(user_agents: &[&str]) -> FetcherConfig {
    let mut config = FetcherConfig::default();
    if !user_agents.is_empty() {
        config.user_agents = Some(UserAgentSource::List(
            user_agents.iter().map(|s| s.to_string()).collect(),
        ));
    }
    config
}

/// Mounts a login page and a credential endpoint answering with `status`
async fn mount_login(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(LOGIN_PAGE)
                .insert_header("content-type", "text/html")
                .insert_header("set-cookie", "csrf=t0k3n; Path=/"),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("user=alice&pass=s3cr3t%21"))
        .respond_with(
            ResponseTemplate::new(status).insert_header("set-cookie", "session=abc123; Path=/"),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_full_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Hello</body></html>")
                .insert_header("content-type", "text/html; charset=utf-8")
                .insert_header("x-custom", "yes"),
        )
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(&create_test_config(&[])).expect("Failed to build fetcher");
    let data = fetcher
        .fetch(Resource::new(format!("{}/page", mock_server.uri())))
        .await;

    assert_eq!(data.status_code, 200);
    assert_eq!(data.content, b"<html><body>Hello</body></html>");
    assert_eq!(data.content_type, "text/html; charset=utf-8");
    assert_eq!(data.header("X-Custom"), Some("yes"));
    assert!(!data.is_truncated());
    assert_eq!(data.resource.status, ResourceStatus::Fetched);
}

#[tokio::test]
async fn test_fetch_truncates_at_content_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![b'x'; 20_000])
                .insert_header("content-type", "application/octet-stream"),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&[]);
    config.content_limit = 10_000;
    let fetcher = Fetcher::new(&config).expect("Failed to build fetcher");

    let data = fetcher
        .fetch(Resource::new(format!("{}/big", mock_server.uri())))
        .await;

    assert_eq!(data.status_code, 200);
    assert_eq!(data.content.len(), 10_000);
    assert!(data.is_truncated());
    assert_eq!(data.header("x-content-truncated"), Some("true"));
    assert_eq!(data.resource.status, ResourceStatus::Fetched);
}

#[tokio::test]
async fn test_body_at_exact_limit_is_not_truncated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/exact"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'y'; 8192]))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&[]);
    config.content_limit = 8192;
    let fetcher = Fetcher::new(&config).expect("Failed to build fetcher");

    let data = fetcher
        .fetch(Resource::new(format!("{}/exact", mock_server.uri())))
        .await;

    assert_eq!(data.content.len(), 8192);
    assert!(!data.is_truncated());
}

#[tokio::test]
async fn test_http_error_status_is_a_normal_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("oops")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(&create_test_config(&[])).expect("Failed to build fetcher");
    let data = fetcher
        .fetch(Resource::new(format!("{}/broken", mock_server.uri())))
        .await;

    assert_eq!(data.status_code, 500);
    assert_eq!(data.content, b"oops");
    assert_eq!(data.content_type, "text/plain");
    assert_eq!(data.resource.status, ResourceStatus::Fetched);
}

#[tokio::test]
async fn test_missing_resources_map_to_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(
            ResponseTemplate::new(410)
                .set_body_string("removed")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(&create_test_config(&[])).expect("Failed to build fetcher");
    let resources = ["/ok", "/missing", "/forbidden", "/gone", "/ok"]
        .iter()
        .map(|p| Resource::new(format!("{}{}", mock_server.uri(), p)));

    let results: Vec<_> = fetch_all(&fetcher, resources).collect().await;
    assert_eq!(results.len(), 5);

    assert_eq!(results[0].status_code, 200);
    assert_eq!(results[0].resource.status, ResourceStatus::Fetched);

    assert!(results[1].resource.url.ends_with("/missing"));
    assert_eq!(results[1].status_code, 404);
    assert!(results[1].content.is_empty());
    assert_eq!(results[1].content_type, "");
    assert_eq!(results[1].resource.status, ResourceStatus::Error);

    // Other HTTP errors remain normal results
    assert_eq!(results[2].status_code, 403);
    assert_eq!(results[2].content, b"denied");
    assert_eq!(results[2].resource.status, ResourceStatus::Fetched);

    assert!(results[3].resource.url.ends_with("/gone"));
    assert_eq!(results[3].status_code, 404);
    assert!(results[3].content.is_empty());
    assert_eq!(results[3].resource.status, ResourceStatus::Error);

    assert_eq!(results[4].status_code, 200);
    assert_eq!(results[4].resource.status, ResourceStatus::Fetched);
}

#[tokio::test]
async fn test_user_agents_rotate_across_fetches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("user-agent", "AgentA/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("A"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(header("user-agent", "AgentB/2.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("B"))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(&create_test_config(&["AgentA/1.0", "AgentB/2.0", "AgentA/1.0"]))
        .expect("Failed to build fetcher");
    let url = format!("{}/", mock_server.uri());

    let mut bodies = Vec::new();
    for _ in 0..3 {
        let data = fetcher.fetch(Resource::new(url.clone())).await;
        bodies.push(String::from_utf8(data.content).unwrap());
    }

    assert_eq!(bodies, vec!["A", "B", "A"]);
}

#[tokio::test]
async fn test_no_user_agent_without_rotation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(418))
        .expect(0)
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(&create_test_config(&[])).expect("Failed to build fetcher");
    let data = fetcher
        .fetch(Resource::new(format!("{}/", mock_server.uri())))
        .await;

    // Unmatched requests get wiremock's default 404
    assert_eq!(data.status_code, 404);
    assert_eq!(data.resource.status, ResourceStatus::Error);
}

#[tokio::test]
async fn test_static_headers_applied() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("x-crawler", "sumi"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&[]);
    config
        .headers
        .insert("X-Crawler".to_string(), "sumi".to_string());
    let fetcher = Fetcher::new(&config).expect("Failed to build fetcher");

    let data = fetcher
        .fetch(Resource::new(format!("{}/", mock_server.uri())))
        .await;
    assert_eq!(data.status_code, 200);
}

#[tokio::test]
async fn test_read_timeout_maps_to_error_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&[]);
    config.connect_timeout = 100;
    config.read_timeout = 200;
    let fetcher = Fetcher::new(&config).expect("Failed to build fetcher");

    let data = fetcher
        .fetch(Resource::new(format!("{}/slow", mock_server.uri())))
        .await;

    assert_eq!(data.status_code, 400);
    assert!(data.content.is_empty());
    assert_eq!(data.resource.status, ResourceStatus::Error);
}

#[tokio::test]
async fn test_sequence_survives_failed_resource() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(&create_test_config(&[])).expect("Failed to build fetcher");
    let resources = vec![
        Resource::new(format!("{}/first", mock_server.uri())),
        // Nothing listens on port 1
        Resource::new("http://127.0.0.1:1/unreachable"),
        Resource::new(format!("{}/third", mock_server.uri())),
    ];

    let results: Vec<_> = fetch_all(&fetcher, resources).collect().await;

    assert_eq!(results.len(), 3);
    assert!(results[0].resource.url.ends_with("/first"));
    assert_eq!(results[0].resource.status, ResourceStatus::Fetched);

    assert_eq!(results[1].resource.url, "http://127.0.0.1:1/unreachable");
    assert_eq!(results[1].status_code, 400);
    assert_eq!(results[1].resource.status, ResourceStatus::Error);

    assert!(results[2].resource.url.ends_with("/third"));
    assert_eq!(results[2].resource.status, ResourceStatus::Fetched);
}

#[tokio::test]
async fn test_stream_fetches_only_when_polled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(&create_test_config(&[])).expect("Failed to build fetcher");
    let resources: Vec<_> = (0..3)
        .map(|i| Resource::new(format!("{}/page{}", mock_server.uri(), i)))
        .collect();

    let mut results = std::pin::pin!(fetch_all(&fetcher, resources));
    let first = results.next().await.expect("Expected a result");
    assert!(first.resource.url.ends_with("/page0"));

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);

    let rest: Vec<_> = results.collect().await;
    assert_eq!(rest.len(), 2);
    assert!(rest[1].resource.url.ends_with("/page2"));
}

#[tokio::test]
async fn test_login_captures_session_cookies() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, 200).await;

    Mock::given(method("GET"))
        .and(path("/private"))
        .and(header_exists("cookie"))
        .respond_with(ResponseTemplate::new(200).set_body_string("members only"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&[]);
    let session = Session::new(&config);
    session
        .login(&format!("{}/login", mock_server.uri()), "alice", "s3cr3t!")
        .await
        .expect("Login failed");

    assert_eq!(session.state(), SessionState::Authenticated);
    let cookies = session.cookies().snapshot();
    assert!(cookies.contains(&Cookie::new("session", "abc123")));
    assert!(cookies.contains(&Cookie::new("csrf", "t0k3n")));

    let fetcher = Fetcher::new(&config)
        .expect("Failed to build fetcher")
        .with_cookies(session.cookies().clone());
    let data = fetcher
        .fetch(Resource::new(format!("{}/private", mock_server.uri())))
        .await;

    assert_eq!(data.status_code, 200);
    assert_eq!(data.content, b"members only");
}

#[tokio::test]
async fn test_login_posts_form_page_cookies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(LOGIN_PAGE)
                .insert_header("set-cookie", "csrf=t0k3n; Path=/"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("cookie", "csrf=t0k3n"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = Session::new(&create_test_config(&[]));
    session
        .login(&format!("{}/login", mock_server.uri()), "alice", "s3cr3t!")
        .await
        .expect("Login failed");

    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_login_keeps_path_scoped_cookies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(LOGIN_PAGE)
                .insert_header("set-cookie", "sid=1; Path=/"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "appsess=2; Path=/app"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/app/dashboard"))
        .and(header_exists("cookie"))
        .respond_with(ResponseTemplate::new(200).set_body_string("dashboard"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&[]);
    let session = Session::new(&config);
    session
        .login(&format!("{}/login", mock_server.uri()), "alice", "s3cr3t!")
        .await
        .expect("Login failed");

    let cookies = session.cookies().snapshot();
    assert!(cookies.contains(&Cookie::new("sid", "1")));
    assert!(cookies.contains(&Cookie::new("appsess", "2")));

    let fetcher = Fetcher::new(&config)
        .expect("Failed to build fetcher")
        .with_cookies(session.cookies().clone());
    let data = fetcher
        .fetch(Resource::new(format!("{}/app/dashboard", mock_server.uri())))
        .await;
    assert_eq!(data.content, b"dashboard");
}

#[tokio::test]
async fn test_login_page_read_is_bounded() {
    let mock_server = MockServer::start().await;

    let mut page = LOGIN_PAGE.to_string();
    page.push_str(&" ".repeat(50_000));
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string("user=alice&pass=s3cr3t%21"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&[]);
    config.content_limit = 1024;
    let session = Session::new(&config);
    session
        .login(&format!("{}/login", mock_server.uri()), "alice", "s3cr3t!")
        .await
        .expect("Login failed");

    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_rejected_login_stays_anonymous() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, 401).await;

    let session = Session::new(&create_test_config(&[]));
    let result = session
        .login(&format!("{}/login", mock_server.uri()), "alice", "s3cr3t!")
        .await;

    assert!(matches!(
        result,
        Err(SessionError::LoginRejected { status: 401, .. })
    ));
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(session.cookies().is_empty());
}

#[tokio::test]
async fn test_login_page_without_password_input() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<form><input type="text" name="user"></form>"#),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let session = Session::new(&create_test_config(&[]));
    let result = session
        .login(&format!("{}/login", mock_server.uri()), "alice", "s3cr3t!")
        .await;

    assert!(matches!(
        result,
        Err(SessionError::MissingField {
            kind: "password",
            ..
        })
    ));
    assert_eq!(session.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_logout_clears_session_and_is_idempotent() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, 200).await;

    Mock::given(method("GET"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = Session::new(&create_test_config(&[]));
    session
        .login(&format!("{}/login", mock_server.uri()), "alice", "s3cr3t!")
        .await
        .expect("Login failed");
    assert!(!session.cookies().is_empty());

    let logout_url = format!("{}/logout", mock_server.uri());
    session.logout(&logout_url).await.expect("Logout failed");
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(session.cookies().is_empty());

    // Second logout makes no request
    session.logout(&logout_url).await.expect("Logout failed");
    assert_eq!(session.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_failed_logout_still_clears_session() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, 200).await;

    Mock::given(method("GET"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/goodbye"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/goodbye"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&[]);
    let session = Session::new(&config);
    let fetcher = Fetcher::new(&config)
        .expect("Failed to build fetcher")
        .with_cookies(session.cookies().clone());

    session
        .login(&format!("{}/login", mock_server.uri()), "alice", "s3cr3t!")
        .await
        .expect("Login failed");
    assert!(!fetcher.cookies().is_empty());

    let result = session
        .logout(&format!("{}/logout", mock_server.uri()))
        .await;

    assert!(matches!(
        result,
        Err(SessionError::LogoutRejected { status: 302, .. })
    ));
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(fetcher.cookies().is_empty());
}
