#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use core_test_support::FakeTransport;
use core_test_support::Reply;
use core_test_support::load_default_config_for_test;
use core_test_support::release_page;
use core_test_support::start_mock_server;
use core_test_support::tagger_link;
use pretty_assertions::assert_eq;
use tagport_core::ControlId;
use tagport_core::ControlStatus;
use tagport_core::Interceptor;
use tagport_core::Page;
use tagport_core::PrivilegedTransport;
use tagport_core::StatusIcon;
use url::Url;
use wiremock::Mock;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

fn interceptor(transport: &Arc<FakeTransport>) -> Interceptor {
    let transport: Arc<FakeTransport> = Arc::clone(transport);
    Interceptor::new(transport, &load_default_config_for_test())
}

#[tokio::test]
async fn successful_click_shows_response_as_tooltip() {
    let transport = Arc::new(
        FakeTransport::new().with_reply("127.0.0.1:8000", Reply::body(200, "Album loaded")),
    );
    let page = release_page("tport=8000", vec![tagger_link(8000)]);
    interceptor(&transport).activate(&page, page.action_controls());

    let status = page.click(ControlId(0)).await;

    assert_eq!(status, Some(ControlStatus::success("Album loaded")));
    let control = page.control(ControlId(0)).unwrap();
    assert_eq!(control.icon, StatusIcon::Success);
    assert_eq!(control.title.as_deref(), Some("Album loaded"));
    assert!(page.navigations().is_empty());
    assert_eq!(transport.requests(), vec![tagger_link(8000)]);
}

// Scenario D.
#[tokio::test]
async fn server_error_shows_fixed_message_without_navigating() {
    let transport = Arc::new(
        FakeTransport::new().with_reply("127.0.0.1:8000", Reply::body(500, "boom")),
    );
    let page = release_page("tport=8000", vec![tagger_link(8000)]);
    interceptor(&transport).activate(&page, page.action_controls());

    let status = page.click(ControlId(0)).await.expect("intercepted click");

    let config = load_default_config_for_test();
    assert_eq!(status, ControlStatus::error(config.error_message.clone()));
    let control = page.control(ControlId(0)).unwrap();
    assert_eq!(control.icon, StatusIcon::Error);
    assert_eq!(control.title, Some(config.error_message));
    assert!(page.navigations().is_empty());
}

#[tokio::test]
async fn transport_failure_shows_fixed_message() {
    let transport = Arc::new(FakeTransport::new());
    let page = release_page("tport=8000", vec![tagger_link(8000)]);
    interceptor(&transport).activate(&page, page.action_controls());

    let status = page.click(ControlId(0)).await.expect("intercepted click");

    assert_eq!(status.icon, StatusIcon::Error);
    assert!(!status.is_success());
    assert!(page.navigations().is_empty());
}

#[tokio::test]
async fn redirect_statuses_count_as_success() {
    let transport =
        Arc::new(FakeTransport::new().with_reply("127.0.0.1:8000", Reply::body(302, "")));
    let page = release_page("tport=8000", vec![tagger_link(8000)]);
    interceptor(&transport).activate(&page, page.action_controls());

    let status = page.click(ControlId(0)).await.unwrap();
    assert!(status.is_success());
}

#[tokio::test]
async fn reactivation_leaves_exactly_one_handler() {
    let transport = Arc::new(
        FakeTransport::new().with_reply("127.0.0.1:8000", Reply::body(200, "ok")),
    );
    let page = release_page("tport=8000", vec![tagger_link(8000)]);
    let interceptor = interceptor(&transport);

    interceptor.activate(&page, page.action_controls());
    let first = page.handler(ControlId(0)).unwrap();
    interceptor.activate(&page, page.action_controls());
    let second = page.handler(ControlId(0)).unwrap();

    assert_eq!(page.replacements(ControlId(0)), 2);
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.href(), &tagger_link(8000));

    page.click(ControlId(0)).await.unwrap();
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn plain_link_navigates_until_intercepted() {
    let transport = Arc::new(FakeTransport::new());
    let page = release_page("tport=8000", vec![tagger_link(8000)]);

    assert_eq!(page.click(ControlId(0)).await, None);
    assert_eq!(page.navigations(), vec![tagger_link(8000)]);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn concurrent_clicks_on_different_controls() {
    let server = start_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/openalbum"))
        .and(query_param("id", "a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("loaded a"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/openalbum"))
        .and(query_param("id", "b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("loaded b"))
        .expect(1)
        .mount(&server)
        .await;

    let link = |id: &str| Url::parse(&format!("{}/openalbum?id={id}", server.uri())).unwrap();
    let page = release_page("", vec![link("a"), link("b")]);
    Interceptor::new(
        Arc::new(PrivilegedTransport::new()),
        &load_default_config_for_test(),
    )
    .activate(&page, page.action_controls());

    let (a, b) = tokio::join!(page.click(ControlId(0)), page.click(ControlId(1)));

    assert_eq!(a, Some(ControlStatus::success("loaded a")));
    assert_eq!(b, Some(ControlStatus::success("loaded b")));
}
