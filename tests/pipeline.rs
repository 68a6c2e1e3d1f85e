mod common;

use common::*;
use nowpensions_scraper::{run_against, Session};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CREDENTIALS: [&str; 6] = ["-o", "ORG123", "-u", "alice", "-p", "secret"];

#[tokio::test]
async fn scrapes_fund_details_in_three_requests() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let uri = server.uri();
    let report = tokio::task::spawn_blocking(move || {
        run_against(&options(&CREDENTIALS), &uri, "http://sheets.invalid")
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(report.details.fund_value, "12345.67");
    assert_eq!(report.details.effective_date.as_deref(), Some("14 October 2026"));
    assert_eq!(report.details.to_string(), "14 October 2026: 12345.67");
    assert_eq!(report.published_to, None);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn follows_redirect_after_login() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;
    mount_login_post(
        &server,
        ResponseTemplate::new(302).insert_header("location", "/ORG123/Home.aspx"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/ORG123/Home.aspx"))
        .respond_with(html(LANDING_PAGE))
        .expect(1)
        .mount(&server)
        .await;
    mount_details_page(&server, 1).await;

    let uri = server.uri();
    let report = tokio::task::spawn_blocking(move || {
        run_against(&options(&CREDENTIALS), &uri, "http://sheets.invalid")
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(report.details.to_string(), "14 October 2026: 12345.67");
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn rejected_login_stops_before_details_request() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;
    // The site answers a bad password with the login page again.
    mount_login_post(&server, html(LOGIN_PAGE)).await;
    mount_details_page(&server, 0).await;

    let uri = server.uri();
    let err = tokio::task::spawn_blocking(move || {
        run_against(&options(&CREDENTIALS), &uri, "http://sheets.invalid")
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(err.to_string().contains("My Workplace Pension"), "{err:#}");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn details_page_without_value_is_an_error() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;
    mount_login_post(&server, html(LANDING_PAGE)).await;
    Mock::given(method("GET"))
        .and(path("/ORG123/Pension/Details"))
        .respond_with(html("<h3>Effective as at: 14 October 2026</h3>"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let err = tokio::task::spawn_blocking(move || {
        run_against(&options(&CREDENTIALS), &uri, "http://sheets.invalid")
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(err.to_string().contains("fund value"), "{err:#}");
}

#[test]
fn transport_failure_is_fatal() {
    // Nothing listens on port 1.
    let session = Session::new("http://127.0.0.1:1", "ORG123").unwrap();
    let err = nowpensions_scraper::scrape(&session, &options(&CREDENTIALS)).unwrap_err();
    assert!(err.to_string().contains("GET http://127.0.0.1:1/ORG123/Login.aspx"), "{err:#}");
}
