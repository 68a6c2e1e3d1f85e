#![allow(dead_code)]

use clap::Parser;
use nowpensions_scraper::Options;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const LOGIN_PAGE: &str = include_str!("../fixtures/login.html");
pub const LANDING_PAGE: &str = include_str!("../fixtures/landing.html");
pub const DETAILS_PAGE: &str = include_str!("../fixtures/details.html");

pub const SESSION_COOKIE: &str = "ASP.NET_SessionId=abc123";

pub fn options(args: &[&str]) -> Options {
    Options::try_parse_from(std::iter::once("nowpensions-scraper").chain(args.iter().copied()))
        .unwrap()
}

pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

/// Login page GET, which hands out the session cookie.
pub async fn mount_login_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/ORG123/Login.aspx"))
        .respond_with(
            html(LOGIN_PAGE)
                .insert_header("set-cookie", format!("{SESSION_COOKIE}; path=/; HttpOnly")),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Login POST carrying the credentials and view state, answered with `landing`.
pub async fn mount_login_post(server: &MockServer, landing: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/ORG123/Login.aspx"))
        .and(header("cookie", SESSION_COOKIE))
        .and(body_string_contains("ctlLogin%24UserName=alice"))
        .and(body_string_contains("ctlLogin%24Password=secret"))
        .and(body_string_contains("ctlLogin%24Login=Login"))
        .and(body_string_contains("__VIEWSTATE=dDwtMTA4NzE%3D"))
        .respond_with(landing)
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_details_page(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/ORG123/Pension/Details"))
        .and(header("cookie", SESSION_COOKIE))
        .respond_with(html(DETAILS_PAGE))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// The three provider pages of a successful login.
pub async fn mount_site(server: &MockServer) {
    mount_login_page(server).await;
    mount_login_post(server, html(LANDING_PAGE)).await;
    mount_details_page(server, 1).await;
}
