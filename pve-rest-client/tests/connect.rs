use serde_json::json;

use pve_rest_client::session;
use pve_rest_client::{Connector, Error, HostAndPort};

mod common;
use common::MockHttp;

fn ticket_reply() -> MockHttp {
    MockHttp::json(
        200,
        json!({
            "data": {
                "ticket": "T",
                "CSRFPreventionToken": "C",
                "username": "root@pam",
            }
        }),
    )
}

fn reachable(_: &HostAndPort) -> bool {
    true
}

#[test]
fn connect_with_credentials() {
    let http = ticket_reply();

    let session = Connector::new(["10.1.1.90"])
        .credentials("root", "secret")
        .probe(reachable)
        .connect_with(&http)
        .unwrap();

    assert_eq!(session.host, "10.1.1.90");
    assert_eq!(session.port, 8006);
    assert_eq!(session.ticket, "T");
    assert_eq!(session.csrf_token, "C");
    assert!(session.api_token.is_empty());

    assert_eq!(http.calls(), 1);
    assert_eq!(
        http.uri(0),
        "https://10.1.1.90:8006/api2/json/access/ticket"
    );
    http.with_request(0, |request| {
        assert_eq!(request.method(), http::Method::POST)
    });
    assert_eq!(
        http.body_json(0),
        json!({ "username": "root@pam", "password": "secret" })
    );
    assert_eq!(http.header(0, "Cookie"), None);

    assert_eq!(session::last_session().as_deref(), Some(&session));
}

#[test]
fn first_reachable_candidate_wins() {
    let http = ticket_reply();

    let session = Connector::new(["pve1", "pve2:8007", "pve3"])
        .credentials("root@pam", "secret")
        .probe(|candidate: &HostAndPort| candidate.host != "pve1")
        .connect_with(&http)
        .unwrap();

    assert_eq!(session.host, "pve2");
    assert_eq!(session.port, 8007);
    assert_eq!(http.uri(0), "https://pve2:8007/api2/json/access/ticket");
}

#[test]
fn no_reachable_host() {
    let http = ticket_reply();

    let err = Connector::new(["pve1", "pve2"])
        .credentials("root", "secret")
        .probe(|_: &HostAndPort| false)
        .connect_with(&http)
        .unwrap_err();

    assert!(matches!(err, Error::HostNotValid), "{err}");
    assert_eq!(http.calls(), 0);
    assert!(session::last_session().is_none());
}

#[test]
fn invalid_port_of_selected_candidate() {
    let http = ticket_reply();

    let err = Connector::new(["pve1:70000"])
        .credentials("root", "secret")
        .probe(reachable)
        .connect_with(&http)
        .unwrap_err();

    assert!(matches!(err, Error::PortNotValid(70000)), "{err}");
    assert_eq!(http.calls(), 0);
}

#[test]
fn second_factor_missing() {
    let http = MockHttp::json(
        200,
        json!({ "data": { "NeedTFA": 1, "ticket": "partial", "CSRFPreventionToken": "C" } }),
    );

    let err = Connector::new(["pve1"])
        .credentials("root", "secret")
        .probe(reachable)
        .connect_with(&http)
        .unwrap_err();
    assert!(matches!(err, Error::TfaRequired), "{err}");
    assert!(session::last_session().is_none());

    let err = Connector::new(["pve1"])
        .credentials("root", "secret")
        .otp("123456")
        .probe(reachable)
        .connect_with(&http)
        .unwrap_err();
    assert!(matches!(err, Error::AuthenticationFailed(_)), "{err}");
    assert_eq!(http.body_json(1)["otp"], "123456");
}

#[test]
fn rejected_credentials() {
    let http = MockHttp::json(401, json!({ "data": null }));

    let err = Connector::new(["pve1"])
        .credentials("root", "wrong")
        .probe(reachable)
        .connect_with(&http)
        .unwrap_err();

    match err {
        Error::AuthenticationFailed(reason) => assert_eq!(reason, "Unauthorized"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejected_credentials_with_server_message() {
    let http = MockHttp::json(
        401,
        json!({ "data": null, "message": "authentication failure\n", "success": 0 }),
    );

    let err = Connector::new(["pve1"])
        .credentials("root", "wrong")
        .probe(reachable)
        .connect_with(&http)
        .unwrap_err();

    match err {
        Error::AuthenticationFailed(reason) => assert_eq!(reason, "authentication failure"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn transport_failure_during_login() {
    let http = MockHttp::new(|_| Err(anyhow::format_err!("connection refused")));

    let err = Connector::new(["pve1"])
        .credentials("root", "secret")
        .probe(reachable)
        .connect_with(&http)
        .unwrap_err();

    match err {
        Error::AuthenticationFailed(reason) => assert_eq!(reason, "connection refused"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn api_token_needs_no_login() {
    let http = ticket_reply();
    let token = "root@pam!automation=0b9d6a2c-3d5e-4f61-8a2b-9c0d1e2f3a4b";

    let session = Connector::new(["pve1"])
        .api_token(token)
        .skip_certificate_check(true)
        .probe(reachable)
        .connect_with(&http)
        .unwrap();

    assert_eq!(http.calls(), 0);
    assert_eq!(session.api_token, token);
    assert!(session.ticket.is_empty());
    assert!(session.skip_certificate_check);
}

#[test]
fn malformed_api_token() {
    let http = ticket_reply();

    let err = Connector::new(["pve1"])
        .api_token("root@pam:secret")
        .probe(reachable)
        .connect_with(&http)
        .unwrap_err();

    assert!(matches!(err, Error::InvalidApiToken(_)), "{err}");
}

#[test]
fn missing_credentials() {
    let http = ticket_reply();

    let err = Connector::new(["pve1"])
        .probe(reachable)
        .connect_with(&http)
        .unwrap_err();

    assert!(matches!(err, Error::MissingCredentials), "{err}");
    assert_eq!(http.calls(), 0);
}

#[test]
fn skip_refresh_last() {
    let http = ticket_reply();

    Connector::new(["pve1"])
        .credentials("root", "secret")
        .skip_refresh_last(true)
        .probe(reachable)
        .connect_with(&http)
        .unwrap();

    assert!(session::last_session().is_none());
}
