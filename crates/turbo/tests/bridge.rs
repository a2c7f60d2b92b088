use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE, LOCATION};
use http::Method;
use turbo::prelude::*;
use turbo::{redirect, TURBOLINKS_COOKIE, TURBOLINKS_LOCATION, TURBOLINKS_REFERRER};

/// `/login` redirects to `/inbox`; every other path renders a page.
fn app() -> impl Handler {
    bridge(handler_fn(|w, req| {
        if req.uri().path() == "/login" {
            redirect(w, req, "/inbox", StatusCode::SEE_OTHER).ok();
        } else {
            w.write_head(StatusCode::OK);
            w.write_all(format!("page {}", req.uri().path()).as_bytes()).ok();
        }
    }))
}

fn request(method: Method, path: &str, visit: bool, cookie: Option<&str>) -> Request {
    let mut builder = http::Request::builder().method(method).uri(path);
    if visit {
        builder = builder.header(TURBOLINKS_REFERRER, "http://localhost/");
    }
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Bytes::new()).unwrap()
}

fn serve(handler: &impl Handler, req: &Request) -> ResponseRecorder {
    let mut rec = ResponseRecorder::new();
    handler.serve(&mut rec, req);
    rec
}

// =============================================================================
// Plain requests
// =============================================================================

#[test]
fn test_plain_redirect_is_untouched() {
    let rec = serve(&app(), &request(Method::GET, "/login", false, None));

    assert_eq!(rec.status(), StatusCode::SEE_OTHER);
    assert_eq!(rec.header(LOCATION), Some("/inbox"));
    assert!(rec.set_cookies().is_empty());
}

#[test]
fn test_plain_form_post_is_untouched() {
    let rec = serve(&app(), &request(Method::POST, "/login", false, None));

    assert_eq!(rec.status(), StatusCode::SEE_OTHER);
    assert_eq!(rec.header(LOCATION), Some("/inbox"));
}

// =============================================================================
// Form submissions
// =============================================================================

#[test]
fn test_form_redirect_becomes_visit_script() {
    let app = bridge(handler_fn(|w, req| {
        redirect(w, req, "/", StatusCode::FOUND).ok();
    }));
    let rec = serve(&app, &request(Method::POST, "/messages", true, None));

    assert_eq!(rec.status(), StatusCode::OK);
    assert_eq!(rec.header(LOCATION), None);
    assert_eq!(rec.header(CONTENT_TYPE), Some("text/javascript"));
    assert_eq!(
        rec.body_string(),
        r#"Turbolinks.clearCache();Turbolinks.visit("/", {action: "advance"});"#
    );
}

#[test]
fn test_form_without_redirect_passes_through() {
    let rec = serve(&app(), &request(Method::POST, "/messages", true, None));

    assert_eq!(rec.status(), StatusCode::OK);
    assert_eq!(rec.body_string(), "page /messages");
}

// =============================================================================
// Redirected visits
// =============================================================================

#[test]
fn test_redirected_visit_reports_final_location() {
    let app = app();

    // The visit is redirected; the bridge remembers where to.
    let first = serve(&app, &request(Method::GET, "/login", true, None));
    assert_eq!(first.status(), StatusCode::SEE_OTHER);
    assert_eq!(first.header(LOCATION), Some("/inbox"));
    let nav = first.set_cookie(TURBOLINKS_COOKIE).unwrap();
    assert_eq!(nav.value(), "/inbox");
    assert_eq!(nav.http_only(), Some(true));
    assert_ne!(nav.secure(), Some(true));

    // The client follows it and learns the URL to show.
    let cookie = first.next_cookie_header().unwrap();
    let second = serve(&app, &request(Method::GET, "/inbox", true, Some(&cookie)));
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.header(TURBOLINKS_LOCATION), Some("/inbox"));
    assert_eq!(second.body_string(), "page /inbox");
    assert_eq!(second.next_cookie_header(), None);
    assert!(second.set_cookie(TURBOLINKS_COOKIE).is_some());

    // Nothing is left to report afterwards.
    let third = serve(&app, &request(Method::GET, "/inbox", true, None));
    assert_eq!(third.header(TURBOLINKS_LOCATION), None);
}

#[test]
fn test_navigation_cookie_is_secure_behind_tls_proxy() {
    let mut req = request(Method::GET, "/login", true, None);
    req.headers_mut()
        .insert("x-forwarded-proto", http::HeaderValue::from_static("https"));

    let rec = serve(&app(), &req);
    let nav = rec.set_cookie(TURBOLINKS_COOKIE).unwrap();
    assert_eq!(nav.secure(), Some(true));
}

#[test]
fn test_location_with_query_survives_cookie_hop() {
    let app = bridge(handler_fn(|w, req| {
        if req.uri().path() == "/search" {
            redirect(w, req, "/results?q=a;b&page=2", StatusCode::FOUND).ok();
        } else {
            w.write_head(StatusCode::OK);
        }
    }));

    let first = serve(&app, &request(Method::GET, "/search", true, None));
    let cookie = first.next_cookie_header().unwrap();
    let second = serve(&app, &request(Method::GET, "/results", true, Some(&cookie)));

    assert_eq!(
        second.header(TURBOLINKS_LOCATION),
        Some("/results?q=a;b&page=2")
    );
}

#[test]
fn test_bridge_wraps_boxed_handlers() {
    let inner: Box<dyn Handler> = Box::new(handler_fn(|w, _| {
        w.write_head(StatusCode::NO_CONTENT);
    }));
    let rec = serve(&bridge(inner), &request(Method::GET, "/", true, None));
    assert_eq!(rec.status(), StatusCode::NO_CONTENT);
}
