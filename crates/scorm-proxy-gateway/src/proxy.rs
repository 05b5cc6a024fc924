// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `/scorm-proxy/{ticket}/{packageId}/{*path}` → `{upstream}/scorm/content/{packageId}/{path}`.

use axum::body::Body;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::TryStreamExt;
use scorm_proto::{ProxyRoute, ProxyUrlError, PROXY_PREFIX};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Header carrying the viewer ticket to package storage.
pub const TICKET_HEADER: &str = "x-viewer-ticket";

/// Upstream response headers relayed to the browser.
static PASSTHROUGH_RESPONSE: [HeaderName; 5] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CACHE_CONTROL,
    header::LAST_MODIFIED,
    header::ETAG,
];

/// Browser request headers relayed upstream.
static PASSTHROUGH_REQUEST: [HeaderName; 2] = [header::IF_NONE_MATCH, header::IF_MODIFIED_SINCE];

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct Gateway {
    upstream: Url,
    http: reqwest::Client,
}

impl Gateway {
    /// Gateway forwarding to `upstream` with `http`.
    pub fn new(upstream: Url, http: reqwest::Client) -> Self {
        Self { upstream, http }
    }
}

/// Router serving the proxy path (GET, and HEAD via GET).
pub fn router(gateway: Gateway) -> Router {
    Router::new()
        .route(
            &format!("/{PROXY_PREFIX}/{{ticket}}/{{package_id}}/{{*path}}"),
            get(proxy),
        )
        .with_state(Arc::new(gateway))
}

async fn proxy(
    State(gateway): State<Arc<Gateway>>,
    Path((ticket, package_id, path)): Path<(String, String, String)>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
) -> Response {
    let route = match ProxyRoute::new(&ticket, &package_id, &path) {
        Ok(route) => route,
        Err(err) => return reject(&err),
    };
    let mut target = match route.upstream_url(&gateway.upstream) {
        Ok(url) => url,
        Err(err) => return reject(&err),
    };
    target.set_query(query.as_deref());

    let mut request = gateway
        .http
        .request(method.clone(), target)
        .header(TICKET_HEADER, route.ticket().expose());
    for name in &PASSTHROUGH_REQUEST {
        if let Some(value) = headers.get(name) {
            request = request.header(name.clone(), value.clone());
        }
    }

    let upstream = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            warn!(package_id = %route.package_id(), %err, "upstream request failed");
            return (StatusCode::BAD_GATEWAY, "package storage unavailable").into_response();
        }
    };
    let status = upstream.status();
    debug!(package_id = %route.package_id(), %method, %status, "proxied content request");

    let mut relayed = HeaderMap::new();
    for name in &PASSTHROUGH_RESPONSE {
        if let Some(value) = upstream.headers().get(name) {
            relayed.insert(name.clone(), value.clone());
        }
    }
    let package_id = route.package_id().clone();
    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from_stream(upstream.bytes_stream().inspect_err(move |err| {
            warn!(package_id = %package_id, %err, "upstream body interrupted");
        }))
    };
    (status, relayed, body).into_response()
}

fn reject(err: &ProxyUrlError) -> Response {
    warn!(%err, "rejected proxy request");
    (StatusCode::BAD_REQUEST, err.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::net::SocketAddr;

    async fn storage(
        Path((id, path)): Path<(String, String)>,
        RawQuery(query): RawQuery,
        headers: HeaderMap,
    ) -> Response {
        if path == "missing.html" {
            return (StatusCode::NOT_FOUND, "nope").into_response();
        }
        if headers.get(header::IF_NONE_MATCH).is_some() {
            return StatusCode::NOT_MODIFIED.into_response();
        }
        let ticket = headers
            .get(TICKET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = format!("{id}|{path}|{}|{ticket}", query.unwrap_or_default());
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                (header::ETAG, "\"v1\""),
                (header::SET_COOKIE, "session=leak"),
            ],
            body,
        )
            .into_response()
    }

    async fn spawn(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn gateway_to(upstream: &str) -> SocketAddr {
        let gateway = Gateway::new(Url::parse(upstream).unwrap(), reqwest::Client::new());
        spawn(router(gateway)).await
    }

    async fn gateway_with_storage() -> SocketAddr {
        let addr = spawn(Router::new().route("/api/scorm/content/{id}/{*path}", get(storage))).await;
        gateway_to(&format!("http://{addr}/api/")).await
    }

    #[tokio::test]
    async fn content_is_rewritten_and_relayed() {
        let gw = gateway_with_storage().await;
        let res = reqwest::get(format!(
            "http://{gw}/scorm-proxy/tkt-1/pkg1/sco/index.html?lang=en"
        ))
        .await
        .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(res.headers()[header::ETAG], "\"v1\"");
        assert!(res.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(res.text().await.unwrap(), "pkg1|sco/index.html|lang=en|tkt-1");
    }

    #[tokio::test]
    async fn upstream_status_passes_through() {
        let gw = gateway_with_storage().await;
        let client = reqwest::Client::new();

        let res = client
            .get(format!("http://{gw}/scorm-proxy/tkt/pkg1/missing.html"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = client
            .get(format!("http://{gw}/scorm-proxy/tkt/pkg1/index.html"))
            .header(header::IF_NONE_MATCH, "\"v1\"")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn head_returns_headers_only() {
        let gw = gateway_with_storage().await;
        let res = reqwest::Client::new()
            .head(format!("http://{gw}/scorm-proxy/tkt/pkg1/index.html"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::ETAG], "\"v1\"");
        assert!(res.bytes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn traversal_and_bad_tickets_are_rejected() {
        let gw = gateway_with_storage().await;
        for path in [
            "/scorm-proxy/tkt/pkg1/sco/..%2F..%2Fsecrets.txt",
            "/scorm-proxy/tkt/pkg1/a%5Cb.html",
            "/scorm-proxy/t!k/pkg1/index.html",
            "/scorm-proxy/tkt/pkg%201/index.html",
        ] {
            let res = reqwest::get(format!("http://{gw}{path}")).await.unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{path}");
        }
    }

    #[tokio::test]
    async fn unreachable_storage_is_bad_gateway() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let dead = listener.local_addr().unwrap();
        drop(listener);
        let gw = gateway_to(&format!("http://{dead}/api/")).await;

        let res = reqwest::get(format!("http://{gw}/scorm-proxy/tkt/pkg1/index.html"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }
}
