//! Header <-> application-properties translation (spec §4.2 steps 2 and
//! egress step 1, spec §6 wire section).

use http::{HeaderMap, Method, Request, StatusCode};
use router_proto::annotations::keys;

/// An ordered `key -> value` application-properties map, preserving
/// header arrival order (spec §6: "Application-properties: an ordered
/// map").
pub type AppProperties = Vec<(String, String)>;

/// Build the application-properties map for an ingress request, plus the
/// AMQP `subject`/`to` properties it implies.
pub struct IngressHeaders {
    pub app_properties: AppProperties,
    pub subject: String,
    pub path: Option<String>,
}

/// Flatten an incoming HTTP/2 request's pseudo- and regular headers into
/// an application-properties map. `:method` becomes the AMQP subject;
/// the configured address becomes `to` at the caller's discretion (the
/// content-composition step, not this one).
pub fn ingress_headers_to_app_properties<B>(req: &Request<B>) -> IngressHeaders {
    let mut app_properties = Vec::with_capacity(req.headers().len() + 2);
    let method = req.method().as_str().to_string();
    app_properties.push((":method".to_string(), method.clone()));
    app_properties.push((":path".to_string(), req.uri().path().to_string()));
    if let Some(authority) = req.uri().authority() {
        app_properties.push((":authority".to_string(), authority.to_string()));
    }
    push_regular_headers(&mut app_properties, req.headers());

    IngressHeaders {
        app_properties,
        subject: method,
        path: Some(req.uri().path().to_string()),
    }
}

/// Flatten an HTTP/2 response's headers (egress reading a peer's
/// response back) the same way.
pub fn status_headers_to_app_properties(status: StatusCode, headers: &HeaderMap) -> AppProperties {
    let mut app_properties = Vec::with_capacity(headers.len() + 1);
    app_properties.push((":status".to_string(), status.as_str().to_string()));
    push_regular_headers(&mut app_properties, headers);
    app_properties
}

fn push_regular_headers(out: &mut AppProperties, headers: &HeaderMap) {
    for (name, value) in headers {
        if let Ok(v) = value.to_str() {
            out.push((name.as_str().to_string(), v.to_string()));
        }
    }
}

/// Convert an application-properties map back into HTTP/2 headers for
/// the egress side (spec §4.2 egress step 1). `:method` and `:status`
/// are consumed by the caller directly rather than re-emitted as
/// headers; the reserved flow-id key is dropped.
pub fn app_properties_to_headers(props: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(props.len());
    for (k, v) in props {
        if k == ":method" || k == ":status" || k == keys::FLOW_ID {
            continue;
        }
        if k.starts_with(':') {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(k.as_bytes()),
            http::HeaderValue::from_str(v),
        ) {
            headers.append(name, value);
        }
    }
    headers
}

/// Pull the egress method out of an application-properties map, default
/// to `GET` if absent.
pub fn method_from_app_properties(props: &[(String, String)]) -> Method {
    props
        .iter()
        .find(|(k, _)| k == ":method")
        .and_then(|(_, v)| Method::from_bytes(v.as_bytes()).ok())
        .unwrap_or(Method::GET)
}
