use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Permissive CORS envelope: every response gets the same three headers, and
/// OPTIONS requests short-circuit before routing with an empty 204.
pub async fn envelope(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut res = StatusCode::NO_CONTENT.into_response();
        apply(res.headers_mut());
        return res;
    }

    let mut res = next.run(req).await;
    apply(res.headers_mut());
    res
}

fn apply(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Content-Type, Authorization, X-User-Username, X-Admin-Username"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_three_headers_are_set() {
        let mut headers = HeaderMap::new();
        apply(&mut headers);
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(
            headers["access-control-allow-methods"],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert!(headers["access-control-allow-headers"]
            .to_str()
            .unwrap()
            .contains("X-Admin-Username"));
    }
}
