//! ICAP message builders shared by the unit tests.

/// Builds an embedded HTTP request header block (with its blank line).
pub(crate) fn http_request(method: &str, content_type: &str, referer: &str, body: &str) -> String {
    format!(
        "{} /submit HTTP/1.1\r\nHost: site\r\nContent-Type: {}\r\nReferer: {}\r\nContent-Length: {}\r\n\r\n",
        method,
        content_type,
        referer,
        body.len()
    )
}

/// Wraps an HTTP request in a REQMOD message with a single-chunk body.
pub(crate) fn reqmod_with_body(http_header: &str, body: &str) -> Vec<u8> {
    format!(
        "REQMOD icap://127.0.0.1:1344/reqmod ICAP/1.0\r\n\
Host: 127.0.0.1:1344\r\n\
Allow: 204\r\n\
Encapsulated: req-hdr=0, req-body={}\r\n\r\n\
{}{:x}\r\n{}\r\n0\r\n\r\n",
        http_header.len(),
        http_header,
        body.len(),
        body
    )
    .into_bytes()
}

/// Wraps an HTTP request in a REQMOD message without a body.
pub(crate) fn reqmod_null_body(http_header: &str) -> Vec<u8> {
    format!(
        "REQMOD icap://127.0.0.1:1344/reqmod ICAP/1.0\r\n\
Host: 127.0.0.1:1344\r\n\
Encapsulated: req-hdr=0, null-body={}\r\n\r\n{}",
        http_header.len(),
        http_header
    )
    .into_bytes()
}

/// A JSON login POST.
pub(crate) fn json_login() -> Vec<u8> {
    let body = r#"{"password":"abc123"}"#;
    let header = http_request("POST", "application/json", "https://site/login", body);
    reqmod_with_body(&header, body)
}

pub(crate) const OPTIONS_REQUEST: &[u8] = b"OPTIONS icap://127.0.0.1:1344/reqmod ICAP/1.0\r\n\
Host: 127.0.0.1:1344\r\n\
Encapsulated: null-body=0\r\n\r\n";
