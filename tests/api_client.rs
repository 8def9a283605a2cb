use std::time::Duration;

use aai_survey_lib::api::{ApiClient, ApiError, LoginRequest};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::oneshot,
};

struct Captured {
    request_line: String,
    headers: String,
    body: String,
}

/// Serves exactly one request with the given status and body, and hands back
/// what it received.
async fn serve_once(
    status: &'static str,
    response_body: &'static str,
) -> (String, oneshot::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/api", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{response_body}",
            response_body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        let (request_line, headers) = head.split_once("\r\n").unwrap_or((head.as_str(), ""));
        let _ = tx.send(Captured {
            request_line: request_line.to_string(),
            headers: headers.to_lowercase(),
            body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
        });
    });

    (base_url, rx)
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(base_url, Duration::from_secs(5), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn survey_body_is_posted_verbatim() {
    let (base_url, captured) = serve_once("201 Created", r#"{"message":"Survey saved"}"#).await;
    let payload = r#"{"airportCode":"DEL","ratings":{"Experience at check-in":"Good"}}"#;

    client(&base_url).submit_survey(payload).await.unwrap();

    let request = captured.await.unwrap();
    assert_eq!(request.request_line, "POST /api/survey/submit HTTP/1.1");
    assert!(request.headers.contains("content-type: application/json"));
    assert_eq!(request.body, payload);
}

#[tokio::test]
async fn non_success_status_fails_delivery() {
    let (base_url, _captured) =
        serve_once("500 Internal Server Error", r#"{"error":"db down"}"#).await;

    match client(&base_url).submit_survey("{}").await {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("db down"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn login_refusal_body_is_parsed() {
    let (base_url, captured) =
        serve_once("401 Unauthorized", r#"{"message":"Invalid credentials"}"#).await;

    let response = client(&base_url)
        .login(&LoginRequest {
            email: "user@example.com".into(),
            password: "wrong".into(),
            device_id: "abc123".into(),
        })
        .await
        .unwrap();
    assert_eq!(response.message.as_deref(), Some("Invalid credentials"));
    assert!(response.into_session().is_none());

    let request = captured.await.unwrap();
    assert_eq!(request.request_line, "POST /api/auth/login HTTP/1.1");
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["deviceId"], "abc123");
}

#[tokio::test]
async fn unreachable_backend_is_a_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client(&format!("http://{addr}/api")).submit_survey("{}").await;
    assert!(matches!(result, Err(ApiError::Connection(_))));
}
