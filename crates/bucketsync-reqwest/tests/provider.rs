//! Wire-level tests of the storage provider against a local HTTP stub.

use std::sync::{Arc, Mutex};

use bucketsync_core::types::{CreateBucket, ListEntry, ListOptions, ObjectBody, UploadOptions};
use bucketsync_core::{ErrorKind, StorageProvider};
use bucketsync_reqwest::{ReqwestClient, ReqwestConfig, StorageEndpoint};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const SERVICE_KEY: &str = "service-key";

/// A request as received by the stub.
#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

/// A canned response.
struct Reply {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl Reply {
    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string().into_bytes(),
        }
    }

    fn bytes(content_type: &'static str, body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type,
            body: body.to_vec(),
        }
    }

    fn encode(&self) -> Vec<u8> {
        let reason = StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown");
        let mut encoded = format!(
            "HTTP/1.1 {} {reason}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            self.status,
            self.content_type,
            self.body.len()
        )
        .into_bytes();
        encoded.extend_from_slice(&self.body);
        encoded
    }
}

/// Serves one canned reply per connection, in order, and records requests.
struct StubServer {
    base: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    async fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        tokio::spawn(async move {
            for reply in replies {
                let (mut stream, _) = listener.accept().await.expect("accept");
                let request = read_request(&mut stream).await;
                recorded.lock().expect("lock").push(request);
                stream.write_all(&reply.encode()).await.expect("write reply");
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base: format!("http://{addr}"),
            requests,
        }
    }

    fn client(&self) -> ReqwestClient {
        let endpoint = StorageEndpoint::parse(&self.base, SERVICE_KEY).unwrap();
        ReqwestClient::new(endpoint, ReqwestConfig::new(5)).unwrap()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("lock").clone()
    }

    fn only_request(&self) -> Recorded {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests[0].clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> Recorded {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.expect("read request");
        assert!(n > 0, "connection closed before headers were complete");
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_owned();
    let path = request_line.next().unwrap_or_default().to_owned();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_owned()))
        .collect();

    let length = headers
        .iter()
        .find(|(key, _)| key == "content-length")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buffer[header_end..].to_vec();
    while body.len() < length {
        let n = stream.read(&mut chunk).await.expect("read body");
        assert!(n > 0, "connection closed before body was complete");
        body.extend_from_slice(&chunk[..n]);
    }

    Recorded {
        method,
        path,
        headers,
        body,
    }
}

#[tokio::test]
async fn list_buckets_sends_credentials() {
    let stub = StubServer::start(vec![Reply::json(
        200,
        json!([
            {"id": "avatars", "name": "avatars", "public": true,
             "created_at": "2024-01-15T10:30:00.000Z"},
            {"id": "docs", "name": "docs", "public": false}
        ]),
    )])
    .await;

    let buckets = stub.client().list_buckets().await.unwrap();
    let ids: Vec<&str> = buckets.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["avatars", "docs"]);
    assert!(buckets[0].public);

    let request = stub.only_request();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/storage/v1/bucket");
    assert_eq!(request.header("authorization"), Some("Bearer service-key"));
    assert_eq!(request.header("apikey"), Some("service-key"));
    assert!(
        request
            .header("user-agent")
            .is_some_and(|ua| ua.starts_with("bucketsync/"))
    );
}

#[tokio::test]
async fn create_bucket_posts_public_flag() {
    let stub = StubServer::start(vec![Reply::json(200, json!({"name": "avatars"}))]).await;

    stub.client()
        .create_bucket(&CreateBucket::public("avatars"))
        .await
        .unwrap();

    let request = stub.only_request();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/storage/v1/bucket");
    assert_eq!(
        request.json(),
        json!({"id": "avatars", "name": "avatars", "public": true})
    );
}

#[tokio::test]
async fn list_objects_sends_paging_and_search() {
    let stub = StubServer::start(vec![
        Reply::json(
            200,
            json!([
                {"name": "dir2", "id": null, "metadata": null},
                {"name": "b.png", "id": "0b7c", "metadata":
                    {"size": 3, "mimetype": "image/png", "cacheControl": "max-age=3600"}}
            ]),
        ),
        Reply::json(200, json!([])),
    ])
    .await;
    let client = stub.client();

    let entries = client
        .list_objects("avatars", "dir1", &ListOptions::page(2).with_offset(4).with_search("b.png"))
        .await
        .unwrap();
    assert_eq!(entries[0], ListEntry::folder("dir2"));
    assert!(entries[1].is_file());
    assert_eq!(entries[1].name(), "b.png");

    client
        .list_objects("avatars", "", &ListOptions::page(1000))
        .await
        .unwrap();

    let requests = stub.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/storage/v1/object/list/avatars");
    assert_eq!(
        requests[0].json(),
        json!({
            "prefix": "dir1",
            "limit": 2,
            "offset": 4,
            "sortBy": {"column": "name", "order": "asc"},
            "search": "b.png"
        })
    );
    assert!(requests[1].json().get("search").is_none());
}

#[tokio::test]
async fn download_reads_bytes_and_content_type() {
    let stub = StubServer::start(vec![Reply::bytes("image/png", b"png-bytes")]).await;

    let body = stub.client().download("avatars", "dir 1/a.png").await.unwrap();
    assert_eq!(body.data.as_ref(), b"png-bytes");
    assert_eq!(body.content_type.as_deref(), Some("image/png"));

    let request = stub.only_request();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/storage/v1/object/avatars/dir%201/a.png");
}

#[tokio::test]
async fn upload_is_create_only_with_cache_lifetime() {
    let stub = StubServer::start(vec![Reply::json(200, json!({"Key": "avatars/a.png"}))]).await;

    let body = ObjectBody::new(b"png-bytes".as_slice()).with_content_type("image/png");
    let options = UploadOptions::create_only().with_cache_control("31536000");
    stub.client()
        .upload("avatars", "dir1/a.png", body, &options)
        .await
        .unwrap();

    let request = stub.only_request();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/storage/v1/object/avatars/dir1/a.png");
    assert_eq!(request.header("x-upsert"), Some("false"));
    assert_eq!(request.header("cache-control"), Some("max-age=31536000"));
    assert_eq!(request.header("content-type"), Some("image/png"));
    assert_eq!(request.body, b"png-bytes");
}

#[tokio::test]
async fn upload_content_type_precedence() {
    let ok = || Reply::json(200, json!({}));
    let stub = StubServer::start(vec![ok(), ok()]).await;
    let client = stub.client();

    let body = ObjectBody::new(b"x".as_slice()).with_content_type("image/png");
    let options = UploadOptions::create_only().with_content_type(Some("image/webp".to_owned()));
    client.upload("b", "with-option", body, &options).await.unwrap();

    let body = ObjectBody::new(b"x".as_slice());
    client
        .upload("b", "without", body, &UploadOptions::create_only())
        .await
        .unwrap();

    let requests = stub.requests();
    assert_eq!(requests[0].header("content-type"), Some("image/webp"));
    assert_eq!(
        requests[1].header("content-type"),
        Some("application/octet-stream")
    );
    assert_eq!(requests[1].header("cache-control"), None);
}

#[tokio::test]
async fn upload_conflict_inside_bad_request_is_already_exists() {
    let stub = StubServer::start(vec![Reply::json(
        400,
        json!({"statusCode": "409", "error": "Duplicate", "message": "The resource already exists"}),
    )])
    .await;

    let body = ObjectBody::new(b"x".as_slice());
    let error = stub
        .client()
        .upload("avatars", "a.png", body, &UploadOptions::create_only())
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::AlreadyExists);
    assert!(error.is_already_exists());
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn status_errors_are_classified() {
    let stub = StubServer::start(vec![
        Reply::json(503, json!({"message": "upstream unavailable"})),
        Reply::json(401, json!({"statusCode": "401", "message": "Invalid JWT"})),
        Reply::json(404, json!({"statusCode": "404", "error": "not_found"})),
    ])
    .await;
    let client = stub.client();

    let unavailable = client.list_buckets().await.unwrap_err();
    assert_eq!(unavailable.kind, ErrorKind::ServiceUnavailable);
    assert!(unavailable.is_retryable());

    let unauthorized = client.list_buckets().await.unwrap_err();
    assert_eq!(unauthorized.kind, ErrorKind::Authentication);
    assert!(!unauthorized.is_retryable());

    let missing = client.download("avatars", "gone.png").await.unwrap_err();
    assert_eq!(missing.kind, ErrorKind::NotFound);
}
