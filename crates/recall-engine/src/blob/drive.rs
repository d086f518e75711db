//! Google Drive v3 blob store.
//!
//! Authorisation is an opaque bearer token handed over by the credential
//! layer; refreshing it is not this client's job.

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::Deserialize;

use super::{BlobId, BlobStore};
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const BOUNDARY: &str = "recall-backup-boundary";

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct DriveBlobStore {
  client:       reqwest::Client,
  base_url:     String,
  access_token: String,
}

#[derive(Deserialize)]
struct FileList {
  #[serde(default)]
  files: Vec<FileRef>,
}

#[derive(Deserialize)]
struct FileRef {
  id: String,
}

impl DriveBlobStore {
  pub fn new(access_token: impl Into<String>) -> Result<Self> {
    Self::with_base_url(access_token, DEFAULT_BASE_URL)
  }

  pub fn with_base_url(
    access_token: impl Into<String>,
    base_url: impl Into<String>,
  ) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(60))
      .build()?;
    Ok(Self {
      client,
      base_url: base_url.into().trim_end_matches('/').to_owned(),
      access_token: access_token.into(),
    })
  }

  fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

  async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
    let resp = req.bearer_auth(&self.access_token).send().await?;
    let status = resp.status();
    if !status.is_success() {
      return Err(Error::ExternalService(format!("drive {what} → {status}")));
    }
    Ok(resp)
  }
}

/// Quote a value for a Drive search query.
fn query_literal(s: &str) -> String {
  format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Build a `multipart/related` body: JSON metadata part, then the content.
fn multipart_body(name: &str, body: &[u8]) -> Result<Vec<u8>> {
  let metadata = serde_json::json!({ "name": name, "mimeType": "application/json" });
  let mut out = Vec::with_capacity(body.len() + 256);
  out.extend_from_slice(
    format!(
      "--{BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{}\r\n",
      serde_json::to_string(&metadata)?
    )
    .as_bytes(),
  );
  out.extend_from_slice(format!("--{BOUNDARY}\r\nContent-Type: application/json\r\n\r\n").as_bytes());
  out.extend_from_slice(body);
  out.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
  Ok(out)
}

impl BlobStore for DriveBlobStore {
  async fn find(&self, name: &str) -> Result<Option<BlobId>> {
    let q = format!("name={} and trashed=false", query_literal(name));
    let req = self
      .client
      .get(self.url("/drive/v3/files"))
      .query(&[("q", q.as_str()), ("spaces", "drive"), ("fields", "files(id, name)")]);

    let list: FileList = self.send(req, "list").await?.json().await?;
    Ok(list.files.into_iter().next().map(|f| BlobId::new(f.id)))
  }

  async fn download(&self, id: &BlobId) -> Result<Vec<u8>> {
    let req = self
      .client
      .get(self.url(&format!("/drive/v3/files/{id}")))
      .query(&[("alt", "media")]);
    let bytes = self.send(req, "download").await?.bytes().await?;
    Ok(bytes.to_vec())
  }

  async fn create(&self, name: &str, body: Vec<u8>) -> Result<BlobId> {
    let req = self
      .client
      .post(self.url("/upload/drive/v3/files"))
      .query(&[("uploadType", "multipart"), ("fields", "id")])
      .header(
        reqwest::header::CONTENT_TYPE,
        format!("multipart/related; boundary={BOUNDARY}"),
      )
      .body(multipart_body(name, &body)?);

    let created: FileRef = self.send(req, "create").await?.json().await?;
    Ok(BlobId::new(created.id))
  }

  async fn update(&self, id: &BlobId, body: Vec<u8>) -> Result<()> {
    let req = self
      .client
      .patch(self.url(&format!("/upload/drive/v3/files/{id}")))
      .query(&[("uploadType", "media")])
      .header(reqwest::header::CONTENT_TYPE, "application/json")
      .body(body);
    self.send(req, "update").await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use axum::http::{Method, StatusCode};

  use super::*;
  use crate::testing::serve_stub;

  #[test]
  fn query_literal_escapes_quotes() {
    assert_eq!(query_literal("memory.json"), "'memory.json'");
    assert_eq!(query_literal("o'brien.json"), "'o\\'brien.json'");
  }

  #[test]
  fn multipart_body_has_metadata_then_content() {
    let body = multipart_body("m.json", b"{\"messages\":[]}").unwrap();
    let text = String::from_utf8(body).unwrap();

    let meta = text.find("\"name\":\"m.json\"").unwrap();
    let content = text.find("{\"messages\":[]}").unwrap();
    assert!(meta < content);
    assert!(text.ends_with(&format!("--{BOUNDARY}--\r\n")));
  }

  #[tokio::test]
  async fn find_lists_by_name_excluding_trash() {
    let (base, log) = serve_stub(|_| {
      (StatusCode::OK, r#"{"files":[{"id":"abc","name":"m.json"},{"id":"def","name":"m.json"}]}"#.into())
    })
    .await;
    let drive = DriveBlobStore::with_base_url("tok", base).unwrap();

    assert_eq!(drive.find("m.json").await.unwrap(), Some(BlobId::new("abc")));

    let log = log.lock().unwrap();
    let req = &log[0];
    assert_eq!(req.method, Method::GET);
    assert_eq!(req.path, "/drive/v3/files");
    assert_eq!(
      req.query.get("q").map(String::as_str),
      Some("name='m.json' and trashed=false")
    );
    assert_eq!(req.authorization.as_deref(), Some("Bearer tok"));
  }

  #[tokio::test]
  async fn find_with_no_files_is_none() {
    let (base, _log) = serve_stub(|_| (StatusCode::OK, r#"{"files":[]}"#.into())).await;
    let drive = DriveBlobStore::with_base_url("tok", base).unwrap();

    assert_eq!(drive.find("m.json").await.unwrap(), None);
  }

  #[tokio::test]
  async fn download_requests_media() {
    let (base, log) = serve_stub(|_| (StatusCode::OK, r#"{"messages":[]}"#.into())).await;
    let drive = DriveBlobStore::with_base_url("tok", base).unwrap();

    let body = drive.download(&BlobId::new("abc")).await.unwrap();
    assert_eq!(body, br#"{"messages":[]}"#);

    let log = log.lock().unwrap();
    assert_eq!(log[0].path, "/drive/v3/files/abc");
    assert_eq!(log[0].query.get("alt").map(String::as_str), Some("media"));
  }

  #[tokio::test]
  async fn create_uploads_multipart_and_returns_id() {
    let (base, log) = serve_stub(|_| (StatusCode::OK, r#"{"id":"new-id"}"#.into())).await;
    let drive = DriveBlobStore::with_base_url("tok", base).unwrap();

    let id = drive.create("m.json", b"{\"memories\":[]}".to_vec()).await.unwrap();
    assert_eq!(id, BlobId::new("new-id"));

    let log = log.lock().unwrap();
    let req = &log[0];
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path, "/upload/drive/v3/files");
    assert_eq!(req.query.get("uploadType").map(String::as_str), Some("multipart"));
    assert_eq!(
      req.content_type.as_deref(),
      Some(format!("multipart/related; boundary={BOUNDARY}").as_str())
    );
    let text = req.body_text();
    assert!(text.contains("\"name\":\"m.json\""));
    assert!(text.contains("{\"memories\":[]}"));
  }

  #[tokio::test]
  async fn update_patches_media() {
    let (base, log) = serve_stub(|_| (StatusCode::OK, "{}".into())).await;
    let drive = DriveBlobStore::with_base_url("tok", base).unwrap();

    drive.update(&BlobId::new("abc"), b"new body".to_vec()).await.unwrap();

    let log = log.lock().unwrap();
    let req = &log[0];
    assert_eq!(req.method, Method::PATCH);
    assert_eq!(req.path, "/upload/drive/v3/files/abc");
    assert_eq!(req.query.get("uploadType").map(String::as_str), Some("media"));
    assert_eq!(req.body, b"new body");
  }

  #[tokio::test]
  async fn rejected_request_is_external_service_error() {
    let (base, _log) = serve_stub(|_| (StatusCode::UNAUTHORIZED, "{}".into())).await;
    let drive = DriveBlobStore::with_base_url("expired", base).unwrap();

    let err = drive.find("m.json").await.unwrap_err();
    assert!(matches!(err, Error::ExternalService(m) if m.contains("401")));
  }
}
