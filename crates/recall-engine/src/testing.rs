//! Scripted stand-ins for the external collaborators.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use axum::{
  Router,
  body::Bytes,
  extract::Query,
  http::{HeaderMap, Method, StatusCode, Uri, header},
};

use crate::{
  Error, Result,
  blob::{BlobId, BlobStore},
  model::ModelClient,
};

/// A model that returns a fixed reply (or always fails) and records prompts.
pub struct ScriptedModel {
  reply:   Option<String>,
  prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
  pub fn replying(reply: &str) -> Self {
    Self { reply: Some(reply.to_owned()), prompts: Mutex::new(Vec::new()) }
  }

  pub fn failing() -> Self { Self { reply: None, prompts: Mutex::new(Vec::new()) } }

  pub fn calls(&self) -> usize { self.prompts.lock().unwrap().len() }

  pub fn last_prompt(&self) -> Option<String> {
    self.prompts.lock().unwrap().last().cloned()
  }
}

impl ModelClient for ScriptedModel {
  async fn generate(&self, prompt: &str) -> Result<String> {
    self.prompts.lock().unwrap().push(prompt.to_owned());
    self
      .reply
      .clone()
      .ok_or_else(|| Error::ExternalService("model unavailable".into()))
  }
}

/// An in-memory blob store keyed by name.
#[derive(Default)]
pub struct MemoryBlobStore {
  objects: Mutex<HashMap<String, Vec<u8>>>,
  fail:    bool,
  pub finds:   AtomicUsize,
  pub creates: AtomicUsize,
  pub updates: AtomicUsize,
}

impl MemoryBlobStore {
  pub fn failing() -> Self { Self { fail: true, ..Self::default() } }

  pub fn with_object(name: &str, body: Vec<u8>) -> Self {
    let store = Self::default();
    store.objects.lock().unwrap().insert(name.to_owned(), body);
    store
  }

  pub fn object(&self, name: &str) -> Option<Vec<u8>> {
    self.objects.lock().unwrap().get(name).cloned()
  }

  pub fn writes(&self) -> usize {
    self.creates.load(Ordering::SeqCst) + self.updates.load(Ordering::SeqCst)
  }

  fn check(&self) -> Result<()> {
    if self.fail {
      return Err(Error::ExternalService("remote unavailable".into()));
    }
    Ok(())
  }
}

impl BlobStore for MemoryBlobStore {
  async fn find(&self, name: &str) -> Result<Option<BlobId>> {
    self.finds.fetch_add(1, Ordering::SeqCst);
    self.check()?;
    let found = self.objects.lock().unwrap().contains_key(name);
    Ok(found.then(|| BlobId::new(name)))
  }

  async fn download(&self, id: &BlobId) -> Result<Vec<u8>> {
    self.check()?;
    self
      .object(id.as_str())
      .ok_or_else(|| Error::ExternalService(format!("no object {id}")))
  }

  async fn create(&self, name: &str, body: Vec<u8>) -> Result<BlobId> {
    self.check()?;
    self.objects.lock().unwrap().insert(name.to_owned(), body);
    self.creates.fetch_add(1, Ordering::SeqCst);
    Ok(BlobId::new(name))
  }

  async fn update(&self, id: &BlobId, body: Vec<u8>) -> Result<()> {
    self.check()?;
    self.objects.lock().unwrap().insert(id.as_str().to_owned(), body);
    self.updates.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

/// One request seen by a [`serve_stub`] server.
#[derive(Debug, Clone)]
pub struct StubRequest {
  pub method:        Method,
  pub path:          String,
  pub query:         HashMap<String, String>,
  pub content_type:  Option<String>,
  pub authorization: Option<String>,
  pub body:          Vec<u8>,
}

impl StubRequest {
  pub fn body_text(&self) -> String { String::from_utf8_lossy(&self.body).into_owned() }
}

pub type StubLog = Arc<Mutex<Vec<StubRequest>>>;

/// Serve `respond` on an ephemeral local port. Returns the base URL and a log
/// of every request received.
pub async fn serve_stub<F>(respond: F) -> (String, StubLog)
where
  F: Fn(&StubRequest) -> (StatusCode, String) + Send + Sync + 'static,
{
  let log: StubLog = Arc::new(Mutex::new(Vec::new()));
  let respond = Arc::new(respond);

  let app = Router::new().fallback({
    let log = log.clone();
    move |method: Method,
          uri: Uri,
          Query(query): Query<HashMap<String, String>>,
          headers: HeaderMap,
          body: Bytes| {
      let log = log.clone();
      let respond = respond.clone();
      async move {
        let header_str = |name: header::HeaderName| {
          headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
        };
        let req = StubRequest {
          method,
          path: uri.path().to_owned(),
          query,
          content_type: header_str(header::CONTENT_TYPE),
          authorization: header_str(header::AUTHORIZATION),
          body: body.to_vec(),
        };
        let (status, reply) = respond(&req);
        log.lock().unwrap().push(req);
        (status, [(header::CONTENT_TYPE, "application/json")], reply)
      }
    }
  });

  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  (format!("http://{addr}"), log)
}
