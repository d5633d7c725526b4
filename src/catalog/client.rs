use crate::catalog::api_types::ApiProductsResponse;
use crate::catalog::error::FetchError;
use crate::catalog::types::Product;
use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use futures::future::{self, BoxFuture, FutureExt};
use tracing::{debug, warn};
use url::Url;

/// Read-only access to the product catalog.
///
/// Both operations are idempotent. Returned futures own everything they need
/// so callers can spawn them.
pub trait CatalogApi: Send + Sync {
  /// Fetch one page of the catalog in the service's default order
  fn fetch_page(&self, limit: usize, skip: usize)
    -> BoxFuture<'static, Result<Vec<Product>, FetchError>>;

  /// Fetch one page of products matching `query`
  fn search(
    &self,
    query: &str,
    limit: usize,
    skip: usize,
  ) -> BoxFuture<'static, Result<Vec<Product>, FetchError>>;
}

/// HTTP client for a dummyjson-compatible catalog API
#[derive(Clone)]
pub struct CatalogClient {
  http: reqwest::Client,
  base_url: Url,
}

impl CatalogClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = Url::parse(&config.catalog.base_url)
      .map_err(|e| eyre!("Invalid catalog URL {}: {}", config.catalog.base_url, e))?;

    if base_url.cannot_be_a_base() {
      return Err(eyre!("Catalog URL {} cannot be used as a base", base_url));
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("prodcat/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }

  /// `GET {base}/products?limit=L&skip=S`
  pub fn products_url(&self, limit: usize, skip: usize) -> Result<Url, FetchError> {
    let mut url = self.endpoint(&["products"])?;
    url
      .query_pairs_mut()
      .append_pair("limit", &limit.to_string())
      .append_pair("skip", &skip.to_string());
    Ok(url)
  }

  /// `GET {base}/products/search?q=Q&limit=L&skip=S`
  pub fn search_url(&self, query: &str, limit: usize, skip: usize) -> Result<Url, FetchError> {
    let mut url = self.endpoint(&["products", "search"])?;
    url
      .query_pairs_mut()
      .append_pair("q", query)
      .append_pair("limit", &limit.to_string())
      .append_pair("skip", &skip.to_string());
    Ok(url)
  }

  fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| FetchError::Url(self.base_url.to_string()))?
      .pop_if_empty()
      .extend(segments);
    url.set_query(None);
    Ok(url)
  }

  fn get_products(
    &self,
    url: Result<Url, FetchError>,
  ) -> BoxFuture<'static, Result<Vec<Product>, FetchError>> {
    match url {
      Ok(url) => fetch_products(self.http.clone(), url).boxed(),
      Err(e) => future::ready(Err(e)).boxed(),
    }
  }
}

impl CatalogApi for CatalogClient {
  fn fetch_page(
    &self,
    limit: usize,
    skip: usize,
  ) -> BoxFuture<'static, Result<Vec<Product>, FetchError>> {
    self.get_products(self.products_url(limit, skip))
  }

  fn search(
    &self,
    query: &str,
    limit: usize,
    skip: usize,
  ) -> BoxFuture<'static, Result<Vec<Product>, FetchError>> {
    self.get_products(self.search_url(query, limit, skip))
  }
}

async fn fetch_products(http: reqwest::Client, url: Url) -> Result<Vec<Product>, FetchError> {
  debug!(%url, "catalog request");

  let response = http.get(url.clone()).send().await.map_err(|e| {
    warn!(%url, error = %e, "catalog request failed");
    FetchError::from(e)
  })?;

  let status = response.status();
  if !status.is_success() {
    warn!(%url, %status, "catalog request failed");
    return Err(FetchError::Status {
      status: status.as_u16(),
    });
  }

  let body: ApiProductsResponse = response.json().await.map_err(|e| {
    warn!(%url, error = %e, "catalog response could not be parsed");
    FetchError::Decode(e.to_string())
  })?;

  let products = body.into_products();
  debug!(%url, count = products.len(), "catalog response");
  Ok(products)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;
  use tokio::sync::oneshot;

  fn client(base_url: &str) -> CatalogClient {
    let mut config = Config::default();
    config.catalog.base_url = base_url.to_string();
    CatalogClient::new(&config).unwrap()
  }

  /// Serve a single canned HTTP response and report the request head
  async fn serve_once(response: String) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = vec![0u8; 4096];
      let n = socket.read(&mut buf).await.unwrap();
      let head = String::from_utf8_lossy(&buf[..n]).to_string();
      socket.write_all(response.as_bytes()).await.unwrap();
      socket.shutdown().await.ok();
      let _ = tx.send(head);
    });

    (format!("http://{}", addr), rx)
  }

  fn http_response(status_line: &str, body: &str) -> String {
    format!(
      "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
      status_line,
      body.len(),
      body
    )
  }

  #[test]
  fn test_products_url() {
    let client = client("https://dummyjson.com");
    let url = client.products_url(10, 20).unwrap();
    assert_eq!(url.as_str(), "https://dummyjson.com/products?limit=10&skip=20");
  }

  #[test]
  fn test_search_url_encodes_query() {
    let client = client("https://dummyjson.com/");
    let url = client.search_url("red phone&case", 10, 0).unwrap();
    assert_eq!(
      url.as_str(),
      "https://dummyjson.com/products/search?q=red+phone%26case&limit=10&skip=0"
    );
  }

  #[test]
  fn test_base_url_with_path_prefix() {
    let client = client("http://localhost:8080/api");
    let url = client.products_url(5, 0).unwrap();
    assert_eq!(url.as_str(), "http://localhost:8080/api/products?limit=5&skip=0");
  }

  #[test]
  fn test_invalid_base_url_rejected() {
    let mut config = Config::default();
    config.catalog.base_url = "not a url".to_string();
    assert!(CatalogClient::new(&config).is_err());
  }

  #[tokio::test]
  async fn test_fetch_page_parses_products() {
    let body = r#"{"products":[{"id":1,"title":"Mascara","price":9.99,"images":[]}],"total":1}"#;
    let (base, head) = serve_once(http_response("200 OK", body)).await;

    let products = client(&base).fetch_page(10, 0).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].title, "Mascara");

    let head = head.await.unwrap();
    assert!(head.starts_with("GET /products?limit=10&skip=0 HTTP/1.1"));
  }

  #[tokio::test]
  async fn test_search_sends_query() {
    let (base, head) = serve_once(http_response("200 OK", r#"{"products":[]}"#)).await;

    let products = client(&base).search("phone", 10, 20).await.unwrap();
    assert!(products.is_empty());

    let head = head.await.unwrap();
    assert!(head.starts_with("GET /products/search?q=phone&limit=10&skip=20 HTTP/1.1"));
  }

  #[tokio::test]
  async fn test_server_error_is_fetch_error() {
    let (base, _head) = serve_once(http_response("500 Internal Server Error", "")).await;

    let result = client(&base).fetch_page(10, 0).await;
    assert_eq!(result, Err(FetchError::Status { status: 500 }));
  }

  #[tokio::test]
  async fn test_malformed_body_is_decode_error() {
    let (base, _head) = serve_once(http_response("200 OK", r#"{"oops":true}"#)).await;

    let result = client(&base).fetch_page(10, 0).await;
    assert!(matches!(result, Err(FetchError::Decode(_))));
  }
}
