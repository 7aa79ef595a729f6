use crate::config::FetchConfig;
use crate::error::ClassifyError;
use bytes::{Bytes, BytesMut};
use log::debug;
use std::time::Duration;

/// Source of raw image bytes for a location reference.
#[allow(async_fn_in_trait)]
pub trait ImageFetcher {
    async fn fetch(&self, location: &str) -> Result<Bytes, ClassifyError>;
}

/// Downloads images over HTTP(S).
///
/// Bodies larger than `max_image_bytes` are refused, whether announced by
/// `Content-Length` or discovered while streaming.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_image_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            max_image_bytes: config.max_image_bytes,
        })
    }

    fn too_large(&self, location: &str) -> ClassifyError {
        ClassifyError::Transport(format!(
            "{} is larger than the {} byte limit",
            location, self.max_image_bytes
        ))
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, location: &str) -> Result<Bytes, ClassifyError> {
        let mut response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| ClassifyError::Transport(describe_reqwest_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Transport(format!(
                "{} returned HTTP {}",
                location, status
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_image_bytes {
                return Err(self.too_large(location));
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ClassifyError::Transport(describe_reqwest_error(&e)))?
        {
            if (body.len() + chunk.len()) as u64 > self.max_image_bytes {
                return Err(self.too_large(location));
            }
            body.extend_from_slice(&chunk);
        }
        debug!("Fetched {} bytes from {}", body.len(), location);

        Ok(body.freeze())
    }
}

fn describe_reqwest_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {}", error)
    } else if error.is_builder() {
        format!("invalid image url: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers a single connection with `response` and returns its url.
    async fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}/image.jpg", address)
    }

    fn limited(max_image_bytes: u64) -> HttpFetcher {
        HttpFetcher::new(&FetchConfig {
            timeout_secs: 5,
            max_image_bytes,
            ..FetchConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn body_within_limit() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello".to_vec(),
        )
        .await;

        let body = limited(16).fetch(&url).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn announced_length_over_limit() {
        let mut response =
            b"HTTP/1.1 200 OK\r\nContent-Length: 64\r\nConnection: close\r\n\r\n".to_vec();
        response.extend_from_slice(&[0u8; 64]);
        let url = serve_once(response).await;

        let err = limited(16).fetch(&url).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Transport(ref m) if m.contains("byte limit")));
    }

    #[tokio::test]
    async fn streamed_body_over_limit() {
        let mut response =
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec();
        for _ in 0..4 {
            response.extend_from_slice(b"10\r\n");
            response.extend_from_slice(&[0u8; 16]);
            response.extend_from_slice(b"\r\n");
        }
        response.extend_from_slice(b"0\r\n\r\n");
        let url = serve_once(response).await;

        let err = limited(40).fetch(&url).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Transport(ref m) if m.contains("byte limit")));
    }

    #[tokio::test]
    async fn invalid_url_is_a_transport_error() {
        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();

        assert!(matches!(err, ClassifyError::Transport(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let fetcher = HttpFetcher::new(&FetchConfig {
            timeout_secs: 2,
            ..FetchConfig::default()
        })
        .unwrap();
        // Port 9 on loopback refuses connections.
        let err = fetcher.fetch("http://127.0.0.1:9/image.jpg").await.unwrap_err();

        assert!(matches!(err, ClassifyError::Transport(_)));
    }
}
