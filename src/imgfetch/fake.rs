//! In-memory fetcher for tests

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;

use super::fetcher::{FetchError, FetchResponse, HttpFetch};

/// Encode a black JPEG of the given size
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Jpeg).unwrap();
    buf.into_inner()
}

enum Reply {
    Response(FetchResponse),
    Timeout,
}

/// Serves canned responses, 404 for unknown URLs
#[derive(Default)]
pub struct FakeFetch {
    replies: HashMap<String, Reply>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, status: u16, content_type: &str, body: Vec<u8>) -> Self {
        self.replies.insert(
            url.to_string(),
            Reply::Response(FetchResponse {
                status,
                content_type: Some(content_type.to_string()),
                body,
            }),
        );
        self
    }

    pub fn with_jpeg(self, url: &str, width: u32, height: u32) -> Self {
        self.with_response(url, 200, "image/jpeg", jpeg_bytes(width, height))
    }

    pub fn with_text(self, url: &str, body: &str) -> Self {
        self.with_response(url, 200, "text/xml", body.as_bytes().to_vec())
    }

    pub fn with_timeout(mut self, url: &str) -> Self {
        self.replies.insert(url.to_string(), Reply::Timeout);
        self
    }

    /// URLs requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetch for FakeFetch {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.replies.get(url) {
            Some(Reply::Response(response)) => Ok(response.clone()),
            Some(Reply::Timeout) => Err(FetchError::Timeout(url.to_string())),
            None => Ok(FetchResponse {
                status: 404,
                content_type: Some("text/plain".to_string()),
                body: b"Not Found".to_vec(),
            }),
        }
    }
}
