//! Web page metadata for the icon mode.
//!
//! Everything here is best effort: a page that cannot be fetched or parsed
//! yields `None` and the icon is generated from the contact name alone.

use crate::image::{ImageFormat, ReferenceImage};
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout for page and preview-image fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest preview image accepted, in bytes (4 MiB).
pub const MAX_PREVIEW_IMAGE_BYTES: usize = 4 * 1024 * 1024;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (compatible; NbStudio/1.0)";

/// Metadata extracted from a web page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlMetadata {
    /// Contents of `<title>`.
    pub title: Option<String>,
    /// `<meta name="description">` content.
    pub description: Option<String>,
    /// `<meta property="og:image">` content.
    pub og_image: Option<String>,
}

impl UrlMetadata {
    /// Returns true if nothing was found.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.og_image.is_none()
    }
}

/// Extracts title, description and preview image from an HTML document.
///
/// Attribute order does not matter and entities are decoded. Blank values
/// count as missing.
pub fn parse_html_metadata(html: &str) -> UrlMetadata {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .and_then(non_blank)
    });

    UrlMetadata {
        title,
        description: meta_content(&document, "name", "description"),
        og_image: meta_content(&document, "property", "og:image"),
    }
}

fn meta_content(document: &Html, key: &str, value: &str) -> Option<String> {
    let selector = Selector::parse("meta[content]").ok()?;
    document
        .select(&selector)
        .find(|el| {
            el.value()
                .attr(key)
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(value))
        })
        .and_then(|el| el.value().attr("content"))
        .and_then(|content| non_blank(content.to_string()))
}

fn non_blank(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Fetches a page and extracts its metadata.
///
/// Returns `None` on timeout, network failure, a non-2xx status or a
/// non-HTML response.
pub async fn fetch_url_metadata(client: &reqwest::Client, url: &str) -> Option<UrlMetadata> {
    let response = match client
        .get(url)
        .timeout(FETCH_TIMEOUT)
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .header(ACCEPT, "text/html,application/xhtml+xml")
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(url, error = %e, "page fetch failed");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(url, status = %response.status(), "page fetch returned error status");
        return None;
    }

    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"));
    if !is_html {
        tracing::debug!(url, "page is not HTML");
        return None;
    }

    let body = response.text().await.ok()?;
    let metadata = parse_html_metadata(&body);
    tracing::debug!(
        url,
        has_title = metadata.title.is_some(),
        has_og_image = metadata.og_image.is_some(),
        "page metadata extracted"
    );
    Some(metadata)
}

/// Downloads a page's preview image for use as a reference image.
///
/// Only `image/*` responses of at most [`MAX_PREVIEW_IMAGE_BYTES`] in a
/// format the model accepts are kept.
pub async fn fetch_reference_image(client: &reqwest::Client, url: &str) -> Option<ReferenceImage> {
    let response = client
        .get(url)
        .timeout(FETCH_TIMEOUT)
        .header(ACCEPT, "image/*")
        .send()
        .await
        .ok()?;

    if !response.status().is_success() {
        return None;
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.starts_with("image/") {
        return None;
    }

    if response
        .content_length()
        .is_some_and(|len| len > MAX_PREVIEW_IMAGE_BYTES as u64)
    {
        return None;
    }

    let Some(data) = read_limited(response, MAX_PREVIEW_IMAGE_BYTES).await else {
        tracing::debug!(url, "preview image rejected: over size limit or unreadable");
        return None;
    };
    if data.is_empty() {
        return None;
    }

    let format = ImageFormat::from_mime_type(&content_type)
        .or_else(|| ImageFormat::from_magic_bytes(&data))?;
    Some(ReferenceImage::new(data, format))
}

/// Reads a body chunk by chunk, giving up as soon as it exceeds `limit`.
async fn read_limited(mut response: reqwest::Response, limit: usize) -> Option<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = response.chunk().await.ok()? {
        if data.len() + chunk.len() > limit {
            return None;
        }
        data.extend_from_slice(&chunk);
    }
    Some(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const PNG: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    /// Serves one chunked `image/png` response without a Content-Length.
    async fn serve_chunked(chunks: Vec<Vec<u8>>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;

            let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            for chunk in chunks {
                let mut frame = format!("{:x}\r\n", chunk.len()).into_bytes();
                frame.extend_from_slice(&chunk);
                frame.extend_from_slice(b"\r\n");
                if socket.write_all(&frame).await.is_err() {
                    return;
                }
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
        });
        format!("http://{addr}/og.png")
    }

    fn local_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    #[tokio::test]
    async fn test_preview_image_without_length_is_capped() {
        let chunk = vec![0u8; 1024 * 1024];
        let url = serve_chunked(vec![chunk; 5]).await;

        let image = fetch_reference_image(&local_client(), &url).await;
        assert!(image.is_none());
    }

    #[tokio::test]
    async fn test_preview_image_streamed_within_limit() {
        let url = serve_chunked(vec![PNG[..6].to_vec(), PNG[6..].to_vec()]).await;

        let image = fetch_reference_image(&local_client(), &url)
            .await
            .unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.data, PNG.to_vec());
    }

    #[test]
    fn test_parse_full_document() {
        let html = r#"<!doctype html><html><head>
            <title> Bakery &amp; Cafe </title>
            <meta name="description" content="Fresh bread &quot;daily&quot;">
            <meta property="og:image" content="https://example.com/og.png">
            </head><body></body></html>"#;

        let meta = parse_html_metadata(html);
        assert_eq!(meta.title.as_deref(), Some("Bakery & Cafe"));
        assert_eq!(meta.description.as_deref(), Some("Fresh bread \"daily\""));
        assert_eq!(meta.og_image.as_deref(), Some("https://example.com/og.png"));
    }

    #[test]
    fn test_attribute_order_does_not_matter() {
        let html = r#"<head>
            <meta content="Reversed" name="Description">
            <meta content="https://example.com/a.jpg" property="og:image">
            </head>"#;

        let meta = parse_html_metadata(html);
        assert_eq!(meta.description.as_deref(), Some("Reversed"));
        assert_eq!(meta.og_image.as_deref(), Some("https://example.com/a.jpg"));
        assert!(meta.title.is_none());
    }

    #[test]
    fn test_missing_and_blank_fields() {
        let meta = parse_html_metadata("<html><head><title>  </title></head></html>");
        assert!(meta.is_empty());

        let meta = parse_html_metadata("not html at all");
        assert!(meta.is_empty());
    }
}
