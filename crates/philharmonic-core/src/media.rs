//! Media URL resolution.

use crate::event::ImageRef;

pub const DEFAULT_CLOUD_HOST: &str = "res.cloudinary.com";
pub const DEFAULT_WIDTH: u32 = 1200;
const QUALITY: u32 = 80;

/// Turns stored media URLs into fetchable ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResolver {
  base_url:   String,
  cloud_host: String,
}

impl MediaResolver {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self::with_cloud_host(base_url, DEFAULT_CLOUD_HOST)
  }

  pub fn with_cloud_host(base_url: impl Into<String>, cloud_host: impl Into<String>) -> Self {
    let base_url = base_url.into().trim_end_matches('/').to_owned();
    Self { base_url, cloud_host: cloud_host.into() }
  }

  pub fn base_url(&self) -> &str { &self.base_url }

  /// Absolute URLs pass through; relative ones are joined to the base URL.
  pub fn resolve(&self, url: &str) -> String {
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
      return url.to_owned();
    }
    if url.starts_with('/') {
      format!("{}{url}", self.base_url)
    } else {
      format!("{}/{url}", self.base_url)
    }
  }

  /// Resolve `url` and, on the cloud host, ask for a `width`-wide rendition.
  pub fn responsive(&self, url: &str, width: u32) -> String {
    let resolved = self.resolve(url);
    if !resolved.contains(self.cloud_host.as_str()) {
      return resolved;
    }
    let sep = if resolved.contains('?') { '&' } else { '?' };
    format!("{resolved}{sep}w={width}&f=auto&q={QUALITY}")
  }

  /// Display URL for an image at the default width.
  pub fn image(&self, image: &ImageRef) -> String {
    self.responsive(image.preferred_url(), DEFAULT_WIDTH)
  }
}
