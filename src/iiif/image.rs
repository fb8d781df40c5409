//! IIIF Image API requests
//!
//! Images are never processed. A request is answered by picking a stored
//! variant that matches the requested size and format exactly.

use thiserror::Error;

use super::types::ImageVariant;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageRequestError {
    #[error("Unsupported image request: {0}")]
    Unsupported(String),
    #[error("Invalid image request: {0}")]
    Invalid(String),
}

/// Requested size parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRequest {
    /// `full` or `max`
    Max,
    Width(u32),
    Height(u32),
    Exact(u32, u32),
}

impl SizeRequest {
    pub fn parse(size: &str) -> Result<Self, ImageRequestError> {
        if size == "full" || size == "max" {
            return Ok(SizeRequest::Max);
        }
        let invalid = || ImageRequestError::Invalid(format!("size '{}'", size));
        let number = |s: &str| s.parse::<u32>().map_err(|_| invalid());

        match size.split_once(',') {
            Some((w, "")) => Ok(SizeRequest::Width(number(w)?)),
            Some(("", h)) => Ok(SizeRequest::Height(number(h)?)),
            Some((w, h)) => Ok(SizeRequest::Exact(number(w)?, number(h)?)),
            None if size.starts_with("pct:") || size.starts_with('!') => {
                Err(ImageRequestError::Unsupported(format!("size '{}'", size)))
            }
            None => Err(invalid()),
        }
    }

    fn matches(&self, variant: &ImageVariant) -> bool {
        match *self {
            SizeRequest::Max => true,
            SizeRequest::Width(w) => variant.width == w,
            SizeRequest::Height(h) => variant.height == h,
            SizeRequest::Exact(w, h) => variant.width == w && variant.height == h,
        }
    }
}

/// A parsed `/{region}/{size}/{rotation}/{quality}.{format}` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub size: SizeRequest,
    /// MIME type derived from the format extension
    pub format: String,
}

impl ImageRequest {
    /// Only the full region, no rotation and the default quality are
    /// available from a level 0 service
    pub fn parse(
        region: &str,
        size: &str,
        rotation: &str,
        quality: &str,
        format: &str,
    ) -> Result<Self, ImageRequestError> {
        if region != "full" {
            return Err(ImageRequestError::Unsupported(format!("region '{}'", region)));
        }
        if rotation != "0" {
            return Err(ImageRequestError::Unsupported(format!("rotation '{}'", rotation)));
        }
        if quality != "default" && quality != "native" {
            return Err(ImageRequestError::Unsupported(format!("quality '{}'", quality)));
        }
        let format = mime_guess::from_ext(format)
            .first()
            .map(|m| m.essence_str().to_string())
            .ok_or_else(|| ImageRequestError::Unsupported(format!("format '{}'", format)))?;

        Ok(Self {
            size: SizeRequest::parse(size)?,
            format,
        })
    }

    /// Split the path segment `{quality}.{format}`
    pub fn split_quality(segment: &str) -> Result<(&str, &str), ImageRequestError> {
        segment
            .rsplit_once('.')
            .ok_or_else(|| ImageRequestError::Invalid(format!("quality and format '{}'", segment)))
    }

    /// Stored variant answering this request
    ///
    /// For `full`/`max` the widest variant wins, otherwise the first exact
    /// match in stored order.
    pub fn select<'a>(&self, variants: &'a [ImageVariant]) -> Option<&'a ImageVariant> {
        let mut candidates = variants
            .iter()
            .filter(|v| v.format == self.format)
            .filter(|v| self.size.matches(v));
        match self.size {
            SizeRequest::Max => candidates.fold(None, |best: Option<&ImageVariant>, v| match best {
                Some(b) if b.width >= v.width => Some(b),
                _ => Some(v),
            }),
            _ => candidates.next(),
        }
    }
}
