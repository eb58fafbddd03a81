//! Static fixtures served verbatim.

/// Image formats with an embedded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Image {
    Png,
    Jpeg,
    Webp,
    Svg,
}

impl Image {
    pub fn bytes(&self) -> &'static [u8] {
        match self {
            Image::Png => include_bytes!("../../resources/images/pig_icon.png"),
            Image::Jpeg => include_bytes!("../../resources/images/jackal.jpg"),
            Image::Webp => include_bytes!("../../resources/images/wolf_1.webp"),
            Image::Svg => include_bytes!("../../resources/images/svg_logo.svg"),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Image::Png => "image/png",
            Image::Jpeg => "image/jpeg",
            Image::Webp => "image/webp",
            Image::Svg => "image/svg+xml",
        }
    }

    /// Pick a format from an `Accept` header. `None` means nothing acceptable.
    /// A missing header defaults to PNG.
    pub fn negotiate(accept: Option<&str>) -> Option<Image> {
        let Some(accept) = accept else {
            return Some(Image::Png);
        };
        let accept = accept.to_ascii_lowercase();

        if accept.contains("image/webp") {
            Some(Image::Webp)
        } else if accept.contains("image/svg+xml") {
            Some(Image::Svg)
        } else if accept.contains("image/jpeg") {
            Some(Image::Jpeg)
        } else if accept.contains("image/png") || accept.contains("image/*") {
            Some(Image::Png)
        } else {
            None
        }
    }
}

pub const ROBOTS_TXT: &str = include_str!("../../resources/text/robots.txt");
pub const DENY_TXT: &str = include_str!("../../resources/text/deny.txt");
