use std::sync::OnceLock;

use regex::Regex;

/// Extensions accepted as images when no other list is configured
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &[
    "apng", "avif", "bmp", "gif", "ico", "jfif", "jpeg", "jpg", "png", "svg", "tif", "tiff",
    "webp",
];

/// Which URLs and files count as images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPolicy {
    image_extensions: Vec<String>,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self::with_extensions(DEFAULT_IMAGE_EXTENSIONS.iter().copied())
    }
}

impl MediaPolicy {
    /// Build a policy from a list of extensions, with or without the dot
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let image_extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { image_extensions }
    }

    pub fn image_extensions(&self) -> &[String] {
        &self.image_extensions
    }

    /// True when the URL's path ends in a known image extension
    ///
    /// The scheme, host, query string and fragment are ignored, and so is
    /// case. A URL with no path is never an image.
    pub fn is_image(&self, url: &str) -> bool {
        let url = url.split(['?', '#']).next().unwrap_or(url);
        let path = match url.split_once("://") {
            Some((_, rest)) => rest.find('/').map_or("", |slash| &rest[slash..]),
            None => url,
        };
        let Some((_, extension)) = path.rsplit_once('.') else {
            return false;
        };
        if extension.contains('/') {
            return false;
        }
        let extension = extension.to_ascii_lowercase();
        self.image_extensions.iter().any(|e| *e == extension)
    }

    /// A well-formed URL whose path names an image
    pub fn is_image_url(&self, text: &str) -> bool {
        is_url(text) && self.is_image(text)
    }
}

/// True for `scheme://host.tld...` and `scheme://localhost...` strings
pub fn is_url(text: &str) -> bool {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    let url_regex = URL_REGEX.get_or_init(|| {
        Regex::new(r"^(?:\w+:)//([^\s.]+\.\S{2}|localhost[:?\d]*)\S*$").expect("Invalid URL regex")
    });
    url_regex.is_match(text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://x.com/a.png", true)]
    #[case("https://example.org/path/to/file", true)]
    #[case("http://localhost:8080/img.gif", true)]
    #[case("ftp://files.example.net", true)]
    #[case("not a url", false)]
    #[case("x.com/a.png", false)]
    #[case("http://nodot", false)]
    #[case("", false)]
    fn recognises_urls(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_url(text), expected);
    }

    #[rstest]
    #[case("http://x.com/a.png", true)]
    #[case("http://x.com/a.JPG", true)]
    #[case("http://x.com/a.jpeg?size=large#top", true)]
    #[case("http://x.com/a.txt", false)]
    #[case("http://x.com/a", false)]
    #[case("http://x.png/readme", false)]
    #[case("http://example.png", false)]
    #[case("http://example.png?file=a.png", false)]
    #[case("http://example.com/", false)]
    fn recognises_image_paths(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(MediaPolicy::default().is_image(url), expected);
    }

    #[test]
    fn configured_extensions_replace_the_defaults() {
        let policy = MediaPolicy::with_extensions([".HEIC", "png"]);
        assert_eq!(policy.image_extensions(), ["heic", "png"]);
        assert!(policy.is_image_url("http://x.com/photo.heic"));
        assert!(!policy.is_image_url("http://x.com/photo.gif"));
    }
}
