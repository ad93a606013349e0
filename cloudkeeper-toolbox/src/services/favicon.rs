//! Favicon URL construction.

const FAVICON_ENDPOINT: &str = "https://www.google.com/s2/favicons";

/// Image URL of a 64px favicon for the given site URL.
pub fn favicon_url(url: &str) -> String {
    format!(
        "{FAVICON_ENDPOINT}?sz=64&domain={}",
        urlencoding::encode(url.trim())
    )
}
