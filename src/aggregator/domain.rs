//! Domain naming for aggregation

use url::Url;

/// Bucket name used when a URL cannot be parsed
pub const UNKNOWN_DOMAIN: &str = "unknown_domain";

/// The aggregation key for a URL: its host (with port, if any) minus a
/// leading `www.`
pub fn domain_name(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return UNKNOWN_DOMAIN.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return UNKNOWN_DOMAIN.to_string();
    };

    let host = host.strip_prefix("www.").unwrap_or(host);
    match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_name() {
        assert_eq!(domain_name("https://www.example.com/a?b=c"), "example.com");
        assert_eq!(domain_name("https://shop.example.com/"), "shop.example.com");
        assert_eq!(domain_name("http://example.com:8080/x"), "example.com:8080");
        assert_eq!(domain_name("https://wwwexample.com"), "wwwexample.com");
    }

    #[test]
    fn test_unparsable_url() {
        assert_eq!(domain_name("not a url"), UNKNOWN_DOMAIN);
        assert_eq!(domain_name("mailto:someone@example.com"), UNKNOWN_DOMAIN);
    }
}
