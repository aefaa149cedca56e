// Lenient URL decomposition.
//
// Users paste all kinds of things into the URL box: bare hostnames,
// `localhost:8080/path`, IP literals with ports, strings with spaces. Every
// later stage needs *some* host to work with, so decomposition never fails;
// anything that can't be parsed comes back with an empty host and path.

use url::Url;

/// The pieces of a submitted URL that the decision stages look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    /// Scheme as written by the user, empty when none was given.
    pub scheme: String,
    /// Lower-cased host without userinfo or port. IPv6 hosts keep their brackets.
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    /// Host text as the user typed it, lower-cased, without userinfo or
    /// port. `host` is the parser's canonical form, which rewrites numeric
    /// hosts (`2130706433` becomes `127.0.0.1`); this one does not.
    pub literal_host: String,
}

impl UrlParts {
    /// Decompose a raw URL string.
    ///
    /// Input without a `scheme://` prefix is retried as `http://<input>` so
    /// that `example.com/login` and `localhost:8080` yield a host.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        if let Some(url) = parse_with_host(trimmed) {
            return Self::from_url(&url, url.scheme(), trimmed);
        }

        // An explicit scheme that failed to parse is malformed, not scheme-less
        if trimmed.contains("://") {
            return Self::default();
        }

        match parse_with_host(&format!("http://{trimmed}")) {
            Some(url) => Self::from_url(&url, "", trimmed),
            None => Self::default(),
        }
    }

    fn from_url(url: &Url, scheme: &str, raw: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            host: url.host_str().unwrap_or_default().to_ascii_lowercase(),
            port: url.port(),
            path: url.path().to_string(),
            literal_host: literal_host(raw),
        }
    }

    /// Host with any trailing root dot removed (`google.com.` -> `google.com`).
    pub fn bare_host(&self) -> &str {
        self.host.trim_end_matches('.')
    }
}

/// Cut the host out of the authority by hand, leaving its spelling alone.
fn literal_host(raw: &str) -> String {
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority = rest
        .split(|c: char| matches!(c, '/' | '?' | '#' | '\\'))
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);

    let host = if host_port.starts_with('[') {
        // IPv6 literal: keep the brackets, drop anything after them
        host_port
            .find(']')
            .map_or(host_port, |end| &host_port[..=end])
    } else {
        host_port.split(':').next().unwrap_or_default()
    };
    host.to_lowercase()
}

/// Parse and keep the result only if it actually names a host.
///
/// `localhost:8080/x` parses as scheme `localhost` with no host, which is
/// useless to us; returning None triggers the `http://` retry.
fn parse_with_host(candidate: &str) -> Option<Url> {
    let url = Url::parse(candidate).ok()?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Some(url),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_url_decomposes() {
        let parts = UrlParts::parse("https://Accounts.Google.com/login?x=1");
        assert_eq!(parts.scheme, "https");
        assert_eq!(parts.host, "accounts.google.com");
        assert_eq!(parts.path, "/login");
        assert_eq!(parts.port, None);
    }

    #[test]
    fn bare_host_with_port_gets_a_host() {
        let parts = UrlParts::parse("localhost:8080/anything");
        assert_eq!(parts.scheme, "");
        assert_eq!(parts.host, "localhost");
        assert_eq!(parts.port, Some(8080));
        assert_eq!(parts.path, "/anything");
    }

    #[test]
    fn bare_domain_gets_a_host() {
        let parts = UrlParts::parse("example.com/verify.php");
        assert_eq!(parts.host, "example.com");
        assert_eq!(parts.path, "/verify.php");
    }

    #[test]
    fn userinfo_is_not_part_of_host() {
        let parts = UrlParts::parse("http://google.com@evil.example/login");
        assert_eq!(parts.host, "evil.example");
    }

    #[test]
    fn garbage_degrades_to_empty() {
        let parts = UrlParts::parse("http://[not a host");
        assert_eq!(parts.host, "");
        assert_eq!(parts.path, "");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(UrlParts::parse("   "), UrlParts::default());
    }

    #[test]
    fn literal_host_keeps_numeric_spelling() {
        let parts = UrlParts::parse("http://2130706433/");
        assert_eq!(parts.host, "127.0.0.1");
        assert_eq!(parts.literal_host, "2130706433");

        let parts = UrlParts::parse("http://user@0x7F.1:8080/x");
        assert_eq!(parts.literal_host, "0x7f.1");

        let parts = UrlParts::parse("localhost:8080/anything");
        assert_eq!(parts.literal_host, "localhost");

        let parts = UrlParts::parse("http://[::1]:3000/");
        assert_eq!(parts.literal_host, "[::1]");
    }

    #[test]
    fn trailing_root_dot_is_trimmed_by_bare_host() {
        let parts = UrlParts::parse("https://google.com./");
        assert_eq!(parts.bare_host(), "google.com");
    }
}
