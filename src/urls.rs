use url::Url;

/// Resolve `href` against `base`. Empty input and unparsable bases come back unchanged.
pub fn make_absolute(href: &str, base: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Drop the query string and any trailing slashes.
pub fn normalize(url: &str) -> &str {
    let without_query = url.split('?').next().unwrap_or(url);
    without_query.trim_end_matches('/')
}

pub fn is_same_url(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Network location of `url`: host plus an explicit port.
pub fn domain_of(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

/// Cross-domain links are trusted (hosted ATS boards); same-domain links must
/// carry one of `job_patterns` to count.
pub fn looks_like_job_url(url: &str, page_domain: &str, job_patterns: &[&str]) -> bool {
    if !url.starts_with("http") {
        return false;
    }
    if domain_of(url) != page_domain {
        return true;
    }
    let lower = url.to_lowercase();
    job_patterns.iter().any(|pattern| lower.contains(pattern))
}

/// `pattern` ending in `$` must match the end of `url`; anything else is a substring test.
pub fn matches_url_pattern(url: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('$') {
        Some(anchored) => url.ends_with(anchored),
        None => url.contains(pattern),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::JOB_URL_PATTERNS;

    #[test]
    fn test_make_absolute() {
        assert_eq!(make_absolute("/jobs/123", "https://example.com/careers"), "https://example.com/jobs/123");
        assert_eq!(make_absolute("123", "https://example.com/jobs/"), "https://example.com/jobs/123");
        assert_eq!(
            make_absolute("https://boards.greenhouse.io/acme/jobs/1", "https://example.com/careers"),
            "https://boards.greenhouse.io/acme/jobs/1"
        );
        assert_eq!(make_absolute("", "https://example.com"), "");
        assert_eq!(make_absolute("/jobs/1", "not a url"), "/jobs/1");
    }

    #[test]
    fn test_is_same_url() {
        assert!(is_same_url("https://x.com/a?id=1", "https://x.com/a/"));
        assert!(is_same_url("https://x.com/a/", "https://x.com/a?id=1"));
        assert!(is_same_url("https://x.com/a", "https://x.com/a"));
        assert!(!is_same_url("https://x.com/a", "https://x.com/b"));
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://example.com/jobs/123"), "example.com");
        assert_eq!(domain_of("http://localhost:8080/jobs"), "localhost:8080");
        assert_eq!(domain_of("garbage"), "");
    }

    #[test]
    fn test_looks_like_job_url_cross_domain() {
        assert!(looks_like_job_url("https://jobs.lever.co/acme/abc", "acme.com", JOB_URL_PATTERNS));
        assert!(looks_like_job_url("https://other.com/", "acme.com", JOB_URL_PATTERNS));
    }

    #[test]
    fn test_looks_like_job_url_same_domain() {
        assert!(looks_like_job_url("https://acme.com/jobs/42", "acme.com", JOB_URL_PATTERNS));
        assert!(looks_like_job_url("https://acme.com/Careers/engineer", "acme.com", JOB_URL_PATTERNS));
        assert!(!looks_like_job_url("https://acme.com/about", "acme.com", JOB_URL_PATTERNS));
        assert!(!looks_like_job_url("mailto:hr@acme.com", "acme.com", JOB_URL_PATTERNS));
    }

    #[test]
    fn test_matches_url_pattern() {
        assert!(matches_url_pattern("https://acme.com/careers", "/careers$"));
        assert!(!matches_url_pattern("https://acme.com/careers/eng", "/careers$"));
        assert!(matches_url_pattern("https://acme.com/embed/job", "/embed/"));
    }
}
