//! URL rewriting applied to every request target.

type Step = fn(String, &str) -> String;

/// Applied in order; each step receives the base URL.
const STEPS: [Step; 3] = [prefix_relative_api, rewrite_legacy_host, strip_host_commas];

const LEGACY_HOSTS: [&str; 2] = ["127.0.0.1:8001", "localhost:8001"];

pub(super) fn apply(target: &str, base_url: &str) -> String {
    STEPS
        .iter()
        .fold(target.trim().to_string(), |url, step| step(url, base_url))
}

/// Trims whitespace and trailing commas or slashes.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches([',', '/']).to_string()
}

fn is_absolute(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// `api/...`, `/api/...` and `./api/...` are joined onto the base URL.
fn prefix_relative_api(url: String, base_url: &str) -> String {
    if is_absolute(&url) {
        return url;
    }
    let lower = url.to_ascii_lowercase();
    let stripped = lower.trim_start_matches('.').trim_start_matches('/');
    if !(stripped.starts_with("api/") || lower.contains("/api/")) {
        return url;
    }

    let path = url.trim_start_matches('.').trim_start_matches('/');
    let mut joined = String::with_capacity(base_url.len() + path.len() + 1);
    joined.push_str(base_url);
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        joined.push('/');
        joined.push_str(segment);
    }
    if path.ends_with('/') {
        joined.push('/');
    }
    joined
}

/// Old deployments hard-coded the API on port 8001.
fn rewrite_legacy_host(url: String, base_url: &str) -> String {
    if base_url.is_empty() {
        return url;
    }
    let lower = url.to_ascii_lowercase();
    for scheme in ["http://", "https://"] {
        for host in LEGACY_HOSTS {
            let prefix_len = scheme.len() + host.len();
            if !lower.starts_with(scheme) || !lower[scheme.len()..].starts_with(host) {
                continue;
            }
            let rest = &url[prefix_len..];
            if rest.is_empty() || rest.starts_with(['/', '?', '#', ',']) {
                return format!("{base_url}{rest}");
            }
        }
    }
    url
}

/// `http://host:8000,/api` becomes `http://host:8000/api`.
fn strip_host_commas(url: String, _base_url: &str) -> String {
    let Some(host_start) = url.find("://").map(|idx| idx + 3) else {
        return url;
    };
    let host_end = url[host_start..]
        .find('/')
        .map_or(url.len(), |idx| host_start + idx);
    if !url[host_start..host_end].contains(',') {
        return url;
    }
    let host: String = url[host_start..host_end]
        .chars()
        .filter(|ch| *ch != ',')
        .collect();
    format!("{}{host}{}", &url[..host_start], &url[host_end..])
}
