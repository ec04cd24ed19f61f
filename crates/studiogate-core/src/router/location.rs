use std::fmt;

/// A navigation target: a path plus ordered query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: normalize_path(&path.into()),
            query: Vec::new(),
        }
    }

    /// Parse `"/path?key=value&..."`. A fragment is ignored.
    pub fn parse(input: &str) -> Self {
        let input = input.split('#').next().unwrap_or_default();
        let (path, query) = match input.split_once('?') {
            Some((path, query)) => (path, query),
            None => (input, ""),
        };

        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();

        Self {
            path: normalize_path(path),
            query,
        }
    }

    /// Set a query parameter, replacing any existing value for the key.
    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.retain(|(k, _)| k != key);
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path with the encoded query string, e.g. `/login?next=%2Fprojects`.
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for Location {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

/// Leading slash, no trailing slash (except for the root).
pub(crate) fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_and_query() {
        let loc = Location::parse("/login?next=%2Fprojects%3Ftab%3D2&mode=quick#top");
        assert_eq!(loc.path, "/login");
        assert_eq!(loc.query_value("next"), Some("/projects?tab=2"));
        assert_eq!(loc.query_value("mode"), Some("quick"));
        assert_eq!(loc.query_value("missing"), None);
    }

    #[test]
    fn test_normalizes_paths() {
        assert_eq!(Location::parse("").path, "/");
        assert_eq!(Location::parse("projects/").path, "/projects");
        assert_eq!(Location::new("/studio/").path, "/studio");
        assert_eq!(Location::new("/").path, "/");
    }

    #[test]
    fn test_full_path_round_trips() {
        let target = Location::parse("/projects?tab=open items");
        let login = Location::new("/login").with_query("next", target.full_path());
        assert_eq!(login.full_path(), "/login?next=%2Fprojects%3Ftab%3Dopen%2520items");

        let reparsed = Location::parse(&login.full_path());
        assert_eq!(reparsed, login);
        assert_eq!(Location::parse(reparsed.query_value("next").unwrap()), target);
    }

    #[test]
    fn test_with_query_replaces_existing_key() {
        let loc = Location::new("/login")
            .with_query("next", "/a")
            .with_query("next", "/b");
        assert_eq!(loc.query, vec![("next".to_string(), "/b".to_string())]);
    }

    #[test]
    fn test_plus_decodes_to_space() {
        assert_eq!(Location::parse("/s?q=a+b").query_value("q"), Some("a b"));
    }
}
