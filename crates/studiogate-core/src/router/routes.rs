use super::location::normalize_path;

/// Declarative route definition, possibly nested.
#[derive(Debug, Clone, Default)]
pub struct RouteRecord {
    pub path: String,
    pub name: Option<String>,
    pub requires_auth: bool,
    pub redirect: Option<String>,
    pub catch_all: bool,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Default::default()
        }
    }

    /// Matches any path that no other record matches.
    pub fn catch_all(redirect: &str) -> Self {
        Self {
            path: "*".to_string(),
            catch_all: true,
            redirect: Some(redirect.to_string()),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn requires_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn redirect(mut self, to: &str) -> Self {
        self.redirect = Some(to.to_string());
        self
    }

    pub fn children(mut self, children: Vec<RouteRecord>) -> Self {
        self.children = children;
        self
    }
}

/// A flattened, matchable route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub name: Option<String>,
    pub requires_auth: bool,
    pub redirect: Option<String>,
    pub catch_all: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(records: Vec<RouteRecord>) -> Self {
        let mut routes = Vec::new();
        for record in &records {
            flatten(record, None, false, &mut routes);
        }
        Self { routes }
    }

    /// The application's routes: a public login page, protected pages under
    /// the main layout, and everything else sent home.
    pub fn app_default() -> Self {
        Self::new(vec![
            RouteRecord::new("/login").name("login"),
            RouteRecord::new("/").requires_auth().children(vec![
                RouteRecord::new("").name("home"),
                RouteRecord::new("project-types").name("project-types"),
                RouteRecord::new("projects").name("projects"),
                RouteRecord::new("studio").name("studio"),
            ]),
            RouteRecord::catch_all("/"),
        ])
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Exact matches win over the catch-all, in declaration order.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let path = normalize_path(path);
        self.routes
            .iter()
            .find(|r| !r.catch_all && r.path == path)
            .or_else(|| self.routes.iter().find(|r| r.catch_all))
    }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name.as_deref() == Some(name))
    }
}

fn flatten(record: &RouteRecord, parent: Option<&str>, inherited_auth: bool, out: &mut Vec<Route>) {
    let requires_auth = inherited_auth || record.requires_auth;

    if record.catch_all {
        out.push(Route {
            path: record.path.clone(),
            name: record.name.clone(),
            requires_auth,
            redirect: record.redirect.clone(),
            catch_all: true,
        });
        return;
    }

    let path = join_paths(parent, &record.path);
    // A parent is only matchable itself when no child claims its path
    let has_index_child = record.children.iter().any(|c| c.path.is_empty());
    if !has_index_child {
        out.push(Route {
            path: path.clone(),
            name: record.name.clone(),
            requires_auth,
            redirect: record.redirect.clone(),
            catch_all: false,
        });
    }

    for child in &record.children {
        flatten(child, Some(&path), requires_auth, out);
    }
}

fn join_paths(parent: Option<&str>, child: &str) -> String {
    match parent {
        _ if child.starts_with('/') => normalize_path(child),
        None => normalize_path(child),
        Some(parent) if child.is_empty() => normalize_path(parent),
        Some(parent) => normalize_path(&format!("{}/{}", parent.trim_end_matches('/'), child)),
    }
}
