//! Path classification for the access gate.
//!
//! Rules are evaluated in a fixed order and the first match wins:
//! bypass, redirect-if-authenticated, public, then protected by default.

use regex::Regex;

/// A single path test.
#[derive(Debug, Clone)]
pub enum RouteMatcher {
    /// Whole path equals the literal.
    Exact(&'static str),
    /// Path starts with `/` followed by the segment text (`/api`, `/apiary`).
    Prefix(&'static str),
    /// Any segment contains a `.`, which is how static files are told apart.
    FileExtension,
    Pattern(Regex),
}

impl RouteMatcher {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            RouteMatcher::Exact(p) => path == *p,
            RouteMatcher::Prefix(p) => path
                .strip_prefix('/')
                .is_some_and(|rest| rest.starts_with(p)),
            RouteMatcher::FileExtension => path.contains('.'),
            RouteMatcher::Pattern(re) => re.is_match(path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Never intercepted: framework internals, API, static files.
    Bypass,
    /// Public pages a signed-in user is sent away from.
    RedirectIfAuthenticated,
    Public,
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct RoutePolicy {
    pub bypass: Vec<RouteMatcher>,
    pub redirect_if_authenticated: Vec<RouteMatcher>,
    pub public: Vec<RouteMatcher>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        let entry_pages = vec![
            RouteMatcher::Exact("/"),
            RouteMatcher::Exact("/sign-in"),
            RouteMatcher::Exact("/sign-up"),
        ];
        let mut public = entry_pages.clone();
        public.push(RouteMatcher::Pattern(Regex::new(r"^/blog/[^/]+$").unwrap()));
        Self {
            bypass: vec![
                RouteMatcher::Prefix("_next"),
                RouteMatcher::Prefix("api"),
                RouteMatcher::Prefix("static"),
                RouteMatcher::FileExtension,
            ],
            redirect_if_authenticated: entry_pages,
            public,
        }
    }
}

impl RoutePolicy {
    pub fn classify(&self, path: &str) -> RouteClass {
        let any = |set: &[RouteMatcher]| set.iter().any(|m| m.matches(path));
        if any(&self.bypass) {
            RouteClass::Bypass
        } else if any(&self.redirect_if_authenticated) {
            RouteClass::RedirectIfAuthenticated
        } else if any(&self.public) {
            RouteClass::Public
        } else {
            RouteClass::Protected
        }
    }
}

/// Pure transition from (class, session present) to the gate's answer.
pub fn decide(
    class: RouteClass,
    authenticated: bool,
    sign_in: &str,
    landing: &str,
) -> GateDecision {
    match (class, authenticated) {
        (RouteClass::Bypass, _) | (RouteClass::Public, _) => GateDecision::Allow,
        (RouteClass::RedirectIfAuthenticated, true) => GateDecision::Redirect(landing.to_string()),
        (RouteClass::RedirectIfAuthenticated, false) => GateDecision::Allow,
        (RouteClass::Protected, true) => GateDecision::Allow,
        (RouteClass::Protected, false) => GateDecision::Redirect(sign_in.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(path: &str) -> RouteClass {
        RoutePolicy::default().classify(path)
    }

    #[test]
    fn entry_pages_redirect_when_authenticated() {
        for path in ["/", "/sign-in", "/sign-up"] {
            assert_eq!(class(path), RouteClass::RedirectIfAuthenticated, "{path}");
        }
    }

    #[test]
    fn single_blog_posts_are_public() {
        assert_eq!(class("/blog/hello-world"), RouteClass::Public);
        assert_eq!(class("/blog/42"), RouteClass::Public);
        assert_eq!(class("/blog/new/otherNew"), RouteClass::Protected);
        assert_eq!(class("/blog/"), RouteClass::Protected);
        assert_eq!(class("/blog"), RouteClass::Protected);
    }

    #[test]
    fn app_pages_are_protected() {
        for path in ["/feed", "/dashboard", "/dashboard/abc", "/profile/1", "/explore/tags"] {
            assert_eq!(class(path), RouteClass::Protected, "{path}");
        }
    }

    #[test]
    fn internals_api_and_files_bypass() {
        for path in [
            "/_next/static/chunk.js",
            "/api/auth/sign-up",
            "/api",
            "/static/logo",
            "/favicon.ico",
            "/blog/post.html",
            "/images/a.png",
        ] {
            assert_eq!(class(path), RouteClass::Bypass, "{path}");
        }
    }

    #[test]
    fn decision_table() {
        let d = |c, a| decide(c, a, "/sign-in", "/feed");
        assert_eq!(d(RouteClass::RedirectIfAuthenticated, true), GateDecision::Redirect("/feed".into()));
        assert_eq!(d(RouteClass::RedirectIfAuthenticated, false), GateDecision::Allow);
        assert_eq!(d(RouteClass::Public, true), GateDecision::Allow);
        assert_eq!(d(RouteClass::Public, false), GateDecision::Allow);
        assert_eq!(d(RouteClass::Protected, true), GateDecision::Allow);
        assert_eq!(d(RouteClass::Protected, false), GateDecision::Redirect("/sign-in".into()));
        assert_eq!(d(RouteClass::Bypass, false), GateDecision::Allow);
    }
}
