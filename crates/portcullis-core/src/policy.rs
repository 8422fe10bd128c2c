//! Route role policy.
//!
//! A [`RolePolicy`] maps a request path to per-method role requirements.
//! Method keys are stored in lower case; `"*"` applies to any method that has
//! no entry of its own.
//!
//! ```toml
//! [role_policy."/admin"]
//! "*" = ["admin"]
//!
//! [role_policy."/courses"]
//! get = ["user", "admin"]
//! post = ["admin"]
//! ```

use std::collections::HashMap;

use http::Method;
use serde::{Deserialize, Serialize};

/// Method key matching every method without an explicit entry.
pub const WILDCARD_METHOD: &str = "*";

type MethodRules = HashMap<String, Vec<String>>;

/// Per-path, per-method required roles.
///
/// Role names are kept as strings so a policy may name roles outside the
/// closed [`Role`](crate::Role) set; those simply never match.
///
/// # Example
///
/// ```
/// use http::Method;
/// use portcullis_core::RolePolicy;
///
/// let policy = RolePolicy::new()
///     .with_rule("/admin", "*", ["admin"])
///     .with_rule("/courses", "GET", ["user", "admin"]);
///
/// assert_eq!(policy.required_roles("/admin", &Method::DELETE), Some(&["admin".to_string()][..]));
/// assert_eq!(policy.required_roles("/courses", &Method::PUT), Some(&[][..]));
/// assert_eq!(policy.required_roles("/health", &Method::GET), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, MethodRules>", into = "HashMap<String, MethodRules>")]
pub struct RolePolicy {
    routes: HashMap<String, MethodRules>,
}

impl From<HashMap<String, MethodRules>> for RolePolicy {
    fn from(routes: HashMap<String, MethodRules>) -> Self {
        let routes = routes
            .into_iter()
            .map(|(path, rules)| {
                let rules = rules
                    .into_iter()
                    .map(|(method, roles)| (method.to_ascii_lowercase(), roles))
                    .collect();
                (path, rules)
            })
            .collect();
        Self { routes }
    }
}

impl From<RolePolicy> for HashMap<String, MethodRules> {
    fn from(policy: RolePolicy) -> Self {
        policy.routes
    }
}

impl RolePolicy {
    /// Creates an empty policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the roles required for `method` on `path`.
    pub fn with_rule<I, S>(mut self, path: impl Into<String>, method: &str, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routes
            .entry(path.into())
            .or_default()
            .insert(
                method.to_ascii_lowercase(),
                roles.into_iter().map(Into::into).collect(),
            );
        self
    }

    /// Returns the roles required for `method` on `path`.
    ///
    /// `None` means the path is not governed at all. For a governed path the
    /// method's own entry wins, then the wildcard entry, then an empty list.
    #[must_use]
    pub fn required_roles(&self, path: &str, method: &Method) -> Option<&[String]> {
        let rules = self.routes.get(path)?;
        let method = method.as_str().to_ascii_lowercase();
        Some(
            rules
                .get(&method)
                .or_else(|| rules.get(WILDCARD_METHOD))
                .map_or(&[][..], Vec::as_slice),
        )
    }

    /// Returns `true` if `path` has an entry.
    #[must_use]
    pub fn governs(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    /// Iterates over governed paths and their method rules.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HashMap<String, Vec<String>>)> {
        self.routes.iter().map(|(path, rules)| (path.as_str(), rules))
    }

    /// Number of governed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no path is governed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn courses_policy() -> RolePolicy {
        RolePolicy::new()
            .with_rule("/admin", "*", ["admin"])
            .with_rule("/courses", "get", ["user", "admin"])
            .with_rule("/courses", "post", ["admin"])
    }

    #[test]
    fn test_wildcard_applies_to_every_method() {
        let policy = courses_policy();
        for method in [Method::GET, Method::POST, Method::DELETE] {
            assert_eq!(
                policy.required_roles("/admin", &method).unwrap(),
                ["admin".to_string()]
            );
        }
    }

    #[test]
    fn test_unlisted_method_without_wildcard_is_open() {
        let policy = courses_policy();
        assert!(policy
            .required_roles("/courses", &Method::PUT)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_explicit_method_beats_wildcard() {
        let policy = RolePolicy::new()
            .with_rule("/reports", "*", ["admin"])
            .with_rule("/reports", "GET", ["user"]);
        assert_eq!(
            policy.required_roles("/reports", &Method::GET).unwrap(),
            ["user".to_string()]
        );
        assert_eq!(
            policy.required_roles("/reports", &Method::PATCH).unwrap(),
            ["admin".to_string()]
        );
    }

    #[test]
    fn test_ungoverned_path() {
        let policy = courses_policy();
        assert!(policy.required_roles("/", &Method::GET).is_none());
        assert!(!policy.governs("/admin/users"));
        assert_eq!(policy.len(), 2);
    }

    #[test]
    fn test_deserialize_lowercases_methods() {
        let policy: RolePolicy = serde_json::from_str(
            r#"{"/courses": {"GET": ["user"], "Post": ["admin", "moderator"]}}"#,
        )
        .unwrap();

        assert_eq!(
            policy.required_roles("/courses", &Method::GET).unwrap(),
            ["user".to_string()]
        );
        assert_eq!(
            policy.required_roles("/courses", &Method::POST).unwrap(),
            ["admin".to_string(), "moderator".to_string()]
        );
    }

    #[test]
    fn test_empty_policy() {
        let policy = RolePolicy::default();
        assert!(policy.is_empty());
        assert_eq!(policy.iter().count(), 0);
    }
}
