//! Route lookup over the registered template set.

use std::sync::Arc;

use http::Method;

use crate::content::Format;
use crate::registry::{Operation, OperationRegistry};
use crate::routing::template::RouteTemplate;

/// A successful route match.
pub struct RouteMatch {
    pub operation: Arc<Operation>,
    pub params: Vec<(String, String)>,
    /// Format derived from a stripped path suffix; overrides header-based
    /// negotiation.
    pub suffix_format: Option<Format>,
}

/// Outcome of route matching. Never an error: the caller maps `NotFound`
/// to the 404-equivalent response.
pub enum MatchResult {
    Found(RouteMatch),
    NotFound,
}

/// What a fallback resolver may name as a last chance.
pub struct FallbackTarget {
    pub operation: String,
    pub params: Vec<(String, String)>,
}

/// Configuration-supplied last-chance resolver consulted when no template
/// matches.
pub type FallbackResolver = Arc<dyn Fn(&Method, &str) -> Option<FallbackTarget> + Send + Sync>;

/// Matches method + path against registered templates, in registration
/// order, first full match wins. Pure over the registered set.
#[derive(Default)]
pub struct RoutePathMatcher {
    templates: Vec<RouteTemplate>,
    fallback: Option<FallbackResolver>,
}

impl RoutePathMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_template(&mut self, template: RouteTemplate) {
        self.templates.push(template);
    }

    pub fn set_fallback(&mut self, resolver: FallbackResolver) {
        self.fallback = Some(resolver);
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Match a request line. When `allow_suffix` is set, a trailing format
    /// extension is stripped before non-wildcard matching and becomes the
    /// negotiated format; wildcard templates always see the raw path.
    pub fn match_request(
        &self,
        registry: &OperationRegistry,
        method: &Method,
        path: &str,
        allow_suffix: bool,
    ) -> MatchResult {
        let (stripped, suffix_format) = if allow_suffix {
            strip_format_suffix(path)
        } else {
            (path, None)
        };

        for template in &self.templates {
            let candidate = if template.has_wildcard() {
                path
            } else {
                stripped
            };
            if let Some(params) = template.match_path(candidate) {
                if let Some(operation) = registry.find(&template.operation, method) {
                    return MatchResult::Found(RouteMatch {
                        operation,
                        params,
                        // a wildcard consumed the raw path, suffix included
                        suffix_format: if template.has_wildcard() {
                            None
                        } else {
                            suffix_format
                        },
                    });
                }
            }
        }

        if let Some(fallback) = &self.fallback {
            if let Some(target) = fallback(method, path) {
                if let Some(operation) = registry.find(&target.operation, method) {
                    return MatchResult::Found(RouteMatch {
                        operation,
                        params: target.params,
                        suffix_format,
                    });
                }
            }
        }

        MatchResult::NotFound
    }
}

/// Split a trailing recognized extension off the last path segment.
fn strip_format_suffix(path: &str) -> (&str, Option<Format>) {
    if let Some(dot) = path.rfind('.') {
        // the dot must be inside the last segment
        if !path[dot..].contains('/') {
            if let Some(format) = Format::from_suffix(&path[dot + 1..]) {
                return (&path[..dot], Some(format));
            }
        }
    }
    (path, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Operation, OperationDef};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct GetOrder {
        id: u32,
    }
    #[derive(Debug, Default, Serialize, Deserialize)]
    struct OrderResponse;

    fn setup() -> (OperationRegistry, RoutePathMatcher) {
        let mut registry = OperationRegistry::new();
        registry.insert(Operation::reply::<GetOrder, OrderResponse, _, _>(
            OperationDef::new().named("GetOrder"),
            |_r, _a| async { Ok(OrderResponse) },
        ));
        let mut matcher = RoutePathMatcher::new();
        matcher.add_template(RouteTemplate::parse("/orders/{Id}", "GetOrder").unwrap());
        (registry, matcher)
    }

    #[test]
    fn suffix_is_stripped_and_reported() {
        let (registry, matcher) = setup();
        match matcher.match_request(&registry, &Method::GET, "/orders/1.json", true) {
            MatchResult::Found(m) => {
                assert_eq!(m.params, vec![("Id".to_string(), "1".to_string())]);
                assert_eq!(m.suffix_format, Some(Format::Json));
            }
            MatchResult::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn suffix_stripping_is_gated() {
        let (registry, matcher) = setup();
        // gate off: the extension stays part of the captured parameter and
        // contributes nothing to negotiation
        match matcher.match_request(&registry, &Method::GET, "/orders/1.json", false) {
            MatchResult::Found(m) => {
                assert_eq!(m.params, vec![("Id".to_string(), "1.json".to_string())]);
                assert_eq!(m.suffix_format, None);
            }
            MatchResult::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn unknown_extension_is_left_alone() {
        let (registry, matcher) = setup();
        match matcher.match_request(&registry, &Method::GET, "/orders/1.tar", true) {
            MatchResult::Found(m) => {
                assert_eq!(m.params, vec![("Id".to_string(), "1.tar".to_string())]);
                assert_eq!(m.suffix_format, None);
            }
            MatchResult::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn wildcard_sees_the_unstripped_path() {
        let mut registry = OperationRegistry::new();
        registry.insert(Operation::reply::<GetOrder, OrderResponse, _, _>(
            OperationDef::new().named("GetFile"),
            |_r, _a| async { Ok(OrderResponse) },
        ));
        let mut matcher = RoutePathMatcher::new();
        matcher.add_template(RouteTemplate::parse("/files/{Path*}", "GetFile").unwrap());
        match matcher.match_request(&registry, &Method::GET, "/files/readme.json", true) {
            MatchResult::Found(m) => {
                assert_eq!(
                    m.params,
                    vec![("Path".to_string(), "readme.json".to_string())]
                );
                assert_eq!(m.suffix_format, None);
            }
            MatchResult::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn fallback_is_consulted_before_not_found() {
        let (registry, mut matcher) = setup();
        matcher.set_fallback(Arc::new(|_method, path| {
            path.starts_with("/legacy").then(|| FallbackTarget {
                operation: "GetOrder".to_string(),
                params: vec![("Id".to_string(), "0".to_string())],
            })
        }));
        assert!(matches!(
            matcher.match_request(&registry, &Method::GET, "/legacy/orders", true),
            MatchResult::Found(_)
        ));
        assert!(matches!(
            matcher.match_request(&registry, &Method::GET, "/nothing", true),
            MatchResult::NotFound
        ));
    }

    #[test]
    fn first_registered_template_wins() {
        let (registry, mut matcher) = setup();
        // same shape registered again; the earlier one must win
        matcher.add_template(RouteTemplate::parse("/orders/{Other}", "GetOrder").unwrap());
        match matcher.match_request(&registry, &Method::GET, "/orders/9", true) {
            MatchResult::Found(m) => {
                assert_eq!(m.params[0].0, "Id");
            }
            MatchResult::NotFound => panic!("expected a match"),
        }
    }
}
