//! Route template and HTTP verb resolution.

use http::Method;
use serde::Deserialize;

use crate::contract::{MethodContract, RouteTemplate};
use crate::error::MappingError;

/// How to treat routes that declare several path fragments or verbs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePolicy {
    /// Use the first declaration and ignore the rest
    #[default]
    FirstWins,
    /// Fail with [`MappingError::AmbiguousRoute`]
    RejectAmbiguous,
}

impl RoutePolicy {
    /// Parse the config spelling (`first_wins` / `reject_ambiguous`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "first_wins" => Some(RoutePolicy::FirstWins),
            "reject_ambiguous" => Some(RoutePolicy::RejectAmbiguous),
            _ => None,
        }
    }
}

/// First element of `items`, or `default` when there is none.
pub fn first_or_default<T: Clone>(items: &[T], default: T) -> T {
    items.first().cloned().unwrap_or(default)
}

/// Join a type-level and a method-level fragment into one path anchored at `/`.
///
/// Leading and trailing slashes of each fragment are dropped, so
/// `("/users/", "/{id}")` and `("users", "{id}")` both give `/users/{id}`.
pub fn join_fragments(type_fragment: &str, method_fragment: &str) -> String {
    let segments: Vec<&str> = [type_fragment, method_fragment]
        .into_iter()
        .map(|fragment| fragment.trim_matches('/'))
        .filter(|fragment| !fragment.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Verb declared by a route: its first verb, GET when none is declared.
pub fn verb_of(route: &RouteTemplate) -> Method {
    first_or_default(route.methods(), Method::GET)
}

/// Merge the contract's type-level and method-level templates.
///
/// # Errors
///
/// [`MappingError::UnmappedMethod`] when the method has no route of its own,
/// [`MappingError::AmbiguousRoute`] when `policy` rejects multiple fragments.
pub fn resolve_path_template(
    contract: &MethodContract,
    policy: RoutePolicy,
) -> Result<String, MappingError> {
    let method_route = contract
        .method_route()
        .ok_or_else(|| MappingError::UnmappedMethod {
            method: contract.id().clone(),
        })?;

    let type_fragment = match contract.type_route() {
        Some(route) => {
            check_fragments(contract, "type", route, policy)?;
            first_or_default(route.paths(), String::new())
        }
        None => String::new(),
    };
    check_fragments(contract, "method", method_route, policy)?;
    let method_fragment = first_or_default(method_route.paths(), String::new());

    Ok(join_fragments(&type_fragment, &method_fragment))
}

/// HTTP verb of the contract's method-level route.
///
/// # Errors
///
/// [`MappingError::UnmappedMethod`] when the method has no route of its own,
/// [`MappingError::AmbiguousRoute`] when `policy` rejects multiple verbs.
pub fn resolve_http_method(
    contract: &MethodContract,
    policy: RoutePolicy,
) -> Result<Method, MappingError> {
    let route = contract
        .method_route()
        .ok_or_else(|| MappingError::UnmappedMethod {
            method: contract.id().clone(),
        })?;

    let methods = route.methods();
    if methods.len() > 1 {
        match policy {
            RoutePolicy::RejectAmbiguous => {
                return Err(MappingError::AmbiguousRoute {
                    method: contract.id().clone(),
                    detail: format!("{} verbs declared: {:?}", methods.len(), methods),
                });
            }
            RoutePolicy::FirstWins => {
                tracing::warn!(
                    method = %contract.id(),
                    declared = ?methods,
                    "multiple verbs declared, using the first"
                );
            }
        }
    }
    Ok(verb_of(route))
}

fn check_fragments(
    contract: &MethodContract,
    level: &str,
    route: &RouteTemplate,
    policy: RoutePolicy,
) -> Result<(), MappingError> {
    let paths = route.paths();
    if paths.len() <= 1 {
        return Ok(());
    }
    match policy {
        RoutePolicy::RejectAmbiguous => Err(MappingError::AmbiguousRoute {
            method: contract.id().clone(),
            detail: format!("{} {level}-level paths declared: {:?}", paths.len(), paths),
        }),
        RoutePolicy::FirstWins => {
            tracing::warn!(
                method = %contract.id(),
                level,
                declared = ?paths,
                "multiple paths declared, using the first"
            );
            Ok(())
        }
    }
}
