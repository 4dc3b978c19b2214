//! Immutable method contracts.
//!
//! A [`MethodContract`] describes one invocable client method: its parameters
//! and their roles, the type-level and method-level route templates, the
//! declared return type and whether the method promises a response body.
//! Contracts are built once (usually by the `#[http_client]` macro) and then
//! shared read-only across every invocation.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use http::Method;
use serde::Serialize;

use crate::bind::{ResolvedName, resolve_name};
use crate::error::ContractError;

/// Identity of a client method, used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MethodId {
    type_name: String,
    method: String,
}

impl MethodId {
    pub fn new(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            method: method.into(),
        }
    }

    /// Name of the declaring type (the trait, for generated clients)
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Method name
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.type_name, self.method)
    }
}

/// Declared role of a method parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamRole {
    /// Bound into a `{name}` placeholder of the route template
    PathVariable,
    /// Appended to the query string
    QueryParam,
    /// Sent verbatim as the request body
    Body,
    /// Not part of the request
    None,
}

/// One parameter of a [`MethodContract`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDescriptor {
    index: usize,
    role: ParamRole,
    declared_name: String,
    discovered_name: Option<String>,
}

impl ParameterDescriptor {
    /// Create a descriptor with no declared or discovered name.
    pub fn new(index: usize, role: ParamRole) -> Self {
        Self {
            index,
            role,
            declared_name: String::new(),
            discovered_name: None,
        }
    }

    /// Path variable with an explicit name (may be empty).
    pub fn path_variable(index: usize, name: impl Into<String>) -> Self {
        Self::new(index, ParamRole::PathVariable).with_name(name)
    }

    /// Query parameter with an explicit name (may be empty).
    pub fn query_param(index: usize, name: impl Into<String>) -> Self {
        Self::new(index, ParamRole::QueryParam).with_name(name)
    }

    pub fn body(index: usize) -> Self {
        Self::new(index, ParamRole::Body)
    }

    /// Set the explicitly declared name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.declared_name = name.into();
        self
    }

    /// Set the name discovered from the method signature.
    pub fn with_discovered_name(mut self, name: impl Into<String>) -> Self {
        self.discovered_name = Some(name.into());
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn role(&self) -> ParamRole {
        self.role
    }

    /// Explicit name, empty when none was declared
    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    pub fn discovered_name(&self) -> Option<&str> {
        self.discovered_name.as_deref()
    }

    /// The binding name of this parameter: declared name first, discovered name second.
    pub fn resolved_name(&self) -> ResolvedName<'_> {
        resolve_name(&self.declared_name, self.discovered_name.as_deref())
    }
}

/// Candidate path fragments and HTTP verbs declared on a type or method.
///
/// Only the first fragment and the first verb take effect; see
/// [`first_or_default`](crate::route::first_or_default).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTemplate {
    paths: Vec<String>,
    methods: Vec<Method>,
}

impl RouteTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template with a single path fragment.
    pub fn at(path: impl Into<String>) -> Self {
        Self::new().path(path)
    }

    /// Add a candidate path fragment.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Add a candidate HTTP verb.
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }
}

/// Name of a payload type, used by transports to pick a deserializer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeRef {
    name: Cow<'static, str>,
}

impl TypeRef {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }

    /// Reference to the Rust type `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Declared return type of a client method.
///
/// The wrapper shapes form a closed set. Each wraps exactly one payload type;
/// nested wrappers are represented by a wrapper whose payload names another
/// wrapper and are not unwrapped further.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "shape", content = "payload", rename_all = "snake_case")]
pub enum ReturnType {
    /// The payload itself
    Plain(TypeRef),
    /// A deferred result: `impl Future<Output = T>` and friends
    Deferred(TypeRef),
    /// A zero-argument callable: `Box<dyn FnOnce() -> T>`, `fn() -> T`
    Callable(TypeRef),
}

impl ReturnType {
    /// The payload type the response body deserializes into.
    ///
    /// Unwraps one level of [`Deferred`](ReturnType::Deferred) or
    /// [`Callable`](ReturnType::Callable).
    pub fn resolve(&self) -> TypeRef {
        match self {
            ReturnType::Plain(ty) | ReturnType::Deferred(ty) | ReturnType::Callable(ty) => {
                ty.clone()
            }
        }
    }

    pub fn is_wrapped(&self) -> bool {
        !matches!(self, ReturnType::Plain(_))
    }
}

impl Default for ReturnType {
    fn default() -> Self {
        ReturnType::Plain(TypeRef::of::<()>())
    }
}

impl From<TypeRef> for ReturnType {
    fn from(ty: TypeRef) -> Self {
        ReturnType::Plain(ty)
    }
}

/// Immutable description of one client method.
#[derive(Debug, Clone)]
pub struct MethodContract {
    id: MethodId,
    parameters: Vec<ParameterDescriptor>,
    type_route: Option<RouteTemplate>,
    method_route: Option<RouteTemplate>,
    return_type: ReturnType,
    type_response_body: bool,
    method_response_body: bool,
}

impl MethodContract {
    /// Start building the contract of `type_name::method`.
    pub fn builder(type_name: impl Into<String>, method: impl Into<String>) -> MethodContractBuilder {
        MethodContractBuilder::new(MethodId::new(type_name, method))
    }

    pub fn id(&self) -> &MethodId {
        &self.id
    }

    /// Parameters in declaration order
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn parameter(&self, index: usize) -> Option<&ParameterDescriptor> {
        self.parameters.get(index)
    }

    pub fn type_route(&self) -> Option<&RouteTemplate> {
        self.type_route.as_ref()
    }

    pub fn method_route(&self) -> Option<&RouteTemplate> {
        self.method_route.as_ref()
    }

    pub fn return_type(&self) -> &ReturnType {
        &self.return_type
    }

    /// Whether the method or its declaring type carries the response-body marker.
    pub fn produces_body(&self) -> bool {
        self.type_response_body || self.method_response_body
    }
}

/// Builder for [`MethodContract`].
#[derive(Debug, Clone)]
pub struct MethodContractBuilder {
    id: MethodId,
    parameters: Vec<ParameterDescriptor>,
    type_route: Option<RouteTemplate>,
    method_route: Option<RouteTemplate>,
    return_type: ReturnType,
    type_response_body: bool,
    method_response_body: bool,
}

impl MethodContractBuilder {
    pub fn new(id: MethodId) -> Self {
        Self {
            id,
            parameters: Vec::new(),
            type_route: None,
            method_route: None,
            return_type: ReturnType::default(),
            type_response_body: false,
            method_response_body: false,
        }
    }

    /// Append a parameter. Positions must follow declaration order.
    pub fn param(mut self, param: ParameterDescriptor) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn type_route(mut self, route: RouteTemplate) -> Self {
        self.type_route = Some(route);
        self
    }

    pub fn method_route(mut self, route: RouteTemplate) -> Self {
        self.method_route = Some(route);
        self
    }

    pub fn returns(mut self, return_type: impl Into<ReturnType>) -> Self {
        self.return_type = return_type.into();
        self
    }

    /// Response-body marker declared on the type.
    pub fn type_response_body(mut self, marked: bool) -> Self {
        self.type_response_body = marked;
        self
    }

    /// Response-body marker declared on the method.
    pub fn response_body(mut self, marked: bool) -> Self {
        self.method_response_body = marked;
        self
    }

    /// Validate the declarations and freeze the contract.
    ///
    /// # Errors
    ///
    /// - [`ContractError::ParameterIndex`] if positions are not `0..n` in order
    /// - [`ContractError::MultipleBodies`] if more than one parameter has the body role
    /// - [`ContractError::DuplicatePathVariable`] if two path variables resolve to one name
    ///
    /// Parameters whose names cannot be resolved are accepted here; they fail
    /// when an invocation is mapped.
    pub fn build(self) -> Result<MethodContract, ContractError> {
        for (slot, param) in self.parameters.iter().enumerate() {
            if param.index != slot {
                return Err(ContractError::ParameterIndex {
                    method: self.id,
                    slot,
                    index: param.index,
                });
            }
        }

        let count = self
            .parameters
            .iter()
            .filter(|p| p.role == ParamRole::Body)
            .count();
        if count > 1 {
            return Err(ContractError::MultipleBodies {
                method: self.id,
                count,
            });
        }

        let mut seen = HashSet::new();
        for param in &self.parameters {
            if param.role != ParamRole::PathVariable {
                continue;
            }
            if let ResolvedName::Resolved(name) = param.resolved_name()
                && !seen.insert(name)
            {
                return Err(ContractError::DuplicatePathVariable {
                    method: self.id.clone(),
                    name: name.to_string(),
                });
            }
        }

        Ok(MethodContract {
            id: self.id,
            parameters: self.parameters,
            type_route: self.type_route,
            method_route: self.method_route,
            return_type: self.return_type,
            type_response_body: self.type_response_body,
            method_response_body: self.method_response_body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_id_display() {
        assert_eq!(MethodId::new("UserApi", "get_user").to_string(), "UserApi::get_user");
    }

    #[test]
    fn test_produces_body_from_either_level() {
        let none = MethodContract::builder("Api", "a").build().unwrap();
        assert!(!none.produces_body());

        let type_level = MethodContract::builder("Api", "b")
            .type_response_body(true)
            .build()
            .unwrap();
        assert!(type_level.produces_body());

        let method_level = MethodContract::builder("Api", "c")
            .response_body(true)
            .build()
            .unwrap();
        assert!(method_level.produces_body());
    }

    #[test]
    fn test_rejects_multiple_bodies() {
        let err = MethodContract::builder("Api", "upload")
            .param(ParameterDescriptor::body(0))
            .param(ParameterDescriptor::body(1))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::MultipleBodies {
                method: MethodId::new("Api", "upload"),
                count: 2
            }
        );
    }

    #[test]
    fn test_rejects_duplicate_path_variables() {
        // Explicit name on one, discovered name on the other
        let err = MethodContract::builder("Api", "get")
            .param(ParameterDescriptor::path_variable(0, "id"))
            .param(ParameterDescriptor::path_variable(1, "").with_discovered_name("id"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::DuplicatePathVariable { ref name, .. } if name == "id"));
    }

    #[test]
    fn test_same_name_across_roles_is_allowed() {
        let contract = MethodContract::builder("Api", "get")
            .param(ParameterDescriptor::path_variable(0, "id"))
            .param(ParameterDescriptor::query_param(1, "id"))
            .build();
        assert!(contract.is_ok());
    }

    #[test]
    fn test_rejects_out_of_order_positions() {
        let err = MethodContract::builder("Api", "get")
            .param(ParameterDescriptor::query_param(1, "q"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::ParameterIndex { slot: 0, index: 1, .. }));
    }

    #[test]
    fn test_unresolvable_names_are_deferred() {
        let contract = MethodContract::builder("Api", "get")
            .param(ParameterDescriptor::path_variable(0, ""))
            .param(ParameterDescriptor::path_variable(1, ""))
            .build();
        assert!(contract.is_ok());
    }

    #[test]
    fn test_return_type_unwraps_one_level() {
        let payload = TypeRef::new("User");
        assert_eq!(ReturnType::Deferred(payload.clone()).resolve(), payload);
        assert_eq!(ReturnType::Callable(payload.clone()).resolve(), payload);
        assert_eq!(ReturnType::Plain(payload.clone()).resolve(), payload);

        // A wrapper around a wrapper only loses the outer layer
        let inner = TypeRef::new("impl Future<Output = User>");
        assert_eq!(ReturnType::Deferred(inner.clone()).resolve(), inner);
    }

    #[test]
    fn test_is_wrapped() {
        assert!(!ReturnType::Plain(TypeRef::new("User")).is_wrapped());
        assert!(ReturnType::Deferred(TypeRef::new("User")).is_wrapped());
        assert!(ReturnType::Callable(TypeRef::new("User")).is_wrapped());
        assert!(!ReturnType::default().is_wrapped());
    }

    #[test]
    fn test_return_type_resolution_is_idempotent() {
        let once = ReturnType::Callable(TypeRef::of::<Vec<u8>>()).resolve();
        let twice = ReturnType::from(once.clone()).resolve();
        assert_eq!(once, twice);
    }
}
