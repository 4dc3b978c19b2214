//! Parameter role binding.
//!
//! Turns the runtime arguments of one invocation into path-variable bindings,
//! query parameters and an optional request body, following each parameter's
//! declared [`ParamRole`].

use std::collections::HashMap;

use serde_json::Value;

use crate::contract::{MethodContract, ParamRole};
use crate::error::MappingError;
use crate::resolver::{Argument, ParamResolver};

/// Outcome of binding-name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedName<'a> {
    Resolved(&'a str),
    Unresolvable,
}

impl<'a> ResolvedName<'a> {
    pub fn into_option(self) -> Option<&'a str> {
        match self {
            ResolvedName::Resolved(name) => Some(name),
            ResolvedName::Unresolvable => None,
        }
    }
}

/// Binding name of a parameter: the declared name when non-empty, then the
/// discovered name when non-empty, otherwise unresolvable.
pub fn resolve_name<'a>(declared: &'a str, discovered: Option<&'a str>) -> ResolvedName<'a> {
    if !declared.is_empty() {
        return ResolvedName::Resolved(declared);
    }
    match discovered {
        Some(name) if !name.is_empty() => ResolvedName::Resolved(name),
        _ => ResolvedName::Unresolvable,
    }
}

/// Path-variable name to value. A `None` value still covers its placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVariables {
    values: HashMap<String, Option<String>>,
}

impl PathVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        self.values.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// `None` if unbound, `Some(None)` if bound without a value.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.values.get(name).map(|v| v.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Query parameters in insertion order. Repeated names are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == name)
    }

    /// All values bound to `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (name, value) in iter {
            params.append(name, value);
        }
        params
    }
}

/// Everything one invocation binds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    pub path_variables: PathVariables,
    pub query_params: QueryParams,
    pub body: Option<Value>,
}

/// Classify every parameter of `contract` by role and bind its runtime value.
///
/// Path variables whose value resolves to nothing are bound to `None`; query
/// parameters whose value resolves to nothing are left out. The body argument
/// is taken verbatim without going through `resolver`.
///
/// # Errors
///
/// [`MappingError::UnresolvableParameterName`] when a path or query parameter
/// has neither a declared nor a discovered name.
pub fn bind_parameters<R>(
    contract: &MethodContract,
    args: &[Argument],
    resolver: &R,
) -> Result<Bindings, MappingError>
where
    R: ParamResolver + ?Sized,
{
    let mut bindings = Bindings::default();

    for param in contract.parameters() {
        let index = param.index();
        match param.role() {
            ParamRole::PathVariable => {
                let name = binding_name(contract, index)?;
                let value = resolver.resolve(contract, args, index);
                tracing::trace!(index, param = name, value = ?value, "bound path variable");
                bindings.path_variables.insert(name, value);
            }
            ParamRole::QueryParam => {
                let name = binding_name(contract, index)?;
                match resolver.resolve(contract, args, index) {
                    Some(value) => {
                        tracing::trace!(index, param = name, value = %value, "bound query parameter");
                        bindings.query_params.append(name, value);
                    }
                    None => tracing::trace!(index, param = name, "query parameter omitted"),
                }
            }
            ParamRole::Body => {
                bindings.body = args.get(index).cloned();
            }
            ParamRole::None => {}
        }
    }

    Ok(bindings)
}

fn binding_name(contract: &MethodContract, index: usize) -> Result<&str, MappingError> {
    contract
        .parameter(index)
        .and_then(|param| param.resolved_name().into_option())
        .ok_or_else(|| MappingError::UnresolvableParameterName {
            method: contract.id().clone(),
            index,
        })
}
