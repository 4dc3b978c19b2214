//! Error types for contract construction and call mapping.

use thiserror::Error;

use crate::contract::MethodId;

/// Errors raised while mapping an invocation to a [`CallDescriptor`](crate::CallDescriptor).
///
/// Every variant carries the identity of the method being mapped. These are
/// programming errors on the client side (a contract that cannot be satisfied),
/// never transient failures, so callers should not retry them.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The method (and its declaring type) lack the response-body marker.
    #[error("The method {method} does not return response body")]
    NoResponseBody { method: MethodId },

    /// The method has no method-level route template.
    #[error("The method {method} is not mapped")]
    UnmappedMethod { method: MethodId },

    /// A path or query parameter has neither a declared nor a discovered name.
    #[error("Name of parameter #{index} can't be resolved during the method {method} call")]
    UnresolvableParameterName { method: MethodId, index: usize },

    /// Template placeholders without a matching path-variable binding.
    #[error(
        "Every url template variable of {method} needs a path parameter. Unbound variables: {names:?}"
    )]
    UnboundPathVariables { method: MethodId, names: Vec<String> },

    /// More than one verb or path fragment declared while ambiguity is rejected.
    #[error("The route of {method} is ambiguous: {detail}")]
    AmbiguousRoute { method: MethodId, detail: String },

    /// The URL builder refused the resolved template.
    #[error("Failed to build the url of {method}: {source}")]
    UrlBuild {
        method: MethodId,
        #[source]
        source: UrlBuildError,
    },

    /// A runtime argument could not be turned into a JSON value.
    #[error("Argument #{index} of {method} could not be serialized: {source}")]
    Argument {
        method: MethodId,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The contract itself could not be built.
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl MappingError {
    /// The method the error originated from.
    pub fn method(&self) -> &MethodId {
        match self {
            MappingError::NoResponseBody { method }
            | MappingError::UnmappedMethod { method }
            | MappingError::UnresolvableParameterName { method, .. }
            | MappingError::UnboundPathVariables { method, .. }
            | MappingError::AmbiguousRoute { method, .. }
            | MappingError::UrlBuild { method, .. }
            | MappingError::Argument { method, .. } => method,
            MappingError::Contract(err) => err.method(),
        }
    }

    /// Whether the error stems from the declared contract rather than from the
    /// runtime argument values.
    pub fn is_programming_error(&self) -> bool {
        !matches!(self, MappingError::Argument { .. })
    }
}

/// Errors raised while building a [`MethodContract`](crate::MethodContract).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Two path-variable parameters resolve to the same name.
    #[error("Path variable '{name}' of {method} is declared more than once")]
    DuplicatePathVariable { method: MethodId, name: String },

    /// More than one parameter carries the body role.
    #[error("The method {method} declares {count} body parameters, at most one is allowed")]
    MultipleBodies { method: MethodId, count: usize },

    /// Parameter positions do not form the sequence `0..n`.
    #[error("Parameter at slot {slot} of {method} declares position {index}")]
    ParameterIndex {
        method: MethodId,
        slot: usize,
        index: usize,
    },
}

impl ContractError {
    pub fn method(&self) -> &MethodId {
        match self {
            ContractError::DuplicatePathVariable { method, .. }
            | ContractError::MultipleBodies { method, .. }
            | ContractError::ParameterIndex { method, .. } => method,
        }
    }
}

/// Errors raised by a [`UrlBuilder`](crate::UrlBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlBuildError {
    /// Unbalanced or stray braces in the path template.
    #[error("Malformed path template '{template}' at byte {position}")]
    MalformedTemplate { template: String, position: usize },

    /// A placeholder has no binding at expansion time.
    #[error("No value bound for path variable '{name}'")]
    MissingVariable { name: String },

    /// The base URL cannot carry a hierarchical path (e.g. `mailto:`).
    #[error("Base url '{0}' cannot be used as a base")]
    CannotBeABase(String),

    /// A path segment expanded to `.` or `..`, which URL normalization would remove.
    #[error("Path segment '{segment}' would be resolved away by url normalization")]
    DotSegment { segment: String },

    /// The expanded URL is not a valid `http::Uri`.
    #[error("Expanded url '{url}' is not a valid uri: {message}")]
    InvalidUri { url: String, message: String },
}

/// Errors raised while loading a [`ClientConfig`](crate::ClientConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid base url '{value}': {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid route policy '{0}', expected 'first_wins' or 'reject_ambiguous'")]
    InvalidRoutePolicy(String),

    #[cfg(feature = "config")]
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[cfg(feature = "config")]
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}
