//! Core engine for client-less.
//!
//! This crate turns a [`MethodContract`] plus the runtime arguments of one
//! invocation into a [`CallDescriptor`]: the URI, verb, body and expected
//! response type of the HTTP call a transport should perform. It does no I/O.
//!
//! The `#[http_client]` macro in the `client-less` crate builds contracts and
//! calls [`InvocationMapper::map`] for you; use this crate directly when
//! contracts come from somewhere else.

pub mod bind;
pub mod call;
pub mod config;
pub mod contract;
pub mod error;
pub mod mapper;
pub mod resolver;
pub mod route;
pub mod template;
pub mod uri;

pub use bind::{Bindings, PathVariables, QueryParams, ResolvedName, resolve_name};
pub use call::CallDescriptor;
pub use config::ClientConfig;
pub use contract::{
    MethodContract, MethodContractBuilder, MethodId, ParamRole, ParameterDescriptor, ReturnType,
    RouteTemplate, TypeRef,
};
pub use error::{ConfigError, ContractError, MappingError, UrlBuildError};
pub use mapper::InvocationMapper;
pub use resolver::{Argument, JsonParamResolver, ParamResolver};
pub use route::RoutePolicy;
pub use uri::{TemplateUrlBuilder, UrlBuilder};

/// Serialize one runtime argument.
///
/// Used by generated clients; failures are reported against `contract`'s
/// method and the argument position.
pub fn to_argument<T: serde::Serialize + ?Sized>(
    contract: &MethodContract,
    index: usize,
    value: &T,
) -> Result<Argument, MappingError> {
    serde_json::to_value(value).map_err(|source| MappingError::Argument {
        method: contract.id().clone(),
        index,
        source,
    })
}
