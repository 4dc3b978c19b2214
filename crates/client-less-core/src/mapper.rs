//! Mapping of one invocation to a [`CallDescriptor`].

use url::Url;

use crate::bind::bind_parameters;
use crate::call::CallDescriptor;
use crate::config::ClientConfig;
use crate::contract::MethodContract;
use crate::error::MappingError;
use crate::resolver::{Argument, JsonParamResolver, ParamResolver};
use crate::route::{RoutePolicy, resolve_http_method, resolve_path_template};
use crate::template::unbound_variables;
use crate::uri::{TemplateUrlBuilder, UrlBuilder};

/// Maps method invocations to call descriptors.
///
/// The mapper holds no per-call state: [`map`](Self::map) is a pure function
/// of the contract and the arguments, so one mapper can serve any number of
/// threads at once.
///
/// # Example
///
/// ```
/// use client_less_core::{InvocationMapper, MethodContract, ParameterDescriptor, RouteTemplate};
/// use serde_json::json;
///
/// let contract = MethodContract::builder("UserApi", "get_user")
///     .type_route(RouteTemplate::at("/users"))
///     .method_route(RouteTemplate::at("/{id}"))
///     .param(ParameterDescriptor::path_variable(0, "id"))
///     .response_body(true)
///     .build()?;
///
/// let mapper = InvocationMapper::new("http://localhost:8080".parse()?);
/// let call = mapper.map(&contract, &[json!(42)])?;
/// assert_eq!(call.uri().path(), "/users/42");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct InvocationMapper<R = JsonParamResolver, U = TemplateUrlBuilder> {
    base_url: Url,
    resolver: R,
    url_builder: U,
    route_policy: RoutePolicy,
}

impl InvocationMapper {
    /// Mapper with the default resolver and URL builder.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            resolver: JsonParamResolver,
            url_builder: TemplateUrlBuilder,
            route_policy: RoutePolicy::default(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url.clone()).with_route_policy(config.route_policy)
    }
}

impl<R, U> InvocationMapper<R, U> {
    /// Replace the parameter value resolver.
    pub fn with_resolver<R2>(self, resolver: R2) -> InvocationMapper<R2, U> {
        InvocationMapper {
            base_url: self.base_url,
            resolver,
            url_builder: self.url_builder,
            route_policy: self.route_policy,
        }
    }

    /// Replace the URL builder.
    pub fn with_url_builder<U2>(self, url_builder: U2) -> InvocationMapper<R, U2> {
        InvocationMapper {
            base_url: self.base_url,
            resolver: self.resolver,
            url_builder,
            route_policy: self.route_policy,
        }
    }

    pub fn with_route_policy(mut self, policy: RoutePolicy) -> Self {
        self.route_policy = policy;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn route_policy(&self) -> RoutePolicy {
        self.route_policy
    }
}

impl<R: ParamResolver, U: UrlBuilder> InvocationMapper<R, U> {
    /// Resolve one invocation of `contract` with runtime `args`.
    ///
    /// The response-body marker is checked before anything else. Route
    /// resolution, parameter binding, path-variable validation and verb
    /// resolution all complete before the URL builder runs; any failure among
    /// them returns without calling it.
    ///
    /// # Errors
    ///
    /// See [`MappingError`]; every variant except `Argument` and `Contract`
    /// can be returned.
    #[tracing::instrument(level = "debug", skip_all, fields(method = %contract.id()))]
    pub fn map(
        &self,
        contract: &MethodContract,
        args: &[Argument],
    ) -> Result<CallDescriptor, MappingError> {
        if !contract.produces_body() {
            return Err(MappingError::NoResponseBody {
                method: contract.id().clone(),
            });
        }

        let template = resolve_path_template(contract, self.route_policy)?;
        let bindings = bind_parameters(contract, args, &self.resolver)?;

        let unbound = unbound_variables(&template, &bindings.path_variables);
        if !unbound.is_empty() {
            return Err(MappingError::UnboundPathVariables {
                method: contract.id().clone(),
                names: unbound,
            });
        }

        let method = resolve_http_method(contract, self.route_policy)?;
        let response_type = contract.return_type().resolve();

        let uri = self
            .url_builder
            .build(
                &self.base_url,
                &template,
                &bindings.query_params,
                &bindings.path_variables,
            )
            .map_err(|source| MappingError::UrlBuild {
                method: contract.id().clone(),
                source,
            })?;

        tracing::debug!(%method, %uri, response_type = %response_type, "mapped invocation");
        Ok(CallDescriptor::new(uri, method, bindings.body, response_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::{PathVariables, QueryParams};
    use crate::contract::{ParamRole, ParameterDescriptor, ReturnType, RouteTemplate, TypeRef};
    use crate::error::UrlBuildError;
    use http::{Method, Uri};
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn mapper() -> InvocationMapper {
        InvocationMapper::new(Url::parse("http://localhost:8080").unwrap())
    }

    #[derive(Default)]
    struct CountingResolver {
        calls: AtomicUsize,
    }

    impl ParamResolver for CountingResolver {
        fn resolve(&self, contract: &MethodContract, args: &[Argument], index: usize) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            JsonParamResolver.resolve(contract, args, index)
        }
    }

    #[derive(Default)]
    struct CountingUrlBuilder {
        calls: AtomicUsize,
    }

    impl UrlBuilder for CountingUrlBuilder {
        fn build(
            &self,
            base: &Url,
            template: &str,
            query: &QueryParams,
            path_variables: &PathVariables,
        ) -> Result<Uri, UrlBuildError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            TemplateUrlBuilder.build(base, template, query, path_variables)
        }
    }

    #[test]
    fn test_path_variable_end_to_end() {
        let contract = MethodContract::builder("UserApi", "get_user")
            .type_route(RouteTemplate::at("/users"))
            .method_route(RouteTemplate::at("/{id}").method(Method::GET))
            .param(ParameterDescriptor::path_variable(0, "id"))
            .returns(TypeRef::new("User"))
            .response_body(true)
            .build()
            .unwrap();

        let call = mapper().map(&contract, &[json!(42)]).unwrap();
        assert_eq!(call.uri().path(), "/users/42");
        assert_eq!(call.method(), Method::GET);
        assert_eq!(call.response_type(), &TypeRef::new("User"));
        assert!(call.body().is_none());
        assert!(call.headers().is_empty());
    }

    #[test]
    fn test_absent_query_param_is_dropped() {
        let contract = MethodContract::builder("SearchApi", "search")
            .method_route(RouteTemplate::at("/search"))
            .param(ParameterDescriptor::query_param(0, "q"))
            .param(ParameterDescriptor::query_param(1, "page"))
            .response_body(true)
            .build()
            .unwrap();

        let call = mapper().map(&contract, &[json!("cat"), Value::Null]).unwrap();
        assert_eq!(call.uri().path(), "/search");
        assert_eq!(call.uri().query(), Some("q=cat"));
    }

    #[test]
    fn test_unbound_path_variable_fails() {
        let contract = MethodContract::builder("ItemApi", "get_item")
            .method_route(RouteTemplate::at("/items/{sku}"))
            .response_body(true)
            .build()
            .unwrap();

        let err = mapper().map(&contract, &[]).unwrap_err();
        match err {
            MappingError::UnboundPathVariables { method, names } => {
                assert_eq!(method.to_string(), "ItemApi::get_item");
                assert_eq!(names, vec!["sku".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_body_is_passed_verbatim() {
        let contract = MethodContract::builder("ItemApi", "create")
            .method_route(RouteTemplate::at("/items").method(Method::POST))
            .param(ParameterDescriptor::body(0))
            .response_body(true)
            .build()
            .unwrap();

        let body = json!({"name": "x"});
        let call = mapper().map(&contract, std::slice::from_ref(&body)).unwrap();
        assert_eq!(call.body(), Some(&body));
        assert_eq!(call.method(), Method::POST);
    }

    #[test]
    fn test_no_response_body_fails_before_binding() {
        let resolver = CountingResolver::default();
        let urls = CountingUrlBuilder::default();
        let mapper = mapper().with_resolver(resolver).with_url_builder(urls);

        // Unmapped too: the body check must come first
        let contract = MethodContract::builder("Api", "render")
            .param(ParameterDescriptor::query_param(0, "q"))
            .build()
            .unwrap();

        let err = mapper.map(&contract, &[json!("x")]).unwrap_err();
        assert!(matches!(err, MappingError::NoResponseBody { .. }));
        assert_eq!(mapper.resolver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(mapper.url_builder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unmapped_method_fails() {
        let contract = MethodContract::builder("Api", "helper")
            .type_route(RouteTemplate::at("/api"))
            .type_response_body(true)
            .build()
            .unwrap();

        let err = mapper().map(&contract, &[]).unwrap_err();
        assert!(matches!(err, MappingError::UnmappedMethod { .. }));
    }

    #[test]
    fn test_failures_never_reach_url_builder() {
        let mapper = mapper().with_url_builder(CountingUrlBuilder::default());

        let unbound = MethodContract::builder("Api", "get")
            .method_route(RouteTemplate::at("/{a}/{b}"))
            .param(ParameterDescriptor::path_variable(0, "a"))
            .response_body(true)
            .build()
            .unwrap();
        let err = mapper.map(&unbound, &[json!(1)]).unwrap_err();
        assert!(matches!(err, MappingError::UnboundPathVariables { ref names, .. } if names == &["b"]));

        let unnamed = MethodContract::builder("Api", "get")
            .method_route(RouteTemplate::at("/x"))
            .param(ParameterDescriptor::new(0, ParamRole::QueryParam))
            .response_body(true)
            .build()
            .unwrap();
        let err = mapper.map(&unnamed, &[json!(1)]).unwrap_err();
        assert!(matches!(err, MappingError::UnresolvableParameterName { index: 0, .. }));

        assert_eq!(mapper.url_builder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_discovered_name_fallback() {
        let contract = MethodContract::builder("UserApi", "get_user")
            .method_route(RouteTemplate::at("/users/{user_id}"))
            .param(ParameterDescriptor::path_variable(0, "").with_discovered_name("user_id"))
            .response_body(true)
            .build()
            .unwrap();

        let call = mapper().map(&contract, &[json!("u-1")]).unwrap();
        assert_eq!(call.uri().path(), "/users/u-1");
    }

    #[test]
    fn test_deferred_return_type_is_unwrapped() {
        let contract = MethodContract::builder("UserApi", "list")
            .method_route(RouteTemplate::at("/users"))
            .returns(ReturnType::Deferred(TypeRef::new("Vec<User>")))
            .response_body(true)
            .build()
            .unwrap();

        let call = mapper().map(&contract, &[]).unwrap();
        assert_eq!(call.response_type().name(), "Vec<User>");
    }

    #[test]
    fn test_reject_ambiguous_policy() {
        let contract = MethodContract::builder("Api", "save")
            .method_route(RouteTemplate::at("/save").method(Method::PUT).method(Method::POST))
            .response_body(true)
            .build()
            .unwrap();

        let call = mapper().map(&contract, &[]).unwrap();
        assert_eq!(call.method(), Method::PUT);

        let strict = mapper().with_route_policy(RoutePolicy::RejectAmbiguous);
        assert!(matches!(
            strict.map(&contract, &[]),
            Err(MappingError::AmbiguousRoute { .. })
        ));
    }

    #[test]
    fn test_url_builder_errors_are_wrapped() {
        let mapper = InvocationMapper::new(Url::parse("mailto:ops@example.com").unwrap());
        let contract = MethodContract::builder("Api", "get")
            .method_route(RouteTemplate::at("/x"))
            .response_body(true)
            .build()
            .unwrap();

        let err = mapper.map(&contract, &[]).unwrap_err();
        assert!(matches!(
            err,
            MappingError::UrlBuild {
                source: UrlBuildError::CannotBeABase(_),
                ..
            }
        ));
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig::parse("http://api.local/v2/")
            .unwrap()
            .with_route_policy(RoutePolicy::RejectAmbiguous);
        let mapper = InvocationMapper::from_config(&config);
        assert_eq!(mapper.base_url().as_str(), "http://api.local/v2/");
        assert_eq!(mapper.route_policy(), RoutePolicy::RejectAmbiguous);

        let contract = MethodContract::builder("Api", "ping")
            .method_route(RouteTemplate::at("/ping"))
            .response_body(true)
            .build()
            .unwrap();
        assert_eq!(mapper.map(&contract, &[]).unwrap().uri().path(), "/v2/ping");
    }
}
