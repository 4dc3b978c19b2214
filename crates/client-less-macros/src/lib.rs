//! Proc macros for client-less.
//!
//! This crate provides the attribute macro that turns a trait declaration
//! into method contracts and a client producing call descriptors.

use proc_macro::TokenStream;
use syn::{ItemTrait, parse_macro_input};

mod client;
mod route;

/// Generate an HTTP client from a trait.
///
/// # Basic Usage
///
/// ```ignore
/// use client_less::http_client;
///
/// #[http_client(path = "/users", response_body)]
/// pub trait UserApi {
///     // GET /users/{id}
///     #[route(path = "/{id}")]
///     fn get_user(&self, #[param(path)] id: u64) -> User;
/// }
///
/// let client = UserApiClient::new("http://localhost:8080".parse()?);
/// let call = client.get_user(42)?;
/// assert_eq!(call.uri().path(), "/users/42");
/// ```
///
/// # Routes
///
/// ```ignore
/// #[http_client(path = "/items")]
/// pub trait ItemApi {
///     // Verb defaults to GET
///     #[route(path = "/search", response_body)]
///     fn search(
///         &self,
///         #[param(query, name = "q")] text: String,
///         #[param(query)] page: Option<u32>,
///     ) -> Vec<Item>;
///
///     // First declared verb wins
///     #[route(method = "POST", method = "PUT", response_body)]
///     fn save(&self, #[param(body)] item: Item) -> impl Future<Output = Item>;
/// }
/// ```
///
/// # Arguments
///
/// - `path = "..."` - type-level route fragment (repeatable)
/// - `response_body` - every method returns its result in the response body
/// - `client = Name` - name of the generated client (default: `{Trait}Client`)
///
/// # Parameters
///
/// - `#[param(path)]`, `#[param(query)]`, `#[param(body)]` - parameter role
/// - `#[param(name = "...")]` - wire name (default: the parameter's name)
/// - no `#[param]` - not part of the request
///
/// # Generated Items
/// - the trait, with `#[route]` and `#[param]` removed
/// - `{Trait}Client<R, U>` with `new(base_url)`, `from_config(&config)`,
///   `with_mapper(mapper)`, `contracts()`, and one method per trait method
///   returning `Result<CallDescriptor, MappingError>`
#[proc_macro_attribute]
pub fn http_client(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as client::HttpClientArgs);
    let item_trait = parse_macro_input!(item as ItemTrait);

    match client::expand_http_client(args, item_trait) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Helper attribute for method-level route declarations.
///
/// Read and removed by `#[http_client]`. It is a no-op on its own.
///
/// # Example
///
/// ```ignore
/// #[http_client(path = "/users")]
/// pub trait UserApi {
///     #[route(path = "/{id}", method = "DELETE", response_body)]
///     fn remove(&self, #[param(path)] id: u64) -> ();
/// }
/// ```
#[proc_macro_attribute]
pub fn route(_attr: TokenStream, item: TokenStream) -> TokenStream {
    // Pass through unchanged - the #[http_client] macro parses these attributes
    item
}
