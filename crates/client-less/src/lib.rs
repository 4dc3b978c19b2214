//! Declarative HTTP clients.
//!
//! Describe an API as a trait, annotate it, and get a client whose methods
//! return [`CallDescriptor`]s: the fully resolved URI, verb, body and
//! expected response type of each call. Executing the call is left to
//! whatever transport you already use.
//!
//! ```ignore
//! use client_less::http_client;
//!
//! #[http_client(path = "/users", response_body)]
//! pub trait UserApi {
//!     #[route(path = "/{id}")]
//!     fn get_user(&self, #[param(path)] id: u64) -> User;
//!
//!     #[route(path = "/search")]
//!     fn search(&self, #[param(query, name = "q")] text: String) -> Vec<User>;
//! }
//!
//! let client = UserApiClient::new("http://localhost:8080".parse()?);
//! let call = client.get_user(42)?;
//! assert_eq!(call.uri(), "http://localhost:8080/users/42");
//! ```

pub use client_less_core::*;
pub use client_less_macros::{http_client, route};

// Paths used by generated code
pub use http;
pub use serde_json;
pub use url;
