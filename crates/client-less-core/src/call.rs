//! The transport-ready call descriptor.

use http::{HeaderMap, Method, Uri};
use serde::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};
use serde_json::Value;

use crate::contract::TypeRef;

/// Fully resolved description of one HTTP call.
///
/// Produced fresh for every invocation and handed to a transport, which owns
/// executing it and deserializing the response into
/// [`response_type`](Self::response_type). Headers start empty; transports
/// add their own.
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    uri: Uri,
    method: Method,
    body: Option<Value>,
    headers: HeaderMap,
    response_type: TypeRef,
}

impl CallDescriptor {
    pub fn new(uri: Uri, method: Method, body: Option<Value>, response_type: TypeRef) -> Self {
        Self {
            uri,
            method,
            body,
            headers: HeaderMap::new(),
            response_type,
        }
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The body argument, exactly as it was passed
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Payload type the response body deserializes into
    pub fn response_type(&self) -> &TypeRef {
        &self.response_type
    }

    /// Split into `(uri, method, body, headers, response_type)`.
    pub fn into_parts(self) -> (Uri, Method, Option<Value>, HeaderMap, TypeRef) {
        (
            self.uri,
            self.method,
            self.body,
            self.headers,
            self.response_type,
        )
    }
}

impl Serialize for CallDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CallDescriptor", 5)?;
        state.serialize_field("uri", &self.uri.to_string())?;
        state.serialize_field("method", self.method.as_str())?;
        state.serialize_field("body", &self.body)?;
        state.serialize_field("headers", &Headers(&self.headers))?;
        state.serialize_field("response_type", &self.response_type)?;
        state.end()
    }
}

struct Headers<'a>(&'a HeaderMap);

impl Serialize for Headers<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0 {
            map.serialize_entry(name.as_str(), &String::from_utf8_lossy(value.as_bytes()))?;
        }
        map.end()
    }
}
