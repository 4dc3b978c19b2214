//! Parameter value resolution.

use serde_json::Value;

use crate::contract::MethodContract;

/// A runtime argument of an invocation.
pub type Argument = Value;

/// Turns one runtime argument into the string bound into a path or query.
///
/// Implementations must be total: an index outside `args` or a value that has
/// no string form yields `None`, never a panic. Returning `None` omits a
/// query parameter and binds a path variable to the empty value.
///
/// Any `Fn(&MethodContract, &[Argument], usize) -> Option<String>` closure is a
/// resolver.
pub trait ParamResolver: Send + Sync {
    fn resolve(&self, contract: &MethodContract, args: &[Argument], index: usize) -> Option<String>;
}

impl<F> ParamResolver for F
where
    F: Fn(&MethodContract, &[Argument], usize) -> Option<String> + Send + Sync,
{
    fn resolve(&self, contract: &MethodContract, args: &[Argument], index: usize) -> Option<String> {
        self(contract, args, index)
    }
}

/// Default resolver for JSON arguments.
///
/// | Argument | Result |
/// |----------|--------|
/// | `null` / missing | `None` |
/// | string | the string |
/// | number, bool | its JSON text |
/// | array of scalars | elements joined with `,` (nulls skipped) |
/// | anything else | compact JSON text |
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParamResolver;

impl ParamResolver for JsonParamResolver {
    fn resolve(&self, _contract: &MethodContract, args: &[Argument], index: usize) -> Option<String> {
        args.get(index).and_then(value_to_string)
    }
}

/// String form of a JSON value, as used by [`JsonParamResolver`].
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(items) if items.iter().all(is_scalar) => Some(
            items
                .iter()
                .filter_map(value_to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}
