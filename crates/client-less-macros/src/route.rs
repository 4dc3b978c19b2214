//! `#[route(...)]` parsing.

use syn::{ItemTrait, TraitItem};

/// Verbs accepted by `#[route(method = "...")]`, with the matching `http::Method` constant.
const VERBS: &[&str] = &[
    "GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "TRACE", "CONNECT",
];

/// Route declarations attached to a method.
#[derive(Debug, Default)]
pub(crate) struct RouteAttr {
    /// Whether any `#[route]` attribute was present
    pub declared: bool,
    pub paths: Vec<String>,
    /// Upper-cased verbs, in declaration order
    pub methods: Vec<syn::Ident>,
    pub response_body: bool,
}

impl RouteAttr {
    pub fn parse_from_attrs(attrs: &[syn::Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("route") {
                continue;
            }
            result.declared = true;

            // `#[route]` with no arguments declares an empty mapping
            if matches!(attr.meta, syn::Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("path") {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    result.paths.push(value.value());
                    Ok(())
                } else if meta.path.is_ident("method") {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    let verb = value.value().to_uppercase();
                    if !VERBS.contains(&verb.as_str()) {
                        return Err(syn::Error::new_spanned(
                            &value,
                            format!(
                                "unknown HTTP method `{}`\n\
                                 \n\
                                 Valid methods: {}",
                                value.value(),
                                VERBS.join(", ")
                            ),
                        ));
                    }
                    result.methods.push(syn::Ident::new(&verb, value.span()));
                    Ok(())
                } else if meta.path.is_ident("response_body") {
                    result.response_body = parse_flag(&meta)?;
                    Ok(())
                } else {
                    Err(meta.error(
                        "unknown attribute\n\
                         \n\
                         Valid attributes: path, method, response_body\n\
                         \n\
                         Examples:\n\
                         - #[route(path = \"/{id}\")]\n\
                         - #[route(path = \"/search\", method = \"GET\")]\n\
                         - #[route(method = \"POST\", response_body)]",
                    ))
                }
            })?;
        }

        Ok(result)
    }
}

/// Support both `flag` and `flag = true`
pub(crate) fn parse_flag(meta: &syn::meta::ParseNestedMeta) -> syn::Result<bool> {
    if meta.input.peek(syn::Token![=]) {
        let value: syn::LitBool = meta.value()?.parse()?;
        Ok(value.value())
    } else {
        Ok(true)
    }
}

/// Remove `#[route(...)]` from every method of a trait
pub(crate) fn strip_route_attrs(item_trait: &mut ItemTrait) {
    for item in &mut item_trait.items {
        if let TraitItem::Fn(method) = item {
            method.attrs.retain(|attr| !attr.path().is_ident("route"));
        }
    }
}
