//! Shared parsing utilities for client-less proc macros.
//!
//! This crate provides common types and functions for extracting
//! method information from trait declarations.

use syn::{
    FnArg, GenericArgument, Ident, ItemTrait, Lit, Meta, Pat, PathArguments, ReturnType,
    TraitItem, TraitItemFn, Type, TypeParamBound,
};

/// Parsed information about a trait method
#[derive(Debug, Clone)]
pub struct MethodInfo {
    /// The method as declared
    pub method: TraitItemFn,
    /// Method name
    pub name: Ident,
    /// Documentation string
    pub docs: Option<String>,
    /// Parameters (excluding self)
    pub params: Vec<ParamInfo>,
    /// Return type info
    pub return_info: ReturnInfo,
}

/// Parsed parameter information
#[derive(Debug, Clone)]
pub struct ParamInfo {
    /// Parameter name, `None` for `_` patterns
    pub name: Option<Ident>,
    /// Parameter type
    pub ty: Type,
    /// Custom wire name (from #[param(name = "...")])
    pub wire_name: Option<String>,
    /// Parameter location (from #[param(query/path/body)])
    pub location: Option<ParamLocation>,
}

impl ParamInfo {
    /// Name the parameter binds under: wire name if non-empty, else the identifier.
    pub fn binding_name(&self) -> Option<String> {
        match &self.wire_name {
            Some(name) if !name.is_empty() => Some(name.clone()),
            _ => self.name.as_ref().map(|ident| ident.to_string()),
        }
    }
}

/// Parameter location for HTTP requests
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamLocation {
    Query,
    Path,
    Body,
}

/// How the declared return type wraps its payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnShape {
    /// The payload itself
    Plain,
    /// `impl Future<Output = T>`, `Pin<Box<dyn Future<Output = T>>>`, `BoxFuture<T>`
    Deferred,
    /// `Box<dyn FnOnce() -> T>`, `impl Fn() -> T`, `fn() -> T`
    Callable,
}

/// Parsed return type information
#[derive(Debug, Clone)]
pub struct ReturnInfo {
    /// The full return type, `None` for `-> ()` by omission
    pub ty: Option<Type>,
    /// The payload type after unwrapping one wrapper level
    pub payload: Type,
    /// Which wrapper (if any) was unwrapped
    pub shape: ReturnShape,
}

impl MethodInfo {
    /// Parse a method from a TraitItemFn
    ///
    /// Returns None for associated functions without a receiver.
    pub fn parse(method: &TraitItemFn) -> syn::Result<Option<Self>> {
        let name = method.sig.ident.clone();

        let receiver = method.sig.inputs.iter().find_map(|arg| match arg {
            FnArg::Receiver(receiver) => Some(receiver),
            FnArg::Typed(_) => None,
        });
        let Some(receiver) = receiver else {
            return Ok(None);
        };
        if receiver.reference.is_none() || receiver.mutability.is_some() {
            return Err(syn::Error::new_spanned(
                receiver,
                "client methods must take `&self`\n\
                 \n\
                 Generated clients only read shared contracts, so `self`,\n\
                 `&mut self` and typed receivers are not supported.",
            ));
        }

        let docs = extract_docs(&method.attrs);
        let params = parse_params(&method.sig.inputs)?;
        let return_info = parse_return_type(&method.sig.output);

        Ok(Some(Self {
            method: method.clone(),
            name,
            docs,
            params,
            return_info,
        }))
    }
}

/// Extract doc comments from attributes
pub fn extract_docs(attrs: &[syn::Attribute]) -> Option<String> {
    let docs: Vec<String> = attrs
        .iter()
        .filter_map(|attr| {
            if attr.path().is_ident("doc")
                && let Meta::NameValue(meta) = &attr.meta
                && let syn::Expr::Lit(syn::ExprLit {
                    lit: Lit::Str(s), ..
                }) = &meta.value
            {
                return Some(s.value().trim().to_string());
            }
            None
        })
        .collect();

    if docs.is_empty() {
        None
    } else {
        Some(docs.join("\n"))
    }
}

/// Parse #[param(...)] attributes from a parameter
pub fn parse_param_attrs(
    attrs: &[syn::Attribute],
) -> syn::Result<(Option<String>, Option<ParamLocation>)> {
    let mut wire_name = None;
    let mut location = None;

    for attr in attrs {
        if !attr.path().is_ident("param") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let next = if meta.path.is_ident("name") {
                // #[param(name = "...")]
                let value: syn::LitStr = meta.value()?.parse()?;
                wire_name = Some(value.value());
                return Ok(());
            } else if meta.path.is_ident("query") {
                ParamLocation::Query
            } else if meta.path.is_ident("path") {
                ParamLocation::Path
            } else if meta.path.is_ident("body") {
                ParamLocation::Body
            } else {
                return Err(meta.error(
                    "unknown attribute\n\
                     \n\
                     Valid attributes: name, path, query, body\n\
                     \n\
                     Examples:\n\
                     - #[param(path)]\n\
                     - #[param(query, name = \"q\")]\n\
                     - #[param(body)]",
                ));
            };

            if let Some(previous) = location
                && previous != next
            {
                return Err(meta.error("a parameter can only have one of path, query or body"));
            }
            location = Some(next);
            Ok(())
        })?;
    }

    Ok((wire_name, location))
}

/// Parse function parameters (excluding self)
pub fn parse_params(
    inputs: &syn::punctuated::Punctuated<FnArg, syn::Token![,]>,
) -> syn::Result<Vec<ParamInfo>> {
    let mut params = Vec::new();

    for arg in inputs {
        match arg {
            FnArg::Receiver(_) => continue, // skip self
            FnArg::Typed(pat_type) => {
                let name = match pat_type.pat.as_ref() {
                    Pat::Ident(pat_ident) => Some(pat_ident.ident.clone()),
                    Pat::Wild(_) => None,
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "unsupported parameter pattern\n\
                             \n\
                             client-less macros require simple parameter names.\n\
                             Use: name: String\n\
                             Not: (name, _): (String, i32) or &name: &String",
                        ));
                    }
                };

                let ty = (*pat_type.ty).clone();
                let (wire_name, location) = parse_param_attrs(&pat_type.attrs)?;

                params.push(ParamInfo {
                    name,
                    ty,
                    wire_name,
                    location,
                });
            }
        }
    }

    Ok(params)
}

/// Parse return type information
pub fn parse_return_type(output: &ReturnType) -> ReturnInfo {
    match output {
        ReturnType::Default => ReturnInfo {
            ty: None,
            payload: syn::parse_quote!(()),
            shape: ReturnShape::Plain,
        },
        ReturnType::Type(_, ty) => {
            let ty = ty.as_ref().clone();

            if let Some(output) = extract_future_output(&ty) {
                return ReturnInfo {
                    ty: Some(ty),
                    payload: output,
                    shape: ReturnShape::Deferred,
                };
            }

            if let Some(output) = extract_callable_output(&ty) {
                return ReturnInfo {
                    ty: Some(ty),
                    payload: output,
                    shape: ReturnShape::Callable,
                };
            }

            ReturnInfo {
                payload: ty.clone(),
                ty: Some(ty),
                shape: ReturnShape::Plain,
            }
        }
    }
}

/// Check for a deferred result and extract its output type
///
/// Matches `impl Future<Output = T>`, `Pin<Box<dyn Future<Output = T>>>` and
/// `BoxFuture<'_, T>` / `LocalBoxFuture<'_, T>`.
pub fn extract_future_output(ty: &Type) -> Option<Type> {
    match ty {
        Type::ImplTrait(impl_trait) => future_output_of(&impl_trait.bounds),
        Type::Path(type_path) => {
            let segment = type_path.path.segments.last()?;
            if segment.ident == "BoxFuture" || segment.ident == "LocalBoxFuture" {
                return first_type_arg(&segment.arguments);
            }
            if segment.ident == "Pin"
                && let Some(Type::Path(inner)) = first_type_arg(&segment.arguments)
                && let Some(boxed) = inner.path.segments.last()
                && boxed.ident == "Box"
                && let Some(Type::TraitObject(object)) = first_type_arg(&boxed.arguments)
            {
                return future_output_of(&object.bounds);
            }
            None
        }
        _ => None,
    }
}

/// Check for a zero-argument callable and extract its return type
///
/// Matches `fn() -> T`, `impl Fn() -> T` and `Box<dyn FnOnce() -> T>`
/// (any of `Fn`, `FnMut`, `FnOnce`).
pub fn extract_callable_output(ty: &Type) -> Option<Type> {
    match ty {
        Type::BareFn(bare) if bare.inputs.is_empty() => Some(return_type_or_unit(&bare.output)),
        Type::ImplTrait(impl_trait) => callable_output_of(&impl_trait.bounds),
        Type::Path(type_path) => {
            let segment = type_path.path.segments.last()?;
            if segment.ident == "Box"
                && let Some(Type::TraitObject(object)) = first_type_arg(&segment.arguments)
            {
                return callable_output_of(&object.bounds);
            }
            None
        }
        _ => None,
    }
}

fn future_output_of(
    bounds: &syn::punctuated::Punctuated<TypeParamBound, syn::Token![+]>,
) -> Option<Type> {
    for bound in bounds {
        if let TypeParamBound::Trait(trait_bound) = bound
            && let Some(segment) = trait_bound.path.segments.last()
            && segment.ident == "Future"
            && let PathArguments::AngleBracketed(args) = &segment.arguments
        {
            for arg in &args.args {
                if let GenericArgument::AssocType(assoc) = arg
                    && assoc.ident == "Output"
                {
                    return Some(assoc.ty.clone());
                }
            }
        }
    }
    None
}

fn callable_output_of(
    bounds: &syn::punctuated::Punctuated<TypeParamBound, syn::Token![+]>,
) -> Option<Type> {
    for bound in bounds {
        if let TypeParamBound::Trait(trait_bound) = bound
            && let Some(segment) = trait_bound.path.segments.last()
            && (segment.ident == "Fn" || segment.ident == "FnMut" || segment.ident == "FnOnce")
            && let PathArguments::Parenthesized(args) = &segment.arguments
            && args.inputs.is_empty()
        {
            return Some(return_type_or_unit(&args.output));
        }
    }
    None
}

fn first_type_arg(arguments: &PathArguments) -> Option<Type> {
    if let PathArguments::AngleBracketed(args) = arguments {
        return args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty.clone()),
            _ => None,
        });
    }
    None
}

fn return_type_or_unit(output: &ReturnType) -> Type {
    match output {
        ReturnType::Default => syn::parse_quote!(()),
        ReturnType::Type(_, ty) => ty.as_ref().clone(),
    }
}

/// Extract all client methods from a trait
///
/// Skips associated functions without a receiver.
pub fn extract_methods(item_trait: &ItemTrait) -> syn::Result<Vec<MethodInfo>> {
    let mut methods = Vec::new();

    for item in &item_trait.items {
        if let TraitItem::Fn(method) = item
            && let Some(info) = MethodInfo::parse(method)?
        {
            methods.push(info);
        }
    }

    Ok(methods)
}

/// Remove `#[param(...)]` from every method parameter of a trait
///
/// Helper attributes are not allowed on function parameters once the
/// attribute macro hands the trait back to the compiler.
pub fn strip_param_attrs(item_trait: &mut ItemTrait) {
    for item in &mut item_trait.items {
        if let TraitItem::Fn(method) = item {
            for arg in &mut method.sig.inputs {
                if let FnArg::Typed(pat_type) = arg {
                    pat_type.attrs.retain(|attr| !attr.path().is_ident("param"));
                }
            }
        }
    }
}

/// Check that a method declares at most one body and unique path names
pub fn validate_params(method: &MethodInfo) -> syn::Result<()> {
    let bodies: Vec<&ParamInfo> = method
        .params
        .iter()
        .filter(|p| p.location == Some(ParamLocation::Body))
        .collect();
    if let Some(second) = bodies.get(1) {
        return Err(syn::Error::new_spanned(
            &second.ty,
            format!(
                "method `{}` declares {} body parameters\n\
                 \n\
                 Hint: a request has a single body. Wrap the values in one struct\n\
                 or move the extra ones to #[param(query)].",
                method.name,
                bodies.len()
            ),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for param in &method.params {
        if param.location != Some(ParamLocation::Path) {
            continue;
        }
        if let Some(name) = param.binding_name()
            && !seen.insert(name.clone())
        {
            return Err(syn::Error::new_spanned(
                &param.ty,
                format!(
                    "path variable `{name}` is declared more than once in method `{}`",
                    method.name
                ),
            ));
        }
    }

    Ok(())
}

/// Get the trait name
pub fn get_trait_name(item_trait: &ItemTrait) -> Ident {
    item_trait.ident.clone()
}
