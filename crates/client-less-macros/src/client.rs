//! HTTP client generation macro.
//!
//! Turns a trait declaration into immutable [`MethodContract`]s and a client
//! type whose methods map their arguments to call descriptors.
//!
//! # Routes
//!
//! - `#[http_client(path = "/users")]` declares the type-level fragment
//! - `#[route(path = "/{id}", method = "GET")]` declares the method-level one;
//!   both keys may repeat, the first declaration wins at call time
//! - a method without `#[route]` is unmapped and fails when called
//!
//! # Response Body
//!
//! `response_body` may appear on `#[http_client]` (every method) or on a
//! single `#[route]`. Methods without it are rejected at call time.
//!
//! [`MethodContract`]: https://docs.rs/client-less-core

use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Ident, ItemTrait, Token, Type, parse::Parse};

use client_less_parse::{
    MethodInfo, ParamInfo, ParamLocation, ReturnShape, extract_methods, get_trait_name,
    strip_param_attrs, validate_params,
};

use crate::route::{RouteAttr, strip_route_attrs};

/// Arguments for the #[http_client] attribute
#[derive(Default)]
pub(crate) struct HttpClientArgs {
    /// Type-level path fragments
    pub paths: Vec<String>,
    /// Type-level response-body marker
    pub response_body: bool,
    /// Name of the generated client (default: `{Trait}Client`)
    pub client: Option<Ident>,
}

impl Parse for HttpClientArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut args = HttpClientArgs::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;

            match ident.to_string().as_str() {
                "path" => {
                    input.parse::<Token![=]>()?;
                    let lit: syn::LitStr = input.parse()?;
                    args.paths.push(lit.value());
                }
                "response_body" => {
                    args.response_body = if input.peek(Token![=]) {
                        input.parse::<Token![=]>()?;
                        input.parse::<syn::LitBool>()?.value()
                    } else {
                        true
                    };
                }
                "client" => {
                    input.parse::<Token![=]>()?;
                    args.client = Some(input.parse()?);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!(
                            "unknown argument `{other}`\n\
                             Valid arguments: path, response_body, client\n\
                             Examples:\n\
                             - #[http_client(path = \"/users\")]\n\
                             - #[http_client(path = \"/users\", response_body)]\n\
                             - #[http_client(client = UsersClient)]"
                        ),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

pub(crate) fn expand_http_client(
    args: HttpClientArgs,
    mut item_trait: ItemTrait,
) -> syn::Result<TokenStream2> {
    if !item_trait.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item_trait.generics,
            "#[http_client] does not support generic traits",
        ));
    }

    let trait_name = get_trait_name(&item_trait);
    let client_name = args
        .client
        .clone()
        .unwrap_or_else(|| format_ident!("{}Client", trait_name));
    let vis = item_trait.vis.clone();

    let methods = extract_methods(&item_trait)?;
    let mut routes = Vec::with_capacity(methods.len());
    for method in &methods {
        validate_params(method)?;
        routes.push(RouteAttr::parse_from_attrs(&method.method.attrs)?);
    }

    let contract_builders: Vec<TokenStream2> = methods
        .iter()
        .zip(&routes)
        .map(|(method, route)| generate_contract(&args, &trait_name, method, route))
        .collect();

    let client_methods: Vec<TokenStream2> = methods
        .iter()
        .enumerate()
        .map(|(slot, method)| generate_client_method(&client_name, slot, method))
        .collect();

    strip_route_attrs(&mut item_trait);
    strip_param_attrs(&mut item_trait);

    let client_doc = format!("HTTP client for [`{trait_name}`], generated by `#[http_client]`.");

    Ok(quote! {
        #item_trait

        #[doc = #client_doc]
        #[derive(Debug, Clone)]
        #vis struct #client_name<
            R = ::client_less::JsonParamResolver,
            U = ::client_less::TemplateUrlBuilder,
        > {
            mapper: ::client_less::InvocationMapper<R, U>,
        }

        impl #client_name {
            /// Client resolving every route against `base_url`.
            pub fn new(base_url: ::client_less::url::Url) -> Self {
                Self::with_mapper(::client_less::InvocationMapper::new(base_url))
            }

            pub fn from_config(config: &::client_less::ClientConfig) -> Self {
                Self::with_mapper(::client_less::InvocationMapper::from_config(config))
            }

            /// Contracts of every client method, in declaration order.
            ///
            /// Built once on first use.
            pub fn contracts() -> ::std::result::Result<
                &'static [::client_less::MethodContract],
                ::client_less::ContractError,
            > {
                fn build() -> ::std::result::Result<
                    ::std::vec::Vec<::client_less::MethodContract>,
                    ::client_less::ContractError,
                > {
                    ::std::result::Result::Ok(::std::vec![#(#contract_builders),*])
                }

                static CONTRACTS: ::std::sync::OnceLock<
                    ::std::result::Result<
                        ::std::vec::Vec<::client_less::MethodContract>,
                        ::client_less::ContractError,
                    >,
                > = ::std::sync::OnceLock::new();

                match CONTRACTS.get_or_init(build) {
                    ::std::result::Result::Ok(contracts) => ::std::result::Result::Ok(contracts.as_slice()),
                    ::std::result::Result::Err(err) => ::std::result::Result::Err(err.clone()),
                }
            }
        }

        impl<R, U> #client_name<R, U> {
            /// Client using a custom mapper, e.g. with another resolver or URL builder.
            pub fn with_mapper(mapper: ::client_less::InvocationMapper<R, U>) -> Self {
                Self { mapper }
            }

            pub fn mapper(&self) -> &::client_less::InvocationMapper<R, U> {
                &self.mapper
            }
        }

        impl<R, U> #client_name<R, U>
        where
            R: ::client_less::ParamResolver,
            U: ::client_less::UrlBuilder,
        {
            #(#client_methods)*
        }
    })
}

/// Generate the builder expression for one method's contract
fn generate_contract(
    args: &HttpClientArgs,
    trait_name: &Ident,
    method: &MethodInfo,
    route: &RouteAttr,
) -> TokenStream2 {
    let type_name = trait_name.to_string();
    let method_name = method.name.to_string();

    let params = method
        .params
        .iter()
        .enumerate()
        .map(|(index, param)| generate_param(index, param));

    let type_route = if args.paths.is_empty() {
        quote! {}
    } else {
        let paths = &args.paths;
        quote! {
            .type_route(::client_less::RouteTemplate::new() #(.path(#paths))*)
        }
    };

    let method_route = if route.declared {
        let paths = &route.paths;
        let verbs = &route.methods;
        quote! {
            .method_route(
                ::client_less::RouteTemplate::new()
                    #(.path(#paths))*
                    #(.method(::client_less::http::Method::#verbs))*
            )
        }
    } else {
        quote! {}
    };

    let payload = type_ref(&method.return_info.payload);
    let returns = match method.return_info.shape {
        ReturnShape::Plain => quote! { ::client_less::ReturnType::Plain(#payload) },
        ReturnShape::Deferred => quote! { ::client_less::ReturnType::Deferred(#payload) },
        ReturnShape::Callable => quote! { ::client_less::ReturnType::Callable(#payload) },
    };

    let type_response_body = args.response_body;
    let response_body = route.response_body;

    quote! {
        ::client_less::MethodContract::builder(#type_name, #method_name)
            #(.param(#params))*
            #type_route
            #method_route
            .returns(#returns)
            .type_response_body(#type_response_body)
            .response_body(#response_body)
            .build()?
    }
}

fn generate_param(index: usize, param: &ParamInfo) -> TokenStream2 {
    let role = match param.location {
        Some(ParamLocation::Path) => quote! { ::client_less::ParamRole::PathVariable },
        Some(ParamLocation::Query) => quote! { ::client_less::ParamRole::QueryParam },
        Some(ParamLocation::Body) => quote! { ::client_less::ParamRole::Body },
        None => quote! { ::client_less::ParamRole::None },
    };

    let declared = param
        .wire_name
        .as_ref()
        .map(|name| quote! { .with_name(#name) });
    let discovered = param.name.as_ref().map(|ident| {
        let name = ident.to_string();
        quote! { .with_discovered_name(#name) }
    });

    quote! {
        ::client_less::ParameterDescriptor::new(#index, #role) #declared #discovered
    }
}

/// `TypeRef` for a payload type; `impl Trait` payloads are named by their tokens
fn type_ref(ty: &Type) -> TokenStream2 {
    if contains_impl_trait(ty) {
        let name = quote!(#ty).to_string();
        quote! { ::client_less::TypeRef::new(#name) }
    } else {
        quote! { ::client_less::TypeRef::of::<#ty>() }
    }
}

fn contains_impl_trait(ty: &Type) -> bool {
    match ty {
        Type::ImplTrait(_) => true,
        Type::Reference(reference) => contains_impl_trait(&reference.elem),
        Type::Paren(paren) => contains_impl_trait(&paren.elem),
        Type::Tuple(tuple) => tuple.elems.iter().any(contains_impl_trait),
        Type::Path(path) => path.path.segments.iter().any(|segment| {
            matches!(&segment.arguments, syn::PathArguments::AngleBracketed(args)
                if args.args.iter().any(|arg| matches!(arg, syn::GenericArgument::Type(inner) if contains_impl_trait(inner))))
        }),
        _ => false,
    }
}

/// Generate the client method mapping one invocation
///
/// Parameters without a role are not part of the request and pass `null`.
fn generate_client_method(client_name: &Ident, slot: usize, method: &MethodInfo) -> TokenStream2 {
    let name = &method.name;
    let docs = method.docs.as_ref().map(|docs| quote! { #[doc = #docs] });

    let arg_names: Vec<Ident> = method
        .params
        .iter()
        .enumerate()
        .map(|(index, param)| {
            param
                .name
                .clone()
                .unwrap_or_else(|| format_ident!("__arg{}", index))
        })
        .collect();
    let arg_types: Vec<&Type> = method.params.iter().map(|param| &param.ty).collect();
    let arity = method.params.len();

    let arguments = method
        .params
        .iter()
        .zip(&arg_names)
        .enumerate()
        .map(|(index, (param, arg))| {
            if param.location.is_some() {
                quote! { ::client_less::to_argument(__contract, #index, &#arg)? }
            } else {
                quote! {{
                    let _ = &#arg;
                    ::client_less::serde_json::Value::Null
                }}
            }
        });

    quote! {
        #docs
        pub fn #name(
            &self,
            #(#arg_names: #arg_types),*
        ) -> ::std::result::Result<::client_less::CallDescriptor, ::client_less::MappingError> {
            let __contract = &<#client_name>::contracts()?[#slot];
            let __args: [::client_less::Argument; #arity] = [#(#arguments),*];
            self.mapper.map(__contract, &__args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_args() {
        let args: HttpClientArgs =
            syn::parse2(quote! { path = "/users", response_body, client = Users }).unwrap();
        assert_eq!(args.paths, vec!["/users"]);
        assert!(args.response_body);
        assert_eq!(args.client.unwrap().to_string(), "Users");

        let args: HttpClientArgs = syn::parse2(quote! { response_body = false }).unwrap();
        assert!(!args.response_body);

        assert!(syn::parse2::<HttpClientArgs>(quote! { prefix = "/x" }).is_err());
    }

    #[test]
    fn test_expand_strips_helpers() {
        let item: ItemTrait = parse_quote! {
            pub trait UserApi {
                #[route(path = "/{id}")]
                fn get_user(&self, #[param(path)] id: u64) -> String;
            }
        };
        let tokens = expand_http_client(HttpClientArgs::default(), item)
            .unwrap()
            .to_string();
        assert!(tokens.contains("UserApiClient"));
        assert!(!tokens.contains("# [route"));
        assert!(!tokens.contains("# [param"));
    }

    #[test]
    fn test_client_method_docs_and_roleless_params() {
        let item: syn::TraitItemFn = parse_quote! {
            /// Fetch one user
            fn get_user(&self, #[param(path)] id: u64, ctx: Context) -> String;
        };
        let method = MethodInfo::parse(&item).unwrap().unwrap();
        let tokens = generate_client_method(&format_ident!("UserApiClient"), 0, &method).to_string();

        assert!(tokens.contains("\"Fetch one user\""));
        assert!(tokens.contains("< UserApiClient > :: contracts ()"));
        // Only the path parameter is serialized
        assert_eq!(tokens.matches("to_argument").count(), 1);
        assert!(tokens.contains("Value :: Null"));
    }

    #[test]
    fn test_expand_rejects_duplicate_bodies() {
        let item: ItemTrait = parse_quote! {
            trait Api {
                #[route(method = "POST")]
                fn upload(&self, #[param(body)] a: String, #[param(body)] b: String) -> String;
            }
        };
        assert!(expand_http_client(HttpClientArgs::default(), item).is_err());
    }

    #[test]
    fn test_impl_trait_payload_detection() {
        assert!(contains_impl_trait(&parse_quote!(impl Future<Output = u8>)));
        assert!(contains_impl_trait(&parse_quote!(Vec<impl Send>)));
        assert!(!contains_impl_trait(&parse_quote!(Vec<u8>)));
    }
}
