//! Derive macro for component-injector
//!
//! `#[derive(Component)]` implements `Discoverable`, so the type can be
//! added to a `Catalog` with `discover::<T>()` or built on demand with
//! `Container::new_instance::<T>()`.
//!
//! # Example
//!
//! ```rust,ignore
//! use component_injector::{Catalog, Component};
//! use std::sync::Arc;
//!
//! trait Notifier: Send + Sync {}
//!
//! #[derive(Component)]
//! #[component(implements(dyn Notifier))]
//! struct EmailNotifier {
//!     #[inject]
//!     smtp: Arc<SmtpClient>,
//!     // Non-injected fields use Default
//!     sent: std::sync::atomic::AtomicU64,
//! }
//!
//! impl Notifier for EmailNotifier {}
//!
//! let catalog = Catalog::new().discover::<EmailNotifier>();
//! ```
//!
//! The generated descriptor is equivalent to:
//!
//! ```rust,ignore
//! impl Discoverable for EmailNotifier {
//!     fn descriptor() -> Component<Self> {
//!         Component::new()
//!             .implements::<dyn Notifier>(upcast!(dyn Notifier))
//!             .inject(|(__dep_0,): (Arc<SmtpClient>,)| Self {
//!                 smtp: __dep_0,
//!                 sent: Default::default(),
//!             })
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::parse::Parse;
use syn::punctuated::Punctuated;
use syn::{Attribute, Data, DeriveInput, Fields, Generics, Token, Type, parse_macro_input, parse_quote};

/// Derive `Discoverable`.
///
/// # Attributes
///
/// - `#[inject]` on a field: the field is a constructor parameter. Its type
///   must be `Arc<T>`; `T` may be a trait object. Parameters keep field
///   order.
/// - `#[component(implements(dyn A, dyn B))]` on the struct: declare the
///   traits the component can be injected as.
///
/// Fields without `#[inject]` are filled with `Default::default()`. A struct
/// without any `#[inject]` field gets a niladic constructor instead of an
/// injectable one.
///
/// Type parameters must be `Send + Sync + 'static`; lifetime parameters are
/// rejected.
#[proc_macro_derive(Component, attributes(inject, component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "Component cannot be derived for structs with lifetime parameters, components must be 'static",
        ));
    }

    let generics = add_injectable_bounds(input.generics.clone());
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Component can only be derived for structs",
        ));
    };

    let implements = parse_implements(&input.attrs)?;
    let upcasts = implements.iter().map(|ty| {
        quote! {
            .implements::<#ty>(::component_injector::upcast!(#ty))
        }
    });

    let constructor = match &data.fields {
        Fields::Named(fields) => {
            let mut dep_types = Vec::new();
            let mut dep_names = Vec::new();
            let mut field_inits = Vec::new();

            for field in &fields.named {
                let Some(field_name) = field.ident.as_ref() else {
                    continue;
                };
                let field_type = &field.ty;

                if has_inject_attr(&field.attrs) {
                    if !is_arc(field_type) {
                        return Err(syn::Error::new_spanned(
                            field_type,
                            "Fields marked with #[inject] must have type Arc<T>",
                        ));
                    }
                    let dep_name = format_ident!("__dep_{}", dep_names.len());
                    field_inits.push(quote! { #field_name: #dep_name });
                    dep_types.push(field_type);
                    dep_names.push(dep_name);
                } else {
                    field_inits.push(quote! {
                        #field_name: ::std::default::Default::default()
                    });
                }
            }

            if dep_types.is_empty() {
                quote! {
                    .niladic(|| Self { #(#field_inits),* })
                }
            } else {
                quote! {
                    .inject(|(#(#dep_names,)*): (#(#dep_types,)*)| Self { #(#field_inits),* })
                }
            }
        }
        Fields::Unit => quote! { .niladic(|| Self) },
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Component can only be derived for structs with named fields or unit structs",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::component_injector::Discoverable for #name #ty_generics #where_clause {
            fn descriptor() -> ::component_injector::Component<Self> {
                ::component_injector::Component::<Self>::new()
                    #(#upcasts)*
                    #constructor
            }
        }
    })
}

/// Require `Send + Sync + 'static` of every type parameter, so a component
/// that cannot be shared is reported at the parameter instead of deep inside
/// the generated impl.
fn add_injectable_bounds(mut generics: Generics) -> Generics {
    let params: Vec<_> = generics.type_params().map(|param| param.ident.clone()).collect();
    let where_clause = generics.make_where_clause();
    for ident in params {
        where_clause.predicates.push(parse_quote! {
            #ident: ::std::marker::Send + ::std::marker::Sync + 'static
        });
    }
    generics
}

fn has_inject_attr(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident("inject"))
}

/// Collect the types listed in `#[component(implements(...))]`.
fn parse_implements(attrs: &[Attribute]) -> syn::Result<Vec<Type>> {
    let mut types = Vec::new();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("component")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("implements") {
                let content;
                syn::parenthesized!(content in meta.input);
                let listed: Punctuated<Type, Token![,]> =
                    content.parse_terminated(Type::parse, Token![,])?;
                types.extend(listed);
                Ok(())
            } else {
                Err(meta.error("unsupported component attribute, expected `implements(...)`"))
            }
        })?;
    }

    Ok(types)
}

/// Whether `ty` is written as `Arc<T>` (any path ending in `Arc`).
fn is_arc(ty: &Type) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };
    type_path.path.segments.last().is_some_and(|segment| {
        segment.ident == "Arc"
            && matches!(
                &segment.arguments,
                syn::PathArguments::AngleBracketed(args) if args.args.len() == 1
            )
    })
}
