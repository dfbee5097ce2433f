//! Procedural macros for vetted-dispatch

use darling::{FromDeriveInput, FromField, FromVariant};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Action)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(enum_any))]
struct ActionOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<ActionVariant, ()>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action))]
struct ActionVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<VariantField>,

    /// Delegate `kind()` to the single wrapped action
    #[darling(default)]
    unit: bool,

    /// Do not generate `From<Inner>` for a `unit` variant
    #[darling(default)]
    skip_from: bool,

    /// Explicit kind instead of the variant name
    #[darling(default)]
    kind: Option<String>,
}

#[derive(Debug, FromField)]
struct VariantField {
    ty: syn::Type,
}

/// Derive macro for the Action trait
///
/// Generates a `kind()` method that returns the variant name as a static
/// string, or the string given with `#[action(kind = "...")]`.
///
/// Variants marked `#[action(unit)]` must wrap exactly one value that is
/// itself an `Action` (typically a `Unit<P>`). Their `kind()` is the wrapped
/// value's kind, and a `From<Inner>` impl is generated so creators can build
/// the enum directly. Add `skip_from` when two variants wrap the same type.
///
/// # Example
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// enum PeopleAction {
///     #[action(unit)]
///     Add(Unit<Person>),
///     #[action(unit)]
///     AddInvalid(Unit<bool>),
///     #[action(kind = "people/clear")]
///     Clear,
///     Tick,
/// }
///
/// assert_eq!(PeopleAction::Tick.kind(), "Tick");
/// assert_eq!(PeopleAction::Clear.kind(), "people/clear");
/// let add: PeopleAction = add_person.create(person).into();
/// assert_eq!(add.kind(), "people/add");
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ActionOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "Action can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let mut kind_arms: Vec<TokenStream2> = Vec::with_capacity(variants.len());
    let mut from_impls: Vec<TokenStream2> = Vec::new();
    let mut errors = darling::Error::accumulator();

    for v in variants {
        let variant_name = &v.ident;

        if v.unit {
            let inner = match (&v.fields.style, v.fields.fields.as_slice()) {
                (darling::ast::Style::Tuple, [field]) => &field.ty,
                _ => {
                    errors.push(
                        darling::Error::custom(
                            "#[action(unit)] requires a tuple variant with exactly one field",
                        )
                        .with_span(variant_name),
                    );
                    continue;
                }
            };
            if v.kind.is_some() {
                errors.push(
                    darling::Error::custom(
                        "#[action(unit)] variants take their kind from the wrapped action",
                    )
                    .with_span(variant_name),
                );
                continue;
            }

            kind_arms.push(quote! {
                #name::#variant_name(inner) => ::vetted_dispatch::Action::kind(inner)
            });
            if !v.skip_from {
                from_impls.push(quote! {
                    impl #impl_generics ::core::convert::From<#inner> for #name #ty_generics #where_clause {
                        fn from(inner: #inner) -> Self {
                            #name::#variant_name(inner)
                        }
                    }
                });
            }
            continue;
        }

        let variant_str = v.kind.clone().unwrap_or_else(|| variant_name.to_string());
        kind_arms.push(match &v.fields.style {
            darling::ast::Style::Unit => quote! {
                #name::#variant_name => #variant_str
            },
            darling::ast::Style::Tuple => quote! {
                #name::#variant_name(..) => #variant_str
            },
            darling::ast::Style::Struct => quote! {
                #name::#variant_name { .. } => #variant_str
            },
        });
    }

    if let Err(e) = errors.finish() {
        return e.write_errors().into();
    }

    let expanded = quote! {
        impl #impl_generics ::vetted_dispatch::Action for #name #ty_generics #where_clause {
            fn kind(&self) -> &'static str {
                match self {
                    #(#kind_arms),*
                }
            }
        }

        #(#from_impls)*
    };

    TokenStream::from(expanded)
}
