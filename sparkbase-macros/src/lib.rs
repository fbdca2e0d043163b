//! Procedural macros for the sparkbase project.
//!
//! Provides `#[derive(Documented)]`, which implements
//! `sparkbase::document::Documented` for a serde type so it can be
//! registered with `AdapterRegistry::register_documented`. The generated
//! impl names the `sparkbase` crate, so it is meant to be used through
//! `sparkbase` rather than by depending on this crate directly.

#[allow(unused_extern_crates)]
extern crate self as sparkbase_macros;

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr, parse_macro_input};

/// Derives `Documented` for a type that already derives `Serialize` and `Deserialize`.
///
/// The display name defaults to the type's identifier and can be overridden:
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Documented)]
/// #[documented(name = "PlayerProfile")]
/// struct Profile { /* ... */ }
/// ```
#[proc_macro_derive(Documented, attributes(documented))]
pub fn derive_documented(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_documented(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_documented(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;
    let mut name = ident.to_string();

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("documented")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = meta.value()?.parse::<LitStr>()?.value();
                Ok(())
            } else {
                Err(meta.error("unsupported documented attribute, expected `name`"))
            }
        })?;
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::sparkbase::document::Documented for #ident #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #name
            }
        }
    })
}
