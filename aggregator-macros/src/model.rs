use crate::derive_utils::apply_derives;
use crate::field_utils::ensure_leading_fields;
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Field, Item, LitBool, LitStr, Result, Token, parse::Parse, parse::ParseStream,
    parse_macro_input,
};

/// #[model] 宏实现
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as ModelAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[model] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let Some(kind) = cfg.kind else {
        return syn::Error::new(
            st.ident.span(),
            "#[model] requires `kind = \"...\"`, e.g. #[model(kind = \"Task\")]",
        )
        .to_compile_error()
        .into();
    };

    // 仅支持具名字段结构体
    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "#[model] only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let id_field: Field = syn::parse_quote! {
        #[serde(default, skip_serializing_if = "::core::option::Option::is_none")]
        pub id: ::core::option::Option<::aggregator_collection::ModelId>
    };
    ensure_leading_fields(fields_named, vec![id_field]);

    let mut required: Vec<syn::Path> = vec![
        syn::parse_quote!(Clone),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    if cfg.derive_debug.unwrap_or(true) {
        required.insert(0, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, required);

    let out_struct = st;
    let ident = &out_struct.ident;
    let (impl_generics, ty_generics, where_clause) = out_struct.generics.split_for_impl();

    let expanded = quote! {
        #out_struct

        impl #impl_generics ::aggregator_collection::record::ModelKind for #ident #ty_generics #where_clause {
            const KIND: &'static str = #kind;
        }
    };

    TokenStream::from(expanded)
}

// -------- parsing --------

struct ModelAttrConfig {
    kind: Option<LitStr>,
    derive_debug: Option<bool>,
}

impl Parse for ModelAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut kind: Option<LitStr> = None;
        let mut derive_debug: Option<bool> = None;

        let elems: Punctuated<ModelAttrElem, Token![,]> =
            Punctuated::<ModelAttrElem, Token![,]>::parse_terminated(input)?;

        for elem in elems {
            match elem {
                ModelAttrElem::Kind(lit) => {
                    if kind.is_some() {
                        return Err(syn::Error::new(
                            lit.span(),
                            "duplicate key 'kind' in attribute",
                        ));
                    }
                    if lit.value().is_empty() {
                        return Err(syn::Error::new(lit.span(), "'kind' must not be empty"));
                    }
                    kind = Some(lit);
                }
                ModelAttrElem::Debug(lit) => {
                    if derive_debug.is_some() {
                        return Err(syn::Error::new(
                            lit.span(),
                            "duplicate key 'debug' in attribute",
                        ));
                    }
                    derive_debug = Some(lit.value);
                }
            }
        }

        Ok(Self { kind, derive_debug })
    }
}

enum ModelAttrElem {
    Kind(LitStr),
    Debug(LitBool),
}

impl Parse for ModelAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        match key.to_string().as_str() {
            "kind" => Ok(Self::Kind(input.parse()?)),
            "debug" => Ok(Self::Debug(input.parse()?)),
            other => Err(syn::Error::new(
                key.span(),
                format!("unknown key '{other}', expected 'kind' or 'debug'"),
            )),
        }
    }
}
