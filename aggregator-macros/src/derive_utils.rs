use quote::ToTokens;
use syn::{Attribute, Token};

// 拆出已有 derive 列表，其余属性原样保留
pub(crate) fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<syn::Path>) {
    let mut retained = Vec::new();
    let mut existing = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("derive") {
            retained.push(attr.clone());
            continue;
        }
        if let Ok(list) = attr.parse_args_with(
            syn::punctuated::Punctuated::<syn::Path, Token![,]>::parse_terminated,
        ) {
            existing.extend(list);
        }
    }
    (retained, existing)
}

// 去重合并，required 在前
fn merge_derives(existing: Vec<syn::Path>, required: Vec<syn::Path>) -> Attribute {
    let mut seen = std::collections::HashSet::<String>::new();
    let merged: Vec<syn::Path> = required
        .into_iter()
        .chain(existing)
        .filter(|p| seen.insert(derive_key(p)))
        .collect();
    syn::parse_quote!(#[derive(#(#merged),*)])
}

// Serialize 与 serde::Serialize 视为同一个派生
fn derive_key(p: &syn::Path) -> String {
    match p.segments.last() {
        Some(last) => {
            let ident = last.ident.to_string();
            match ident.as_str() {
                "Serialize" | "Deserialize" => format!("serde::{ident}"),
                _ => ident,
            }
        }
        None => p.to_token_stream().to_string(),
    }
}

pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<syn::Path>) {
    let (retained, existing) = split_derives(attrs);
    let merged = merge_derives(existing, required);
    *attrs = std::iter::once(merged).chain(retained).collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_without_duplicates_and_keeps_other_attributes() {
        let mut attrs: Vec<Attribute> = vec![
            syn::parse_quote!(#[derive(Serialize, PartialEq)]),
            syn::parse_quote!(#[serde(rename_all = "camelCase")]),
        ];
        apply_derives(
            &mut attrs,
            vec![
                syn::parse_quote!(Debug),
                syn::parse_quote!(serde::Serialize),
            ],
        );
        assert_eq!(attrs.len(), 2);
        let (rest, derives) = split_derives(&attrs);
        let keys: Vec<String> = derives.iter().map(derive_key).collect();
        assert_eq!(keys, vec!["Debug", "serde::Serialize", "PartialEq"]);
        assert_eq!(rest.len(), 1);
        assert!(rest[0].path().is_ident("serde"));
    }
}
