use syn::{Field, FieldsNamed, Token, punctuated::Punctuated};

/// 确保具名字段结构体包含所需字段
/// - 缺失的字段按给定顺序插入到最前；
/// - 已存在的同名字段保持用户定义，并移动到最前。
pub(crate) fn ensure_leading_fields(fields_named: &mut FieldsNamed, required: Vec<Field>) {
    let old_named = fields_named.named.clone();
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();

    let name_of = |f: &Field| f.ident.as_ref().map(|i| i.to_string());
    let required_names: Vec<Option<String>> = required.iter().map(name_of).collect();

    for field in required {
        let existing = old_named
            .iter()
            .find(|f| f.ident.is_some() && name_of(f) == name_of(&field));
        new_named.push(existing.cloned().unwrap_or(field));
    }
    for field in old_named {
        if !required_names.contains(&name_of(&field)) {
            new_named.push(field);
        }
    }

    fields_named.named = new_named;
}
