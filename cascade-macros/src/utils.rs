use syn::{Attribute, Field, FieldsNamed, Ident, Token, Type, parse::Parse, parse::ParseStream};

// 判断具名字段中是否存在指定字段名
pub(crate) fn has_field_named(fields: &FieldsNamed, name: &str) -> bool {
    fields
        .named
        .iter()
        .any(|f| f.ident.as_ref().map(|i| i == name).unwrap_or(false))
}

pub(crate) fn find_field(fields: &FieldsNamed, name: &str) -> Option<Field> {
    fields
        .named
        .iter()
        .find(|f| f.ident.as_ref().map(|i| i == name).unwrap_or(false))
        .cloned()
}

// 结构体是否派生了 serde（决定注入字段能否携带 #[serde(skip)]）
pub(crate) fn derives_serde(attrs: &[Attribute]) -> bool {
    attrs.iter().filter(|a| a.path().is_ident("derive")).any(|attr| {
        attr.parse_args_with(
            syn::punctuated::Punctuated::<syn::Path, Token![,]>::parse_terminated,
        )
        .map(|list| {
            list.iter().any(|p| {
                p.segments
                    .last()
                    .map(|s| s.ident == "Serialize" || s.ident == "Deserialize")
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false)
    })
}

/// `key = Type` 形式的属性参数
pub(crate) struct KvType {
    pub(crate) key: Ident,
    #[allow(dead_code)]
    pub(crate) eq: Token![=],
    pub(crate) ty: Type,
}

impl Parse for KvType {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(Self {
            key: input.parse()?,
            eq: input.parse()?,
            ty: input.parse()?,
        })
    }
}
