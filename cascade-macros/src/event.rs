use proc_macro::TokenStream;
use quote::{ToTokens, quote};
use std::collections::HashMap;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Expr, Ident, Item, Token, parse::Parse, parse::ParseStream, parse_macro_input};

pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let enum_item = match &mut input {
        Item::Enum(e) => e,
        other => {
            return syn::Error::new(other.span(), "#[event] can only be used on enum types")
                .to_compile_error()
                .into();
        }
    };

    if enum_item.variants.is_empty() {
        return syn::Error::new(enum_item.span(), "#[event] requires at least one variant")
            .to_compile_error()
            .into();
    }

    let default_version = cfg.version.unwrap_or_else(|| syn::parse_quote! { 1 });

    let mut variant_types: HashMap<String, syn::LitStr> = HashMap::new();
    let mut variant_versions: HashMap<String, syn::LitInt> = HashMap::new();

    for v in &mut enum_item.variants {
        let mut retained_attrs = Vec::new();

        for attr in v.attrs.iter() {
            if !attr.path().is_ident("event") {
                retained_attrs.push(attr.clone());
                continue;
            }

            let parsed = match parse_variant_event_attr(attr) {
                Ok(parsed) => parsed,
                Err(err) => return err.to_compile_error().into(),
            };

            let key = v.ident.to_string();
            if let Some(lit) = parsed.ty {
                if variant_types.insert(key.clone(), lit).is_some() {
                    return syn::Error::new(
                        attr.span(),
                        "duplicate 'event_type' specified for this variant",
                    )
                    .to_compile_error()
                    .into();
                }
            }
            if let Some(lit) = parsed.version {
                if variant_versions.insert(key, lit).is_some() {
                    return syn::Error::new(
                        attr.span(),
                        "duplicate 'event_version' specified for this variant",
                    )
                    .to_compile_error()
                    .into();
                }
            }
        }

        v.attrs = retained_attrs;
    }

    let enum_ident = &enum_item.ident;
    let enum_name = enum_ident.to_string();
    let (impl_generics, ty_generics, where_clause) = enum_item.generics.split_for_impl();

    // `{ .. }` 模式同时匹配具名、元组与单元变体
    let type_match_arms = enum_item.variants.iter().map(|v| {
        let v_ident = &v.ident;
        let lit = variant_types
            .get(&v_ident.to_string())
            .cloned()
            .unwrap_or_else(|| {
                syn::LitStr::new(&format!("{enum_name}.{v_ident}"), v_ident.span())
            });
        quote! { Self::#v_ident { .. } => #lit }
    });

    let ver_match_arms = enum_item.variants.iter().map(|v| {
        let v_ident = &v.ident;
        match variant_versions.get(&v_ident.to_string()) {
            Some(lit) => quote! { Self::#v_ident { .. } => #lit },
            None => quote! { Self::#v_ident { .. } => #default_version },
        }
    });

    let out = quote! {
        #enum_item

        impl #impl_generics ::cascade_domain::domain_event::DomainEvent for #enum_ident #ty_generics #where_clause {
            fn event_type(&self) -> &str {
                match self { #( #type_match_arms, )* }
            }

            fn event_version(&self) -> usize {
                match self { #( #ver_match_arms, )* }
            }
        }
    };

    TokenStream::from(out)
}

struct VariantEventAttrConfig {
    ty: Option<syn::LitStr>,
    version: Option<syn::LitInt>,
}

fn parse_variant_event_attr(attr: &syn::Attribute) -> syn::Result<VariantEventAttrConfig> {
    let syn::Meta::List(_) = &attr.meta else {
        return Err(syn::Error::new(attr.meta.span(), "expected #[event(...)]"));
    };

    let mut ty: Option<syn::LitStr> = None;
    let mut version: Option<syn::LitInt> = None;
    let pairs = attr.parse_args_with(Punctuated::<VariantEventAttrKv, Token![,]>::parse_terminated)?;

    for kv in pairs {
        match kv.key.to_string().as_str() {
            "event_type" => {
                if ty.is_some() {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "duplicate key 'event_type' in attribute",
                    ));
                }
                match kv.value {
                    Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(lit),
                        ..
                    }) => ty = Some(lit),
                    other => {
                        return Err(syn::Error::new(
                            other.span(),
                            "expected string literal for 'event_type'",
                        ));
                    }
                }
            }
            "event_version" => {
                if version.is_some() {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "duplicate key 'event_version' in attribute",
                    ));
                }
                match kv.value {
                    Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Int(lit),
                        ..
                    }) => version = Some(lit),
                    other => {
                        return Err(syn::Error::new(
                            other.span(),
                            "expected integer literal for 'event_version'",
                        ));
                    }
                }
            }
            _ => {
                return Err(syn::Error::new(
                    kv.key.span(),
                    "unknown key; expected 'event_type' | 'event_version'",
                ));
            }
        }
    }

    Ok(VariantEventAttrConfig { ty, version })
}

struct VariantEventAttrKv {
    key: Ident,
    #[allow(dead_code)]
    eq: Token![=],
    value: Expr,
}

impl Parse for VariantEventAttrKv {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(Self {
            key: input.parse()?,
            eq: input.parse()?,
            value: input.parse()?,
        })
    }
}

// 解析 event 宏键值参数：version = <int>
struct EventAttrConfig {
    version: Option<syn::LitInt>,
}

impl Parse for EventAttrConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut version: Option<syn::LitInt> = None;

        if input.is_empty() {
            return Ok(Self { version });
        }

        let pairs = Punctuated::<syn::ExprAssign, Token![,]>::parse_terminated(input)?;

        for assign in pairs.into_iter() {
            let key_ident = match *assign.left {
                Expr::Path(p) if p.path.segments.len() == 1 => p.path.segments[0].ident.clone(),
                other => {
                    return Err(syn::Error::new(other.span(), "invalid attribute key"));
                }
            };
            match key_ident.to_string().as_str() {
                "version" => {
                    if version.is_some() {
                        return Err(syn::Error::new(
                            key_ident.span(),
                            "duplicate key 'version' in attribute",
                        ));
                    }
                    version = Some(syn::parse2(assign.right.to_token_stream())?);
                }
                _ => {
                    return Err(syn::Error::new(
                        key_ident.span(),
                        "unknown key; expected 'version'",
                    ));
                }
            }
        }

        Ok(Self { version })
    }
}
