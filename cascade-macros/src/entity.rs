use crate::utils::{KvType, derives_serde, find_field};
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Item, ItemStruct, Token, Type, parse::Parse, parse::ParseStream, parse_macro_input};

pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EntityAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[entity] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let with_serde = derives_serde(&st.attrs);

    // 仅支持具名字段
    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let id_type = cfg.id_ty.unwrap_or_else(|| syn::parse_quote! { String });

    // 重建字段顺序：id、version 在最前，pending_events 紧随其后，其他字段保持原有相对顺序
    let mut new_named: Punctuated<syn::Field, Token![,]> = Punctuated::new();

    match find_field(fields_named, "id") {
        Some(f) => new_named.push(f),
        None => new_named.push(syn::parse_quote! { id: #id_type }),
    }

    match find_field(fields_named, "version") {
        Some(f) => new_named.push(f),
        None => new_named.push(syn::parse_quote! { version: usize }),
    }

    if let Some(event_ty) = &cfg.events_ty {
        match find_field(fields_named, "pending_events") {
            Some(f) => new_named.push(f),
            None if with_serde => new_named.push(syn::parse_quote! {
                #[serde(skip)]
                pending_events: ::cascade_domain::domain_event::PendingEvents<#event_ty>
            }),
            None => new_named.push(syn::parse_quote! {
                pending_events: ::cascade_domain::domain_event::PendingEvents<#event_ty>
            }),
        }
    }

    for f in fields_named.named.clone().into_iter() {
        let injected = f
            .ident
            .as_ref()
            .map(|i| i == "id" || i == "version" || (cfg.events_ty.is_some() && i == "pending_events"))
            .unwrap_or(false);
        if !injected {
            new_named.push(f);
        }
    }

    fields_named.named = new_named;

    let out_struct = ItemStruct { ..st };

    let ident = &out_struct.ident;
    let generics = out_struct.generics.clone();
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let pending_impl = cfg.events_ty.as_ref().map(|event_ty| {
        quote! {
            impl #impl_generics ::cascade_domain::aggregate::HasPendingEvents for #ident #ty_generics #where_clause {
                type Event = #event_ty;

                fn pending_events(&self) -> &::cascade_domain::domain_event::PendingEvents<#event_ty> {
                    &self.pending_events
                }

                fn pending_events_mut(&mut self) -> &mut ::cascade_domain::domain_event::PendingEvents<#event_ty> {
                    &mut self.pending_events
                }
            }
        }
    });

    let expanded = quote! {
        #out_struct

        impl #impl_generics ::cascade_domain::entity::Entity for #ident #ty_generics #where_clause {
            type Id = #id_type;

            fn new(id: Self::Id) -> Self {
                Self {
                    id,
                    version: 0,
                    ..Default::default()
                }
            }

            fn id(&self) -> &Self::Id {
                &self.id
            }

            fn version(&self) -> usize {
                self.version
            }
        }

        #pending_impl
    };

    TokenStream::from(expanded)
}

// 解析 entity 宏键值参数：id = <Type>、events = <Type>
struct EntityAttrConfig {
    id_ty: Option<Type>,
    events_ty: Option<Type>,
}

impl Parse for EntityAttrConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut id_ty: Option<Type> = None;
        let mut events_ty: Option<Type> = None;

        if input.is_empty() {
            return Ok(Self { id_ty, events_ty });
        }

        let pairs: Punctuated<KvType, Token![,]> =
            Punctuated::<KvType, Token![,]>::parse_terminated(input)?;

        for kv in pairs.into_iter() {
            let slot = match kv.key.to_string().as_str() {
                "id" => &mut id_ty,
                "events" => &mut events_ty,
                _ => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "unknown key in attribute; expected 'id' | 'events'",
                    ));
                }
            };
            if slot.is_some() {
                return Err(syn::Error::new(
                    kv.key.span(),
                    format!("duplicate key '{}' in attribute", kv.key),
                ));
            }
            *slot = Some(kv.ty);
        }

        Ok(Self { id_ty, events_ty })
    }
}
