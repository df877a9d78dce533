mod decode_entity;
mod decode_property;

use decode_entity::{EntityMetadata, decode_entity};
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implements `stencil::Entity` for a struct with named fields.
///
/// Struct attributes: `#[stencil(name = "table", schema = "schema")]`, the table name defaults to
/// the snake case struct name. Field attributes: `#[stencil(name = "column", key,
/// database_generated, skip, order = N)]`.
#[proc_macro_derive(Entity, attributes(stencil))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    match decode_entity(item) {
        Ok(entity) => encode_entity(&entity).into(),
        Err(error) => error.to_compile_error().into(),
    }
}

fn encode_entity(entity: &EntityMetadata) -> proc_macro2::TokenStream {
    let ident = &entity.item.ident;
    let table_name = &entity.name;
    let schema_name = &entity.schema;
    let properties_count = entity.properties().count();
    let property_defs = entity.properties().map(|p| {
        let name = &p.name;
        let column_name = &p.column_name;
        let order = p.order;
        let key = p.key;
        let database_generated = p.database_generated;
        quote! {
            ::stencil::PropertyDef {
                name: #name,
                column_name: #column_name,
                order: #order,
                key: #key,
                database_generated: #database_generated,
            }
        }
    });
    let property_value = entity.properties().map(|p| {
        let name = &p.name;
        let field = &p.ident;
        quote! {
            #name => ::stencil::AsValue::as_value(::std::clone::Clone::clone(&self.#field))
        }
    });
    let set_property_value = entity.properties().map(|p| {
        let name = &p.name;
        let field = &p.ident;
        let ty = &p.ty;
        quote! {
            #name => {
                self.#field = <#ty as ::stencil::AsValue>::try_from_value(value)?;
            }
        }
    });
    let from_row = entity.fields.iter().map(|p| {
        let field = &p.ident;
        if p.skip {
            return quote!(#field: ::std::default::Default::default());
        }
        let name = &p.name;
        let ty = &p.ty;
        quote! {
            #field: ::stencil::Context::with_context(
                <#ty as ::stencil::AsValue>::try_from_value(row.take(#name)),
                || format!("While decoding property `{}` of `{}`", #name, stringify!(#ident)),
            )?
        }
    });
    quote! {
        impl ::stencil::Entity for #ident {
            fn table_name() -> &'static str {
                #table_name
            }

            fn schema_name() -> &'static str {
                #schema_name
            }

            fn properties() -> &'static [::stencil::PropertyDef] {
                static PROPERTIES: [::stencil::PropertyDef; #properties_count] =
                    [#(#property_defs),*];
                &PROPERTIES
            }

            fn descriptor() -> &'static ::stencil::EntityDescriptor<Self> {
                static DESCRIPTOR: ::std::sync::LazyLock<::stencil::EntityDescriptor<#ident>> =
                    ::std::sync::LazyLock::new(::stencil::EntityDescriptor::new);
                &DESCRIPTOR
            }

            fn property_value(&self, property: &str) -> ::std::option::Option<::stencil::Value> {
                ::std::option::Option::Some(match property {
                    #(#property_value,)*
                    _ => return ::std::option::Option::None,
                })
            }

            fn set_property_value(
                &mut self,
                property: &str,
                value: ::stencil::Value,
            ) -> ::stencil::Result<()> {
                match property {
                    #(#set_property_value)*
                    _ => {
                        return ::std::result::Result::Err(::stencil::Error::msg(format!(
                            "Entity `{}` has no property `{}`",
                            stringify!(#ident),
                            property
                        )));
                    }
                }
                ::std::result::Result::Ok(())
            }

            fn from_row(mut row: ::stencil::RowLabeled) -> ::stencil::Result<Self> {
                ::std::result::Result::Ok(Self {
                    #(#from_row,)*
                })
            }
        }
    }
}
