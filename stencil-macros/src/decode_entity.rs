use crate::decode_property::{PropertyMetadata, decode_property};
use convert_case::{Case, Casing};
use std::collections::HashSet;
use syn::{Fields, ItemStruct, LitStr, parse::ParseBuffer, spanned::Spanned};

pub(crate) struct EntityMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) name: String,
    pub(crate) schema: String,
    /// Every field, skipped ones included, in declaration order.
    pub(crate) fields: Vec<PropertyMetadata>,
}

impl EntityMetadata {
    pub(crate) fn properties(&self) -> impl Iterator<Item = &PropertyMetadata> + Clone {
        self.fields.iter().filter(|v| !v.skip)
    }
}

pub fn decode_entity(item: ItemStruct) -> syn::Result<EntityMetadata> {
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new(
            item.generics.span(),
            "Entities cannot have generic parameters",
        ));
    }
    if !matches!(item.fields, Fields::Named(..)) {
        return Err(syn::Error::new(
            item.ident.span(),
            "Entity must be a struct with named fields",
        ));
    }
    let mut name = item.ident.to_string().to_case(Case::Snake);
    let mut schema = String::new();
    if name.starts_with('_') {
        name.remove(0);
    }
    for attr in &item.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("stencil") {
            let Ok(list) = meta.require_list() else {
                panic!(
                    "Error while parsing `stencil`, use it like: `#[stencil(attribute = value, ..)]`",
                );
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `name`, use it like: `#[stencil(name = \"my_table\")]`"
                        );
                    };
                    name = value.value();
                } else if arg.path.is_ident("schema") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `schema`, use it like: `#[stencil(schema = \"my_schema\")]`"
                        );
                    };
                    schema = value.value();
                } else {
                    panic!(
                        "Unknown attribute `{}` inside stencil macro",
                        quote::ToTokens::to_token_stream(&arg.path).to_string()
                    );
                }
                Ok(())
            });
        }
    }
    if name.is_empty() {
        return Err(syn::Error::new(
            item.ident.span(),
            "Entity is mapped to an empty table name",
        ));
    }
    let fields = item
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| decode_property(f, i))
        .collect::<syn::Result<Vec<_>>>()?;
    let mut columns = HashSet::new();
    for property in fields.iter().filter(|v| !v.skip) {
        if !columns.insert(property.column_name.as_str()) {
            return Err(syn::Error::new(
                property.span,
                format!(
                    "Column `{}` is mapped by more than one property",
                    property.column_name
                ),
            ));
        }
    }
    Ok(EntityMetadata {
        item,
        name,
        schema,
        fields,
    })
}
