use proc_macro2::Span;
use quote::ToTokens;
use syn::{Field, Ident, LitInt, LitStr, Type, parse::ParseBuffer};

pub(crate) struct PropertyMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) column_name: String,
    pub(crate) order: i32,
    pub(crate) key: bool,
    pub(crate) database_generated: bool,
    pub(crate) skip: bool,
    pub(crate) span: Span,
}

pub fn decode_property(field: &Field, index: usize) -> syn::Result<PropertyMetadata> {
    let Some(ident) = field.ident.clone() else {
        return Err(syn::Error::new_spanned(
            field,
            "Entity fields must be named, tuple structs are not supported",
        ));
    };
    let name = ident.to_string();
    let mut column_name = name.clone();
    if column_name.starts_with('_') {
        column_name.remove(0);
    }
    let mut metadata = PropertyMetadata {
        span: ident.span(),
        ident,
        ty: field.ty.clone(),
        name,
        column_name,
        order: index as i32,
        key: false,
        database_generated: false,
        skip: false,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("stencil") {
            let Ok(list) = meta.require_list() else {
                panic!(
                    "Error while parsing `stencil`, use it like: `#[stencil(attribute = value, ...)]`",
                );
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `name`, use it like: `#[stencil(name = \"my_column\")]`");
                    };
                    metadata.column_name = v.value();
                } else if arg.path.is_ident("order") {
                    let Ok(v) = arg
                        .value()
                        .and_then(ParseBuffer::parse::<LitInt>)
                        .and_then(|v| v.base10_parse::<i32>())
                    else {
                        panic!("Error while parsing `order`, use it like: `#[stencil(order = 2)]`");
                    };
                    metadata.order = v;
                } else if arg.path.is_ident("key") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!("Error while parsing `key`, use it like: `#[stencil(key)]`");
                    };
                    metadata.key = true;
                } else if arg.path.is_ident("database_generated") {
                    let Err(..) = arg.value() else {
                        panic!("Error while parsing `database_generated`, use it like: `#[stencil(database_generated)]`");
                    };
                    metadata.database_generated = true;
                } else if arg.path.is_ident("skip") {
                    let Err(..) = arg.value() else {
                        panic!("Error while parsing `skip`, use it like: `#[stencil(skip)]`");
                    };
                    metadata.skip = true;
                } else {
                    panic!(
                        "Unknown attribute `{}` inside stencil macro",
                        arg.path.to_token_stream().to_string()
                    );
                }
                Ok(())
            });
        }
    }
    if metadata.column_name.is_empty() {
        return Err(syn::Error::new(
            metadata.span,
            format!("Property `{}` is mapped to an empty column name", metadata.name),
        ));
    }
    Ok(metadata)
}
