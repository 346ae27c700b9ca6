//! Parsing for `#[derive(Bind)]` input.
//!
//! Accepts named-field structs only. Fields opt in with one of
//! `#[bind(form = "...")]`, `#[bind(file = "...")]` or `#[bind(flatten)]`;
//! the container may carry `#[bind(validate)]`.

use syn::{spanned::Spanned, Attribute, Data, DeriveInput, Fields, Ident, LitStr, Type};

/// A struct accepted by the derive.
#[derive(Debug)]
pub struct BindStruct {
    /// The struct name.
    pub ident: Ident,
    /// Whether `violations()` delegates to `Validate`.
    pub validate: bool,
    /// Tagged fields, in declaration order.
    pub fields: Vec<BindField>,
}

/// A field carrying a `#[bind(...)]` attribute.
#[derive(Debug)]
pub struct BindField {
    pub ident: Ident,
    pub ty: Type,
    pub tag: FieldTag,
}

/// How a field is bound.
#[derive(Debug)]
pub enum FieldTag {
    /// Text values sent under the given wire name.
    Form(LitStr),
    /// Uploaded files sent under the given wire name.
    File(LitStr),
    /// Tagged fields of an embedded record.
    Flatten,
}

impl BindStruct {
    /// Validates the derive input and collects tagged fields.
    pub fn from_derive_input(input: DeriveInput) -> syn::Result<Self> {
        let fields = match input.data {
            Data::Struct(data) => match data.fields {
                Fields::Named(named) => named.named,
                Fields::Unnamed(_) | Fields::Unit => {
                    return Err(syn::Error::new(
                        input.ident.span(),
                        "Bind can only be derived for structs with named fields",
                    ))
                }
            },
            Data::Enum(_) | Data::Union(_) => {
                return Err(syn::Error::new(
                    input.ident.span(),
                    "Bind can only be derived for structs",
                ))
            }
        };

        if !input.generics.params.is_empty() {
            return Err(syn::Error::new(
                input.generics.span(),
                "Bind cannot be derived for generic structs",
            ));
        }

        let validate = parse_container_attrs(&input.attrs)?;

        let mut tagged = Vec::new();
        for field in fields {
            let Some(tag) = parse_field_attrs(&field.attrs)? else {
                continue;
            };
            let ident = field
                .ident
                .ok_or_else(|| syn::Error::new(field.ty.span(), "expected a named field"))?;
            tagged.push(BindField {
                ident,
                ty: field.ty,
                tag,
            });
        }

        Ok(Self {
            ident: input.ident,
            validate,
            fields: tagged,
        })
    }
}

fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut validate = false;

    for attr in attrs.iter().filter(|a| a.path().is_ident("bind")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("validate") {
                validate = true;
                Ok(())
            } else {
                Err(meta.error("unknown container attribute, expected `validate`"))
            }
        })?;
    }

    Ok(validate)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<Option<FieldTag>> {
    let mut tag = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("bind")) {
        attr.parse_nested_meta(|meta| {
            let parsed = if meta.path.is_ident("form") {
                FieldTag::Form(parse_wire_name(&meta.value()?.parse()?)?)
            } else if meta.path.is_ident("file") {
                FieldTag::File(parse_wire_name(&meta.value()?.parse()?)?)
            } else if meta.path.is_ident("flatten") {
                FieldTag::Flatten
            } else {
                return Err(meta.error("unknown field attribute, expected `form`, `file` or `flatten`"));
            };

            if tag.is_some() {
                return Err(meta.error("a field takes only one of `form`, `file` or `flatten`"));
            }
            tag = Some(parsed);
            Ok(())
        })?;
    }

    Ok(tag)
}

fn parse_wire_name(lit: &LitStr) -> syn::Result<LitStr> {
    if lit.value().is_empty() {
        return Err(syn::Error::new(lit.span(), "wire name must not be empty"));
    }
    Ok(lit.clone())
}
