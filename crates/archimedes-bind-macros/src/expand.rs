//! Code generation for `#[derive(Bind)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::parse::{BindField, BindStruct, FieldTag};

/// Which descriptor table an entry is generated for.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Table {
    Form,
    File,
}

/// Expands the derive input into a `Bindable` impl.
pub fn expand_bind(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let record = BindStruct::from_derive_input(input)?;
    Ok(generate_bindable(&record))
}

fn generate_bindable(record: &BindStruct) -> TokenStream {
    let ident = &record.ident;

    let form_entries = record
        .fields
        .iter()
        .filter_map(|f| generate_entry(ident, f, Table::Form));
    let file_entries = record
        .fields
        .iter()
        .filter_map(|f| generate_entry(ident, f, Table::File));

    let violations = record.validate.then(|| {
        quote! {
            fn violations(&self) -> ::std::vec::Vec<::archimedes_bind::FieldViolation> {
                <Self as ::archimedes_bind::Validate>::validate(self)
            }
        }
    });

    quote! {
        #[automatically_derived]
        impl ::archimedes_bind::Bindable for #ident {
            fn descriptors(
                tag: ::archimedes_bind::TagKind,
            ) -> &'static [::archimedes_bind::FieldDescriptor<Self>] {
                static FORM: ::std::sync::OnceLock<
                    ::std::vec::Vec<::archimedes_bind::FieldDescriptor<#ident>>,
                > = ::std::sync::OnceLock::new();
                static FILE: ::std::sync::OnceLock<
                    ::std::vec::Vec<::archimedes_bind::FieldDescriptor<#ident>>,
                > = ::std::sync::OnceLock::new();

                match tag {
                    ::archimedes_bind::TagKind::Form => FORM
                        .get_or_init(|| {
                            #[allow(unused_mut)]
                            let mut fields: ::std::vec::Vec<::archimedes_bind::FieldDescriptor<#ident>> =
                                ::std::vec::Vec::new();
                            #(#form_entries)*
                            fields
                        })
                        .as_slice(),
                    ::archimedes_bind::TagKind::File => FILE
                        .get_or_init(|| {
                            #[allow(unused_mut)]
                            let mut fields: ::std::vec::Vec<::archimedes_bind::FieldDescriptor<#ident>> =
                                ::std::vec::Vec::new();
                            #(#file_entries)*
                            fields
                        })
                        .as_slice(),
                }
            }

            #violations
        }
    }
}

// Each entry lives in its own block so every field gets a private `access`.
fn generate_entry(record: &syn::Ident, field: &BindField, table: Table) -> Option<TokenStream> {
    let member = &field.ident;
    let ty = &field.ty;
    let name = member.to_string();

    let push = match (&field.tag, table) {
        (FieldTag::Form(wire), Table::Form) => quote! {
            fields.push(::archimedes_bind::FieldDescriptor::value(#name, #wire, access));
        },
        (FieldTag::File(wire), Table::File) => quote! {
            fields.push(::archimedes_bind::FieldDescriptor::file(#name, #wire, access));
        },
        (FieldTag::Flatten, _) => {
            let kind = match table {
                Table::Form => quote!(::archimedes_bind::TagKind::Form),
                Table::File => quote!(::archimedes_bind::TagKind::File),
            };
            quote! {
                fields.extend(
                    <#ty as ::archimedes_bind::Bindable>::descriptors(#kind)
                        .iter()
                        .map(|d| d.lift(#name, access)),
                );
            }
        }
        _ => return None,
    };

    Some(quote! {
        {
            fn access(record: &mut #record) -> &mut #ty {
                &mut record.#member
            }
            #push
        }
    })
}
