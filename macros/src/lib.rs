//! Derive macros for ironhorizon command and event structs.
//!
//! Hand-writing `Command`/`Event` impls means repeating the same
//! boilerplate for every struct: an `aggregate_id()` accessor, a constant
//! `aggregate_type()`/`command_type()`/`event_type()`, a `validate()` that
//! rejects zero-valued required fields, and a `to_json()` built on
//! `serde_json::to_value`. These two macros generate that boilerplate from a
//! handful of attributes.
//!
//! # Example
//!
//! ```ignore
//! use ironhorizon_macros::DomainCommand;
//! use serde::Serialize;
//!
//! #[derive(Debug, Serialize, DomainCommand)]
//! #[ironhorizon(aggregate = "Order", command_type = "PlaceOrder")]
//! struct PlaceOrder {
//!     #[ironhorizon(aggregate_id)]
//!     order_id: String,
//!     customer_id: String,
//!     #[ironhorizon(optional)]
//!     note: String,
//! }
//! ```
//!
//! `validate()` rejects the command if `customer_id` is left at
//! `String::default()`; `note` is exempt because it's marked optional.
//! `order_id` is both the field the macro reads for `aggregate_id()` and,
//! since it isn't marked optional, still subject to the zero-value check.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, LitStr};

/// Struct-level `#[ironhorizon(...)]` arguments shared by both derives.
struct ContainerArgs {
    aggregate: Option<String>,
    type_name: Option<String>,
}

/// Parse the struct-level `#[ironhorizon(aggregate = "...", <type_key> =
/// "...")]` attribute, where `type_key` is `"command_type"` or
/// `"event_type"` depending on which derive is running.
fn parse_container_args(input: &DeriveInput, type_key: &str) -> syn::Result<ContainerArgs> {
    let mut args = ContainerArgs {
        aggregate: None,
        type_name: None,
    };

    for attr in &input.attrs {
        if !attr.path().is_ident("ironhorizon") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("aggregate") {
                let value: LitStr = meta.value()?.parse()?;
                args.aggregate = Some(value.value());
                Ok(())
            } else if meta.path.is_ident(type_key) {
                let value: LitStr = meta.value()?.parse()?;
                args.type_name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error(format!("expected `aggregate` or `{type_key}`")))
            }
        })?;
    }

    Ok(args)
}

/// True if `field` carries a bare `#[ironhorizon(<flag>)]` marker.
fn field_has_flag(field: &Field, flag: &str) -> bool {
    field.attrs.iter().any(|attr| {
        if !attr.path().is_ident("ironhorizon") {
            return false;
        }
        let mut found = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(flag) {
                found = true;
            }
            Ok(())
        });
        found
    })
}

/// Named fields of a struct, erroring out on tuple/unit structs.
fn named_fields<'a>(
    input: &'a DeriveInput,
    derive_name: &str,
) -> syn::Result<&'a syn::punctuated::Punctuated<Field, syn::token::Comma>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                input,
                format!("#[derive({derive_name})] requires named fields"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            format!("#[derive({derive_name})] can only be used on structs"),
        )),
    }
}

/// Derive macro generating an [`ironhorizon_core::command::Command`] impl.
///
/// # Attributes
///
/// - `#[ironhorizon(aggregate = "...", command_type = "...")]` (struct-level,
///   required) — sets `aggregate_type()` and `command_type()`.
/// - `#[ironhorizon(aggregate_id)]` (field-level, required on exactly one
///   field) — that field's `.to_string()` becomes `aggregate_id()`.
/// - `#[ironhorizon(optional)]` (field-level) — excludes a field from the
///   generated `validate()`'s zero-value check.
///
/// `validate()` compares every non-optional field against
/// `Default::default()`, so every such field's type must implement
/// `Default + PartialEq`. `to_json()` is generated as
/// `serde_json::to_value(self)`, so the struct must separately derive
/// `serde::Serialize`.
///
/// # Panics
///
/// Produces a compile error, not a runtime panic, if the struct-level
/// attribute is missing, no field is marked `aggregate_id`, or the type is
/// not a struct with named fields.
#[proc_macro_derive(DomainCommand, attributes(ironhorizon))]
pub fn derive_domain_command(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_domain_command_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn derive_domain_command_impl(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let fields = named_fields(input, "DomainCommand")?;
    let args = parse_container_args(input, "command_type")?;

    let aggregate = args.aggregate.ok_or_else(|| {
        syn::Error::new_spanned(
            input,
            "#[derive(DomainCommand)] requires #[ironhorizon(aggregate = \"...\")]",
        )
    })?;
    let command_type = args.type_name.ok_or_else(|| {
        syn::Error::new_spanned(
            input,
            "#[derive(DomainCommand)] requires #[ironhorizon(command_type = \"...\")]",
        )
    })?;

    let id_field = fields
        .iter()
        .find(|field| field_has_flag(field, "aggregate_id"))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                input,
                "#[derive(DomainCommand)] requires exactly one field marked #[ironhorizon(aggregate_id)]",
            )
        })?;
    let id_field_name = id_field
        .ident
        .as_ref()
        .expect("named_fields guarantees every field has an ident");

    let required_checks = fields
        .iter()
        .filter(|field| !field_has_flag(field, "optional"))
        .map(|field| {
            let field_name = field
                .ident
                .as_ref()
                .expect("named_fields guarantees every field has an ident");
            let field_label = field_name.to_string();
            quote! {
                if self.#field_name == ::core::default::Default::default() {
                    return ::std::result::Result::Err(
                        ironhorizon_core::error::DomainError::MissingField {
                            field: #field_label,
                        }
                    );
                }
            }
        });

    Ok(quote! {
        impl ironhorizon_core::command::Command for #name {
            fn aggregate_id(&self) -> ::std::string::String {
                ::std::string::ToString::to_string(&self.#id_field_name)
            }

            fn aggregate_type(&self) -> &'static str {
                #aggregate
            }

            fn command_type(&self) -> &'static str {
                #command_type
            }

            fn validate(&self) -> ::std::result::Result<(), ironhorizon_core::error::DomainError> {
                #(#required_checks)*
                ::std::result::Result::Ok(())
            }

            fn to_json(&self) -> ::std::result::Result<::serde_json::Value, ironhorizon_core::error::DomainError> {
                ::serde_json::to_value(self)
                    .map_err(|e| ironhorizon_core::error::DomainError::Serialization(e.to_string()))
            }
        }
    })
}

/// Derive macro generating an [`ironhorizon_core::event::Event`] impl.
///
/// # Attributes
///
/// - `#[ironhorizon(aggregate = "...", event_type = "...")]` (struct-level,
///   required) — sets `aggregate_type()` and `event_type()`.
/// - `#[ironhorizon(aggregate_id)]` (field-level, required on exactly one
///   field) — that field's `.to_string()` becomes `aggregate_id()`.
///
/// Unlike commands, events carry no `validate()` — they are facts that
/// already happened, so there's nothing left to reject. `to_json()` is
/// generated as `serde_json::to_value(self)`, so the struct must separately
/// derive `serde::Serialize`.
///
/// # Panics
///
/// Produces a compile error, not a runtime panic, if the struct-level
/// attribute is missing, no field is marked `aggregate_id`, or the type is
/// not a struct with named fields.
#[proc_macro_derive(DomainEvent, attributes(ironhorizon))]
pub fn derive_domain_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_domain_event_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn derive_domain_event_impl(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let fields = named_fields(input, "DomainEvent")?;
    let args = parse_container_args(input, "event_type")?;

    let aggregate = args.aggregate.ok_or_else(|| {
        syn::Error::new_spanned(
            input,
            "#[derive(DomainEvent)] requires #[ironhorizon(aggregate = \"...\")]",
        )
    })?;
    let event_type = args.type_name.ok_or_else(|| {
        syn::Error::new_spanned(
            input,
            "#[derive(DomainEvent)] requires #[ironhorizon(event_type = \"...\")]",
        )
    })?;

    let id_field = fields
        .iter()
        .find(|field| field_has_flag(field, "aggregate_id"))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                input,
                "#[derive(DomainEvent)] requires exactly one field marked #[ironhorizon(aggregate_id)]",
            )
        })?;
    let id_field_name = id_field
        .ident
        .as_ref()
        .expect("named_fields guarantees every field has an ident");

    Ok(quote! {
        impl ironhorizon_core::event::Event for #name {
            fn aggregate_id(&self) -> ::std::string::String {
                ::std::string::ToString::to_string(&self.#id_field_name)
            }

            fn aggregate_type(&self) -> &'static str {
                #aggregate
            }

            fn event_type(&self) -> &'static str {
                #event_type
            }

            fn to_json(&self) -> ::std::result::Result<::serde_json::Value, ironhorizon_core::event::EventError> {
                ::serde_json::to_value(self)
                    .map_err(|e| ironhorizon_core::event::EventError::Serialization(e.to_string()))
            }
        }
    })
}
