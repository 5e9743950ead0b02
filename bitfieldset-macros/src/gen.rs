use std::collections::HashSet;

use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{parse_quote, Attribute, Error, Expr, ExprLit, Ident, Lit, LitInt, Path, Result};
use syn::{Visibility, VisRestricted};

use crate::ast::{self, Input};

struct Config {
    crate_path: Path,
}

/// A primitive word type and its properties.
struct WordType {
    ident: Ident,
    bits: u8,
    bytes: usize,
    max: u64,
}

impl WordType {
    fn new(ident: &Ident) -> Result<Self> {
        let bits = match ident.to_string().as_str() {
            "u8" => 8,
            "u16" => 16,
            "u32" => 32,
            "u64" => 64,
            _ => {
                return Err(Error::new(
                    ident.span(),
                    "word type must be one of `u8`, `u16`, `u32` or `u64`",
                ))
            }
        };
        Ok(Self {
            ident: ident.clone(),
            bits,
            bytes: bits as usize / 8,
            max: u64::MAX >> (64 - bits as u32),
        })
    }

    /// Names the type without relying on the primitive names being unshadowed.
    fn path(&self) -> TokenStream {
        let ident = &self.ident;
        quote! { ::core::primitive::#ident }
    }

    /// Names a per-type function such as `mask_u32`.
    fn function(&self, prefix: &str) -> Ident {
        format_ident!("{}_{}", prefix, self.ident, span = self.ident.span())
    }
}

pub fn bitfield_set_impl(input: Input) -> TokenStream {
    let cfg = Config {
        crate_path: input.crate_path,
    };
    let results: Vec<_> = input
        .sets
        .into_iter()
        .map(|set| generate_set(&cfg, set))
        .collect();
    quote! { #(#results)* }
}

fn generate_set(cfg: &Config, input: ast::FieldSet) -> TokenStream {
    let cloned_visibility = input.visibility.clone();
    let cloned_name = input.name.clone();
    match generate_set_impl(cfg, input) {
        Ok(result) => result,
        Err(e) => {
            let compile_error = e.into_compile_error();
            quote! {
                #compile_error
                #cloned_visibility enum #cloned_name {}
            }
        }
    }
}

fn generate_set_impl(cfg: &Config, input: ast::FieldSet) -> Result<TokenStream> {
    let crate_path = &cfg.crate_path;
    let word_type = WordType::new(&input.word_type)?;
    let word_count: usize = input.word_count.base10_parse()?;

    // Collect fields, reporting every bad field at once.
    let mut fields = Vec::new();
    let mut names = HashSet::new();
    let mut errors: Option<Error> = None;
    for (index, field) in input.fields.into_iter().enumerate() {
        if !names.insert(field.name.to_string()) {
            let e = Error::new(field.name.span(), "duplicate field name");
            combine(&mut errors, e);
            continue;
        }
        match FieldInfo::new(index, &word_type, field) {
            Ok(info) => fields.push(info),
            Err(e) => combine(&mut errors, e),
        }
    }
    if let Some(e) = errors {
        return Err(e);
    }

    let name = &input.name;
    let visibility = &input.visibility;
    let attrs = &input.attrs;
    let word = word_type.path();
    let validate_fn = word_type.function("validate");
    let count = Literal::usize_unsuffixed(word_count);
    let field_count = Literal::usize_unsuffixed(fields.len());
    let descriptors = fields
        .iter()
        .map(|field| field.descriptor(crate_path, &word_type));

    let module_name = module_name(name);
    let module_doc = format!("Fields of [`{name}`].");
    let markers = fields
        .iter()
        .map(|field| field.marker(crate_path, name, visibility, &word_type));

    Ok(quote! {
        #(#attrs)*
        #visibility enum #name {}

        impl #crate_path::Layout for #name {
            type Word = #word;
            type Words = [#word; #count];

            const WORD_COUNT: ::core::primitive::usize = #count;
            const FIELD_COUNT: ::core::primitive::usize = #field_count;
            const FIELDS: &'static [#crate_path::FieldDescriptor<#word>] = &[
                #(#descriptors,)*
            ];
            const ZEROED: [#word; #count] = [0; #count];
            const REPORT: #crate_path::Report = #crate_path::validate::#validate_fn(
                Self::FIELDS,
                Self::WORD_COUNT,
                Self::FIELD_COUNT,
            );
        }

        const _: () = #crate_path::validate::assert_valid(
            <#name as #crate_path::Layout>::REPORT,
        );

        #[doc = #module_doc]
        #[allow(dead_code, non_camel_case_types)]
        #visibility mod #module_name {
            #(#markers)*
        }
    })
}

fn combine(errors: &mut Option<Error>, e: Error) {
    match errors {
        Some(errors) => errors.combine(e),
        None => *errors = Some(e),
    }
}

enum Access {
    ReadWrite,
    ReadOnly,
    WriteOnly,
    None,
}

struct FieldInfo {
    index: usize,
    name: Ident,
    visibility: Visibility,
    other_attrs: Vec<Attribute>,
    word: usize,
    byte_offset: Option<usize>,
    lsb: u8,
    msb: u8,
    access: Access,
    may_overlap: bool,
    default: Option<u64>,
    min: Option<u64>,
    max: Option<u64>,
    compound_offset: Option<u8>,
}

impl FieldInfo {
    fn new(index: usize, word_type: &WordType, input: ast::Field) -> Result<Self> {
        let mut access = None;
        let mut may_overlap = None;
        let mut default = None;
        let mut min = None;
        let mut max = None;
        let mut compound_offset: Option<u8> = None;
        let mut byte_offset: Option<usize> = None;
        let mut other_attrs = Vec::new();

        for attr in input.attrs {
            let path = attr.path();
            if let Some(new_access) = [
                ("read_only", Access::ReadOnly),
                ("write_only", Access::WriteOnly),
                ("no_access", Access::None),
            ]
            .into_iter()
            .find_map(|(name, access)| path.is_ident(name).then_some(access))
            {
                attr.meta.require_path_only()?;
                if access.is_some() {
                    return Err(Error::new(
                        attr.span(),
                        "multiple access attributes are not allowed",
                    ));
                }
                access = Some(new_access);
            } else if path.is_ident("may_overlap") {
                attr.meta.require_path_only()?;
                set_once(&mut may_overlap, &attr, true)?;
            } else if path.is_ident("default") {
                set_once(&mut default, &attr, parse_value(&attr, word_type)?)?;
            } else if path.is_ident("min") {
                set_once(&mut min, &attr, parse_value(&attr, word_type)?)?;
            } else if path.is_ident("max") {
                set_once(&mut max, &attr, parse_value(&attr, word_type)?)?;
            } else if path.is_ident("compound_offset") {
                set_once(&mut compound_offset, &attr, int_value(&attr)?.base10_parse()?)?;
            } else if path.is_ident("byte_offset") {
                set_once(&mut byte_offset, &attr, int_value(&attr)?.base10_parse()?)?;
            } else {
                other_attrs.push(attr);
            }
        }

        let bits = &input.bits;
        let lsb: u8 = bits.lsb().base10_parse()?;
        let msb: u8 = match bits.msb() {
            Some(msb) => msb.base10_parse()?,
            None => word_type.bits - 1,
        };
        if lsb > msb {
            return Err(Error::new(
                bits.span(),
                "the least significant bit must not exceed the most significant bit",
            ));
        }
        if msb >= word_type.bits {
            return Err(Error::new(
                bits.span(),
                format!("bit {msb} is outside a {}-bit word", word_type.bits),
            ));
        }

        let word: usize = match (&input.word, byte_offset) {
            (Some(word), _) => word.base10_parse()?,
            (None, Some(byte_offset)) => byte_offset / word_type.bytes,
            (None, None) => {
                return Err(Error::new(
                    input.name.span(),
                    "field needs a word index or a `#[byte_offset]` attribute",
                ))
            }
        };

        Ok(Self {
            index,
            name: input.name,
            visibility: input.visibility,
            other_attrs,
            word,
            byte_offset,
            lsb,
            msb,
            access: access.unwrap_or(Access::ReadWrite),
            may_overlap: may_overlap.unwrap_or(false),
            default,
            min,
            max,
            compound_offset,
        })
    }

    fn descriptor(&self, crate_path: &Path, word_type: &WordType) -> TokenStream {
        let word = word_type.path();
        let lsb = Literal::u8_unsuffixed(self.lsb);
        let msb = Literal::u8_unsuffixed(self.msb);
        let index = Literal::usize_unsuffixed(self.word);
        let mut tokens = quote! { #crate_path::FieldDescriptor::<#word>::new(#index, #lsb, #msb) };
        if let Some(byte_offset) = self.byte_offset {
            let byte_offset = Literal::usize_unsuffixed(byte_offset);
            tokens.extend(quote! { .with_byte_offset(#byte_offset) });
        }
        match self.access {
            Access::ReadWrite => (),
            Access::ReadOnly => tokens.extend(quote! { .read_only() }),
            Access::WriteOnly => tokens.extend(quote! { .write_only() }),
            Access::None => tokens.extend(quote! { .no_access() }),
        }
        if let Some(default) = self.default {
            let default = Literal::u64_unsuffixed(default);
            tokens.extend(quote! { .with_default(#default) });
        }
        if let Some(min) = self.min {
            let min = Literal::u64_unsuffixed(min);
            tokens.extend(quote! { .with_min(#min) });
        }
        if let Some(max) = self.max {
            let max = Literal::u64_unsuffixed(max);
            tokens.extend(quote! { .with_max(#max) });
        }
        if let Some(compound_offset) = self.compound_offset {
            let compound_offset = Literal::u8_unsuffixed(compound_offset);
            tokens.extend(quote! { .with_compound_offset(#compound_offset) });
        }
        if self.may_overlap {
            tokens.extend(quote! { .overlapping() });
        }
        tokens
    }

    fn marker(
        &self,
        crate_path: &Path,
        set_name: &Ident,
        set_visibility: &Visibility,
        word_type: &WordType,
    ) -> TokenStream {
        let name = &self.name;
        let visibility = marker_visibility(set_visibility, &self.visibility);
        let other_attrs = &self.other_attrs;
        let doc = if other_attrs.iter().any(|attr| attr.path().is_ident("doc")) {
            quote! {}
        } else {
            let doc = format!("The `{name}` field of [`{set_name}`](super::{set_name}).");
            quote! { #[doc = #doc] }
        };

        let word = word_type.path();
        let mask_fn = word_type.function("mask");
        let name_str = name.to_string();
        let index = Literal::usize_unsuffixed(self.index);
        let slot = Literal::usize_unsuffixed(self.word);
        let lsb = Literal::u32_unsuffixed(self.lsb as u32);
        let msb = Literal::u32_unsuffixed(self.msb as u32);

        let readable = matches!(self.access, Access::ReadWrite | Access::ReadOnly).then(|| {
            quote! { impl #crate_path::Readable for #name {} }
        });
        let writable = matches!(self.access, Access::ReadWrite | Access::WriteOnly).then(|| {
            quote! { impl #crate_path::Writable for #name {} }
        });

        quote! {
            #doc
            #(#other_attrs)*
            #visibility enum #name {}

            impl #crate_path::Field for #name {
                type Layout = super::#set_name;
                type Slot = #crate_path::WordSlot<#slot>;

                const NAME: &'static ::core::primitive::str = #name_str;
                const INDEX: ::core::primitive::usize = #index;
                const MASK: #word = #crate_path::mask::#mask_fn(#lsb, #msb);
            }

            #readable
            #writable
        }
    }
}

fn set_once<T>(slot: &mut Option<T>, attr: &Attribute, value: T) -> Result<()> {
    if slot.is_some() {
        return Err(Error::new(attr.span(), "duplicate attribute"));
    }
    *slot = Some(value);
    Ok(())
}

fn int_value(attr: &Attribute) -> Result<&LitInt> {
    match &attr.meta.require_name_value()?.value {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => Ok(lit),
        value => Err(Error::new(value.span(), "expected an integer literal")),
    }
}

fn parse_value(attr: &Attribute, word_type: &WordType) -> Result<u64> {
    let lit = int_value(attr)?;
    let value: u64 = lit.base10_parse()?;
    if value > word_type.max {
        return Err(Error::new(
            lit.span(),
            format!("value does not fit a `{}` word", word_type.ident),
        ));
    }
    Ok(value)
}

/// Converts the visibility of a field to the same visibility from inside the field module.
fn nested_visibility(visibility: &Visibility) -> Visibility {
    match visibility {
        Visibility::Public(_) => visibility.clone(),
        Visibility::Inherited => parse_quote! { pub(super) },
        Visibility::Restricted(VisRestricted { path, .. }) => {
            let first = path.segments.first().map(|segment| &segment.ident);
            if path.leading_colon.is_some() || first.map_or(false, |ident| ident == "crate") {
                visibility.clone()
            } else if first.map_or(false, |ident| ident == "self") {
                let rest = path.segments.iter().skip(1);
                parse_quote! { pub(in super #(::#rest)*) }
            } else {
                parse_quote! { pub(in super::#path) }
            }
        }
    }
}

/// Returns the visibility of a field marker, which may not exceed the visibility of its layout.
fn marker_visibility(set_visibility: &Visibility, field_visibility: &Visibility) -> Visibility {
    let crate_wide = |visibility: &Visibility| match visibility {
        Visibility::Public(_) => true,
        Visibility::Restricted(VisRestricted { path, .. }) => path.is_ident("crate"),
        Visibility::Inherited => false,
    };
    match (set_visibility, field_visibility) {
        (Visibility::Public(_), _) | (_, Visibility::Inherited) => {
            nested_visibility(field_visibility)
        }
        (Visibility::Inherited, _) => parse_quote! { pub(super) },
        (set, field) if crate_wide(field) => nested_visibility(set),
        (_, field) => nested_visibility(field),
    }
}

/// Converts an upper camel case name to snake case, e.g. `UartRegs` to `uart_regs`.
fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let boundary = match i.checked_sub(1).map(|j| chars[j]) {
                Some(prev) if prev.is_lowercase() || prev.is_ascii_digit() => true,
                Some(prev) if prev.is_uppercase() => {
                    chars.get(i + 1).map_or(false, |next| next.is_lowercase())
                }
                _ => false,
            };
            if boundary {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

fn module_name(name: &Ident) -> Ident {
    let snake = snake_case(&name.to_string());
    let span = name.span();
    match snake.as_str() {
        "crate" | "self" | "super" => format_ident!("{}_", snake, span = span),
        _ if syn::parse_str::<Ident>(&snake).is_err() => Ident::new_raw(&snake, span),
        _ => Ident::new(&snake, span),
    }
}
