use proc_macro2::Span;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    braced, bracketed, parenthesized, token, Attribute, Ident, LitInt, Path, Result, Token,
    Visibility,
};

pub struct Input {
    _paren_token: token::Paren,
    pub crate_path: Path,
    _comma_token: Token![,],
    pub sets: Vec<FieldSet>,
}

impl Parse for Input {
    fn parse(input: ParseStream) -> Result<Self> {
        let content;
        Ok(Input {
            _paren_token: parenthesized!(content in input),
            crate_path: content.parse()?,
            _comma_token: content.parse()?,
            sets: {
                let mut sets = Vec::new();
                while !content.is_empty() {
                    sets.push(content.parse()?);
                }
                sets
            },
        })
    }
}

/// `struct Name: [word_type; word_count] { fields }`
pub struct FieldSet {
    pub attrs: Vec<Attribute>,
    pub visibility: Visibility,
    _struct_token: Token![struct],
    pub name: Ident,
    _colon_token: Token![:],
    _bracket_token: token::Bracket,
    pub word_type: Ident,
    _semi_token: Token![;],
    pub word_count: LitInt,
    _brace_token: token::Brace,
    pub fields: Punctuated<Field, Token![,]>,
}

impl Parse for FieldSet {
    fn parse(input: ParseStream) -> Result<Self> {
        let words;
        let body;
        Ok(Self {
            attrs: input.call(Attribute::parse_outer)?,
            visibility: input.parse()?,
            _struct_token: input.parse()?,
            name: input.parse()?,
            _colon_token: input.parse()?,
            _bracket_token: bracketed!(words in input),
            word_type: words.parse()?,
            _semi_token: words.parse()?,
            word_count: words.parse()?,
            _brace_token: braced!(body in input),
            fields: body.parse_terminated(Field::parse, Token![,])?,
        })
    }
}

/// `Name: word[bits]`, where `word` is optional.
pub struct Field {
    pub attrs: Vec<Attribute>,
    pub visibility: Visibility,
    pub name: Ident,
    _colon_token: Token![:],
    pub word: Option<LitInt>,
    _bracket_token: token::Bracket,
    pub bits: BitRange,
}

impl Parse for Field {
    fn parse(input: ParseStream) -> Result<Self> {
        let bits;
        Ok(Self {
            attrs: input.call(Attribute::parse_outer)?,
            visibility: input.parse()?,
            name: input.parse()?,
            _colon_token: input.parse()?,
            word: {
                if input.peek(LitInt) {
                    Some(input.parse()?)
                } else {
                    None
                }
            },
            _bracket_token: bracketed!(bits in input),
            bits: bits.parse()?,
        })
    }
}

pub enum BitRange {
    /// `[n]`
    Single(LitInt),
    /// `[lsb..=msb]`
    Inclusive {
        lsb: LitInt,
        _dot_dot_eq_token: Token![..=],
        msb: LitInt,
    },
    /// `[lsb..]`, up to the top bit of the word.
    ToTop {
        lsb: LitInt,
        dot_dot_token: Token![..],
    },
}

impl BitRange {
    pub fn lsb(&self) -> &LitInt {
        match self {
            Self::Single(bit) => bit,
            Self::Inclusive { lsb, .. } | Self::ToTop { lsb, .. } => lsb,
        }
    }

    /// Returns the explicit most significant bit, if any.
    pub fn msb(&self) -> Option<&LitInt> {
        match self {
            Self::Single(bit) => Some(bit),
            Self::Inclusive { msb, .. } => Some(msb),
            Self::ToTop { .. } => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Single(bit) => bit.span(),
            Self::Inclusive { lsb, msb, .. } => lsb.span().join(msb.span()).unwrap_or(lsb.span()),
            Self::ToTop { lsb, dot_dot_token } => lsb
                .span()
                .join(dot_dot_token.span())
                .unwrap_or(lsb.span()),
        }
    }
}

impl Parse for BitRange {
    fn parse(input: ParseStream) -> Result<Self> {
        let lsb = input.parse()?;
        let lookahead = input.lookahead1();
        if lookahead.peek(Token![..=]) {
            Ok(Self::Inclusive {
                lsb,
                _dot_dot_eq_token: input.parse()?,
                msb: input.parse()?,
            })
        } else if lookahead.peek(Token![..]) {
            let dot_dot_token = input.parse()?;
            if !input.is_empty() {
                return Err(input.error("exclusive bit ranges are not supported, use `..=`"));
            }
            Ok(Self::ToTop { lsb, dot_dot_token })
        } else if input.is_empty() {
            Ok(Self::Single(lsb))
        } else {
            Err(lookahead.error())
        }
    }
}
