//! Literal values used as parameter defaults and declaration initializers.

use std::fmt;

use ordered_float::OrderedFloat;

/// A compile-time literal.
///
/// `Null` doubles as "no explicit default": an optional parameter written as
/// `string name = null` seeds its target type's zero value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Null,
    Int(i64),
    Char(u8),
    Float(OrderedFloat<f64>),
    Bool(bool),
    String(String),
    Array(Vec<Literal>),
}

/// The kind of a [`Literal`], used in conversion diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Null,
    Int,
    Char,
    Float,
    Bool,
    String,
    Array,
}

impl Literal {
    pub fn float(value: f64) -> Self {
        Literal::Float(OrderedFloat(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Literal::String(value.into())
    }

    pub fn kind(&self) -> LiteralKind {
        match self {
            Literal::Null => LiteralKind::Null,
            Literal::Int(_) => LiteralKind::Int,
            Literal::Char(_) => LiteralKind::Char,
            Literal::Float(_) => LiteralKind::Float,
            Literal::Bool(_) => LiteralKind::Bool,
            Literal::String(_) => LiteralKind::String,
            Literal::Array(_) => LiteralKind::Array,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Render as a C expression.
    ///
    /// Arrays have no C expression form and render as `None`.
    pub fn to_c(&self) -> Option<String> {
        let c = match self {
            Literal::Null => "0".to_string(),
            Literal::Int(value) => value.to_string(),
            Literal::Char(byte) => c_char_literal(*byte),
            Literal::Float(value) => c_double_literal(value.0),
            Literal::Bool(value) => if *value { "1" } else { "0" }.to_string(),
            Literal::String(value) => c_string_literal(value),
            Literal::Array(_) => return None,
        };
        Some(c)
    }
}

impl LiteralKind {
    /// Integer and char literals.
    pub fn is_int_like(self) -> bool {
        matches!(self, LiteralKind::Int | LiteralKind::Char)
    }
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LiteralKind::Null => "null",
            LiteralKind::Int => "integer",
            LiteralKind::Char => "char",
            LiteralKind::Float => "double",
            LiteralKind::Bool => "bool",
            LiteralKind::String => "string",
            LiteralKind::Array => "array",
        })
    }
}

/// Quote and escape a string for use as a C string literal.
pub fn c_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for byte in value.bytes() {
        push_escaped(&mut out, byte, b'"');
    }
    out.push('"');
    out
}

fn c_char_literal(byte: u8) -> String {
    let mut out = String::from("'");
    push_escaped(&mut out, byte, b'\'');
    out.push('\'');
    out
}

fn push_escaped(out: &mut String, byte: u8, quote: u8) {
    match byte {
        b'\\' => out.push_str("\\\\"),
        b'\n' => out.push_str("\\n"),
        b'\r' => out.push_str("\\r"),
        b'\t' => out.push_str("\\t"),
        b if b == quote => {
            out.push('\\');
            out.push(b as char);
        }
        0x20..=0x7e => out.push(byte as char),
        _ => out.push_str(&format!("\\x{byte:02x}")),
    }
}

/// Non-finite values use the `<math.h>` macros.
fn c_double_literal(value: f64) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INFINITY" } else { "-INFINITY" }.to_string();
    }
    let text = value.to_string();
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.0")
    }
}
