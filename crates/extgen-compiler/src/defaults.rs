//! Default Value Synthesizer.
//!
//! Produces the initialization sequence that seeds a variable of a given
//! low-level type from a literal. Lossy conversions (double to integer,
//! integer to double) are applied at compile time; every combination the
//! target type cannot represent fails with `UnsupportedDefaultConversion`.
//!
//! | target          | null             | int-like  | double   | bool      | string   | array       |
//! |-----------------|------------------|-----------|----------|-----------|----------|-------------|
//! | integer family  | `0`              | verbatim  | truncate | error     | error    | error       |
//! | double          | `0`              | widen     | verbatim | error     | error    | error       |
//! | bool            | `0`              | error     | error    | verbatim  | error    | error       |
//! | string          | empty string     | error     | error    | error     | verbatim | error       |
//! | array           | empty array      | error     | error    | error     | error    | verbatim    |
//! | generic boxed   | shared null/copy | boxed int | boxed dbl| shared/copy| boxed str| boxed array |

use extgen_core::{
    CompilationError, Literal, LowLevelType, RuntimeConstants, SingletonKind, Span,
    c_string_literal,
};

use crate::Result;
use crate::mutation::MutationEstimate;
use crate::symbols::Variable;

/// Generated initialization code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initialization {
    pub lines: Vec<String>,
    /// The code allocates heap-managed storage and needs a managed frame.
    pub allocates: bool,
}

impl Initialization {
    fn plain(line: String) -> Self {
        Self {
            lines: vec![line],
            allocates: false,
        }
    }

    fn boxed(lines: Vec<String>) -> Self {
        Self {
            lines,
            allocates: true,
        }
    }
}

/// Builds initialization code for literal defaults.
#[derive(Debug, Clone, Copy)]
pub struct DefaultSynthesizer<'c> {
    constants: &'c RuntimeConstants,
}

impl<'c> DefaultSynthesizer<'c> {
    pub fn new(constants: &'c RuntimeConstants) -> Self {
        Self { constants }
    }

    /// Seed `var` from `literal`.
    ///
    /// `rebinds` comes from the unit's mutation provider and decides whether
    /// a boxed null or bool may point at the shared singleton.
    pub fn synthesize(
        &self,
        var: &Variable,
        literal: &Literal,
        rebinds: MutationEstimate,
        span: Span,
    ) -> Result<Initialization> {
        let ty = var.ty();
        let name = var.name();
        let unsupported = || CompilationError::UnsupportedDefaultConversion {
            name: name.to_string(),
            target: ty,
            literal: literal.kind(),
            span,
        };

        if ty.is_integer() || matches!(ty, LowLevelType::Double | LowLevelType::Bool) {
            let value = scalar_value(ty, literal).ok_or_else(unsupported)?;
            return Ok(Initialization::plain(format!("{name} = {value};")));
        }

        match ty {
            LowLevelType::String => match literal {
                Literal::Null => Ok(init_boxed(var, format!("ZVAL_EMPTY_STRING({});", var.boxed_ref()))),
                Literal::String(s) => Ok(init_boxed(var, zval_string(var, s))),
                _ => Err(unsupported()),
            },
            LowLevelType::Array => match literal {
                Literal::Null => Ok(init_boxed(var, format!("array_init({});", var.boxed_ref()))),
                Literal::Array(items) => build_array(var, items).ok_or_else(unsupported),
                _ => Err(unsupported()),
            },
            LowLevelType::Variable | LowLevelType::Mixed => match literal {
                Literal::Null => Ok(self.singleton_or_copy(var, SingletonKind::Null, rebinds)),
                Literal::Bool(v) => Ok(self.singleton_or_copy(var, SingletonKind::for_bool(*v), rebinds)),
                Literal::Int(v) => Ok(init_boxed(var, format!("ZVAL_LONG({}, {v});", var.boxed_ref()))),
                Literal::Char(_) => {
                    let c = literal.to_c().ok_or_else(unsupported)?;
                    Ok(init_boxed(var, format!("ZVAL_LONG({}, {c});", var.boxed_ref())))
                }
                Literal::Float(v) => Ok(init_boxed(
                    var,
                    format!("ZVAL_DOUBLE({}, {});", var.boxed_ref(), double_text(v.0)),
                )),
                Literal::String(s) => Ok(init_boxed(var, zval_string(var, s))),
                Literal::Array(items) => build_array(var, items).ok_or_else(unsupported),
            },
            LowLevelType::Object | LowLevelType::Callable | LowLevelType::Resource => match literal {
                Literal::Null => Ok(self.singleton_or_copy(var, SingletonKind::Null, rebinds)),
                _ => Err(unsupported()),
            },
            _ => Err(unsupported()),
        }
    }

    /// Point at the shared constant when the variable is rebound at most
    /// once; otherwise allocate a private copy it can mutate.
    fn singleton_or_copy(
        &self,
        var: &Variable,
        kind: SingletonKind,
        rebinds: MutationEstimate,
    ) -> Initialization {
        if rebinds.shares_singleton() && !var.is_local_only() {
            return Initialization::plain(format!(
                "{} = {};",
                var.name(),
                self.constants.address_of(kind)
            ));
        }
        let target = var.boxed_ref();
        let set = match kind {
            SingletonKind::Null => format!("ZVAL_NULL({target});"),
            SingletonKind::True => format!("ZVAL_BOOL({target}, 1);"),
            SingletonKind::False => format!("ZVAL_BOOL({target}, 0);"),
        };
        init_boxed(var, set)
    }
}

/// C expression seeding a native scalar of type `ty` from `literal`.
pub(crate) fn scalar_value(ty: LowLevelType, literal: &Literal) -> Option<String> {
    if ty.is_integer() {
        return match literal {
            Literal::Null => Some("0".to_string()),
            Literal::Int(v) => Some(v.to_string()),
            Literal::Char(_) => literal.to_c(),
            Literal::Float(v) if v.0.is_finite() => Some((v.0.trunc() as i64).to_string()),
            _ => None,
        };
    }
    match (ty, literal) {
        (LowLevelType::Double | LowLevelType::Bool, Literal::Null) => Some("0".to_string()),
        (LowLevelType::Double, Literal::Int(v)) => Some(double_text(*v as f64)),
        (LowLevelType::Double, Literal::Char(c)) => Some(double_text(f64::from(*c))),
        (LowLevelType::Double, Literal::Float(_)) => literal.to_c(),
        (LowLevelType::Bool, Literal::Bool(v)) => Some(u8::from(*v).to_string()),
        _ => None,
    }
}

fn init_boxed(var: &Variable, set: String) -> Initialization {
    Initialization::boxed(vec![format!("ZEPHIR_INIT_VAR({});", var.boxed_ref()), set])
}

fn zval_string(var: &Variable, value: &str) -> String {
    format!("ZVAL_STRING({}, {});", var.boxed_ref(), c_string_literal(value))
}

fn double_text(value: f64) -> String {
    Literal::float(value).to_c().unwrap_or_else(|| value.to_string())
}

/// Build a boxed array literal.
///
/// A nested array is filled in its own C block through an inline temporary
/// that the parent array then takes ownership of.
fn build_array(var: &Variable, items: &[Literal]) -> Option<Initialization> {
    let target = var.boxed_ref();
    let mut lines = vec![format!("ZEPHIR_INIT_VAR({target});")];
    fill_array(&target, var.name(), items, 0, &mut lines)?;
    Some(Initialization::boxed(lines))
}

fn fill_array(
    target: &str,
    base: &str,
    items: &[Literal],
    depth: usize,
    lines: &mut Vec<String>,
) -> Option<()> {
    let pad = "\t".repeat(depth);
    if items.is_empty() {
        lines.push(format!("{pad}array_init({target});"));
        return Some(());
    }

    lines.push(format!("{pad}zephir_create_array({target}, {}, 0);", items.len()));
    for item in items {
        let add = match item {
            Literal::Null => format!("add_next_index_null({target});"),
            Literal::Int(v) => format!("add_next_index_long({target}, {v});"),
            Literal::Char(_) => format!("add_next_index_long({target}, {});", item.to_c()?),
            Literal::Float(v) => format!("add_next_index_double({target}, {});", double_text(v.0)),
            Literal::Bool(v) => format!("add_next_index_bool({target}, {});", u8::from(*v)),
            Literal::String(s) => {
                format!("add_next_index_stringl({target}, SL({}));", c_string_literal(s))
            }
            Literal::Array(inner) => {
                let tmp = format!("{base}_nested{}", depth + 1);
                lines.push(format!("{pad}{{"));
                lines.push(format!("{pad}\tzval {tmp};"));
                fill_array(&format!("&{tmp}"), base, inner, depth + 1, lines)?;
                lines.push(format!("{pad}\tadd_next_index_zval({target}, &{tmp});"));
                lines.push(format!("{pad}}}"));
                continue;
            }
        };
        lines.push(format!("{pad}{add}"));
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{SymbolTable, VarFlags};
    use extgen_core::LiteralKind;

    const ONCE: MutationEstimate = MutationEstimate::Exact(1);
    const TWICE: MutationEstimate = MutationEstimate::Exact(2);

    fn var(ty: LowLevelType, flags: VarFlags) -> Variable {
        let mut table = SymbolTable::new();
        let var = table.declare("v", ty, Span::default()).unwrap();
        var.set_flag(flags);
        var.clone()
    }

    fn synth(ty: LowLevelType, literal: Literal) -> Result<Initialization> {
        let constants = RuntimeConstants::default();
        DefaultSynthesizer::new(&constants).synthesize(
            &var(ty, VarFlags::empty()),
            &literal,
            ONCE,
            Span::default(),
        )
    }

    fn samples() -> Vec<Literal> {
        vec![
            Literal::Null,
            Literal::Int(7),
            Literal::float(2.75),
            Literal::Bool(true),
            Literal::string("x"),
            Literal::Array(vec![]),
            Literal::Array(vec![Literal::Int(1), Literal::Array(vec![Literal::Int(2)])]),
        ]
    }

    fn allowed(ty: LowLevelType, kind: LiteralKind) -> bool {
        use LiteralKind as K;
        if ty.is_integer() || ty == LowLevelType::Double {
            return matches!(kind, K::Null | K::Int | K::Char | K::Float);
        }
        match ty {
            LowLevelType::Bool => matches!(kind, K::Null | K::Bool),
            LowLevelType::String => matches!(kind, K::Null | K::String),
            LowLevelType::Array => matches!(kind, K::Null | K::Array),
            LowLevelType::Variable | LowLevelType::Mixed => true,
            _ => false,
        }
    }

    #[test]
    fn conversion_table_is_total() {
        let targets = [
            LowLevelType::Int,
            LowLevelType::UInt,
            LowLevelType::Long,
            LowLevelType::ULong,
            LowLevelType::Char,
            LowLevelType::UChar,
            LowLevelType::Double,
            LowLevelType::Bool,
            LowLevelType::String,
            LowLevelType::Array,
            LowLevelType::Variable,
            LowLevelType::Mixed,
        ];
        for ty in targets {
            for literal in samples() {
                let kind = literal.kind();
                let result = synth(ty, literal);
                if allowed(ty, kind) {
                    let init = result.unwrap_or_else(|e| panic!("{ty} <- {kind}: {e}"));
                    assert!(!init.lines.is_empty());
                } else {
                    assert!(
                        matches!(result, Err(CompilationError::UnsupportedDefaultConversion { .. })),
                        "{ty} <- {kind} should be rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn integer_truncates_double() {
        let init = synth(LowLevelType::Int, Literal::float(2.75)).unwrap();
        assert_eq!(init.lines, vec!["v = 2;"]);
        assert!(!init.allocates);
    }

    #[test]
    fn double_widens_integer() {
        let init = synth(LowLevelType::Double, Literal::Int(3)).unwrap();
        assert_eq!(init.lines, vec!["v = 3.0;"]);
    }

    #[test]
    fn string_literal_into_integer_fails() {
        let err = synth(LowLevelType::Int, Literal::string("1")).unwrap_err();
        assert!(matches!(
            err,
            CompilationError::UnsupportedDefaultConversion {
                target: LowLevelType::Int,
                literal: LiteralKind::String,
                ..
            }
        ));
    }

    #[test]
    fn string_null_is_empty_string() {
        let constants = RuntimeConstants::default();
        let init = DefaultSynthesizer::new(&constants)
            .synthesize(
                &var(LowLevelType::String, VarFlags::LOCAL_ONLY),
                &Literal::Null,
                ONCE,
                Span::default(),
            )
            .unwrap();
        assert_eq!(init.lines, vec!["ZEPHIR_INIT_VAR(&v);", "ZVAL_EMPTY_STRING(&v);"]);
        assert!(init.allocates);
    }

    #[test]
    fn boxed_null_shares_singleton_when_rebound_once() {
        let init = synth(LowLevelType::Variable, Literal::Null).unwrap();
        assert_eq!(init.lines, vec!["v = &__$null;"]);
        assert!(!init.allocates);
    }

    #[test]
    fn boxed_bool_copies_when_rebound_twice() {
        let constants = RuntimeConstants::default();
        let init = DefaultSynthesizer::new(&constants)
            .synthesize(
                &var(LowLevelType::Variable, VarFlags::empty()),
                &Literal::Bool(false),
                TWICE,
                Span::default(),
            )
            .unwrap();
        assert_eq!(init.lines, vec!["ZEPHIR_INIT_VAR(v);", "ZVAL_BOOL(v, 0);"]);
        assert!(init.allocates);
    }

    #[test]
    fn conservative_write_forces_copy() {
        let constants = RuntimeConstants::default();
        let init = DefaultSynthesizer::new(&constants)
            .synthesize(
                &var(LowLevelType::Variable, VarFlags::empty()),
                &Literal::Null,
                MutationEstimate::Written(true),
                Span::default(),
            )
            .unwrap();
        assert_eq!(init.lines[1], "ZVAL_NULL(v);");
    }

    #[test]
    fn array_literal_verbatim() {
        let init = synth(
            LowLevelType::Array,
            Literal::Array(vec![Literal::Int(1), Literal::string("two")]),
        )
        .unwrap();
        assert_eq!(
            init.lines,
            vec![
                "ZEPHIR_INIT_VAR(v);",
                "zephir_create_array(v, 2, 0);",
                "add_next_index_long(v, 1);",
                "add_next_index_stringl(v, SL(\"two\"));",
            ]
        );
    }

    #[test]
    fn nested_array_fills_scoped_temporaries() {
        let init = synth(
            LowLevelType::Array,
            Literal::Array(vec![
                Literal::Int(1),
                Literal::Array(vec![Literal::Int(2), Literal::Array(vec![])]),
            ]),
        )
        .unwrap();
        assert_eq!(
            init.lines,
            vec![
                "ZEPHIR_INIT_VAR(v);",
                "zephir_create_array(v, 2, 0);",
                "add_next_index_long(v, 1);",
                "{",
                "\tzval v_nested1;",
                "\tzephir_create_array(&v_nested1, 2, 0);",
                "\tadd_next_index_long(&v_nested1, 2);",
                "\t{",
                "\t\tzval v_nested2;",
                "\t\tarray_init(&v_nested2);",
                "\t\tadd_next_index_zval(&v_nested1, &v_nested2);",
                "\t}",
                "\tadd_next_index_zval(v, &v_nested1);",
                "}",
            ]
        );
        assert!(init.allocates);
    }

    #[test]
    fn nested_array_into_generic_boxed() {
        let init = synth(
            LowLevelType::Variable,
            Literal::Array(vec![Literal::Array(vec![Literal::Bool(true)])]),
        )
        .unwrap();
        assert_eq!(init.lines[1], "zephir_create_array(v, 1, 0);");
        assert!(init.lines.contains(&"\tadd_next_index_bool(&v_nested1, 1);".to_string()));
        assert!(init.lines.contains(&"\tadd_next_index_zval(v, &v_nested1);".to_string()));
    }

    #[test]
    fn non_finite_double_cannot_seed_integer() {
        assert!(synth(LowLevelType::Int, Literal::float(f64::INFINITY)).is_err());
        assert!(synth(LowLevelType::Long, Literal::float(f64::NAN)).is_err());
        let init = synth(LowLevelType::Double, Literal::float(f64::INFINITY)).unwrap();
        assert_eq!(init.lines, vec!["v = INFINITY;"]);
    }

    #[test]
    fn object_only_defaults_to_null() {
        assert!(synth(LowLevelType::Object, Literal::Null).is_ok());
        assert!(synth(LowLevelType::Object, Literal::Int(1)).is_err());
    }

    #[test]
    fn internal_types_have_no_defaults() {
        assert!(synth(LowLevelType::HashTable, Literal::Null).is_err());
    }
}
