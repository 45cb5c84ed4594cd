//! The type algebra: pure functions computing the result schema of an
//! operator from its operand schemas.
//!
//! Both compiler passes ([`crate::expr_to_op`] and [`crate::infer`]) call into
//! this single implementation, so the schema they derive for the same tree
//! cannot diverge. Nothing here allocates shared state or touches a scope;
//! every function is a plain value-in, value-out rule.

use crate::error::CompileError;
use crate::operation::{BinaryOperator, LiteralValue, UnaryOperator};
use crate::schema::{BooleanFormat, SchemaNode};
use itertools::Itertools;

/// Classification of a schema within the numeric promotion hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numeric {
    Integer,
    Decimal { percent: bool },
    Currency { lcid: u32 },
}

fn numeric_class(schema: &SchemaNode) -> Option<Numeric> {
    match schema {
        SchemaNode::Integer { .. } => Some(Numeric::Integer),
        SchemaNode::Decimal {
            show_as_percent, ..
        } => Some(Numeric::Decimal {
            percent: *show_as_percent,
        }),
        SchemaNode::Currency { lcid, .. } => Some(Numeric::Currency { lcid: *lcid }),
        _ => None,
    }
}

fn decimal_with_percent(percent: bool) -> SchemaNode {
    SchemaNode::Decimal {
        min: None,
        max: None,
        lcid: None,
        show_as_percent: percent,
    }
}

fn mismatch(op: BinaryOperator, left: &SchemaNode, right: &SchemaNode) -> CompileError {
    CompileError::SchemaMismatch {
        operator: op.name(),
        detail: format!("{left} and {right}"),
    }
}

/// The schema a literal payload classifies as.
///
/// Numeric literals are always decimal-typed; the compiler never infers
/// `integer` from a literal value.
pub fn literal_schema(value: &LiteralValue) -> SchemaNode {
    match value {
        LiteralValue::Bool(_) => SchemaNode::boolean(BooleanFormat::Checkbox),
        LiteralValue::Number(_) => SchemaNode::decimal(),
        LiteralValue::Text(_) => SchemaNode::text(None),
    }
}

/// Resolves a named field against a `Complex` schema, or transparently
/// through a `LookupBelongs` relationship's target schema.
pub fn resolve_field<'a>(
    schema: &'a SchemaNode,
    field: &str,
) -> Result<&'a SchemaNode, CompileError> {
    match schema {
        SchemaNode::Complex { fields, .. } => fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| &f.schema)
            .ok_or_else(|| CompileError::UnknownField {
                field: field.to_string(),
            }),
        SchemaNode::LookupBelongs { lookup_schema, .. } => resolve_field(lookup_schema, field),
        other => Err(CompileError::InvalidFieldAccess {
            field: field.to_string(),
            target: other.kind_name(),
        }),
    }
}

/// Unwraps the element schema of a collection-like node: a `Collection`
/// directly, or the target schema of a one-to-many / many-to-many
/// relationship.
pub fn element_schema_of(schema: &SchemaNode) -> Result<&SchemaNode, CompileError> {
    match schema {
        SchemaNode::Collection { element_schema } => Ok(element_schema),
        SchemaNode::LookupContains { lookup_schema, .. } => Ok(lookup_schema),
        SchemaNode::LookupHasMany { lookup_schema, .. } => Ok(lookup_schema),
        other => Err(CompileError::NotACollection {
            got: other.kind_name(),
        }),
    }
}

/// The common element schema of a collection literal. Elements must agree
/// under deep structural equality; an empty literal gets an empty `Complex`
/// placeholder.
pub fn collection_element_schema(schemas: &[SchemaNode]) -> Result<SchemaNode, CompileError> {
    let Some((first, rest)) = schemas.split_first() else {
        return Ok(SchemaNode::empty_complex());
    };
    if schemas.iter().all_equal() {
        Ok(first.clone())
    } else {
        // Report the first element whose schema breaks the run.
        let got = rest.iter().find(|s| *s != first).unwrap_or(first);
        Err(CompileError::HeterogeneousCollection {
            expected: first.to_string(),
            got: got.to_string(),
        })
    }
}

/// `resultSchema(op, left, right)` for every binary operator; fails with
/// `SchemaMismatch` on combinations the algebra does not define.
pub fn binary_result_schema(
    op: BinaryOperator,
    left: &SchemaNode,
    right: &SchemaNode,
) -> Result<SchemaNode, CompileError> {
    use BinaryOperator::*;
    match op {
        Add | Subtract => additive(op, left, right),
        Multiply => multiplicative(op, left, right),
        Divide => division(op, left, right),
        // Loose comparison is intentionally permissive at the schema level;
        // operand mismatches surface at execution time.
        Equal | NotEqual => Ok(SchemaNode::boolean(BooleanFormat::Checkbox)),
        Greater | GreaterOrEqual | Less | LessOrEqual => {
            if numeric_class(left).is_some() && numeric_class(right).is_some() {
                Ok(SchemaNode::boolean(BooleanFormat::Checkbox))
            } else {
                Err(mismatch(op, left, right))
            }
        }
        And | Or => match (left, right) {
            (
                SchemaNode::Boolean { format: left_fmt },
                SchemaNode::Boolean { format: right_fmt },
            ) => {
                let format = if *left_fmt == BooleanFormat::YesNo
                    && *right_fmt == BooleanFormat::YesNo
                {
                    BooleanFormat::YesNo
                } else {
                    BooleanFormat::Checkbox
                };
                Ok(SchemaNode::boolean(format))
            }
            _ => Err(mismatch(op, left, right)),
        },
    }
}

/// add / subtract: promote through integer → decimal → currency; two
/// currencies must agree on lcid.
fn additive(
    op: BinaryOperator,
    left: &SchemaNode,
    right: &SchemaNode,
) -> Result<SchemaNode, CompileError> {
    use Numeric::*;
    let (Some(l), Some(r)) = (numeric_class(left), numeric_class(right)) else {
        return Err(mismatch(op, left, right));
    };
    match (l, r) {
        (Integer, Integer) => Ok(SchemaNode::integer()),
        (Integer, Decimal { percent }) | (Decimal { percent }, Integer) => {
            Ok(decimal_with_percent(percent))
        }
        (Decimal { percent: a }, Decimal { percent: b }) => Ok(decimal_with_percent(a || b)),
        (Integer | Decimal { .. }, Currency { lcid })
        | (Currency { lcid }, Integer | Decimal { .. }) => Ok(SchemaNode::currency(lcid)),
        (Currency { lcid: a }, Currency { lcid: b }) => {
            if a == b {
                Ok(SchemaNode::currency(a))
            } else {
                Err(CompileError::SchemaMismatch {
                    operator: op.name(),
                    detail: format!("currency lcids {a} and {b} differ"),
                })
            }
        }
    }
}

/// multiply: as additive, except two currencies are never multiplied — the
/// product of two money amounts is meaningless.
fn multiplicative(
    op: BinaryOperator,
    left: &SchemaNode,
    right: &SchemaNode,
) -> Result<SchemaNode, CompileError> {
    use Numeric::*;
    if let (Some(Currency { .. }), Some(Currency { .. })) =
        (numeric_class(left), numeric_class(right))
    {
        return Err(mismatch(op, left, right));
    }
    additive(op, left, right)
}

/// divide: integer/integer stays integer; currency/currency is a plain ratio;
/// otherwise promote as additive.
fn division(
    op: BinaryOperator,
    left: &SchemaNode,
    right: &SchemaNode,
) -> Result<SchemaNode, CompileError> {
    use Numeric::*;
    if let (Some(Currency { .. }), Some(Currency { .. })) =
        (numeric_class(left), numeric_class(right))
    {
        // A money amount divided by a money amount is no longer money.
        return Ok(SchemaNode::decimal());
    }
    additive(op, left, right)
}

/// `resultSchema(op, operand)` for the unary operators.
pub fn unary_result_schema(
    op: UnaryOperator,
    operand: &SchemaNode,
) -> Result<SchemaNode, CompileError> {
    match op {
        UnaryOperator::Not => match operand {
            SchemaNode::Boolean { format } => Ok(SchemaNode::boolean(*format)),
            other => Err(CompileError::SchemaMismatch {
                operator: op.name(),
                detail: format!("operand {other}"),
            }),
        },
        UnaryOperator::Negate => {
            if numeric_class(operand).is_some() {
                Ok(operand.clone())
            } else {
                Err(CompileError::SchemaMismatch {
                    operator: op.name(),
                    detail: format!("operand {operand}"),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ComplexField;
    use BinaryOperator::*;

    fn percent() -> SchemaNode {
        SchemaNode::Decimal {
            min: None,
            max: None,
            lcid: None,
            show_as_percent: true,
        }
    }

    #[test]
    fn test_additive_promotion_table() {
        struct Case {
            op: BinaryOperator,
            left: SchemaNode,
            right: SchemaNode,
            expected: SchemaNode,
        }
        let cases = vec![
            Case {
                op: Add,
                left: SchemaNode::integer(),
                right: SchemaNode::integer(),
                expected: SchemaNode::integer(),
            },
            Case {
                op: Add,
                left: SchemaNode::integer(),
                right: SchemaNode::decimal(),
                expected: SchemaNode::decimal(),
            },
            Case {
                op: Subtract,
                left: percent(),
                right: SchemaNode::integer(),
                expected: percent(),
            },
            Case {
                op: Add,
                left: SchemaNode::decimal(),
                right: percent(),
                expected: percent(),
            },
            Case {
                op: Add,
                left: SchemaNode::decimal(),
                right: SchemaNode::currency(1033),
                expected: SchemaNode::currency(1033),
            },
            Case {
                op: Subtract,
                left: SchemaNode::currency(1036),
                right: SchemaNode::integer(),
                expected: SchemaNode::currency(1036),
            },
            Case {
                op: Add,
                left: SchemaNode::currency(1033),
                right: SchemaNode::currency(1033),
                expected: SchemaNode::currency(1033),
            },
        ];
        for case in cases {
            let actual = binary_result_schema(case.op, &case.left, &case.right).unwrap();
            assert_eq!(
                actual, case.expected,
                "{} {:?} {}",
                case.left, case.op, case.right
            );
        }
    }

    #[test]
    fn test_additive_currency_lcid_mismatch_fails() {
        let err = binary_result_schema(Add, &SchemaNode::currency(1033), &SchemaNode::currency(1036))
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::SchemaMismatch {
                operator: "add",
                detail: "currency lcids 1033 and 1036 differ".to_string(),
            }
        );
    }

    #[test]
    fn test_additive_rejects_non_numeric() {
        assert!(binary_result_schema(Add, &SchemaNode::text(None), &SchemaNode::integer()).is_err());
        assert!(binary_result_schema(
            Subtract,
            &SchemaNode::integer(),
            &SchemaNode::boolean(BooleanFormat::Checkbox)
        )
        .is_err());
    }

    #[test]
    fn test_multiply_two_currencies_is_undefined() {
        assert!(binary_result_schema(
            Multiply,
            &SchemaNode::currency(1033),
            &SchemaNode::currency(1033)
        )
        .is_err());
        // One currency side is fine and keeps its lcid.
        assert_eq!(
            binary_result_schema(Multiply, &SchemaNode::currency(1036), &SchemaNode::decimal())
                .unwrap(),
            SchemaNode::currency(1036)
        );
        assert_eq!(
            binary_result_schema(Multiply, &SchemaNode::integer(), &SchemaNode::currency(1033))
                .unwrap(),
            SchemaNode::currency(1033)
        );
    }

    #[test]
    fn test_divide_rules() {
        assert_eq!(
            binary_result_schema(Divide, &SchemaNode::integer(), &SchemaNode::integer()).unwrap(),
            SchemaNode::integer()
        );
        // currency / currency is a ratio, not money.
        assert_eq!(
            binary_result_schema(
                Divide,
                &SchemaNode::currency(1033),
                &SchemaNode::currency(1036)
            )
            .unwrap(),
            SchemaNode::decimal()
        );
        assert_eq!(
            binary_result_schema(Divide, &SchemaNode::currency(1033), &SchemaNode::integer())
                .unwrap(),
            SchemaNode::currency(1033)
        );
        assert_eq!(
            binary_result_schema(Divide, &SchemaNode::integer(), &SchemaNode::decimal()).unwrap(),
            SchemaNode::decimal()
        );
    }

    #[test]
    fn test_equality_is_boolean_for_any_operands() {
        let combos = vec![
            (SchemaNode::integer(), SchemaNode::text(None)),
            (SchemaNode::decimal(), SchemaNode::decimal()),
            (
                SchemaNode::boolean(BooleanFormat::YesNo),
                SchemaNode::currency(1033),
            ),
        ];
        for (left, right) in combos {
            assert_eq!(
                binary_result_schema(Equal, &left, &right).unwrap(),
                SchemaNode::boolean(BooleanFormat::Checkbox)
            );
            assert_eq!(
                binary_result_schema(NotEqual, &left, &right).unwrap(),
                SchemaNode::boolean(BooleanFormat::Checkbox)
            );
        }
    }

    #[test]
    fn test_ordering_requires_numeric_family() {
        for op in [Greater, GreaterOrEqual, Less, LessOrEqual] {
            assert_eq!(
                binary_result_schema(op, &SchemaNode::currency(1033), &SchemaNode::decimal())
                    .unwrap(),
                SchemaNode::boolean(BooleanFormat::Checkbox)
            );
            assert!(binary_result_schema(op, &SchemaNode::text(None), &SchemaNode::text(None))
                .is_err());
        }
    }

    #[test]
    fn test_logic_operators_propagate_yes_no_format() {
        let yes_no = SchemaNode::boolean(BooleanFormat::YesNo);
        let checkbox = SchemaNode::boolean(BooleanFormat::Checkbox);
        assert_eq!(
            binary_result_schema(And, &yes_no, &yes_no).unwrap(),
            yes_no
        );
        assert_eq!(
            binary_result_schema(Or, &yes_no, &checkbox).unwrap(),
            checkbox
        );
        assert!(binary_result_schema(And, &yes_no, &SchemaNode::integer()).is_err());
    }

    #[test]
    fn test_unary_rules() {
        let yes_no = SchemaNode::boolean(BooleanFormat::YesNo);
        assert_eq!(
            unary_result_schema(UnaryOperator::Not, &yes_no).unwrap(),
            yes_no
        );
        assert!(unary_result_schema(UnaryOperator::Not, &SchemaNode::integer()).is_err());
        assert_eq!(
            unary_result_schema(UnaryOperator::Negate, &SchemaNode::currency(1033)).unwrap(),
            SchemaNode::currency(1033)
        );
        assert!(unary_result_schema(UnaryOperator::Negate, &SchemaNode::text(None)).is_err());
    }

    #[test]
    fn test_literal_classification() {
        assert_eq!(
            literal_schema(&LiteralValue::Bool(true)),
            SchemaNode::boolean(BooleanFormat::Checkbox)
        );
        // No integer inference from literals: every number is decimal-typed.
        assert_eq!(literal_schema(&LiteralValue::Number(0.0)), SchemaNode::decimal());
        assert_eq!(
            literal_schema(&LiteralValue::Text("x".to_string())),
            SchemaNode::text(None)
        );
    }

    #[test]
    fn test_resolve_field_through_lookup_belongs() {
        let supplier = SchemaNode::Complex {
            fields: vec![ComplexField {
                name: "companyName".to_string(),
                title: "Company Name".to_string(),
                schema: SchemaNode::text(Some(40)),
                is_nullable: false,
            }],
            key: vec![],
        };
        let relationship = SchemaNode::LookupBelongs {
            lookup_schema: Box::new(supplier),
            foreign_field_names: vec!["supplierId".to_string()],
        };
        assert_eq!(
            resolve_field(&relationship, "companyName").unwrap(),
            &SchemaNode::text(Some(40))
        );
        assert_eq!(
            resolve_field(&relationship, "missing").unwrap_err(),
            CompileError::UnknownField {
                field: "missing".to_string()
            }
        );
        assert_eq!(
            resolve_field(&SchemaNode::integer(), "anything").unwrap_err(),
            CompileError::InvalidFieldAccess {
                field: "anything".to_string(),
                target: "integer"
            }
        );
    }

    #[test]
    fn test_element_schema_unwraps_collection_like_kinds() {
        let entity = SchemaNode::empty_complex();
        assert_eq!(
            element_schema_of(&SchemaNode::collection(entity.clone())).unwrap(),
            &entity
        );
        let contains = SchemaNode::LookupContains {
            lookup_schema: Box::new(entity.clone()),
            lookup_foreign_field_names: vec!["orderId".to_string()],
        };
        assert_eq!(element_schema_of(&contains).unwrap(), &entity);
        assert_eq!(
            element_schema_of(&SchemaNode::integer()).unwrap_err(),
            CompileError::NotACollection { got: "integer" }
        );
    }

    #[test]
    fn test_collection_element_schema_homogeneity() {
        assert_eq!(
            collection_element_schema(&[]).unwrap(),
            SchemaNode::empty_complex()
        );
        assert_eq!(
            collection_element_schema(&[SchemaNode::decimal(), SchemaNode::decimal()]).unwrap(),
            SchemaNode::decimal()
        );
        let err = collection_element_schema(&[SchemaNode::decimal(), SchemaNode::text(None)])
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::HeterogeneousCollection {
                expected: "decimal".to_string(),
                got: "text".to_string(),
            }
        );
    }
}
