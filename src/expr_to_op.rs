//! `expr_to_op` lowers an externally-parsed expression tree into a
//! `QueryOperation` and the `SchemaNode` of the value it produces.
//!
//! The walk is bottom-up under a lexical [`Scope`]: it both builds the
//! operation tree and proves its type in a single traversal, so a
//! successfully-lowered expression can never reference an unbound name or a
//! nonexistent field. A tree supplied directly as data goes through
//! [`crate::infer`] instead; the two passes share [`crate::typing`] so they
//! agree node-for-node.

use crate::error::CompileError;
use crate::expr::{ExprOperator, Expression};
use crate::operation::{BinaryOperator, ElementField, QueryOperation};
use crate::schema::{ComplexField, SchemaNode};
use crate::scope::Scope;
use crate::typing;

/// Lowers `expr` under `scope`, returning the operation node and the schema
/// of the data it will produce.
pub fn lower(
    scope: &Scope,
    expr: &Expression,
) -> Result<(QueryOperation, SchemaNode), CompileError> {
    match expr {
        Expression::Parameter { name } => {
            let schema = scope
                .lookup(name)
                .ok_or_else(|| CompileError::UnboundName(name.clone()))?;
            Ok((QueryOperation::Parameter { name: name.clone() }, schema.clone()))
        }
        Expression::Constant { value } => Ok((
            QueryOperation::Literal {
                value: value.clone(),
            },
            typing::literal_schema(value),
        )),
        Expression::ObjectLiteral { properties } => {
            let mut fields = Vec::with_capacity(properties.len());
            let mut schema_fields = Vec::with_capacity(properties.len());
            for property in properties {
                let (value, schema) = lower(scope, &property.value)?;
                fields.push(ElementField {
                    name: property.name.clone(),
                    value,
                });
                // Ad-hoc projections carry no null-safety guarantee.
                schema_fields.push(ComplexField {
                    name: property.name.clone(),
                    title: property.name.clone(),
                    schema,
                    is_nullable: true,
                });
            }
            Ok((
                QueryOperation::ElementLiteral { fields },
                SchemaNode::Complex {
                    fields: schema_fields,
                    key: vec![],
                },
            ))
        }
        Expression::ArrayLiteral { elements } => {
            let mut ops = Vec::with_capacity(elements.len());
            let mut schemas = Vec::with_capacity(elements.len());
            for element in elements {
                let (op, schema) = lower(scope, element)?;
                ops.push(op);
                schemas.push(schema);
            }
            let element_schema = typing::collection_element_schema(&schemas)?;
            Ok((
                QueryOperation::CollectionLiteral { elements: ops },
                SchemaNode::collection(element_schema),
            ))
        }
        Expression::PropertyAccess { expression, name } => {
            let (element, element_schema) = lower(scope, expression)?;
            let field_schema = typing::resolve_field(&element_schema, name)?.clone();
            Ok((
                QueryOperation::FieldReference {
                    element: Box::new(element),
                    field_name: name.clone(),
                },
                field_schema,
            ))
        }
        Expression::Binary {
            operator,
            left,
            right,
        } => {
            // Only the equality kinds are accepted at the expression layer;
            // richer operators are reachable through hand-built trees.
            let op = match operator {
                ExprOperator::Equals | ExprOperator::StrictEquals => BinaryOperator::Equal,
                ExprOperator::NotEquals | ExprOperator::NotStrictEquals => BinaryOperator::NotEqual,
                other => {
                    return Err(CompileError::Unsupported {
                        operation: format!("expression operator '{}'", other.name()),
                    })
                }
            };
            let (left_op, left_schema) = lower(scope, left)?;
            let (right_op, right_schema) = lower(scope, right)?;
            let schema = typing::binary_result_schema(op, &left_schema, &right_schema)?;
            Ok((op.build(left_op, right_op), schema))
        }
        Expression::Call { callee, arguments } => lower_call(scope, callee, arguments),
        Expression::Lambda { .. } => Err(CompileError::InvalidArgument(
            "a lambda is only valid as the argument of filter or map".to_string(),
        )),
    }
}

/// Lowers a method call. Only `filter` and `map` on a collection-like target
/// are accepted, each taking exactly one single-parameter lambda.
fn lower_call(
    scope: &Scope,
    callee: &Expression,
    arguments: &[Expression],
) -> Result<(QueryOperation, SchemaNode), CompileError> {
    let Expression::PropertyAccess {
        expression: target,
        name: method,
    } = callee
    else {
        return Err(CompileError::InvalidArgument(
            "only method calls on a collection can be lowered".to_string(),
        ));
    };
    if method != "filter" && method != "map" {
        return Err(CompileError::Unsupported {
            operation: format!("method '{method}'"),
        });
    }

    let (source, source_schema) = lower(scope, target)?;
    let element_schema = typing::element_schema_of(&source_schema)?.clone();
    let (parameter_name, body) = single_lambda_argument(arguments)?;
    let inner = scope.extended(&parameter_name, element_schema);
    let (body_op, body_schema) = lower(&inner, body)?;

    if method == "filter" {
        if !body_schema.is_boolean() {
            return Err(CompileError::PredicateNotBoolean {
                got: body_schema.to_string(),
            });
        }
        // Filtering narrows rows, not shape.
        Ok((
            QueryOperation::Filter {
                source: Box::new(source),
                parameter_name,
                predicate: Box::new(body_op),
            },
            source_schema,
        ))
    } else {
        Ok((
            QueryOperation::Map {
                source: Box::new(source),
                parameter_name,
                projection: Box::new(body_op),
            },
            SchemaNode::collection(body_schema),
        ))
    }
}

fn single_lambda_argument(
    arguments: &[Expression],
) -> Result<(String, &Expression), CompileError> {
    match arguments {
        [Expression::Lambda { parameters, body }] => match parameters.as_slice() {
            [name] => Ok((name.clone(), body)),
            _ => Err(CompileError::InvalidArgument(
                "lambda must take exactly one parameter".to_string(),
            )),
        },
        _ => Err(CompileError::InvalidArgument(
            "expected exactly one lambda argument".to_string(),
        )),
    }
}
