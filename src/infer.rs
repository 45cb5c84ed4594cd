//! `infer` re-derives the result schema of an already-built operation tree.
//!
//! This is the validation path for trees supplied directly as data (for
//! example, deserialized off the wire) rather than produced by lowering an
//! expression. It mirrors [`crate::expr_to_op`] node-by-node through the
//! shared [`crate::typing`] algebra. A node kind with no rule here fails
//! loudly with `Unsupported` — never a best-effort schema.

use crate::error::CompileError;
use crate::operation::{ElementField, QueryOperation, UnaryOperator};
use crate::schema::{ComplexField, SchemaNode};
use crate::scope::{Scope, DATA_SOURCE_NAME};
use crate::typing;

/// Infers the schema of the data `operation` will produce under `scope`.
pub fn infer_schema(scope: &Scope, operation: &QueryOperation) -> Result<SchemaNode, CompileError> {
    if let Some((op, left, right)) = operation.as_binary() {
        let left_schema = infer_schema(scope, left)?;
        let right_schema = infer_schema(scope, right)?;
        return typing::binary_result_schema(op, &left_schema, &right_schema);
    }
    match operation {
        QueryOperation::DataSourceReference => scope
            .data_source()
            .cloned()
            .ok_or_else(|| CompileError::UnboundName(DATA_SOURCE_NAME.to_string())),
        QueryOperation::Parameter { name } => scope
            .lookup(name)
            .cloned()
            .ok_or_else(|| CompileError::UnboundName(name.clone())),
        QueryOperation::Literal { value } => Ok(typing::literal_schema(value)),
        QueryOperation::ElementLiteral { fields } => element_literal_schema(scope, fields),
        QueryOperation::CollectionLiteral { elements } => {
            let schemas = elements
                .iter()
                .map(|element| infer_schema(scope, element))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SchemaNode::collection(typing::collection_element_schema(
                &schemas,
            )?))
        }
        QueryOperation::FieldReference {
            element,
            field_name,
        } => {
            let element_schema = infer_schema(scope, element)?;
            Ok(typing::resolve_field(&element_schema, field_name)?.clone())
        }
        QueryOperation::Filter {
            source,
            parameter_name,
            predicate,
        } => {
            let source_schema = infer_schema(scope, source)?;
            let element_schema = typing::element_schema_of(&source_schema)?.clone();
            let inner = scope.extended(parameter_name, element_schema);
            let predicate_schema = infer_schema(&inner, predicate)?;
            if !predicate_schema.is_boolean() {
                return Err(CompileError::PredicateNotBoolean {
                    got: predicate_schema.to_string(),
                });
            }
            // Filtering narrows rows, not shape.
            Ok(source_schema)
        }
        QueryOperation::Map {
            source,
            parameter_name,
            projection,
        } => {
            let source_schema = infer_schema(scope, source)?;
            let element_schema = typing::element_schema_of(&source_schema)?.clone();
            let inner = scope.extended(parameter_name, element_schema);
            let projection_schema = infer_schema(&inner, projection)?;
            Ok(SchemaNode::collection(projection_schema))
        }
        QueryOperation::Negate { operand } => {
            let operand_schema = infer_schema(scope, operand)?;
            typing::unary_result_schema(UnaryOperator::Negate, &operand_schema)
        }
        QueryOperation::Not { operand } => {
            let operand_schema = infer_schema(scope, operand)?;
            typing::unary_result_schema(UnaryOperator::Not, &operand_schema)
        }
        other => Err(CompileError::Unsupported {
            operation: other.kind_name().to_string(),
        }),
    }
}

fn element_literal_schema(
    scope: &Scope,
    fields: &[ElementField],
) -> Result<SchemaNode, CompileError> {
    let mut schema_fields = Vec::with_capacity(fields.len());
    for field in fields {
        let schema = infer_schema(scope, &field.value)?;
        // Synthesized fields carry no null-safety guarantee.
        schema_fields.push(ComplexField {
            name: field.name.clone(),
            title: field.name.clone(),
            schema,
            is_nullable: true,
        });
    }
    Ok(SchemaNode::Complex {
        fields: schema_fields,
        key: vec![],
    })
}
