//! Defines the serializable query operation tree (`QueryOperation`).
//!
//! Operation nodes are immutable once constructed and reference children by
//! value, so a tree is strictly acyclic and can be cloned, shared, and
//! serialized as plain data. New queries built on top of an existing one share
//! the unchanged subtrees; nothing in a node may hold a resource handle.

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

/// The payload of a `Literal` node.
///
/// A closed variant rather than an open dynamic type, so literal
/// classification in the compiler passes is exhaustive and cannot silently
/// fall through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner)]
#[serde(untagged)]
pub enum LiteralValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for LiteralValue {
    fn from(v: bool) -> Self {
        LiteralValue::Bool(v)
    }
}
impl From<f64> for LiteralValue {
    fn from(v: f64) -> Self {
        LiteralValue::Number(v)
    }
}
impl From<i64> for LiteralValue {
    fn from(v: i64) -> Self {
        LiteralValue::Number(v as f64)
    }
}
impl From<i32> for LiteralValue {
    fn from(v: i32) -> Self {
        LiteralValue::Number(v.into())
    }
}
impl From<&str> for LiteralValue {
    fn from(v: &str) -> Self {
        LiteralValue::Text(v.to_string())
    }
}
impl From<String> for LiteralValue {
    fn from(v: String) -> Self {
        LiteralValue::Text(v)
    }
}

/// One field of an `ElementLiteral` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementField {
    pub name: String,
    pub value: QueryOperation,
}

/// One step of a `Sort` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortStep {
    pub sort_by: QueryOperation,
    pub ascending: bool,
}

/// The closed, tagged union of query operation node kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum QueryOperation {
    // Leaves
    Parameter {
        name: String,
    },
    DataSourceReference,
    Literal {
        value: LiteralValue,
    },
    // Collection
    Count {
        source: Box<QueryOperation>,
    },
    Filter {
        source: Box<QueryOperation>,
        parameter_name: String,
        predicate: Box<QueryOperation>,
    },
    Map {
        source: Box<QueryOperation>,
        parameter_name: String,
        projection: Box<QueryOperation>,
    },
    Sort {
        source: Box<QueryOperation>,
        parameter_name: String,
        steps: Vec<SortStep>,
    },
    TakePage {
        source: Box<QueryOperation>,
        start: u64,
        count: u64,
    },
    // Structural
    ElementLiteral {
        fields: Vec<ElementField>,
    },
    CollectionLiteral {
        elements: Vec<QueryOperation>,
    },
    FieldReference {
        element: Box<QueryOperation>,
        field_name: String,
    },
    // Binary
    Add {
        left_operand: Box<QueryOperation>,
        right_operand: Box<QueryOperation>,
    },
    Subtract {
        left_operand: Box<QueryOperation>,
        right_operand: Box<QueryOperation>,
    },
    Multiply {
        left_operand: Box<QueryOperation>,
        right_operand: Box<QueryOperation>,
    },
    Divide {
        left_operand: Box<QueryOperation>,
        right_operand: Box<QueryOperation>,
    },
    Equal {
        left_operand: Box<QueryOperation>,
        right_operand: Box<QueryOperation>,
    },
    NotEqual {
        left_operand: Box<QueryOperation>,
        right_operand: Box<QueryOperation>,
    },
    Greater {
        left_operand: Box<QueryOperation>,
        right_operand: Box<QueryOperation>,
    },
    GreaterOrEqual {
        left_operand: Box<QueryOperation>,
        right_operand: Box<QueryOperation>,
    },
    Less {
        left_operand: Box<QueryOperation>,
        right_operand: Box<QueryOperation>,
    },
    LessOrEqual {
        left_operand: Box<QueryOperation>,
        right_operand: Box<QueryOperation>,
    },
    And {
        left_operand: Box<QueryOperation>,
        right_operand: Box<QueryOperation>,
    },
    Or {
        left_operand: Box<QueryOperation>,
        right_operand: Box<QueryOperation>,
    },
    // Unary
    Negate {
        operand: Box<QueryOperation>,
    },
    Not {
        operand: Box<QueryOperation>,
    },
    If {
        condition: Box<QueryOperation>,
        true_operation: Box<QueryOperation>,
        false_operation: Box<QueryOperation>,
    },
    // String
    Contains {
        source: Box<QueryOperation>,
        search: Box<QueryOperation>,
    },
    StartsWith {
        source: Box<QueryOperation>,
        fragment: Box<QueryOperation>,
    },
    EndsWith {
        source: Box<QueryOperation>,
        fragment: Box<QueryOperation>,
    },
    ToUpperCase {
        text: Box<QueryOperation>,
    },
    ToLowerCase {
        text: Box<QueryOperation>,
    },
}

/// The binary operator kinds, used to key the type algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn name(self) -> &'static str {
        match self {
            BinaryOperator::Add => "add",
            BinaryOperator::Subtract => "subtract",
            BinaryOperator::Multiply => "multiply",
            BinaryOperator::Divide => "divide",
            BinaryOperator::Equal => "equal",
            BinaryOperator::NotEqual => "notEqual",
            BinaryOperator::Greater => "greater",
            BinaryOperator::GreaterOrEqual => "greaterOrEqual",
            BinaryOperator::Less => "less",
            BinaryOperator::LessOrEqual => "lessOrEqual",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }

    /// Builds the operation node for this operator.
    pub fn build(self, left: QueryOperation, right: QueryOperation) -> QueryOperation {
        let left_operand = Box::new(left);
        let right_operand = Box::new(right);
        match self {
            BinaryOperator::Add => QueryOperation::Add {
                left_operand,
                right_operand,
            },
            BinaryOperator::Subtract => QueryOperation::Subtract {
                left_operand,
                right_operand,
            },
            BinaryOperator::Multiply => QueryOperation::Multiply {
                left_operand,
                right_operand,
            },
            BinaryOperator::Divide => QueryOperation::Divide {
                left_operand,
                right_operand,
            },
            BinaryOperator::Equal => QueryOperation::Equal {
                left_operand,
                right_operand,
            },
            BinaryOperator::NotEqual => QueryOperation::NotEqual {
                left_operand,
                right_operand,
            },
            BinaryOperator::Greater => QueryOperation::Greater {
                left_operand,
                right_operand,
            },
            BinaryOperator::GreaterOrEqual => QueryOperation::GreaterOrEqual {
                left_operand,
                right_operand,
            },
            BinaryOperator::Less => QueryOperation::Less {
                left_operand,
                right_operand,
            },
            BinaryOperator::LessOrEqual => QueryOperation::LessOrEqual {
                left_operand,
                right_operand,
            },
            BinaryOperator::And => QueryOperation::And {
                left_operand,
                right_operand,
            },
            BinaryOperator::Or => QueryOperation::Or {
                left_operand,
                right_operand,
            },
        }
    }
}

/// The unary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

impl UnaryOperator {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "negate",
            UnaryOperator::Not => "not",
        }
    }
}

impl QueryOperation {
    /// Views a binary node as `(operator, left, right)`, if this is one.
    pub fn as_binary(&self) -> Option<(BinaryOperator, &QueryOperation, &QueryOperation)> {
        use QueryOperation::*;
        let (op, l, r) = match self {
            Add { left_operand, right_operand } => (BinaryOperator::Add, left_operand, right_operand),
            Subtract { left_operand, right_operand } => (BinaryOperator::Subtract, left_operand, right_operand),
            Multiply { left_operand, right_operand } => (BinaryOperator::Multiply, left_operand, right_operand),
            Divide { left_operand, right_operand } => (BinaryOperator::Divide, left_operand, right_operand),
            Equal { left_operand, right_operand } => (BinaryOperator::Equal, left_operand, right_operand),
            NotEqual { left_operand, right_operand } => (BinaryOperator::NotEqual, left_operand, right_operand),
            Greater { left_operand, right_operand } => (BinaryOperator::Greater, left_operand, right_operand),
            GreaterOrEqual { left_operand, right_operand } => {
                (BinaryOperator::GreaterOrEqual, left_operand, right_operand)
            }
            Less { left_operand, right_operand } => (BinaryOperator::Less, left_operand, right_operand),
            LessOrEqual { left_operand, right_operand } => (BinaryOperator::LessOrEqual, left_operand, right_operand),
            And { left_operand, right_operand } => (BinaryOperator::And, left_operand, right_operand),
            Or { left_operand, right_operand } => (BinaryOperator::Or, left_operand, right_operand),
            _ => return None,
        };
        Some((op, l, r))
    }

    /// The wire tag of this node's kind.
    pub fn kind_name(&self) -> &'static str {
        use QueryOperation::*;
        match self {
            Parameter { .. } => "parameter",
            DataSourceReference => "dataSourceReference",
            Literal { .. } => "literal",
            Count { .. } => "count",
            Filter { .. } => "filter",
            Map { .. } => "map",
            Sort { .. } => "sort",
            TakePage { .. } => "takePage",
            ElementLiteral { .. } => "elementLiteral",
            CollectionLiteral { .. } => "collectionLiteral",
            FieldReference { .. } => "fieldReference",
            Add { .. } => "add",
            Subtract { .. } => "subtract",
            Multiply { .. } => "multiply",
            Divide { .. } => "divide",
            Equal { .. } => "equal",
            NotEqual { .. } => "notEqual",
            Greater { .. } => "greater",
            GreaterOrEqual { .. } => "greaterOrEqual",
            Less { .. } => "less",
            LessOrEqual { .. } => "lessOrEqual",
            And { .. } => "and",
            Or { .. } => "or",
            Negate { .. } => "negate",
            Not { .. } => "not",
            If { .. } => "if",
            Contains { .. } => "contains",
            StartsWith { .. } => "startsWith",
            EndsWith { .. } => "endsWith",
            ToUpperCase { .. } => "toUpperCase",
            ToLowerCase { .. } => "toLowerCase",
        }
    }

    /// A `FieldReference` on this node.
    pub fn field(self, field_name: impl Into<String>) -> QueryOperation {
        QueryOperation::FieldReference {
            element: Box::new(self),
            field_name: field_name.into(),
        }
    }

    /// A `Parameter` node.
    pub fn parameter(name: impl Into<String>) -> QueryOperation {
        QueryOperation::Parameter { name: name.into() }
    }

    /// A `Literal` node.
    pub fn literal(value: impl Into<LiteralValue>) -> QueryOperation {
        QueryOperation::Literal {
            value: value.into(),
        }
    }
}
