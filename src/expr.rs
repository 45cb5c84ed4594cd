//! Model of the externally-parsed lambda expression tree.
//!
//! An external collaborator parses or reflects a native lambda into this
//! structure; the crate only reads it. The lowering pass in
//! [`crate::expr_to_op`] consumes these nodes and never constructs or mutates
//! them itself, so the builder methods here exist purely for the producing
//! side (and for tests).

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Parameter {
        name: String,
    },
    Constant {
        value: crate::operation::LiteralValue,
    },
    ObjectLiteral {
        properties: Vec<Property>,
    },
    ArrayLiteral {
        elements: Vec<Expression>,
    },
    PropertyAccess {
        expression: Box<Expression>,
        name: String,
    },
    Binary {
        operator: ExprOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Lambda {
        parameters: Vec<String>,
        body: Box<Expression>,
    },
}

/// One property of an object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: Expression,
}

/// Binary operator kinds the expression source can produce.
///
/// Only the four equality kinds are currently accepted by the lowering pass;
/// richer operators are reachable only through hand-built operation trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprOperator {
    Equals,
    StrictEquals,
    NotEquals,
    NotStrictEquals,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    And,
    Or,
}

impl ExprOperator {
    pub fn name(self) -> &'static str {
        match self {
            ExprOperator::Equals => "equals",
            ExprOperator::StrictEquals => "strictEquals",
            ExprOperator::NotEquals => "notEquals",
            ExprOperator::NotStrictEquals => "notStrictEquals",
            ExprOperator::Greater => "greater",
            ExprOperator::GreaterOrEqual => "greaterOrEqual",
            ExprOperator::Less => "less",
            ExprOperator::LessOrEqual => "lessOrEqual",
            ExprOperator::Add => "add",
            ExprOperator::Subtract => "subtract",
            ExprOperator::Multiply => "multiply",
            ExprOperator::Divide => "divide",
            ExprOperator::And => "and",
            ExprOperator::Or => "or",
        }
    }
}

impl Expression {
    pub fn parameter(name: impl Into<String>) -> Expression {
        Expression::Parameter { name: name.into() }
    }

    pub fn constant(value: impl Into<crate::operation::LiteralValue>) -> Expression {
        Expression::Constant {
            value: value.into(),
        }
    }

    pub fn object(properties: Vec<(&str, Expression)>) -> Expression {
        Expression::ObjectLiteral {
            properties: properties
                .into_iter()
                .map(|(name, value)| Property {
                    name: name.to_string(),
                    value,
                })
                .collect(),
        }
    }

    pub fn array(elements: Vec<Expression>) -> Expression {
        Expression::ArrayLiteral { elements }
    }

    /// A property access on this expression.
    pub fn property(self, name: impl Into<String>) -> Expression {
        Expression::PropertyAccess {
            expression: Box::new(self),
            name: name.into(),
        }
    }

    pub fn binary(operator: ExprOperator, left: Expression, right: Expression) -> Expression {
        Expression::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// A call of the named method on this expression, e.g. `self.filter(arg)`.
    pub fn method_call(self, name: impl Into<String>, arguments: Vec<Expression>) -> Expression {
        Expression::Call {
            callee: Box::new(self.property(name)),
            arguments,
        }
    }

    pub fn lambda(parameter: impl Into<String>, body: Expression) -> Expression {
        Expression::Lambda {
            parameters: vec![parameter.into()],
            body: Box::new(body),
        }
    }
}
