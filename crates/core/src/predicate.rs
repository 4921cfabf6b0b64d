//! Typed, composable row predicates.
//!
//! A [`Predicate`] is a plain value parameterised by an entity's field enum,
//! so a filter written for villas cannot be handed to the villa-number
//! repository. The persistence layer walks the tree and renders it into
//! parameterised SQL; literal values are always bound, never interpolated.

use std::fmt;

/// A column of one entity type that predicates and orderings can refer to.
pub trait Field: Copy + fmt::Debug + Send + Sync + 'static {
    /// Column name in the backing table.
    fn column(self) -> &'static str;
}

/// A literal compared against a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// Boolean filter over the fields `F` of one entity type.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate<F> {
    /// Matches every row.
    All,
    Compare {
        field: F,
        op: CmpOp,
        value: Value,
    },
    /// Text equality ignoring letter case.
    EqIgnoreCase {
        field: F,
        value: String,
    },
    IsNull(F),
    In {
        field: F,
        values: Vec<Value>,
    },
    And(Vec<Predicate<F>>),
    Or(Vec<Predicate<F>>),
    Not(Box<Predicate<F>>),
}

impl<F> Default for Predicate<F> {
    fn default() -> Self {
        Predicate::All
    }
}

impl<F: Field> Predicate<F> {
    pub fn compare(field: F, op: CmpOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            field,
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: F, value: impl Into<Value>) -> Self {
        Self::compare(field, CmpOp::Eq, value)
    }

    pub fn ne(field: F, value: impl Into<Value>) -> Self {
        Self::compare(field, CmpOp::Ne, value)
    }

    pub fn lt(field: F, value: impl Into<Value>) -> Self {
        Self::compare(field, CmpOp::Lt, value)
    }

    pub fn le(field: F, value: impl Into<Value>) -> Self {
        Self::compare(field, CmpOp::Le, value)
    }

    pub fn gt(field: F, value: impl Into<Value>) -> Self {
        Self::compare(field, CmpOp::Gt, value)
    }

    pub fn ge(field: F, value: impl Into<Value>) -> Self {
        Self::compare(field, CmpOp::Ge, value)
    }

    pub fn eq_ignore_case(field: F, value: impl Into<String>) -> Self {
        Predicate::EqIgnoreCase {
            field,
            value: value.into(),
        }
    }

    pub fn is_null(field: F) -> Self {
        Predicate::IsNull(field)
    }

    pub fn is_in<V: Into<Value>>(field: F, values: impl IntoIterator<Item = V>) -> Self {
        Predicate::In {
            field,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Conjunction. `All` is the identity and nested `And`s are flattened.
    pub fn and(self, other: Predicate<F>) -> Self {
        match (self, other) {
            (Predicate::All, p) | (p, Predicate::All) => p,
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), p) => {
                left.push(p);
                Predicate::And(left)
            }
            (p, Predicate::And(mut right)) => {
                right.insert(0, p);
                Predicate::And(right)
            }
            (left, right) => Predicate::And(vec![left, right]),
        }
    }

    /// Disjunction. `All` absorbs the other side.
    pub fn or(self, other: Predicate<F>) -> Self {
        match (self, other) {
            (Predicate::All, _) | (_, Predicate::All) => Predicate::All,
            (Predicate::Or(mut left), Predicate::Or(right)) => {
                left.extend(right);
                Predicate::Or(left)
            }
            (Predicate::Or(mut left), p) => {
                left.push(p);
                Predicate::Or(left)
            }
            (left, right) => Predicate::Or(vec![left, right]),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Predicate::Not(inner) => *inner,
            p => Predicate::Not(Box::new(p)),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Predicate::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Explicit ordering term. Queries have no implicit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy<F> {
    pub field: F,
    pub direction: Direction,
}
