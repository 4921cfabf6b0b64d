//! Predicate query engine: renders typed queries into parameterised SQL.

use sqlx::{Postgres, QueryBuilder};
use villa_core::predicate::{Direction, Field, OrderBy, Predicate, Value};

use crate::entity::Entity;

/// A read request against one entity type: which rows, which relations to
/// load alongside them, and in what order.
///
/// An empty query matches every row in storage order.
pub struct Query<E: Entity> {
    pub predicate: Predicate<E::Field>,
    pub includes: Vec<E::Relation>,
    pub order: Vec<OrderBy<E::Field>>,
}

impl<E: Entity> Query<E> {
    /// Match every row.
    pub fn all() -> Self {
        Self::filter(Predicate::All)
    }

    pub fn filter(predicate: Predicate<E::Field>) -> Self {
        Self {
            predicate,
            includes: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Eagerly load `relation` for every returned row.
    pub fn include(mut self, relation: E::Relation) -> Self {
        self.includes.push(relation);
        self
    }

    pub fn include_all(mut self, relations: impl IntoIterator<Item = E::Relation>) -> Self {
        self.includes.extend(relations);
        self
    }

    pub fn order_by(mut self, field: E::Field, direction: Direction) -> Self {
        self.order.push(OrderBy { field, direction });
        self
    }
}

impl<E: Entity> Default for Query<E> {
    fn default() -> Self {
        Self::all()
    }
}

impl<E: Entity> Clone for Query<E> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            includes: self.includes.clone(),
            order: self.order.clone(),
        }
    }
}

/// Build `SELECT <columns> FROM <table> [WHERE ..] [ORDER BY ..] [LIMIT n]`.
pub fn select<E: Entity>(query: &Query<E>, limit: Option<i64>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", E::COLUMNS, E::TABLE));

    if !query.predicate.is_all() {
        qb.push(" WHERE ");
        push_predicate(&mut qb, &query.predicate);
    }

    if !query.order.is_empty() {
        qb.push(" ORDER BY ");
        for (i, term) in query.order.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(term.field.column());
            qb.push(" ");
            qb.push(term.direction.as_sql());
        }
    }

    if let Some(limit) = limit {
        qb.push(" LIMIT ");
        qb.push_bind(limit);
    }

    qb
}

/// Append the SQL form of `predicate`, binding every literal.
pub fn push_predicate<F: Field>(qb: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate<F>) {
    match predicate {
        Predicate::All => {
            qb.push("TRUE");
        }
        Predicate::Compare { field, op, value } => {
            qb.push(field.column());
            qb.push(" ");
            qb.push(op.as_sql());
            qb.push(" ");
            push_value(qb, value);
        }
        Predicate::EqIgnoreCase { field, value } => {
            qb.push("LOWER(");
            qb.push(field.column());
            qb.push(") = LOWER(");
            qb.push_bind(value.clone());
            qb.push(")");
        }
        Predicate::IsNull(field) => {
            qb.push(field.column());
            qb.push(" IS NULL");
        }
        Predicate::In { values, .. } if values.is_empty() => {
            qb.push("FALSE");
        }
        Predicate::In { field, values } => {
            qb.push(field.column());
            qb.push(" IN (");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                push_value(qb, value);
            }
            qb.push(")");
        }
        Predicate::And(terms) => push_junction(qb, terms, " AND ", "TRUE"),
        Predicate::Or(terms) => push_junction(qb, terms, " OR ", "FALSE"),
        Predicate::Not(inner) => {
            qb.push("NOT (");
            push_predicate(qb, inner);
            qb.push(")");
        }
    }
}

fn push_junction<F: Field>(
    qb: &mut QueryBuilder<'static, Postgres>,
    terms: &[Predicate<F>],
    joiner: &str,
    empty: &str,
) {
    if terms.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            qb.push(joiner);
        }
        push_predicate(qb, term);
    }
    qb.push(")");
}

fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &Value) {
    match value {
        Value::Int(v) => qb.push_bind(*v),
        Value::Float(v) => qb.push_bind(*v),
        Value::Text(v) => qb.push_bind(v.clone()),
        Value::Bool(v) => qb.push_bind(*v),
    };
}
