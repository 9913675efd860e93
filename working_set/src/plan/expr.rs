//! Scalar and aggregate expressions used by [`crate::plan::PlanNode`]s.
/*
* Copyright 2022-2025 Crown Copyright
*
* Licensed under the Apache License, Version 2.0 (the "License");
* you may not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*     http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing, software
* distributed under the License is distributed on an "AS IS" BASIS,
* WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
* See the License for the specific language governing permissions and
* limitations under the License.
*/
use std::{
    fmt::{Display, Formatter},
    ops::{Div, Rem, Sub},
};

/// A literal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Int(i64),
    Str(String),
}

/// Binary operators. Arithmetic on integers uses integer semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Gt,
    Eq,
    And,
    Minus,
    Modulo,
    Divide,
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Gt => ">",
            Self::Eq => "=",
            Self::And => "AND",
            Self::Minus => "-",
            Self::Modulo => "%",
            Self::Divide => "/",
        };
        write!(f, "{symbol}")
    }
}

/// A scalar expression evaluated once per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Reference to a column by its exact (case sensitive) name.
    Column(String),
    Literal(Literal),
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// Replaces every non-overlapping occurrence of `from` with `to`, scanning left to right once.
    Replace {
        input: Box<Expr>,
        from: String,
        to: String,
    },
    /// Extracts capture group `group` of the first match of `pattern`.
    ///
    /// Yields an empty string when the pattern does not match or the group did not
    /// participate in the match, and null for a null input.
    RegexpExtract {
        input: Box<Expr>,
        pattern: String,
        group: usize,
    },
}

/// Create a column reference.
#[must_use]
pub fn column(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Create an integer literal.
#[must_use]
pub fn lit_int(value: i64) -> Expr {
    Expr::Literal(Literal::Int(value))
}

/// Create a string literal.
#[must_use]
pub fn lit_str(value: impl Into<String>) -> Expr {
    Expr::Literal(Literal::Str(value.into()))
}

impl Expr {
    fn binary(self, op: BinaryOperator, right: Expr) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn gt(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Gt, other)
    }

    #[must_use]
    pub fn equals(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Eq, other)
    }

    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::And, other)
    }

    #[must_use]
    pub fn replace(self, from: impl Into<String>, to: impl Into<String>) -> Expr {
        Expr::Replace {
            input: Box::new(self),
            from: from.into(),
            to: to.into(),
        }
    }

    #[must_use]
    pub fn regexp_extract(self, pattern: impl Into<String>, group: usize) -> Expr {
        Expr::RegexpExtract {
            input: Box::new(self),
            pattern: pattern.into(),
            group,
        }
    }

    /// Names of all columns this expression reads, in order of appearance.
    #[must_use]
    pub fn referenced_columns(&self) -> Vec<&str> {
        match self {
            Expr::Column(name) => vec![name.as_str()],
            Expr::Literal(_) => vec![],
            Expr::BinaryOp { left, right, .. } => {
                let mut cols = left.referenced_columns();
                cols.extend(right.referenced_columns());
                cols
            }
            Expr::Replace { input, .. } | Expr::RegexpExtract { input, .. } => {
                input.referenced_columns()
            }
        }
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        self.binary(BinaryOperator::Minus, rhs)
    }
}

impl Rem for Expr {
    type Output = Expr;

    fn rem(self, rhs: Expr) -> Expr {
        self.binary(BinaryOperator::Modulo, rhs)
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        self.binary(BinaryOperator::Divide, rhs)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{name}"),
            Expr::Literal(Literal::Int(v)) => write!(f, "{v}"),
            Expr::Literal(Literal::Str(s)) => write!(f, "'{s}'"),
            Expr::BinaryOp { left, op, right } => write!(f, "({left} {op} {right})"),
            Expr::Replace { input, from, to } => write!(f, "replace({input}, '{from}', '{to}')"),
            Expr::RegexpExtract {
                input,
                pattern,
                group,
            } => write!(f, "regexp_extract({input}, '{pattern}', {group})"),
        }
    }
}

/// Aggregating functions over the rows of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateFunction {
    /// Distinct non-null values of a column.
    CollectSet(String),
    Sum(String),
    /// Number of rows in the group.
    CountRows,
}

impl AggregateFunction {
    /// Name the output of this aggregate.
    #[must_use]
    pub fn alias(self, alias: impl Into<String>) -> AggregateExpr {
        AggregateExpr {
            function: self,
            alias: alias.into(),
        }
    }
}

impl Display for AggregateFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CollectSet(col) => write!(f, "collect_set({col})"),
            Self::Sum(col) => write!(f, "sum({col})"),
            Self::CountRows => write!(f, "count(*)"),
        }
    }
}

#[must_use]
pub fn collect_set(col: impl Into<String>) -> AggregateFunction {
    AggregateFunction::CollectSet(col.into())
}

#[must_use]
pub fn sum(col: impl Into<String>) -> AggregateFunction {
    AggregateFunction::Sum(col.into())
}

#[must_use]
pub fn count_rows() -> AggregateFunction {
    AggregateFunction::CountRows
}

/// An aggregate function and the name of its output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateExpr {
    pub function: AggregateFunction,
    pub alias: String,
}

impl Display for AggregateExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} AS {}", self.function, self.alias)
    }
}
