//! Lowering of [`PlanNode`] trees into `DataFusion` [`DataFrame`]s.
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
use crate::{
    datafusion::regexp_extract::RegexpExtract,
    plan::{AggregateExpr, AggregateFunction, BinaryOperator, Expr, Literal, PlanNode, SourceTable},
};
use datafusion::{
    common::plan_datafusion_err,
    dataframe::DataFrame,
    error::DataFusionError,
    functions::expr_fn::replace,
    functions_aggregate::expr_fn::{array_agg, count, sum},
    functions_nested::expr_fn::array_sort,
    logical_expr::{
        Expr as DFExpr, ExprFunctionExt, JoinType, Operator, ScalarUDF, binary_expr, ident,
    },
    prelude::lit,
};
use log::debug;
use std::collections::HashMap;

/// Converts a scalar expression into a `DataFusion` expression.
///
/// # Errors
/// If a regular expression in the expression is invalid.
pub fn lower_expr(expr: &Expr) -> Result<DFExpr, DataFusionError> {
    Ok(match expr {
        Expr::Column(name) => ident(name),
        Expr::Literal(Literal::Int(v)) => lit(*v),
        Expr::Literal(Literal::Str(s)) => lit(s.clone()),
        Expr::BinaryOp { left, op, right } => binary_expr(
            lower_expr(left)?,
            match op {
                BinaryOperator::Gt => Operator::Gt,
                BinaryOperator::Eq => Operator::Eq,
                BinaryOperator::And => Operator::And,
                BinaryOperator::Minus => Operator::Minus,
                BinaryOperator::Modulo => Operator::Modulo,
                BinaryOperator::Divide => Operator::Divide,
            },
            lower_expr(right)?,
        ),
        // DataFusion's replace is a single non-overlapping left to right pass
        Expr::Replace { input, from, to } => {
            replace(lower_expr(input)?, lit(from.clone()), lit(to.clone()))
        }
        Expr::RegexpExtract {
            input,
            pattern,
            group,
        } => ScalarUDF::new_from_impl(RegexpExtract::try_new(pattern, *group)?)
            .call(vec![lower_expr(input)?]),
    })
}

fn lower_aggregate(aggregate: &AggregateExpr) -> Result<DFExpr, DataFusionError> {
    let expr = match &aggregate.function {
        AggregateFunction::CollectSet(column) => array_agg(ident(column)).distinct().build()?,
        AggregateFunction::Sum(column) => sum(ident(column)),
        AggregateFunction::CountRows => count(lit(1)),
    };
    Ok(expr.alias(&aggregate.alias))
}

/// Converts a plan into a [`DataFrame`], reading each scanned table from `sources`.
///
/// Collected sets are sorted ascending after aggregation.
///
/// # Errors
/// If a scanned table is missing from `sources`, or `DataFusion` rejects the plan,
/// e.g. because a column doesn't exist.
pub fn lower_plan(
    node: &PlanNode,
    sources: &HashMap<SourceTable, DataFrame>,
) -> Result<DataFrame, DataFusionError> {
    match node {
        PlanNode::Scan { source } => sources
            .get(source)
            .cloned()
            .ok_or_else(|| plan_datafusion_err!("No input registered for table {source}")),
        PlanNode::Select { input, columns } => {
            lower_plan(input, sources)?.select(columns.iter().map(ident).collect::<Vec<_>>())
        }
        PlanNode::Filter { input, predicate } => {
            lower_plan(input, sources)?.filter(lower_expr(predicate)?)
        }
        PlanNode::WithColumn { input, name, expr } => {
            lower_plan(input, sources)?.with_column(name, lower_expr(expr)?)
        }
        PlanNode::Join { left, right, on } => {
            let left = lower_plan(left, sources)?;
            let right = lower_plan(right, sources)?;
            left.join_on(
                right,
                JoinType::Inner,
                on.iter().map(|(l, r)| ident(l).eq(ident(r))),
            )
        }
        PlanNode::Aggregate {
            input,
            group_by,
            aggregates,
        } => {
            let aggr_exprs = aggregates
                .iter()
                .map(lower_aggregate)
                .collect::<Result<Vec<_>, _>>()?;
            debug!("Aggregate expressions {aggr_exprs:?}");
            let frame = lower_plan(input, sources)?
                .aggregate(group_by.iter().map(ident).collect(), aggr_exprs)?;
            // Aggregation may emit sets in any order
            let projection = group_by
                .iter()
                .map(ident)
                .chain(aggregates.iter().map(|a| match a.function {
                    AggregateFunction::CollectSet(_) => {
                        array_sort(ident(&a.alias), lit("ASC"), lit("NULLS LAST")).alias(&a.alias)
                    }
                    _ => ident(&a.alias),
                }))
                .collect::<Vec<_>>();
            frame.select(projection)
        }
    }
}
