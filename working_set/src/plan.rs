//! A small relational plan describing a query independently of the engine that runs it.
//!
//! Plans are trees of [`PlanNode`]s built with a [`PlanBuilder`]. The `datafusion` module
//! lowers a plan into a `DataFusion` `DataFrame` for execution.
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
use std::fmt::{Display, Formatter};

pub mod expr;

pub use expr::{AggregateExpr, AggregateFunction, BinaryOperator, Expr, Literal};

/// The tables a plan can scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceTable {
    JobReports,
    Files,
    Blocks,
    Datasets,
}

impl Display for SourceTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::JobReports => "job_reports",
            Self::Files => "files",
            Self::Blocks => "blocks",
            Self::Datasets => "datasets",
        };
        write!(f, "{name}")
    }
}

/// One relational operator and its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanNode {
    Scan {
        source: SourceTable,
    },
    /// Keep only the named columns, in the given order.
    Select {
        input: Box<PlanNode>,
        columns: Vec<String>,
    },
    Filter {
        input: Box<PlanNode>,
        predicate: Expr,
    },
    /// Add a column, or replace the column with the same name.
    WithColumn {
        input: Box<PlanNode>,
        name: String,
        expr: Expr,
    },
    /// Inner equi-join. Each pair is (left column, right column).
    Join {
        left: Box<PlanNode>,
        right: Box<PlanNode>,
        on: Vec<(String, String)>,
    },
    Aggregate {
        input: Box<PlanNode>,
        group_by: Vec<String>,
        aggregates: Vec<AggregateExpr>,
    },
}

impl PlanNode {
    /// Direct inputs of this node.
    #[must_use]
    pub fn inputs(&self) -> Vec<&PlanNode> {
        match self {
            PlanNode::Scan { .. } => vec![],
            PlanNode::Select { input, .. }
            | PlanNode::Filter { input, .. }
            | PlanNode::WithColumn { input, .. }
            | PlanNode::Aggregate { input, .. } => vec![input],
            PlanNode::Join { left, right, .. } => vec![left, right],
        }
    }

    /// Every table scanned by this plan, without duplicates, in the order first scanned.
    #[must_use]
    pub fn sources(&self) -> Vec<SourceTable> {
        let mut found = Vec::new();
        self.collect_sources(&mut found);
        found
    }

    fn collect_sources(&self, found: &mut Vec<SourceTable>) {
        if let PlanNode::Scan { source } = self
            && !found.contains(source)
        {
            found.push(*source);
        }
        for input in self.inputs() {
            input.collect_sources(found);
        }
    }

    fn fmt_indent(&self, f: &mut Formatter<'_>, depth: usize) -> std::fmt::Result {
        write!(f, "{:width$}", "", width = depth * 2)?;
        match self {
            PlanNode::Scan { source } => writeln!(f, "Scan: {source}")?,
            PlanNode::Select { columns, .. } => writeln!(f, "Select: {}", columns.join(", "))?,
            PlanNode::Filter { predicate, .. } => writeln!(f, "Filter: {predicate}")?,
            PlanNode::WithColumn { name, expr, .. } => writeln!(f, "WithColumn: {name}={expr}")?,
            PlanNode::Join { on, .. } => writeln!(
                f,
                "Join: {}",
                on.iter()
                    .map(|(l, r)| format!("{l} = {r}"))
                    .collect::<Vec<_>>()
                    .join(" AND ")
            )?,
            PlanNode::Aggregate {
                group_by,
                aggregates,
                ..
            } => writeln!(
                f,
                "Aggregate: groupBy=[{}], aggr=[{}]",
                group_by.join(", "),
                aggregates
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )?,
        }
        for input in self.inputs() {
            input.fmt_indent(f, depth + 1)?;
        }
        Ok(())
    }
}

impl Display for PlanNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.fmt_indent(f, 0)
    }
}

/// Builds a [`PlanNode`] tree by method chaining.
///
/// # Examples
/// ```
/// # use working_set::plan::{PlanBuilder, SourceTable, expr::{column, lit_int}};
/// let plan = PlanBuilder::scan(SourceTable::JobReports)
///     .filter(column("JobExecExitCode").equals(lit_int(0)))
///     .select(["FileName"])
///     .build();
/// assert_eq!(plan.sources(), vec![SourceTable::JobReports]);
/// ```
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    node: PlanNode,
}

impl PlanBuilder {
    /// Start a plan by reading a source table.
    #[must_use]
    pub fn scan(source: SourceTable) -> Self {
        Self {
            node: PlanNode::Scan { source },
        }
    }

    #[must_use]
    pub fn select<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            node: PlanNode::Select {
                input: Box::new(self.node),
                columns: columns.into_iter().map(Into::into).collect(),
            },
        }
    }

    #[must_use]
    pub fn filter(self, predicate: Expr) -> Self {
        Self {
            node: PlanNode::Filter {
                input: Box::new(self.node),
                predicate,
            },
        }
    }

    #[must_use]
    pub fn with_column(self, name: impl Into<String>, expr: Expr) -> Self {
        Self {
            node: PlanNode::WithColumn {
                input: Box::new(self.node),
                name: name.into(),
                expr,
            },
        }
    }

    /// Inner join this plan (left) with `right` where `left_col == right_col`.
    #[must_use]
    pub fn join(
        self,
        right: PlanBuilder,
        left_col: impl Into<String>,
        right_col: impl Into<String>,
    ) -> Self {
        Self {
            node: PlanNode::Join {
                left: Box::new(self.node),
                right: Box::new(right.node),
                on: vec![(left_col.into(), right_col.into())],
            },
        }
    }

    #[must_use]
    pub fn aggregate<I, S>(self, group_by: I, aggregates: Vec<AggregateExpr>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            node: PlanNode::Aggregate {
                input: Box::new(self.node),
                group_by: group_by.into_iter().map(Into::into).collect(),
                aggregates,
            },
        }
    }

    #[must_use]
    pub fn build(self) -> PlanNode {
        self.node
    }
}
