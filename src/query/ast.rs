//! Immutable query tree.
//!
//! A [`QueryNode`] describes one top-level block or one nested selection.
//! Attribute lists live behind `Arc`s so cloning a node is cheap and builder
//! calls only copy the list they touch.

use std::sync::Arc;

use crate::query::filter::FilterExpr;

/// Ordering direction for `orderasc` / `orderdesc`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OrderDir {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDir {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            OrderDir::Asc => "asc",
            OrderDir::Desc => "desc",
        }
    }
}

/// One order clause: `order<dir>: expr`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderClause {
    /// Expression or predicate ordered on.
    pub expr: String,
    /// Direction.
    pub dir: OrderDir,
}

impl OrderClause {
    pub(crate) fn render(&self) -> String {
        format!("order{}: {}", self.dir.as_str(), self.expr)
    }
}

/// Entry in a node's filter list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FilterEntry {
    /// Root function candidate; the last one added is rendered.
    Func(FilterExpr),
    /// Simple predicate, ANDed with its siblings.
    Pred(FilterExpr),
    /// Parenthesized OR group, ANDed with its siblings.
    Or(Vec<FilterExpr>),
}

/// Child of a node's selection list.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    /// Literal field text rendered verbatim, e.g. `name@en` or `G as genre`.
    Field(String),
    /// Nested selection block.
    Node(QueryNode),
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::Field(value.to_owned())
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        Selection::Field(value)
    }
}

impl From<QueryNode> for Selection {
    fn from(value: QueryNode) -> Self {
        Selection::Node(value)
    }
}

impl From<&QueryNode> for Selection {
    fn from(value: &QueryNode) -> Self {
        Selection::Node(value.clone())
    }
}

/// Query block or nested selection.
///
/// Every builder method returns a new node; the receiver is never modified.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryNode {
    pub(crate) name: Option<Arc<str>>,
    pub(crate) filters: Arc<Vec<FilterEntry>>,
    pub(crate) order: Arc<Vec<OrderClause>>,
    pub(crate) first: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) var_name: Option<Arc<str>>,
    pub(crate) block_var: Option<Arc<str>>,
    pub(crate) cond_var: Option<Arc<str>>,
    pub(crate) is_var: bool,
    pub(crate) inline: bool,
    pub(crate) cascade: bool,
    pub(crate) group_by: Option<Arc<str>>,
    pub(crate) children: Arc<Vec<Selection>>,
}

impl QueryNode {
    /// Creates an empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a variable-collecting `var(func: ...)` block.
    pub fn var() -> Self {
        Self {
            is_var: true,
            ..Self::default()
        }
    }

    /// Creates a condition statement `cond_var as block_name(func: ...)`
    /// that binds a variable and has no body.
    pub fn condition(cond_var: &str, block_name: &str) -> Self {
        Self {
            cond_var: Some(cond_var.into()),
            name: Some(block_name.into()),
            ..Self::default()
        }
    }

    /// Block name used for the query and for locating results.
    pub fn key(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Name the block renders under: explicit name, `var` for variable
    /// blocks.
    pub fn effective_name(&self) -> &str {
        if self.is_var {
            "var"
        } else {
            self.key()
        }
    }

    /// Returns the active root function, if any. The last one added wins.
    pub fn root_function(&self) -> Option<&FilterExpr> {
        self.filters.iter().rev().find_map(|f| match f {
            FilterEntry::Func(expr) => Some(expr),
            _ => None,
        })
    }

    /// Predicate filters in declaration order (root functions excluded).
    pub fn predicate_filters(&self) -> impl Iterator<Item = &FilterEntry> {
        self.filters
            .iter()
            .filter(|f| !matches!(f, FilterEntry::Func(_)))
    }

    /// Selection list in declaration order.
    pub fn children(&self) -> &[Selection] {
        &self.children
    }

    /// Block-level variable prefix, if set.
    pub fn block_var_name(&self) -> Option<&str> {
        self.block_var.as_deref()
    }

    /// True for condition statements.
    pub fn is_condition(&self) -> bool {
        self.cond_var.is_some()
    }
}
