//! Fluent builder methods for [`QueryNode`].
//!
//! Every method borrows the receiver and returns a new node, so a shared base
//! node can be specialized by several callers without interference.

use std::sync::Arc;

use crate::query::{
    ast::{FilterEntry, OrderClause, OrderDir, QueryNode, Selection},
    filter::{self, FilterExpr, Key, Operand},
};

/// Literal for the predicate that expands every predicate of a node.
pub const EXPAND_ALL: &str = "expand(_all_)";

/// Builds an inline `expand(_all_) { f1 f2 }` selection.
pub fn expand_all_block<I, S>(fields: I) -> QueryNode
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    QueryNode::new()
        .select(fields.into_iter().map(|f| Selection::Field(f.into())))
        .name(EXPAND_ALL)
        .inline()
}

impl QueryNode {
    fn with(&self, edit: impl FnOnce(&mut QueryNode)) -> QueryNode {
        let mut next = self.clone();
        edit(&mut next);
        next
    }

    fn push_filter(&self, entry: FilterEntry) -> QueryNode {
        self.with(|n| Arc::make_mut(&mut n.filters).push(entry))
    }

    /// Sets the block name (or the predicate name for a nested selection).
    #[must_use]
    pub fn name(&self, name: &str) -> QueryNode {
        self.with(|n| n.name = Some(name.into()))
    }

    /// Appends fields and/or nested nodes to the selection list.
    #[must_use]
    pub fn select<I, S>(&self, items: I) -> QueryNode
    where
        I: IntoIterator<Item = S>,
        S: Into<Selection>,
    {
        self.with(|n| {
            Arc::make_mut(&mut n.children).extend(items.into_iter().map(Into::<Selection>::into))
        })
    }

    /// Appends one literal field.
    #[must_use]
    pub fn field(&self, field: &str) -> QueryNode {
        self.select([Selection::Field(field.to_owned())])
    }

    /// Appends one nested selection.
    #[must_use]
    pub fn nest(&self, child: &QueryNode) -> QueryNode {
        self.select([Selection::Node(child.clone())])
    }

    /// Binds this nested selection to a variable: `var as name { ... }`.
    #[must_use]
    pub fn assign(&self, var: &str) -> QueryNode {
        self.with(|n| n.var_name = Some(var.into()))
    }

    /// Adds an order clause.
    #[must_use]
    pub fn order(&self, expr: &str, dir: OrderDir) -> QueryNode {
        let clause = OrderClause {
            expr: expr.to_owned(),
            dir,
        };
        self.with(|n| Arc::make_mut(&mut n.order).push(clause))
    }

    /// Sets `first: n`. Negative values select from the end.
    #[must_use]
    pub fn first(&self, n: i64) -> QueryNode {
        self.with(|node| node.first = Some(n))
    }

    /// Sets `offset: n`.
    #[must_use]
    pub fn offset(&self, n: i64) -> QueryNode {
        self.with(|node| node.offset = Some(n))
    }

    /// Prefixes the block with a variable: `var as var(func: ...)`.
    #[must_use]
    pub fn block_var(&self, var: &str) -> QueryNode {
        self.with(|n| n.block_var = Some(var.into()))
    }

    /// Renders this nested selection on a single line.
    #[must_use]
    pub fn inline(&self) -> QueryNode {
        self.with(|n| n.inline = true)
    }

    /// Adds `@groupby(field)`.
    #[must_use]
    pub fn group_by(&self, field: &str) -> QueryNode {
        self.with(|n| n.group_by = Some(field.into()))
    }

    /// Adds `@cascade`.
    #[must_use]
    pub fn cascade(&self) -> QueryNode {
        self.with(|n| n.cascade = true)
    }

    /// Sets any expression as the root function.
    #[must_use]
    pub fn func(&self, expr: FilterExpr) -> QueryNode {
        self.push_filter(FilterEntry::Func(expr))
    }

    /// Root function `uid(id)`.
    #[must_use]
    pub fn uid(&self, id: &str) -> QueryNode {
        self.func(filter::uid(id))
    }

    /// Root function `uid(a, b, ...)`.
    #[must_use]
    pub fn uids<I, T>(&self, ids: I) -> QueryNode
    where
        I: IntoIterator<Item = T>,
        T: std::fmt::Display,
    {
        self.func(filter::uids(ids))
    }

    /// Root function `has(predicate)`.
    #[must_use]
    pub fn has(&self, predicate: &str) -> QueryNode {
        self.func(filter::has(predicate))
    }

    /// Root function `type(name)`.
    #[must_use]
    pub fn type_(&self, name: &str) -> QueryNode {
        self.func(filter::type_of(name))
    }

    /// Root function `allofterms(predicate, "value")`.
    #[must_use]
    pub fn allofterms(&self, predicate: &str, value: &str) -> QueryNode {
        self.func(filter::allofterms(predicate, value))
    }

    /// Root function `anyofterms(predicate, "value")`.
    #[must_use]
    pub fn anyofterms(&self, predicate: &str, value: &str) -> QueryNode {
        self.func(filter::anyofterms(predicate, value))
    }

    /// Root function `between(predicate, from, to)`.
    #[must_use]
    pub fn between(
        &self,
        predicate: &str,
        from: impl Into<Operand>,
        to: impl Into<Operand>,
    ) -> QueryNode {
        self.func(filter::between(predicate, from, to))
    }

    /// Root function `regexp(predicate, /pattern/)`.
    #[must_use]
    pub fn regexp(&self, predicate: &str, pattern: &str) -> QueryNode {
        self.func(filter::regexp(predicate, pattern))
    }

    /// Root function `regexp(predicate, /pattern/flags)`.
    #[must_use]
    pub fn regexp_with_flags(&self, predicate: &str, pattern: &str, flags: &str) -> QueryNode {
        self.func(filter::regexp_with_flags(predicate, pattern, flags))
    }

    /// Adds AND-ed predicate filters.
    #[must_use]
    pub fn filter<I>(&self, exprs: I) -> QueryNode
    where
        I: IntoIterator<Item = FilterExpr>,
    {
        self.with(|n| {
            Arc::make_mut(&mut n.filters).extend(exprs.into_iter().map(FilterEntry::Pred))
        })
    }

    /// Adds an OR group, ANDed with the other filters.
    #[must_use]
    pub fn or<I>(&self, exprs: I) -> QueryNode
    where
        I: IntoIterator<Item = FilterExpr>,
    {
        self.push_filter(FilterEntry::Or(exprs.into_iter().collect()))
    }

    /// Filter `eq(key, value)`.
    #[must_use]
    pub fn eq(&self, key: impl Into<Key>, value: impl Into<Operand>) -> QueryNode {
        self.push_filter(FilterEntry::Pred(filter::eq(key, value)))
    }

    /// Filter `gt(key, value)`.
    #[must_use]
    pub fn gt(&self, key: impl Into<Key>, value: impl Into<Operand>) -> QueryNode {
        self.push_filter(FilterEntry::Pred(filter::gt(key, value)))
    }

    /// Filter `ge(key, value)`.
    #[must_use]
    pub fn ge(&self, key: impl Into<Key>, value: impl Into<Operand>) -> QueryNode {
        self.push_filter(FilterEntry::Pred(filter::ge(key, value)))
    }

    /// Filter `lt(key, value)`.
    #[must_use]
    pub fn lt(&self, key: impl Into<Key>, value: impl Into<Operand>) -> QueryNode {
        self.push_filter(FilterEntry::Pred(filter::lt(key, value)))
    }

    /// Filter `le(key, value)`.
    #[must_use]
    pub fn le(&self, key: impl Into<Key>, value: impl Into<Operand>) -> QueryNode {
        self.push_filter(FilterEntry::Pred(filter::le(key, value)))
    }

    /// Filter `ngram(predicate, "value")`.
    #[must_use]
    pub fn ngram(&self, predicate: &str, value: &str) -> QueryNode {
        self.push_filter(FilterEntry::Pred(filter::ngram(predicate, value)))
    }

    /// Filter `alloftext(predicate, "value")`.
    #[must_use]
    pub fn alloftext(&self, predicate: &str, value: &str) -> QueryNode {
        self.push_filter(FilterEntry::Pred(filter::alloftext(predicate, value)))
    }

    /// Filter `anyoftext(predicate, "value")`.
    #[must_use]
    pub fn anyoftext(&self, predicate: &str, value: &str) -> QueryNode {
        self.push_filter(FilterEntry::Pred(filter::anyoftext(predicate, value)))
    }

    /// Filter `NOT expr`.
    #[must_use]
    pub fn not(&self, expr: FilterExpr) -> QueryNode {
        self.push_filter(FilterEntry::Pred(filter::not(expr)))
    }
}
