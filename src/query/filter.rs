//! Filter expressions: pure constructors returning pre-rendered text.
//!
//! A [`FilterExpr`] is immutable once built. It can be used as a root
//! function, as an entry of a node's `@filter`, or embedded in another
//! expression (for example `gt(val(G), 50)` or `uid_in(p, uid(x) )`).

use std::fmt;

/// Rendered filter fragment such as `eq(name, "Alice")` or `has(email)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FilterExpr {
    expr: String,
}

impl FilterExpr {
    /// Wraps raw text verbatim. No quoting or validation is applied.
    pub fn raw(expr: impl Into<String>) -> Self {
        Self { expr: expr.into() }
    }

    /// Returns the rendered text.
    pub fn as_str(&self) -> &str {
        &self.expr
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expr)
    }
}

/// Right-hand operand of a comparison.
///
/// Strings are quoted; numbers, booleans and nested expressions are emitted
/// verbatim so comparisons can target literals and `val`/`count` references
/// alike.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// String literal, rendered double-quoted.
    Text(String),
    /// Signed integer literal.
    Int(i64),
    /// Unsigned integer literal.
    UInt(u64),
    /// Floating point literal.
    Float(f64),
    /// Boolean literal.
    Bool(bool),
    /// Nested expression such as `val(x)`.
    Expr(FilterExpr),
}

impl Operand {
    /// Renders the operand following the quoting rule.
    pub fn render(&self) -> String {
        match self {
            Operand::Text(s) => format!("\"{s}\""),
            Operand::Int(v) => v.to_string(),
            Operand::UInt(v) => v.to_string(),
            Operand::Float(v) => v.to_string(),
            Operand::Bool(v) => v.to_string(),
            Operand::Expr(e) => e.expr.clone(),
        }
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::Text(value.to_owned())
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Operand::Text(value)
    }
}

impl From<&String> for Operand {
    fn from(value: &String) -> Self {
        Operand::Text(value.clone())
    }
}

macro_rules! operand_from_int {
    ($variant:ident: $($ty:ty),*) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Operand::$variant(value.into())
                }
            }
        )*
    };
}

operand_from_int!(Int: i8, i16, i32, i64);
operand_from_int!(UInt: u8, u16, u32, u64);

impl From<usize> for Operand {
    fn from(value: usize) -> Self {
        Operand::UInt(value as u64)
    }
}

impl From<f32> for Operand {
    fn from(value: f32) -> Self {
        Operand::Float(value.into())
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Float(value)
    }
}

impl From<bool> for Operand {
    fn from(value: bool) -> Self {
        Operand::Bool(value)
    }
}

impl From<FilterExpr> for Operand {
    fn from(value: FilterExpr) -> Self {
        Operand::Expr(value)
    }
}

impl From<&FilterExpr> for Operand {
    fn from(value: &FilterExpr) -> Self {
        Operand::Expr(value.clone())
    }
}

/// Left-hand side of a comparison: a predicate name or an expression.
/// Both render verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    /// Predicate name, e.g. `age` or `name@en`.
    Predicate(String),
    /// Expression such as `val(G)` or `count(~genre)`.
    Expr(FilterExpr),
}

impl Key {
    fn render(&self) -> &str {
        match self {
            Key::Predicate(p) => p,
            Key::Expr(e) => e.as_str(),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Predicate(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Predicate(value)
    }
}

impl From<FilterExpr> for Key {
    fn from(value: FilterExpr) -> Self {
        Key::Expr(value)
    }
}

impl From<&FilterExpr> for Key {
    fn from(value: &FilterExpr) -> Self {
        Key::Expr(value.clone())
    }
}

/// Target of a single-valued `uid_in`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UidTarget {
    /// Literal uid such as `0x99706`.
    Literal(String),
    /// Expression such as `uid(getJeunet)`.
    Expr(FilterExpr),
}

impl From<&str> for UidTarget {
    fn from(value: &str) -> Self {
        UidTarget::Literal(value.to_owned())
    }
}

impl From<String> for UidTarget {
    fn from(value: String) -> Self {
        UidTarget::Literal(value)
    }
}

impl From<u64> for UidTarget {
    fn from(value: u64) -> Self {
        UidTarget::Literal(value.to_string())
    }
}

impl From<FilterExpr> for UidTarget {
    fn from(value: FilterExpr) -> Self {
        UidTarget::Expr(value)
    }
}

fn call(func: &str, args: std::fmt::Arguments<'_>) -> FilterExpr {
    FilterExpr {
        expr: format!("{func}({args})"),
    }
}

/// `eq(key, value)`.
pub fn eq(key: impl Into<Key>, value: impl Into<Operand>) -> FilterExpr {
    compare("eq", key.into(), value.into())
}

/// `gt(key, value)`.
pub fn gt(key: impl Into<Key>, value: impl Into<Operand>) -> FilterExpr {
    compare("gt", key.into(), value.into())
}

/// `ge(key, value)`.
pub fn ge(key: impl Into<Key>, value: impl Into<Operand>) -> FilterExpr {
    compare("ge", key.into(), value.into())
}

/// `lt(key, value)`.
pub fn lt(key: impl Into<Key>, value: impl Into<Operand>) -> FilterExpr {
    compare("lt", key.into(), value.into())
}

/// `le(key, value)`.
pub fn le(key: impl Into<Key>, value: impl Into<Operand>) -> FilterExpr {
    compare("le", key.into(), value.into())
}

fn compare(func: &str, key: Key, value: Operand) -> FilterExpr {
    call(func, format_args!("{}, {}", key.render(), value.render()))
}

fn text_match(func: &str, predicate: &str, value: &str) -> FilterExpr {
    call(func, format_args!("{predicate}, \"{value}\""))
}

/// `allofterms(predicate, "value")`.
pub fn allofterms(predicate: &str, value: &str) -> FilterExpr {
    text_match("allofterms", predicate, value)
}

/// `anyofterms(predicate, "value")`.
pub fn anyofterms(predicate: &str, value: &str) -> FilterExpr {
    text_match("anyofterms", predicate, value)
}

/// `alloftext(predicate, "value")`.
pub fn alloftext(predicate: &str, value: &str) -> FilterExpr {
    text_match("alloftext", predicate, value)
}

/// `anyoftext(predicate, "value")`.
pub fn anyoftext(predicate: &str, value: &str) -> FilterExpr {
    text_match("anyoftext", predicate, value)
}

/// `ngram(predicate, "value")`.
pub fn ngram(predicate: &str, value: &str) -> FilterExpr {
    text_match("ngram", predicate, value)
}

/// `has(predicate)`.
pub fn has(predicate: &str) -> FilterExpr {
    call("has", format_args!("{predicate}"))
}

/// `type(name)`.
pub fn type_of(name: &str) -> FilterExpr {
    call("type", format_args!("{name}"))
}

/// `uid(id)` for a single uid literal or variable name.
pub fn uid(id: impl fmt::Display) -> FilterExpr {
    call("uid", format_args!("{id}"))
}

/// `uid(a, b, c)`.
pub fn uids<I, T>(ids: I) -> FilterExpr
where
    I: IntoIterator<Item = T>,
    T: fmt::Display,
{
    let parts: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
    call("uid", format_args!("{}", parts.join(", ")))
}

/// `uid_in(predicate, target)`.
///
/// Expression targets keep a space before the closing paren:
/// `uid_in(~director.film, uid(x) )`.
pub fn uid_in(predicate: &str, target: impl Into<UidTarget>) -> FilterExpr {
    match target.into() {
        UidTarget::Literal(id) => call("uid_in", format_args!("{predicate}, {id}")),
        UidTarget::Expr(e) => call("uid_in", format_args!("{predicate}, {e} ")),
    }
}

/// `uid_in(predicate, [a,b,c])`. A single id falls back to [`uid_in`].
pub fn uid_in_many<I, T>(predicate: &str, ids: I) -> FilterExpr
where
    I: IntoIterator<Item = T>,
    T: fmt::Display,
{
    let parts: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
    if parts.len() == 1 {
        return uid_in(predicate, parts[0].as_str());
    }
    call("uid_in", format_args!("{predicate}, [{}]", parts.join(",")))
}

/// `between(predicate, from, to)`.
pub fn between(predicate: &str, from: impl Into<Operand>, to: impl Into<Operand>) -> FilterExpr {
    call(
        "between",
        format_args!("{predicate}, {}, {}", from.into().render(), to.into().render()),
    )
}

/// Negates an expression: `NOT expr`.
pub fn not(expr: FilterExpr) -> FilterExpr {
    FilterExpr {
        expr: format!("NOT {}", expr.expr),
    }
}

/// `val(var)` reference.
pub fn val(var: &str) -> FilterExpr {
    call("val", format_args!("{var}"))
}

/// `count(predicate)` reference.
pub fn count(predicate: &str) -> FilterExpr {
    call("count", format_args!("{predicate}"))
}

/// `regexp(predicate, /pattern/)`.
pub fn regexp(predicate: &str, pattern: &str) -> FilterExpr {
    regexp_with_flags(predicate, pattern, "")
}

/// `regexp(predicate, /pattern/flags)`.
pub fn regexp_with_flags(predicate: &str, pattern: &str, flags: &str) -> FilterExpr {
    call("regexp", format_args!("{predicate}, /{pattern}/{flags}"))
}
