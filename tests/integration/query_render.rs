//! Query rendering tests.
//!
//! Exact-text checks for common block shapes plus property tests for the
//! quoting rule and for builder call order independence.

#![allow(missing_docs)]

use dqlkit::query::{build, expand_all_block, filter, OrderDir, QueryNode, Selection};
use proptest::prelude::*;

#[test]
fn var_block_feeds_a_named_block() {
    let films = QueryNode::var()
        .has("director.film")
        .field("films as count(director.film)");
    let top = QueryNode::new()
        .func(filter::uid("films"))
        .order("val(films)", OrderDir::Desc)
        .first(3)
        .select(["name@en", "total : val(films)"])
        .name("top");

    assert_eq!(
        build(&[films, top]),
        "{\n  var(func: has(director.film)) {\n    films as count(director.film)\n  }\n\n  top(func: uid(films), orderdesc: val(films), first: 3) {\n    name@en\n    total : val(films)\n  }\n}"
    );
}

#[test]
fn nested_selection_carries_var_order_and_pagination() {
    let films = QueryNode::new()
        .name("director.film")
        .assign("F")
        .order("initial_release_date", OrderDir::Asc)
        .first(2)
        .offset(1)
        .field("name@en");
    let q = QueryNode::new()
        .allofterms("name@en", "jones indiana")
        .nest(&films)
        .name("me");

    assert_eq!(
        q.query(),
        "{\n  me(func: allofterms(name@en, \"jones indiana\")) {\n    F as director.film(orderasc: initial_release_date, first: 2, offset: 1) {\n      name@en\n    }\n  }\n}"
    );
}

#[test]
fn last_root_function_is_rendered() {
    let q = QueryNode::new().has("name").type_("Person").field("uid").name("q");
    assert_eq!(q.query(), "{\n  q(func: type(Person)) {\n    uid\n  }\n}");
}

#[test]
fn filters_and_or_groups_keep_declaration_order() {
    let q = QueryNode::new()
        .type_("Film")
        .ge("rating", 4.5)
        .or([
            filter::anyofterms("genre", "drama"),
            filter::uid_in("director", "0x2"),
        ])
        .not(filter::has("banned"))
        .field("uid")
        .name("films");

    assert_eq!(
        q.query(),
        "{\n  films(func: type(Film))\n  @filter(\n    ge(rating, 4.5)\n    AND (\n      anyofterms(genre, \"drama\")\n      OR uid_in(director, 0x2)\n    )\n    AND NOT has(banned)\n  ) {\n    uid\n  }\n}"
    );
}

#[test]
fn comparisons_against_variables_stay_unquoted() {
    let q = QueryNode::new()
        .type_("Person")
        .gt(filter::count("friend"), 10)
        .eq("score", filter::val("best"))
        .field("uid")
        .name("busy");
    let text = q.query();
    assert!(text.contains("gt(count(friend), 10)"));
    assert!(text.contains("AND eq(score, val(best))"));
}

#[test]
fn condition_and_query_blocks_compose() {
    let cond = QueryNode::condition("getJeunet", "q").func(filter::eq("name@fr", "Jean-Pierre Jeunet"));
    let films = QueryNode::new()
        .func(filter::has("director.film"))
        .filter([filter::uid_in("~director.film", filter::uid("getJeunet"))])
        .field("name@en")
        .name("films");

    assert_eq!(
        build(&[cond, films]),
        "{\n  getJeunet as q(func: eq(name@fr, \"Jean-Pierre Jeunet\"))\n\n  films(func: has(director.film)) @filter(uid_in(~director.film, uid(getJeunet) )) {\n    name@en\n  }\n}"
    );
}

#[test]
fn expand_all_renders_inline() {
    let q = QueryNode::new()
        .uid("0x1")
        .nest(&expand_all_block(["uid", "name"]))
        .name("q");
    assert_eq!(
        q.query(),
        "{\n  q(func: uid(0x1)) {\n    expand(_all_) { uid name }\n  }\n}"
    );
}

#[test]
fn block_var_prefixes_named_block() {
    let q = QueryNode::new()
        .regexp_with_flags("email", "^a.*", "i")
        .block_var("v")
        .field("uid")
        .name("q");
    assert_eq!(
        q.query(),
        "{\n  v as q(func: regexp(email, /^a.*/i)) {\n    uid\n  }\n}"
    );
}

#[test]
fn shared_base_is_unaffected_by_derived_queries() {
    let base = QueryNode::new().type_("User").select(["uid", "name"]);
    let by_email = base.eq("email", "a@b.c").name("byEmail");
    let by_age = base.between("age", 18, 30).name("byAge");

    assert_eq!(base.predicate_filters().count(), 0);
    assert!(by_email.query().contains("@filter(eq(email, \"a@b.c\"))"));
    assert!(by_age.query().contains("byAge(func: between(age, 18, 30))"));
    assert!(!by_age.query().contains("@filter"));
}

#[derive(Clone, Debug)]
enum Step {
    Name,
    Root,
    Filter,
    Order,
    First,
    Offset,
    Cascade,
    GroupBy,
    Select,
}

impl Step {
    fn apply(&self, node: &QueryNode) -> QueryNode {
        match self {
            Step::Name => node.name("people"),
            Step::Root => node.type_("Person"),
            Step::Filter => node.gt("age", 18),
            Step::Order => node.order("name", OrderDir::Asc),
            Step::First => node.first(10),
            Step::Offset => node.offset(5),
            Step::Cascade => node.cascade(),
            Step::GroupBy => node.group_by("city"),
            Step::Select => node.select([Selection::from("uid"), "name".into()]),
        }
    }
}

fn all_steps() -> Vec<Step> {
    vec![
        Step::Name,
        Step::Root,
        Step::Filter,
        Step::Order,
        Step::First,
        Step::Offset,
        Step::Cascade,
        Step::GroupBy,
        Step::Select,
    ]
}

fn apply_all(steps: &[Step]) -> QueryNode {
    steps
        .iter()
        .fold(QueryNode::new(), |node, step| step.apply(&node))
}

proptest! {
    #[test]
    fn prop_string_operands_are_quoted_once(value in "[a-zA-Z0-9 @._-]{0,16}") {
        let expr = filter::eq("p", value.as_str()).to_string();
        prop_assert_eq!(&expr, &format!("eq(p, \"{value}\")"));
        let quoted = format!("\"{value}\"");
        prop_assert_eq!(expr.matches(quoted.as_str()).count(), 1);
    }

    #[test]
    fn prop_numeric_operands_are_never_quoted(value in any::<i64>(), bound in any::<u32>()) {
        prop_assert!(!filter::eq("p", value).to_string().contains('"'));
        prop_assert!(!filter::between("p", value, bound).to_string().contains('"'));
        prop_assert!(!filter::eq("p", filter::val("x")).to_string().contains('"'));
    }

    #[test]
    fn prop_builder_call_order_is_irrelevant(steps in Just(all_steps()).prop_shuffle()) {
        let canonical = apply_all(&all_steps()).query();
        prop_assert_eq!(apply_all(&steps).query(), canonical);
    }

    #[test]
    fn prop_filter_clause_shape_follows_filter_count(count in 0usize..4) {
        let node = (0..count).fold(QueryNode::new().has("name").field("uid").name("q"), |n, i| {
            n.eq(format!("p{i}"), i)
        });
        let text = node.query();
        match count {
            0 => prop_assert!(!text.contains("@filter")),
            1 => {
                let expected = "q(func: has(name)) @filter(eq(p0, 0)) {";
                prop_assert!(text.contains(expected));
            }
            _ => {
                prop_assert!(text.contains("\n  @filter(\n    eq(p0, 0)\n    AND eq(p1, 1)\n"));
            }
        }
    }
}
