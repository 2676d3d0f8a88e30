//! Mutation and upsert document text.

#![allow(missing_docs)]

use std::collections::BTreeMap;

use dqlkit::entity;
use dqlkit::mutation::{
    blank_node_name, mutation, upsert, upsert_block, upsert_delete, upsert_with_query, Entity,
    Json, Triple,
};
use dqlkit::query::{filter, QueryNode};

#[derive(Default)]
struct User {
    uid: String,
    name: String,
    email: String,
    age: i64,
    roles: Json<BTreeMap<String, i32>>,
    secret: String,
}

entity!(User {
    uid => "uid",
    name => "name",
    email => "email",
    age => "age",
    roles => "roles,json",
    secret => "-",
});

#[derive(Default)]
struct Account {
    uid: String,
    display_name: String,
    active: bool,
    score: f64,
}

entity!(Account as "Member" {
    uid => "uid",
    display_name => "",
    active => "active",
    score => "score",
});

#[derive(Default)]
struct Note {
    body: String,
}

entity!(Note { body => "body" });

#[derive(Default)]
struct Broken {
    uid: String,
    tags: Json<BTreeMap<(i32, i32), i32>>,
}

entity!(Broken {
    uid => "uid",
    tags => "tags,json",
});

#[derive(Default)]
struct Stat {
    uid: String,
    name: String,
    hits: Json<i32>,
    label: Json<String>,
}

entity!(Stat {
    uid => "uid",
    name => "name",
    hits => "hits,json",
    label => "label,json",
});

fn alice() -> User {
    User {
        name: "Alice".into(),
        email: "alice@example.com".into(),
        age: 29,
        secret: "hidden".into(),
        ..User::default()
    }
}

#[test]
fn simple_mutation_orders_text_before_scalars() {
    let text = mutation(&alice()).unwrap();
    assert_eq!(
        text,
        concat!(
            "{\n",
            "  set {\n",
            "    _:user <name> \"Alice\" .\n",
            "    _:user <email> \"alice@example.com\" .\n",
            "    _:user <age> \"29\" .\n",
            "    _:user <dgraph.type> \"User\" .\n",
            "  }\n",
            "}"
        )
    );
    assert!(!text.contains("hidden"));
}

#[test]
fn json_fields_are_encoded_and_escaped() {
    let mut user = alice();
    user.roles.0.insert("user".into(), 1);
    user.roles.0.insert("company".into(), 2);
    let text = mutation(&user).unwrap();
    assert!(text.contains(concat!(
        "    _:user <email> \"alice@example.com\" .\n",
        r#"    _:user <roles> "{\"company\":2,\"user\":1}" ."#,
        "\n    _:user <age> \"29\" .\n"
    )));
}

#[test]
fn override_name_and_field_name_fallback() {
    let account = Account {
        display_name: "neo".into(),
        active: true,
        score: 1.5,
        ..Account::default()
    };
    assert_eq!(account.dgraph_type(), "Member");
    assert_eq!(blank_node_name(&account), "member");
    assert_eq!(
        mutation(&account).unwrap(),
        concat!(
            "{\n  set {\n",
            "    _:member <display_name> \"neo\" .\n",
            "    _:member <active> \"true\" .\n",
            "    _:member <score> \"1.5\" .\n",
            "    _:member <dgraph.type> \"Member\" .\n",
            "  }\n}"
        )
    );
}

#[test]
fn zero_values_are_skipped() {
    let account = Account {
        display_name: "neo".into(),
        ..Account::default()
    };
    let text = mutation(&account).unwrap();
    assert!(!text.contains("<active>"));
    assert!(!text.contains("<score>"));
}

#[test]
fn zero_json_scalars_are_skipped() {
    let stat = Stat {
        name: "x".into(),
        ..Stat::default()
    };
    assert_eq!(
        mutation(&stat).unwrap(),
        concat!(
            "{\n  set {\n",
            "    _:stat <name> \"x\" .\n",
            "    _:stat <dgraph.type> \"Stat\" .\n",
            "  }\n}"
        )
    );

    let counted = Stat {
        hits: Json(3),
        label: Json("hot".into()),
        ..stat
    };
    let text = mutation(&counted).unwrap();
    assert!(text.contains("    _:stat <hits> \"3\" .\n"));
    assert!(text.contains(r#"    _:stat <label> "\"hot\"" ."#));
}

#[test]
fn descriptor_is_built_once_per_type() {
    let a = alice();
    let b = User::default();
    assert!(std::ptr::eq(a.descriptor(), b.descriptor()));
    assert_eq!(a.descriptor().fields().len(), 5);
}

#[test]
fn mutation_requires_identifier_field() {
    let note = Note { body: "x".into() };
    let err = mutation(&note).unwrap_err();
    assert_eq!(err.code(), "MissingIdentifierField");
    assert!(!err.is_conflict());
}

#[test]
fn unencodable_json_fails_fast() {
    let mut broken = Broken::default();
    broken.tags.0.insert((1, 2), 3);
    let err = mutation(&broken).unwrap_err();
    assert_eq!(err.code(), "FieldSerialization");
}

#[test]
fn targeted_upsert() {
    let user = User {
        name: "Alice Sayum".into(),
        age: 30,
        ..User::default()
    };
    let text = upsert(
        &user,
        &filter::eq("email", "alice@example.com"),
        &["age", "name", "email", "unknown"],
    )
    .unwrap();
    assert_eq!(
        text,
        concat!(
            "upsert {\n",
            "  query {\n",
            "    user as var(func: eq(email, \"alice@example.com\"))\n",
            "  }\n",
            "  mutation {\n",
            "    set {\n",
            "      uid(user) <age> \"30\" .\n",
            "      uid(user) <name> \"Alice Sayum\" .\n",
            "    }\n",
            "  }\n",
            "}"
        )
    );
}

#[test]
fn upsert_with_named_query() {
    let user = User {
        name: "first last".into(),
        email: "user@company1.io".into(),
        ..User::default()
    };
    let node = QueryNode::new()
        .func(filter::eq("email", "user@company1.io"))
        .select(["v as uid", "name"]);
    let text = upsert_with_query("q", &node, "v", &user, &["name", "email"]).unwrap();
    assert_eq!(
        text,
        concat!(
            "upsert {\n",
            "  query {\n",
            "    q(func: eq(email, \"user@company1.io\")) {\n",
            "      v as uid\n",
            "      name\n",
            "    }\n",
            "  }\n",
            "\n",
            "  mutation {\n",
            "    set {\n",
            "      uid(v) <name> \"first last\" .\n",
            "      uid(v) <email> \"user@company1.io\" .\n",
            "    }\n",
            "  }\n",
            "}"
        )
    );
}

#[test]
fn explicit_triples_with_named_query() {
    let node = QueryNode::new()
        .type_("User")
        .lt("age", 18)
        .select(["v as uid"]);
    let text = upsert_block(
        "minors",
        &node,
        &[Triple::set("v", "minor", true), Triple::set("v", "note", "young")],
    );
    assert_eq!(
        text,
        concat!(
            "upsert {\n",
            "  query {\n",
            "    minors(func: type(User)) @filter(lt(age, 18)) {\n",
            "      v as uid\n",
            "    }\n",
            "  }\n",
            "\n",
            "  mutation {\n",
            "    set {\n",
            "      uid(v) <minor> true .\n",
            "      uid(v) <note> \"young\" .\n",
            "    }\n",
            "  }\n",
            "}"
        )
    );
}

#[test]
fn targeted_delete() {
    let text = upsert_delete(
        "v",
        &filter::regexp("email", ".*@company1.io$"),
        &["name", "email", "age"],
    );
    assert_eq!(
        text,
        concat!(
            "upsert {\n",
            "  query {\n",
            "    v as var(func: regexp(email, /.*@company1.io$/))\n",
            "  }\n",
            "\n",
            "  mutation {\n",
            "    delete {\n",
            "      uid(v) <name> * .\n",
            "      uid(v) <email> * .\n",
            "      uid(v) <age> * .\n",
            "    }\n",
            "  }\n",
            "}"
        )
    );
}
