//! Nested entity serialization and uid write-back.

#![allow(missing_docs)]

use std::collections::HashMap;

use dqlkit::entity;
use dqlkit::mutation::{parse_mutation, serialize_graph, set_uid, set_uids, UpsertCase};

#[derive(Debug, Default)]
struct ShortUser {
    uid: String,
    name: String,
}

entity!(ShortUser {
    uid => "uid",
    name => "name",
});

#[derive(Debug, Default)]
struct Company {
    uid: String,
    name: String,
    owner: Option<Box<ShortUser>>,
    staffs: Vec<ShortUser>,
}

entity!(Company {
    uid => "uid",
    name => "name",
    owner => "owner",
    staffs => "staffs",
});

#[derive(Debug, Default)]
struct Team {
    uid: String,
    title: String,
    lead: Option<Box<ShortUser>>,
}

entity!(Team {
    uid => "uid",
    title => "title",
    lead => "lead",
});

#[derive(Debug, Default)]
struct Org {
    uid: String,
    name: String,
    teams: Vec<Team>,
}

entity!(Org {
    uid => "uid",
    name => "name",
    teams => "teams",
});

#[derive(Debug, Default)]
struct Club {
    uid: String,
    name: String,
    members: Vec<ShortUser>,
}

entity!(Club {
    uid => "uid",
    name => "name,unique",
    members => "members",
});

#[derive(Debug, Default)]
struct Ticket {
    uid: u64,
    title: String,
}

entity!(Ticket {
    uid => "uid",
    title => "title",
});

#[derive(Debug, Default)]
struct Board {
    uid: String,
    tickets: Vec<Ticket>,
}

entity!(Board {
    uid => "uid",
    tickets => "tickets",
});

fn user(name: &str) -> ShortUser {
    ShortUser {
        name: name.into(),
        ..ShortUser::default()
    }
}

fn company() -> Company {
    Company {
        name: "A".into(),
        owner: Some(Box::new(user("U"))),
        staffs: vec![user("S0"), user("S1")],
        ..Company::default()
    }
}

#[test]
fn shallow_serialization_has_own_triples_only() {
    let only_owner = Company {
        name: "A".into(),
        owner: Some(Box::new(user("U"))),
        ..Company::default()
    };
    let text = serialize_graph(&only_owner, "company", false).unwrap();
    assert_eq!(text, "_:company <name> \"A\" .\n_:company <dgraph.type> \"Company\" .");

    let deep = serialize_graph(&only_owner, "company", true).unwrap();
    assert_eq!(
        deep,
        concat!(
            "_:company <name> \"A\" .\n",
            "_:company <dgraph.type> \"Company\" .\n",
            "_:company <owner> _:owner .\n",
            "_:owner <name> \"U\" .\n",
            "_:owner <dgraph.type> \"ShortUser\" ."
        )
    );
}

#[test]
fn links_precede_nested_content() {
    let text = serialize_graph(&company(), "company", true).unwrap();
    assert_eq!(
        text,
        concat!(
            "_:company <name> \"A\" .\n",
            "_:company <dgraph.type> \"Company\" .\n",
            "_:company <owner> _:owner .\n",
            "_:company <staffs> _:staffs0 .\n",
            "_:company <staffs> _:staffs1 .\n",
            "_:owner <name> \"U\" .\n",
            "_:owner <dgraph.type> \"ShortUser\" .\n",
            "_:staffs0 <name> \"S0\" .\n",
            "_:staffs0 <dgraph.type> \"ShortUser\" .\n",
            "_:staffs1 <name> \"S1\" .\n",
            "_:staffs1 <dgraph.type> \"ShortUser\" ."
        )
    );
}

#[test]
fn each_subtree_is_emitted_before_the_next_sibling() {
    let org = Org {
        name: "O".into(),
        teams: vec![
            Team {
                title: "T0".into(),
                lead: Some(Box::new(user("L"))),
                ..Team::default()
            },
            Team {
                title: "T1".into(),
                ..Team::default()
            },
        ],
        ..Org::default()
    };
    assert_eq!(
        serialize_graph(&org, "org", true).unwrap(),
        concat!(
            "_:org <name> \"O\" .\n",
            "_:org <dgraph.type> \"Org\" .\n",
            "_:org <teams> _:teams0 .\n",
            "_:org <teams> _:teams1 .\n",
            "_:teams0 <title> \"T0\" .\n",
            "_:teams0 <dgraph.type> \"Team\" .\n",
            "_:teams0 <lead> _:lead .\n",
            "_:lead <name> \"L\" .\n",
            "_:lead <dgraph.type> \"ShortUser\" .\n",
            "_:teams1 <title> \"T1\" .\n",
            "_:teams1 <dgraph.type> \"Team\" ."
        )
    );
}

#[test]
fn nested_entity_with_uid_is_linked_not_reinserted() {
    let mut c = company();
    c.staffs.clear();
    if let Some(owner) = c.owner.as_mut() {
        owner.uid = "0x9".into();
    }
    assert_eq!(
        serialize_graph(&c, "company", true).unwrap(),
        "_:company <name> \"A\" .\n_:company <dgraph.type> \"Company\" .\n_:company <owner> <0x9> ."
    );
}

#[test]
fn insert_plan_honours_deep_flag() {
    let c = company();
    let shallow = parse_mutation(&c, false).unwrap();
    assert_eq!(shallow.case, UpsertCase::Insert);
    assert_eq!(
        shallow.mutations[0].set_nquads,
        "_:company <name> \"A\" .\n_:company <dgraph.type> \"Company\" ."
    );
    let deep = parse_mutation(&c, true).unwrap();
    assert_eq!(
        deep.mutations[0].set_nquads,
        serialize_graph(&c, "company", true).unwrap()
    );
}

#[test]
fn conditional_insert_appends_nested_content_when_deep() {
    let club = Club {
        name: "chess".into(),
        members: vec![user("M")],
        ..Club::default()
    };
    let shallow = parse_mutation(&club, false).unwrap();
    assert_eq!(shallow.case, UpsertCase::ConditionalInsert);
    assert!(!shallow.mutations[0].set_nquads.contains("members"));

    let deep = parse_mutation(&club, true).unwrap();
    assert_eq!(
        deep.mutations[0].set_nquads,
        concat!(
            "_:club <name> \"chess\" .\n",
            "_:club <dgraph.type> \"Club\" .\n",
            "_:club <members> _:members0 .\n",
            "_:members0 <name> \"M\" .\n",
            "_:members0 <dgraph.type> \"ShortUser\" ."
        )
    );
}

#[test]
fn uids_are_written_back_by_blank_node_name() {
    let mut c = company();
    let uids = HashMap::from([
        ("company".to_owned(), "0x1".to_owned()),
        ("owner".to_owned(), "0x2".to_owned()),
        ("staffs0".to_owned(), "0x3".to_owned()),
    ]);
    set_uids(&mut c, &uids).unwrap();
    assert_eq!(c.uid, "0x1");
    assert_eq!(c.owner.as_ref().map(|o| o.uid.as_str()), Some("0x2"));
    assert_eq!(c.staffs[0].uid, "0x3");
    assert_eq!(c.staffs[1].uid, "", "missing keys leave the field untouched");
}

#[test]
fn write_back_recurses_through_collections() {
    let mut org = Org {
        teams: vec![Team {
            lead: Some(Box::new(user("L"))),
            ..Team::default()
        }],
        ..Org::default()
    };
    let uids = HashMap::from([
        ("teams0".to_owned(), "0x20".to_owned()),
        ("lead".to_owned(), "0x21".to_owned()),
    ]);
    set_uids(&mut org, &uids).unwrap();
    assert_eq!(org.uid, "");
    assert_eq!(org.teams[0].uid, "0x20");
    assert_eq!(
        org.teams[0].lead.as_ref().map(|l| l.uid.as_str()),
        Some("0x21")
    );
}

#[test]
fn set_uid_overwrites_identifier() {
    let mut u = user("x");
    set_uid(&mut u, "0xff").unwrap();
    assert_eq!(u.uid, "0xff");
}

#[test]
fn non_string_identifier_cannot_receive_a_uid() {
    let mut ticket = Ticket::default();
    let err = set_uid(&mut ticket, "0x1").unwrap_err();
    assert_eq!(err.code(), "UnsettableField");
    assert!(!err.is_conflict());
    assert_eq!(ticket.uid, 0);

    let mut board = Board {
        tickets: vec![Ticket::default()],
        ..Board::default()
    };
    let uids = HashMap::from([
        ("board".to_owned(), "0x2".to_owned()),
        ("tickets0".to_owned(), "0x3".to_owned()),
    ]);
    let err = set_uids(&mut board, &uids).unwrap_err();
    assert_eq!(err.code(), "UnsettableField");
    assert_eq!(board.uid, "0x2");
}
