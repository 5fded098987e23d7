//! Subqueries used as criterion values.

use pretty_assertions::assert_eq;

use crate::ast::*;
use crate::error::Error;
use crate::fixtures;
use crate::transpiler::ROOT_ALIAS;

fn paid_orders() -> Query {
    Query::new("Order").columns(["UserId"]).where_eq("Status", 1)
}

#[test]
fn test_scalar_subquery_takes_one_row() {
    let schema = fixtures::schema();
    let mut ctx = fixtures::context(&schema);
    let query = Query::new("User").where_eq("Id", paid_orders());
    let t = ctx.translate(&query, ROOT_ALIAS, true).unwrap();
    assert_eq!(
        t.condition,
        "TB.\"ID\" = (SELECT TSB0.\"USER_ID\" FROM \"ORDERS\" TSB0 WHERE TSB0.\"STATUS\" = :Status0 AND ROWNUM <= 1)"
    );
    assert_eq!(ctx.parameters().len(), 1);
}

#[test]
fn test_scalar_subquery_parenthesizes_or() {
    let schema = fixtures::schema();
    let mut ctx = fixtures::context(&schema);
    let sub = paid_orders().or_filter("Status", Operator::Equal, 2);
    let query = Query::new("User").filter("Id", Operator::GreaterThan, sub);
    let t = ctx.translate(&query, ROOT_ALIAS, true).unwrap();
    assert_eq!(
        t.condition,
        "TB.\"ID\" > (SELECT TSB0.\"USER_ID\" FROM \"ORDERS\" TSB0 WHERE (TSB0.\"STATUS\" = :Status0 OR TSB0.\"STATUS\" = :Status1) AND ROWNUM <= 1)"
    );
}

#[test]
fn test_in_subquery_sorted_and_capped() {
    let schema = fixtures::schema();
    let mut ctx = fixtures::context(&schema);
    let sub = paid_orders().order_by("Amount", SortOrder::Desc).limit(5);
    let query = Query::new("User").filter("Id", Operator::In, sub);
    let t = ctx.translate(&query, ROOT_ALIAS, true).unwrap();
    assert_eq!(
        t.condition,
        "TB.\"ID\" IN (SELECT TSB0.\"USER_ID\" FROM (SELECT TSB0.\"USER_ID\" FROM \"ORDERS\" TSB0 \
         WHERE TSB0.\"STATUS\" = :Status0 ORDER BY TSB0.\"AMOUNT\" DESC) TSB0 WHERE ROWNUM <= 5)"
    );
}

#[test]
fn test_in_subquery_without_size_drops_sort() {
    let schema = fixtures::schema();
    let mut ctx = fixtures::context(&schema);
    let sub = paid_orders().order_by("Amount", SortOrder::Desc);
    let query = Query::new("User").filter("Id", Operator::NotIn, sub);
    let t = ctx.translate(&query, ROOT_ALIAS, true).unwrap();
    assert_eq!(
        t.condition,
        "TB.\"ID\" NOT IN (SELECT TSB0.\"USER_ID\" FROM \"ORDERS\" TSB0 WHERE TSB0.\"STATUS\" = :Status0)"
    );
}

#[test]
fn test_in_subquery_with_combine() {
    let schema = fixtures::schema();
    let mut ctx = fixtures::context(&schema);
    let sub = paid_orders()
        .combine(CombineKind::UnionAll, Query::new("Order").where_eq("Status", 2))
        .order_by("UserId", SortOrder::Desc)
        .limit(3);
    let query = Query::new("User").filter("Id", Operator::In, sub);
    let t = ctx.translate(&query, ROOT_ALIAS, true).unwrap();
    let combined = "SELECT TSB0.\"USER_ID\" FROM \"ORDERS\" TSB0 WHERE TSB0.\"STATUS\" = :Status0 \
                    UNION ALL SELECT TSB1.\"USER_ID\" FROM \"ORDERS\" TSB1 WHERE TSB1.\"STATUS\" = :Status1";
    let sorted = format!(
        "SELECT TSB0.\"USER_ID\" FROM ({}) TSB0 ORDER BY TSB0.\"USER_ID\" DESC",
        combined
    );
    assert_eq!(
        t.condition,
        format!(
            "TB.\"ID\" IN (SELECT TSB0.\"USER_ID\" FROM ({}) TSB0 WHERE ROWNUM <= 3)",
            sorted
        )
    );
}

#[test]
fn test_subquery_parameters_share_sequence() {
    let schema = fixtures::schema();
    let mut ctx = fixtures::context(&schema);
    let query = Query::new("User")
        .where_eq("Name", "a")
        .filter("Id", Operator::In, paid_orders())
        .filter("Age", Operator::LessThan, 40);
    let t = ctx.translate(&query, ROOT_ALIAS, true).unwrap();
    assert_eq!(
        t.condition,
        "TB.\"NAME\" = :Name0 AND TB.\"ID\" IN (SELECT TSB0.\"USER_ID\" FROM \"ORDERS\" TSB0 \
         WHERE TSB0.\"STATUS\" = :Status1) AND TB.\"AGE\" < :Age2"
    );
    let names: Vec<&str> = ctx.parameters().names().collect();
    assert_eq!(names, vec!["Name0", "Status1", "Age2"]);
}

#[test]
fn test_subquery_without_field() {
    let schema = fixtures::schema();
    let mut ctx = fixtures::context(&schema);
    let query = Query::new("User").where_eq("Id", Query::new("Order"));
    assert!(matches!(
        ctx.translate(&query, ROOT_ALIAS, true),
        Err(Error::MissingQueryField(entity)) if entity == "Order"
    ));
}

#[test]
fn test_recursive_subquery_lifts_pre_script() {
    let schema = fixtures::schema();
    let mut ctx = fixtures::context(&schema);
    let tree = Query::new("Department")
        .columns(["Id"])
        .recurse("Id", "ParentId", RecursionDirection::Down);
    let query = Query::new("Department").filter("ParentId", Operator::In, tree);
    let t = ctx.translate(&query, ROOT_ALIAS, true).unwrap();
    assert_eq!(t.pre_scripts.len(), 1);
    assert!(t.allow_join);
    assert!(t.condition.starts_with("TB.\"PARENT_ID\" IN (SELECT TSB0.\"ID\" FROM \"DEPARTMENTS\" TSB0 WHERE TSB0.\"ID\" IN ("));
    assert_eq!(t.recurse_object_name.as_deref(), Some("\"DEPARTMENTS\""));
    assert_eq!(t.recurse_pet_name.as_deref(), Some("TSB1"));
}

#[test]
fn test_in_subquery_combine_projects_first_field_only() {
    let schema = fixtures::schema();
    let mut ctx = fixtures::context(&schema);
    let sub = Query::new("Order")
        .columns(["UserId", "Amount"])
        .combine(CombineKind::Union, Query::new("Order").where_eq("Status", 2));
    let query = Query::new("User").filter("Id", Operator::In, sub);
    let t = ctx.translate(&query, ROOT_ALIAS, true).unwrap();
    assert_eq!(
        t.condition,
        "TB.\"ID\" IN (SELECT TSB0.\"USER_ID\" FROM \"ORDERS\" TSB0 \
         UNION SELECT TSB1.\"USER_ID\" FROM \"ORDERS\" TSB1 WHERE TSB1.\"STATUS\" = :Status0)"
    );
}
