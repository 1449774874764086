use super::*;
use crate::{
    db::{
        criteria::Expr,
        predicate::OrderItem,
        provider::{LockMode, Output},
    },
    test_fixtures::{Person, Simple, registry},
    traits::EntityKind,
};

fn seeded() -> MemoryContext {
    let ctx = MemoryContext::new(registry());
    for (name, counter) in [("a", 3), ("b", 1), ("c", 2), ("b", 5)] {
        ctx.persist("Simple", Simple::named(name).with_counter(counter).to_row())
            .unwrap();
    }
    ctx.persist("Simple", Simple::named("d").to_row()).unwrap();
    ctx
}

fn names(outputs: Vec<Output>) -> Vec<String> {
    outputs
        .into_iter()
        .filter_map(Output::into_row)
        .map(|row| Simple::from_row(&row).unwrap().name.unwrap_or_default())
        .collect()
}

fn run(ctx: &MemoryContext, query: &str, params: &[Value]) -> Vec<Output> {
    let mut prepared = ctx.create_query(query).unwrap();
    for (i, value) in params.iter().enumerate() {
        prepared.set_parameter(i + 1, value.clone());
    }
    prepared.result_list().unwrap()
}

// ---------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------

#[test]
fn persist_generates_sequential_keys() {
    let ctx = seeded();
    assert_eq!(ctx.len("Simple"), 5);

    let row = ctx.find("Simple", &Value::Int(2)).unwrap().unwrap();
    assert_eq!(row.value("name"), &Value::from("b"));
    assert_eq!(ctx.find("Simple", &Value::Int(99)).unwrap(), None);
}

#[test]
fn explicit_keys_advance_the_sequence() {
    let ctx = MemoryContext::new(registry());
    let mut simple = Simple::named("x");
    simple.id = Some(10);
    ctx.persist("Simple", simple.to_row()).unwrap();

    let stored = ctx.persist("Simple", Simple::named("y").to_row()).unwrap();
    assert_eq!(stored.value("id"), &Value::Int(11));

    let err = ctx.persist("Simple", simple.to_row()).unwrap_err();
    assert!(matches!(err, PersistenceError::ConstraintViolation { .. }));
}

#[test]
fn merge_replaces_or_inserts() {
    let ctx = seeded();
    let mut row = ctx.find("Simple", &Value::Int(1)).unwrap().unwrap();
    row.insert("name".to_string(), Value::from("renamed"));
    ctx.merge("Simple", row).unwrap();

    let row = ctx.find("Simple", &Value::Int(1)).unwrap().unwrap();
    assert_eq!(row.value("name"), &Value::from("renamed"));
    assert_eq!(ctx.len("Simple"), 5);

    let stored = ctx.merge("Simple", Simple::named("new").to_row()).unwrap();
    assert_eq!(stored.value("id"), &Value::Int(6));
}

#[test]
fn remove_unknown_key_is_not_found() {
    let ctx = seeded();
    ctx.remove("Simple", &Value::Int(1)).unwrap();
    assert_eq!(ctx.len("Simple"), 4);

    let err = ctx.remove("Simple", &Value::Int(1)).unwrap_err();
    assert!(matches!(err, PersistenceError::EntityNotFound { .. }));
}

#[test]
fn unknown_entity_is_reported() {
    let ctx = seeded();
    let err = ctx.persist("Nope", Row::new()).unwrap_err();
    assert!(matches!(err, PersistenceError::UnknownEntity { .. }));

    ctx.flush().unwrap();
    assert_eq!(ctx.flush_count(), 1);
}

// ---------------------------------------------------------------------
// Query language
// ---------------------------------------------------------------------

#[test]
fn filters_with_positional_parameters() {
    let ctx = seeded();
    let rows = run(&ctx, "select e from Simple e where e.name = ?1", &["b".into()]);
    assert_eq!(names(rows), vec!["b", "b"]);

    let rows = run(
        &ctx,
        "select e from Simple e where e.counter between ?1 and ?2 order by e.counter desc",
        &[2.into(), 5.into()],
    );
    assert_eq!(names(rows), vec!["b", "a", "c"]);
}

#[test]
fn nulls_never_match_comparisons() {
    let ctx = seeded();
    let rows = run(&ctx, "select e from Simple e where e.counter <> ?1", &[1.into()]);
    assert_eq!(names(rows), vec!["a", "c", "b"]);

    let rows = run(&ctx, "select e from Simple e where not (e.counter = 1)", &[]);
    assert_eq!(names(rows), vec!["a", "c", "b"]);

    let rows = run(&ctx, "select e from Simple e where e.counter is null", &[]);
    assert_eq!(names(rows), vec!["d"]);
}

#[test]
fn ordering_is_stable_with_nulls_first() {
    let ctx = seeded();
    let rows = run(&ctx, "select e from Simple e order by e.counter", &[]);
    assert_eq!(names(rows), vec!["d", "b", "c", "a", "b"]);

    let rows = run(&ctx, "select e from Simple e order by e.name asc", &[]);
    assert_eq!(names(rows), vec!["a", "b", "b", "c", "d"]);
}

#[test]
fn like_in_and_case_folding() {
    let ctx = seeded();
    let rows = run(
        &ctx,
        "select e from Simple e where upper(e.name) like upper(?1) or e.name in (?2, 'c')",
        &["A%".into(), "d".into()],
    );
    assert_eq!(names(rows), vec!["a", "c", "d"]);

    let rows = run(
        &ctx,
        "select e from Simple e where e.counter not in ?1",
        &[Value::from(vec![1_i64, 2, 3])],
    );
    assert_eq!(names(rows), vec!["b"]);
}

#[test]
fn count_projection_ignores_paging() {
    let ctx = seeded();
    let mut query = ctx
        .create_query("select count(e) from Simple e where e.counter > 1")
        .unwrap();
    query.set_first_result(10);
    query.set_max_results(1);

    let result = query.single_result().unwrap();
    assert_eq!(result, Output::Scalar(Value::Uint(3)));
}

#[test]
fn paging_skips_and_limits() {
    let ctx = seeded();
    let mut query = ctx
        .create_query("select e from Simple e order by e.name")
        .unwrap();
    query.set_first_result(1);
    query.set_max_results(2);
    query.set_lock_mode(LockMode::PessimisticRead);

    assert_eq!(names(query.result_list().unwrap()), vec!["b", "b"]);
    assert_eq!(query.lock_mode(), LockMode::PessimisticRead);
}

#[test]
fn single_result_distinguishes_none_and_many() {
    let ctx = seeded();
    let mut query = ctx
        .create_query("select e from Simple e where e.name = ?1")
        .unwrap();

    query.set_parameter(1, "zzz".into());
    assert!(matches!(
        query.single_result(),
        Err(PersistenceError::NoResult { .. })
    ));

    query.set_parameter(1, "b".into());
    assert!(matches!(
        query.single_result(),
        Err(PersistenceError::NonUnique { count: 2, .. })
    ));

    query.set_parameter(1, "a".into());
    assert!(query.single_result().is_ok());
}

#[test]
fn missing_parameter_is_an_error() {
    let ctx = seeded();
    let query = ctx
        .create_query("select e from Simple e where e.name = :name")
        .unwrap();
    let err = query.result_list().unwrap_err();
    assert_eq!(
        err,
        PersistenceError::MissingParameter {
            parameter: ":name".to_string()
        }
    );
}

#[test]
fn syntax_and_attribute_errors() {
    let ctx = seeded();
    for bad in [
        "select e Simple e",
        "select e from Simple e where e.name = 'open",
        "select x from Simple e",
        "select e from Simple e where name = ?1",
    ] {
        assert!(
            matches!(
                ctx.create_query(bad).unwrap_err(),
                PersistenceError::Syntax { .. }
            ),
            "{bad}"
        );
    }

    assert!(matches!(
        ctx.create_query("select e from Simple e where e.nickname = ?1")
            .unwrap_err(),
        PersistenceError::UnknownAttribute { .. }
    ));
    assert!(matches!(
        ctx.create_query("select e from Missing e").unwrap_err(),
        PersistenceError::UnknownEntity { .. }
    ));
}

#[test]
fn bulk_delete_runs_through_execute_update() {
    let ctx = seeded();
    let mut query = ctx
        .create_query("delete from Simple e where e.name = ?1")
        .unwrap();
    query.set_parameter(1, "b".into());

    assert!(query.result_list().is_err());
    assert_eq!(query.execute_update().unwrap(), 2);
    assert_eq!(ctx.len("Simple"), 3);
}

#[test]
fn bulk_delete_with_unbound_parameter_removes_nothing() {
    let ctx = seeded();
    let query = ctx
        .create_query("delete from Simple e where e.name = 'b' or e.counter = ?1")
        .unwrap();

    assert!(matches!(
        query.execute_update().unwrap_err(),
        PersistenceError::MissingParameter { .. }
    ));
    assert_eq!(ctx.len("Simple"), 5);
}

#[test]
fn named_and_native_queries() {
    let ctx = seeded();

    let mut named = ctx.create_named_query("Simple.byName").unwrap();
    assert_eq!(named.source(), QuerySource::Named);
    named.set_parameter(1, "c".into());
    assert_eq!(names(named.result_list().unwrap()), vec!["c"]);

    assert!(matches!(
        ctx.create_named_query("Simple.unknown").unwrap_err(),
        PersistenceError::UnknownNamedQuery { .. }
    ));

    let mut native = ctx
        .create_native_query("select * from simple_table where name = ? and counter > ?")
        .unwrap();
    native.set_parameter(1, "b".into());
    native.set_parameter(2, 2.into());
    assert_eq!(names(native.result_list().unwrap()), vec!["b"]);
}

#[test]
fn embedded_and_collection_predicates() {
    let ctx = MemoryContext::new(registry());
    for person in [
        Person::new("Ada", "Lovelace", 36).in_city("London").tagged(&["math"]),
        Person::new("Alan", "Turing", 41).in_city("Wilmslow"),
        Person::new("Grace", "Hopper", 85).tagged(&["navy", "cobol"]),
    ] {
        ctx.persist("Person", person.to_row()).unwrap();
    }

    let rows = run(&ctx, "select p from Person p where p.address.city = ?1", &["London".into()]);
    assert_eq!(rows.len(), 1);

    let rows = run(&ctx, "select p from Person p where p.tags is empty", &[]);
    assert_eq!(rows.len(), 1);

    let rows = run(&ctx, "select p from Person p where ?1 member of p.tags", &["cobol".into()]);
    let people: Vec<_> = rows
        .into_iter()
        .filter_map(Output::into_row)
        .map(|row| Person::from_row(&row).unwrap())
        .collect();
    assert_eq!(people[0].last_name, "Hopper");
}

#[test]
fn criteria_queries_share_the_evaluator() {
    let ctx = seeded();
    let criteria = CriteriaQuery::select("Simple")
        .filter(Expr::equals("name", "b"))
        .order_by(OrderItem::desc("counter"));
    let query = ctx.create_criteria_query(criteria).unwrap();
    assert_eq!(query.source(), QuerySource::Criteria);

    let counters: Vec<_> = query
        .result_list()
        .unwrap()
        .into_iter()
        .filter_map(Output::into_row)
        .map(|row| row.value("counter").clone())
        .collect();
    assert_eq!(counters, vec![Value::Int(5), Value::Int(1)]);
}
