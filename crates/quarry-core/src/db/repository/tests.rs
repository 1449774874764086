use super::*;
use crate::{
    config::QueryConfig,
    db::{
        compile::Backend,
        dao::EntityDao,
        memory::MemoryContext,
        method::QueryDeclaration,
        predicate::Direction,
    },
    error::PersistenceError,
    obs::MetricsEvent,
    test_fixtures::{Person, Simple, registry},
};
use proptest::prelude::*;
use std::sync::Mutex;

fn simple_repository(backend: Backend) -> Repository<Simple> {
    Repository::<Simple>::builder()
        .method(MethodSignature::new("findByName", ReturnKind::List).param())
        .method(MethodSignature::new("findByNameOrderByCounterDesc", ReturnKind::List).param())
        .method(MethodSignature::new("findByCounterBetween", ReturnKind::List).params(2))
        .method(MethodSignature::new("findByCounterIn", ReturnKind::List).param())
        .method(MethodSignature::new("findByNameStartingWith", ReturnKind::List).param())
        .method(MethodSignature::new("findByNameIgnoreCase", ReturnKind::List).param())
        .method(MethodSignature::new("findByCounterIsNull", ReturnKind::List))
        .method(MethodSignature::new("findByEnabledFalse", ReturnKind::List))
        .method(MethodSignature::new("findFirst2ByEnabledTrueOrderByCounterAsc", ReturnKind::List))
        .method(MethodSignature::new("findAnyByName", ReturnKind::Single).param())
        .method(MethodSignature::new("findOptionalByName", ReturnKind::Optional).param())
        .method(MethodSignature::new("findByEnabledTrue", ReturnKind::Cursor))
        .method(
            MethodSignature::new("findByCounterGreaterThan", ReturnKind::List)
                .param()
                .page()
                .sort(),
        )
        .method(MethodSignature::new("countByName", ReturnKind::Count).param())
        .method(MethodSignature::new("existsByName", ReturnKind::Exists).param())
        .method(MethodSignature::new("deleteByName", ReturnKind::Count).param())
        .method(
            MethodSignature::new("byNamed", ReturnKind::List)
                .named_param("name")
                .query(QueryDeclaration::query(
                    "select s from Simple s where s.name = :name",
                )),
        )
        .method(
            MethodSignature::new("nativeByCounter", ReturnKind::List)
                .param()
                .query(QueryDeclaration::native(
                    "select * from simple_table where counter >= ?",
                )),
        )
        .method(
            MethodSignature::new("namedByName", ReturnKind::Cursor)
                .param()
                .query(QueryDeclaration::named("Simple.byName")),
        )
        .method(
            MethodSignature::new("firstByQuery", ReturnKind::List).query(
                QueryDeclaration::query("select e from Simple e order by e.counter desc")
                    .with_max_results(1),
            ),
        )
        .method(
            MethodSignature::new("purgeDisabled", ReturnKind::Void)
                .query(QueryDeclaration::query("delete from Simple e where e.enabled = false")),
        )
        .method(
            MethodSignature::new("total", ReturnKind::Count).delegate(|persistence, _| {
                EntityDao::<Simple>::new(persistence).count().map(Outcome::Count)
            }),
        )
        .build(&registry(), &QueryConfig::default().with_backend(backend))
        .unwrap()
}

fn seeded() -> MemoryContext {
    let ctx = MemoryContext::new(registry());
    let rows = [
        Simple::named("alpha").with_counter(1),
        Simple::named("beta").with_counter(2),
        Simple::named("alpha").with_counter(3),
        Simple::named("Gamma"),
        Simple {
            enabled: false,
            ..Simple::named("off%").with_counter(5)
        },
    ];
    for simple in rows {
        ctx.persist("Simple", simple.to_row()).unwrap();
    }
    ctx
}

fn counters(outcome: Outcome<'_, Simple>) -> Vec<Option<i64>> {
    outcome
        .into_list()
        .unwrap()
        .into_iter()
        .map(|simple| simple.counter)
        .collect()
}

fn list(
    repo: &Repository<Simple>,
    ctx: &MemoryContext,
    name: &str,
    args: Vec<Argument>,
) -> Vec<Option<i64>> {
    counters(repo.invoke(ctx, name, args).unwrap())
}

// ---------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------

#[test]
fn duplicate_method_names_are_rejected() {
    let err = Repository::<Simple>::builder()
        .method(MethodSignature::new("findByName", ReturnKind::List).param())
        .method(MethodSignature::new("findByName", ReturnKind::List).param())
        .build(&registry(), &QueryConfig::default())
        .unwrap_err();
    assert!(matches!(err, QueryError::Signature { .. }));
}

#[test]
fn one_bad_method_fails_the_whole_build() {
    let err = Repository::<Simple>::builder()
        .method(MethodSignature::new("findByName", ReturnKind::List).param())
        .method(MethodSignature::new("findByNickname", ReturnKind::List).param())
        .build(&registry(), &QueryConfig::default())
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn unregistered_entity_is_rejected() {
    let err = Repository::<Simple>::builder()
        .build(&crate::model::MetadataRegistry::new(), &QueryConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Method(MethodExpressionError::UnknownEntity { .. })
    ));
}

#[test]
fn invalid_config_is_rejected() {
    let config = QueryConfig::default().with_page_size(0);
    let err = Repository::<Simple>::builder()
        .build(&registry(), &config)
        .unwrap_err();
    assert!(matches!(err, QueryError::Config(_)));
}

#[test]
fn classification_is_recorded() {
    struct Capture(Mutex<Vec<MethodKind>>);

    impl MetricsSink for Capture {
        fn record(&self, event: MetricsEvent) {
            if let MetricsEvent::Classified { kind, .. } = event {
                self.0.lock().unwrap().push(kind);
            }
        }
    }

    static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

    let repo = Repository::<Simple>::builder()
        .metrics_sink(&CAPTURE)
        .method(MethodSignature::new("findByName", ReturnKind::List).param())
        .method(
            MethodSignature::new("total", ReturnKind::Count).delegate(|_, _| Ok(Outcome::Count(0))),
        )
        .build(&registry(), &QueryConfig::default())
        .unwrap();

    assert_eq!(repo.kind("findByName"), Some(MethodKind::Derive));
    assert_eq!(repo.kind("total"), Some(MethodKind::Delegate));

    let kinds = CAPTURE.0.lock().unwrap().clone();
    assert_eq!(kinds, vec![MethodKind::Derive, MethodKind::Delegate]);
}

// ---------------------------------------------------------------------
// Derived methods
// ---------------------------------------------------------------------

#[test]
fn derived_methods_on_both_backends() {
    let ctx = seeded();
    for backend in [Backend::Text, Backend::Criteria] {
        let repo = simple_repository(backend);
        let call = |name: &str, args: Vec<Argument>| list(&repo, &ctx, name, args);

        assert_eq!(call("findByName", vec![Argument::value("alpha")]), vec![Some(1), Some(3)]);
        assert_eq!(
            call("findByNameOrderByCounterDesc", vec![Argument::value("alpha")]),
            vec![Some(3), Some(1)]
        );
        assert_eq!(
            call("findByCounterBetween", vec![Argument::value(2_i64), Argument::value(3_i64)]),
            vec![Some(2), Some(3)]
        );
        assert_eq!(
            call("findByCounterIn", vec![Argument::value(vec![1_i64, 5])]),
            vec![Some(1), Some(5)]
        );
        assert_eq!(call("findByNameIgnoreCase", vec![Argument::value("GAMMA")]), vec![None]);
        assert_eq!(call("findByCounterIsNull", vec![]), vec![None]);
        assert_eq!(call("findByEnabledFalse", vec![]), vec![Some(5)]);
        assert_eq!(
            call("findFirst2ByEnabledTrueOrderByCounterAsc", vec![]),
            vec![None, Some(1)]
        );
    }
}

#[test]
fn like_wrapped_arguments_are_escaped() {
    let ctx = seeded();
    let repo = simple_repository(Backend::Text);

    assert_eq!(
        list(&repo, &ctx, "findByNameStartingWith", vec![Argument::value("al")]),
        vec![Some(1), Some(3)]
    );
    assert_eq!(
        list(&repo, &ctx, "findByNameStartingWith", vec![Argument::value("off%")]),
        vec![Some(5)]
    );
    assert!(
        list(&repo, &ctx, "findByNameStartingWith", vec![Argument::value("%")]).is_empty()
    );
}

#[test]
fn page_and_sort_arguments_shape_the_query() {
    let ctx = seeded();
    let repo = simple_repository(Backend::Criteria);

    let page = list(
        &repo,
        &ctx,
        "findByCounterGreaterThan",
        vec![
            Argument::value(0_i64),
            Argument::Page { first: 1, max: 2 },
            Argument::Sort(vec![OrderItem::desc("counter")]),
        ],
    );
    assert_eq!(page, vec![Some(3), Some(2)]);
}

#[test]
fn single_and_optional_results() {
    let ctx = seeded();
    let repo = simple_repository(Backend::Text);

    let beta = repo
        .invoke(&ctx, "findAnyByName", vec![Argument::value("beta")])
        .unwrap()
        .into_entity()
        .unwrap();
    assert_eq!(beta.counter, Some(2));

    let err = repo
        .invoke(&ctx, "findAnyByName", vec![Argument::value("alpha")])
        .unwrap_err();
    assert!(matches!(
        err.persistence(),
        Some(PersistenceError::NonUnique { count: 2, .. })
    ));

    let none = repo
        .invoke(&ctx, "findOptionalByName", vec![Argument::value("zeta")])
        .unwrap();
    assert!(matches!(none, Outcome::Maybe(None)));
}

#[test]
fn count_exists_and_delete() {
    let ctx = seeded();
    let repo = simple_repository(Backend::Text);

    let count = repo.invoke(&ctx, "countByName", vec![Argument::value("alpha")]).unwrap();
    assert_eq!(count.count(), Some(2));

    let exists = repo.invoke(&ctx, "existsByName", vec![Argument::value("beta")]).unwrap();
    assert_eq!(exists.exists(), Some(true));
    let exists = repo.invoke(&ctx, "existsByName", vec![Argument::value("zeta")]).unwrap();
    assert_eq!(exists.exists(), Some(false));

    let deleted = repo.invoke(&ctx, "deleteByName", vec![Argument::value("alpha")]).unwrap();
    assert!(matches!(deleted, Outcome::Affected(2)));
    assert_eq!(ctx.len("Simple"), 3);
}

#[test]
fn cursor_outcome_stays_lazy() {
    let ctx = seeded();
    let repo = simple_repository(Backend::Criteria);

    let cursor = repo
        .invoke(&ctx, "findByEnabledTrue", vec![])
        .unwrap()
        .into_cursor()
        .unwrap()
        .order_desc("counter")
        .with_page_size(3);

    assert_eq!(cursor.count().unwrap(), 4);
    assert_eq!(cursor.count_pages().unwrap(), 2);
    let counters: Vec<_> = cursor
        .result_list()
        .unwrap()
        .into_iter()
        .map(|simple| simple.counter)
        .collect();
    assert_eq!(counters.len(), 3);
}

// ---------------------------------------------------------------------
// Explicit and delegate methods
// ---------------------------------------------------------------------

#[test]
fn explicit_queries_bind_parameters() {
    let ctx = seeded();
    let repo = simple_repository(Backend::Text);

    assert_eq!(
        list(&repo, &ctx, "byNamed", vec![Argument::value("beta")]),
        vec![Some(2)]
    );
    assert_eq!(
        list(&repo, &ctx, "nativeByCounter", vec![Argument::value(3_i64)]),
        vec![Some(3), Some(5)]
    );
    assert_eq!(list(&repo, &ctx, "firstByQuery", vec![]), vec![Some(5)]);
}

#[test]
fn named_query_cursor_counts_through_rewrite() {
    let ctx = seeded();
    let repo = simple_repository(Backend::Text);

    let cursor = repo
        .invoke(&ctx, "namedByName", vec![Argument::value("alpha")])
        .unwrap()
        .into_cursor()
        .unwrap();
    assert_eq!(cursor.count().unwrap(), 2);
    assert_eq!(cursor.result_list().unwrap().len(), 2);
}

#[test]
fn explicit_bulk_delete_returns_unit() {
    let ctx = seeded();
    let repo = simple_repository(Backend::Text);

    let outcome = repo.invoke(&ctx, "purgeDisabled", vec![]).unwrap();
    assert!(outcome.is_unit());
    assert_eq!(ctx.len("Simple"), 4);
}

#[test]
fn failed_bulk_delete_keeps_every_row() {
    let ctx = seeded();
    let lenient = QueryConfig {
        strict_arity: false,
        ..QueryConfig::default()
    };

    for backend in [Backend::Text, Backend::Criteria] {
        let repo = Repository::<Simple>::builder()
            .method(MethodSignature::new("deleteByName", ReturnKind::Count))
            .build(&registry(), &lenient.clone().with_backend(backend))
            .unwrap();

        let err = repo.invoke(&ctx, "deleteByName", vec![]).unwrap_err();
        assert!(matches!(
            err.persistence(),
            Some(PersistenceError::MissingParameter { .. })
        ));
        assert_eq!(ctx.len("Simple"), 5);
    }
}

#[test]
fn delegates_run_their_body() {
    let ctx = seeded();
    let repo = simple_repository(Backend::Text);

    let outcome = repo.invoke(&ctx, "total", vec![]).unwrap();
    assert_eq!(outcome.count(), Some(5));
}

#[test]
fn invocation_errors() {
    let ctx = seeded();
    let repo = simple_repository(Backend::Text);

    let err = repo.invoke(&ctx, "missing", vec![]).unwrap_err();
    assert!(matches!(err, QueryError::UnknownMethod { .. }));

    let err = repo.invoke(&ctx, "findByName", vec![]).unwrap_err();
    assert!(matches!(err, QueryError::Argument { .. }));

    let err = repo
        .invoke(&ctx, "findByName", vec![Argument::Page { first: 0, max: 1 }])
        .unwrap_err();
    assert!(matches!(err, QueryError::Argument { .. }));
}

#[test]
fn embedded_paths_resolve_in_derived_methods() {
    let ctx = MemoryContext::new(registry());
    for person in [
        Person::new("Ada", "Lovelace", 36).in_city("London"),
        Person::new("Alan", "Turing", 41).in_city("Manchester"),
        Person::new("Grace", "Hopper", 85).tagged(&["navy"]),
    ] {
        ctx.persist("Person", person.to_row()).unwrap();
    }

    for backend in [Backend::Text, Backend::Criteria] {
        let repo = Repository::<Person>::builder()
            .method(MethodSignature::new("findByAddressCity", ReturnKind::List).param())
            .method(MethodSignature::new("findByTagsContaining", ReturnKind::List).param())
            .method(MethodSignature::new("findByTagsIsEmpty", ReturnKind::List))
            .build(&registry(), &QueryConfig::default().with_backend(backend))
            .unwrap();

        let names = |name: &str, args: Vec<Argument>| -> Vec<String> {
            repo.invoke(&ctx, name, args)
                .unwrap()
                .into_list()
                .unwrap()
                .into_iter()
                .map(|person| person.first_name)
                .collect()
        };

        assert_eq!(names("findByAddressCity", vec![Argument::value("London")]), vec!["Ada"]);
        assert_eq!(names("findByTagsContaining", vec![Argument::value("navy")]), vec!["Grace"]);
        assert_eq!(names("findByTagsIsEmpty", vec![]), vec!["Ada", "Alan"]);
    }
}

// ---------------------------------------------------------------------
// Backend equivalence
// ---------------------------------------------------------------------

fn arb_simple() -> impl Strategy<Value = Simple> {
    (
        prop::sample::select(vec!["alpha", "beta", "gamma"]),
        prop::option::of(0_i64..6),
        any::<bool>(),
    )
        .prop_map(|(name, counter, enabled)| Simple {
            id: None,
            name: Some(name.to_string()),
            counter,
            enabled,
        })
}

proptest! {
    #[test]
    fn text_and_criteria_backends_agree(
        rows in prop::collection::vec(arb_simple(), 0..12),
        name in prop::sample::select(vec!["alpha", "beta", "gamma"]),
        low in 0_i64..6,
        span in 0_i64..4,
    ) {
        let ctx = MemoryContext::new(registry());
        for simple in &rows {
            ctx.persist("Simple", simple.to_row()).unwrap();
        }
        let text = simple_repository(Backend::Text);
        let criteria = simple_repository(Backend::Criteria);

        let calls: Vec<(&str, Vec<Argument>)> = vec![
            ("findByName", vec![Argument::value(name)]),
            ("findByNameOrderByCounterDesc", vec![Argument::value(name)]),
            ("findByCounterBetween", vec![Argument::value(low), Argument::value(low + span)]),
            ("findByCounterIsNull", vec![]),
            ("findByEnabledFalse", vec![]),
            ("findFirst2ByEnabledTrueOrderByCounterAsc", vec![]),
            ("findByNameStartingWith", vec![Argument::value(&name[..2])]),
        ];

        for (method, args) in calls {
            let a = text.invoke(&ctx, method, args.clone()).unwrap().into_list().unwrap();
            let b = criteria.invoke(&ctx, method, args).unwrap().into_list().unwrap();
            prop_assert_eq!(a, b, "{}", method);
        }

        let sort = vec![OrderItem { path: "counter".into(), direction: Direction::Desc }];
        let paged = |repo: &Repository<Simple>| {
            repo.invoke(
                &ctx,
                "findByCounterGreaterThan",
                vec![
                    Argument::value(low),
                    Argument::Page { first: 1, max: 3 },
                    Argument::Sort(sort.clone()),
                ],
            )
            .unwrap()
            .into_list()
            .unwrap()
        };
        prop_assert_eq!(paged(&text), paged(&criteria));
    }
}
