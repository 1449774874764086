use super::*;
use crate::{
    db::memory::MemoryContext,
    test_fixtures::{Person, Simple, registry},
};

fn create(dao: &EntityDao<'_, Simple>, name: &str, counter: Option<i64>) -> Simple {
    let mut simple = Simple::named(name);
    simple.counter = counter;
    dao.save(&simple).unwrap()
}

// ---------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------

#[test]
fn save_without_key_inserts_and_assigns_key() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx);

    let saved = dao.save(&Simple::named("testSave")).unwrap();
    assert!(saved.id.is_some());
    assert_eq!(ctx.len("Simple"), 1);
}

#[test]
fn save_with_key_merges_and_keeps_key() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx);

    let mut simple = create(&dao, "testMerge", None);
    let id = simple.id;
    simple.name = Some("testMergeNew".to_string());

    let merged = dao.save(&simple).unwrap();
    assert_eq!(merged.id, id);
    assert_eq!(merged.name.as_deref(), Some("testMergeNew"));
    assert_eq!(ctx.len("Simple"), 1);
}

#[test]
fn save_and_flush_flushes_once() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx);

    let saved = dao.save_and_flush(&Simple::named("testSaveAndFlush")).unwrap();
    assert_eq!(ctx.flush_count(), 1);
    assert_eq!(dao.find(saved.id).unwrap().unwrap().id, saved.id);
}

#[test]
fn refresh_reloads_stored_state() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx);

    let mut simple = create(&dao, "testRefresh", None);
    simple.name = Some("changed".to_string());

    let refreshed = dao.refresh(&simple).unwrap();
    assert_eq!(refreshed.name.as_deref(), Some("testRefresh"));
}

#[test]
fn refresh_of_unknown_entity_is_not_found() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx);

    let mut ghost = Simple::named("ghost");
    ghost.id = Some(42);
    let err = dao.refresh(&ghost).unwrap_err();
    assert!(matches!(
        err.persistence(),
        Some(PersistenceError::EntityNotFound { .. })
    ));
}

#[test]
fn remove_deletes_the_row() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx);

    let simple = create(&dao, "testRemove", None);
    dao.remove(&simple).unwrap();
    dao.flush().unwrap();

    assert_eq!(dao.find(simple.id).unwrap(), None);
    assert!(dao.remove(&simple).is_err());
}

// ---------------------------------------------------------------------
// Example queries
// ---------------------------------------------------------------------

#[test]
fn find_by_example_skips_null_attributes() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx);
    create(&dao, "x", Some(1));
    create(&dao, "x", Some(2));
    create(&dao, "y", Some(1));

    let example = Simple::named("x");
    let found = dao.find_by_example(&example, &["name", "counter"]).unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|simple| simple.name.as_deref() == Some("x")));
}

#[test]
fn find_by_example_with_no_attributes_uses_all_singular_values() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx);
    let simple = create(&dao, "testFindByExample", Some(3));
    create(&dao, "testFindByExample", Some(4));

    let found = dao.find_by_example(&simple, &[]).unwrap();
    assert_eq!(found, vec![simple]);
}

#[test]
fn find_by_example_range_pages_results() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx);
    create(&dao, "testFindByExample", None);
    create(&dao, "testFindByExample", None);

    let found = dao
        .find_by_example_range(&Simple::named("testFindByExample"), 1, 10, &["name"])
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn find_by_example_rejects_unknown_and_collection_attributes() {
    let ctx = MemoryContext::new(registry());
    let simples = EntityDao::<Simple>::new(&ctx);
    let err = simples
        .find_by_example(&Simple::named("x"), &["nickname"])
        .unwrap_err();
    assert!(matches!(
        err.persistence(),
        Some(PersistenceError::UnknownAttribute { .. })
    ));

    let people = EntityDao::<Person>::new(&ctx);
    let err = people
        .find_by_example(&Person::new("a", "b", 1), &["tags"])
        .unwrap_err();
    assert!(matches!(err, QueryError::Argument { .. }));
}

#[test]
fn find_all_and_range() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx);
    create(&dao, "testFindAll1", None);
    create(&dao, "testFindAll2", None);

    assert_eq!(dao.find_all().unwrap().len(), 2);
    assert_eq!(dao.find_all_range(0, 1).unwrap().len(), 1);
}

#[test]
fn find_by_like_wraps_text_attributes() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx);
    create(&dao, "testFindAll1", Some(1));
    create(&dao, "testFindAll2", Some(2));
    create(&dao, "other", Some(1));

    let example = Simple::named("FindAll");
    assert_eq!(dao.find_by_like(&example, &["name"]).unwrap().len(), 2);
    assert_eq!(
        dao.find_by_like_range(&example, 1, 10, &["name"]).unwrap().len(),
        1
    );

    // non-text attributes fall back to equality
    let example = Simple::named("test").with_counter(1);
    assert_eq!(
        dao.find_by_like(&example, &["name", "counter"]).unwrap().len(),
        1
    );
}

#[test]
fn find_by_like_escapes_wildcards() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx);
    create(&dao, "50% off", None);
    create(&dao, "500 off", None);

    let found = dao.find_by_like(&Simple::named("0%"), &["name"]).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name.as_deref(), Some("50% off"));
}

// ---------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------

#[test]
fn counts() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx);
    let simple = create(&dao, "testFindAll1", Some(55));
    create(&dao, "testFindAll2", Some(55));

    assert_eq!(dao.count().unwrap(), 2);
    assert_eq!(dao.count_by_example(&simple, &["name", "counter"]).unwrap(), 1);
    assert_eq!(dao.count_by_example(&simple, &["counter"]).unwrap(), 2);
    assert_eq!(dao.count_like(&Simple::named("test"), &["name"]).unwrap(), 2);
}

#[test]
fn cursor_supports_ordering_and_paging() {
    let ctx = MemoryContext::new(registry());
    let dao = EntityDao::<Simple>::new(&ctx).with_page_size(2);
    for counter in [3, 1, 2] {
        create(&dao, "c", Some(counter));
    }

    let page: Vec<_> = dao
        .all()
        .order_desc("counter")
        .to_page(0)
        .max_results(2)
        .result_list()
        .unwrap()
        .into_iter()
        .filter_map(|simple| simple.counter)
        .collect();
    assert_eq!(page, vec![3, 2]);
    assert_eq!(dao.all().count_pages().unwrap(), 2);
}
