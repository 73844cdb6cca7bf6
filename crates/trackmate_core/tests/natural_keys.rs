mod common;

use common::{book, count, signup, task, track};
use trackmate_core::db::open_db_in_memory;
use trackmate_core::model::book::BookPatch;
use trackmate_core::model::task::{TaskInput, TaskPatch};
use trackmate_core::model::track::TrackInput;
use trackmate_core::{BookService, CoreError, FsImageStore, TaskService, TrackService};

#[test]
fn unset_and_negative_track_ids_are_distinct_task_keys() {
    let conn = open_db_in_memory().unwrap();
    let ana = signup(&conn, "ana@example.com");
    let tasks = TaskService::new(&conn).unwrap();

    let loose = tasks.create(&ana, &task("x")).unwrap();
    let negative_input = TaskInput {
        track_id: Some(-1),
        ..task("x")
    };
    let negative = tasks.create(&ana, &negative_input).unwrap();
    assert_ne!(loose.id, negative.id);

    assert_eq!(tasks.create(&ana, &task("x")).unwrap().id, loose.id);
    assert_eq!(tasks.create(&ana, &negative_input).unwrap().id, negative.id);
    assert_eq!(count(&conn, "tasks"), 2);
}

#[test]
fn nested_task_with_negative_track_id_reuses_its_own_row() {
    let conn = open_db_in_memory().unwrap();
    let media = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(media.path());
    let ana = signup(&conn, "ana@example.com");
    let tracks = TrackService::new(&conn, &store).unwrap();

    let input = TrackInput {
        tasks: vec![
            task("x"),
            TaskInput {
                track_id: Some(-1),
                ..task("x")
            },
        ],
        ..track("keys")
    };
    let first = tracks.create(&ana, &input).unwrap();
    assert_eq!(first.tasks.len(), 2);

    let second = tracks.create(&ana, &input).unwrap();
    let ids = |aggregate: &trackmate_core::model::track::TrackAggregate| {
        let mut ids: Vec<_> = aggregate.tasks.iter().map(|task| task.id).collect();
        ids.sort_unstable();
        ids
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(count(&conn, "tasks"), 2);
}

#[test]
fn book_update_onto_an_existing_key_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let ana = signup(&conn, "ana@example.com");
    let books = BookService::new(&conn).unwrap();

    books.create(&ana, &book("A")).unwrap();
    let b = books.create(&ana, &book("B")).unwrap();

    let err = books
        .update(
            &ana,
            b.id,
            BookPatch {
                title: Some("A".to_string()),
                ..BookPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { entity: "book" }));
    assert_eq!(books.get(&ana, b.id).unwrap().title, "B");
}

#[test]
fn task_update_onto_an_existing_key_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let ana = signup(&conn, "ana@example.com");
    let bo = signup(&conn, "bo@example.com");
    let tasks = TaskService::new(&conn).unwrap();

    tasks.create(&ana, &task("read")).unwrap();
    let drill = tasks.create(&ana, &task("drill")).unwrap();
    let rename = || TaskPatch {
        task_name: Some("read".to_string()),
        ..TaskPatch::default()
    };

    let err = tasks.update(&ana, drill.id, rename()).unwrap_err();
    assert!(matches!(err, CoreError::Conflict { entity: "task" }));

    let other = tasks.create(&bo, &task("drill")).unwrap();
    assert_eq!(tasks.update(&bo, other.id, rename()).unwrap().task_name, "read");
}
