mod common;

use common::{book, count, signup, task, track};
use trackmate_core::db::open_db_in_memory;
use trackmate_core::model::profile::{ProfileInput, Role};
use trackmate_core::model::track::{
    DiscoveryFilter, ImageUpload, TrackFilter, TrackInput, TrackPatch, TrackQuery,
};
use trackmate_core::model::validation::ValidationError;
use trackmate_core::{
    BookService, CoreError, FsImageStore, ImageStore, Project, ProfileService, TaskService,
    TrackService, View,
};

fn with_books(name: &str, titles: &[&str]) -> TrackInput {
    TrackInput {
        books: titles.iter().map(|title| book(title)).collect(),
        ..track(name)
    }
}

#[test]
fn related_id_filter_returns_each_matching_track_once() {
    let conn = open_db_in_memory().unwrap();
    let media = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(media.path());
    let ana = signup(&conn, "ana@example.com");
    let tracks = TrackService::new(&conn, &store).unwrap();

    let t1 = tracks.create(&ana, &with_books("T1", &["one"])).unwrap();
    let t2 = tracks.create(&ana, &with_books("T2", &["two"])).unwrap();
    let t3 = tracks
        .create(&ana, &with_books("T3", &["one", "two"]))
        .unwrap();
    tracks.create(&ana, &with_books("T4", &[])).unwrap();

    let book_one = t1.books[0].id;
    let book_two = t2.books[0].id;
    assert_eq!(
        t3.books.iter().map(|b| b.id).collect::<Vec<_>>(),
        vec![book_one, book_two]
    );

    let filter = TrackFilter::try_from(TrackQuery {
        books: Some(format!("{book_one},{book_two}")),
        ..TrackQuery::default()
    })
    .unwrap();
    let ids: Vec<_> = tracks
        .list(&ana, filter)
        .unwrap()
        .into_iter()
        .map(|aggregate| aggregate.track.id)
        .collect();
    assert_eq!(ids, vec![t3.track.id, t2.track.id, t1.track.id]);
}

#[test]
fn plain_and_related_filters_compose_conjunctively() {
    let conn = open_db_in_memory().unwrap();
    let media = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(media.path());
    let ana = signup(&conn, "ana@example.com");
    let tracks = TrackService::new(&conn, &store).unwrap();

    let algebra = tracks
        .create(
            &ana,
            &TrackInput {
                tasks: vec![task("drill")],
                ..track("algebra")
            },
        )
        .unwrap();
    let physics = tracks
        .create(
            &ana,
            &TrackInput {
                subject_major: "physics".to_string(),
                tasks: vec![task("drill")],
                ..track("physics")
            },
        )
        .unwrap();
    let drill = algebra.tasks[0].id;
    assert_eq!(physics.tasks[0].id, drill);

    let only_math = tracks
        .list(
            &ana,
            TrackFilter {
                subject_major: Some("math".to_string()),
                tasks: Some(vec![drill]),
                ..TrackFilter::default()
            },
        )
        .unwrap();
    assert_eq!(only_math.len(), 1);
    assert_eq!(only_math[0].track.id, algebra.track.id);

    let nothing = tracks
        .list(
            &ana,
            TrackFilter {
                target_grade: Some("B".to_string()),
                ..TrackFilter::default()
            },
        )
        .unwrap();
    assert!(nothing.is_empty());

    let err = TrackFilter::try_from(TrackQuery {
        books: Some("1,x".to_string()),
        ..TrackQuery::default()
    })
    .unwrap_err();
    assert_eq!(err.field(), "books");
}

#[test]
fn identical_nested_book_is_created_once_per_user() {
    let conn = open_db_in_memory().unwrap();
    let media = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(media.path());
    let ana = signup(&conn, "ana@example.com");
    let bo = signup(&conn, "bo@example.com");
    let tracks = TrackService::new(&conn, &store).unwrap();

    let first = tracks.create(&ana, &with_books("first", &["X"])).unwrap();
    let second = tracks.create(&ana, &with_books("second", &["X"])).unwrap();
    assert_eq!(first.books[0].id, second.books[0].id);
    assert_eq!(count(&conn, "books"), 1);

    // The natural key includes the creator.
    let other = tracks.create(&bo, &with_books("other", &["X"])).unwrap();
    assert_ne!(other.books[0].id, first.books[0].id);
    assert_eq!(count(&conn, "books"), 2);

    // A repeated payload inside one request links the row once.
    let doubled = tracks
        .create(&ana, &with_books("doubled", &["X", "X"]))
        .unwrap();
    assert_eq!(doubled.books.len(), 1);
    assert_eq!(count(&conn, "books"), 2);
}

#[test]
fn update_replaces_nested_links_only_when_provided() {
    let conn = open_db_in_memory().unwrap();
    let media = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(media.path());
    let ana = signup(&conn, "ana@example.com");
    let tracks = TrackService::new(&conn, &store).unwrap();

    let created = tracks
        .create(
            &ana,
            &TrackInput {
                tasks: vec![task("warm-up")],
                ..with_books("plan", &["old"])
            },
        )
        .unwrap();
    let old_book = created.books[0].id;

    let renamed = tracks
        .update(
            &ana,
            created.track.id,
            &TrackPatch {
                track_name: Some("renamed".to_string()),
                ..TrackPatch::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.track.track_name, "renamed");
    assert_eq!(renamed.books, created.books);
    assert_eq!(renamed.tasks, created.tasks);
    assert_eq!(renamed.track.published_date, created.track.published_date);

    let replaced = tracks
        .update(
            &ana,
            created.track.id,
            &TrackPatch {
                books: Some(vec![book("new")]),
                ..TrackPatch::default()
            },
        )
        .unwrap();
    assert_eq!(replaced.books.len(), 1);
    assert_ne!(replaced.books[0].id, old_book);
    assert_eq!(replaced.books[0].title, "new");
    assert_eq!(replaced.tasks, created.tasks);
    assert_eq!(replaced.track.track_name, "renamed");

    let cleared = tracks
        .update(
            &ana,
            created.track.id,
            &TrackPatch {
                tasks: Some(Vec::new()),
                ..TrackPatch::default()
            },
        )
        .unwrap();
    assert!(cleared.tasks.is_empty());
    assert_eq!(cleared.books, replaced.books);
}

#[test]
fn nested_patch_payload_can_be_told_apart_from_absent() {
    let absent: TrackPatch = serde_json::from_str(r#"{"track_name": "x"}"#).unwrap();
    assert_eq!(absent.books, None);

    let provided: TrackPatch = serde_json::from_str(
        r#"{"book": [{"title": "T", "author": "A", "isbn": "1", "publisher": "P"}], "task": []}"#,
    )
    .unwrap();
    assert_eq!(provided.books.map(|books| books.len()), Some(1));
    assert_eq!(provided.tasks, Some(Vec::new()));
}

#[test]
fn failed_update_leaves_track_and_links_untouched() {
    let conn = open_db_in_memory().unwrap();
    let media = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(media.path());
    let ana = signup(&conn, "ana@example.com");
    let tracks = TrackService::new(&conn, &store).unwrap();

    let created = tracks.create(&ana, &with_books("plan", &["kept"])).unwrap();
    let err = tracks
        .update(
            &ana,
            created.track.id,
            &TrackPatch {
                track_name: Some("changed".to_string()),
                books: Some(vec![book("")]),
                ..TrackPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::Missing { field: "title" })
    ));
    assert_eq!(tracks.get(&ana, created.track.id).unwrap(), created);
}

#[test]
fn create_validates_required_fields_and_counters() {
    let conn = open_db_in_memory().unwrap();
    let media = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(media.path());
    let ana = signup(&conn, "ana@example.com");
    let tracks = TrackService::new(&conn, &store).unwrap();

    let err = tracks
        .create(
            &ana,
            &TrackInput {
                track_name: String::new(),
                ..track("x")
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::Missing { field: "track_name" })
    ));

    let err = tracks
        .create(
            &ana,
            &TrackInput {
                followers_num: -1,
                ..track("x")
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::Invalid { field: "followers_num", .. })
    ));
    assert_eq!(count(&conn, "tracks"), 0);
}

#[test]
fn upload_image_requires_a_file_and_replaces_the_previous_one() {
    let conn = open_db_in_memory().unwrap();
    let media = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(media.path());
    let ana = signup(&conn, "ana@example.com");
    let bo = signup(&conn, "bo@example.com");
    let tracks = TrackService::new(&conn, &store).unwrap();
    let created = tracks.create(&ana, &track("visual")).unwrap();

    let err = tracks
        .upload_image(&ana, created.track.id, None)
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::Missing { field: "image" })
    ));

    let err = tracks
        .upload_image(&bo, created.track.id, None)
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { entity: "track", .. }));

    let upload = |name: &str| ImageUpload {
        file_name: name.to_string(),
        bytes: vec![0x89, b'P', b'N', b'G'],
    };
    let first = tracks
        .upload_image(&ana, created.track.id, Some(upload("cover.PNG")))
        .unwrap();
    assert_eq!(first.id, created.track.id);
    assert!(first.image.starts_with("uploads/track/"));
    assert!(first.image.ends_with(".png"));
    let first_path = store.resolve(&first.image).unwrap();
    assert!(first_path.exists());

    let projection = first.project(View::Detail);
    assert_eq!(projection.len(), 2);
    assert_eq!(projection["image"], first.image.as_str());

    let second = tracks
        .upload_image(&ana, created.track.id, Some(upload("next.jpg")))
        .unwrap();
    assert_ne!(second.image, first.image);
    assert!(!first_path.exists());
    assert_eq!(
        tracks.get(&ana, created.track.id).unwrap().track.image,
        Some(second.image.clone())
    );

    tracks.delete(&ana, created.track.id).unwrap();
    assert!(!store.resolve(&second.image).unwrap().exists());
    store.remove(&second.image).unwrap();
}

#[test]
fn discovery_is_unscoped_while_management_is_not() {
    let conn = open_db_in_memory().unwrap();
    let media = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(media.path());
    let ana = signup(&conn, "ana@example.com");
    let bo = signup(&conn, "bo@example.com");
    let tracks = TrackService::new(&conn, &store).unwrap();

    let math = tracks.create(&ana, &track("math")).unwrap();
    let physics = tracks
        .create(
            &bo,
            &TrackInput {
                subject_major: "physics".to_string(),
                ..track("physics")
            },
        )
        .unwrap();

    let everything = tracks.browse(DiscoveryFilter::default()).unwrap();
    assert_eq!(everything.len(), 2);

    let only_physics = tracks
        .browse(DiscoveryFilter {
            subject_major: Some("physics".to_string()),
            ..DiscoveryFilter::default()
        })
        .unwrap();
    assert_eq!(only_physics, vec![physics.clone()]);

    assert_eq!(tracks.browse_get(math.track.id).unwrap(), math);
    assert!(matches!(
        tracks.get(&bo, math.track.id),
        Err(CoreError::NotFound { .. })
    ));
    assert!(matches!(
        tracks.browse_get(9_999),
        Err(CoreError::NotFound { .. })
    ));
}

#[test]
fn track_embeds_the_leaders_profile_and_projects_by_view() {
    let conn = open_db_in_memory().unwrap();
    let media = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(media.path());
    let ana = signup(&conn, "ana@example.com");
    let tracks = TrackService::new(&conn, &store).unwrap();

    let without_profile = tracks.create(&ana, &track("early")).unwrap();
    assert!(without_profile.profile.is_none());

    let profile = ProfileService::new(&conn)
        .unwrap()
        .create(&ana, &ProfileInput::new("Ana", Role::Leader))
        .unwrap();
    let created = tracks
        .create(
            &ana,
            &TrackInput {
                description: "full plan".to_string(),
                tasks: vec![task("read")],
                ..with_books("late", &["B"])
            },
        )
        .unwrap();
    assert_eq!(created.profile.as_ref(), Some(&profile));

    let list = created.project(View::List);
    let keys: Vec<_> = list.keys().map(String::as_str).collect();
    let mut expected = vec![
        "id",
        "profile",
        "subject_major",
        "subject_minor",
        "target_test",
        "target_grade",
        "track_name",
        "book",
        "link",
        "followers_num",
        "rating_avg",
        "task",
        "image",
        "published_date",
    ];
    let mut sorted_keys = keys.clone();
    sorted_keys.sort_unstable();
    expected.sort_unstable();
    assert_eq!(sorted_keys, expected);
    assert_eq!(list["profile"]["subjects"], "");
    assert_eq!(list["book"][0]["title"], "B");
    assert_eq!(list["task"][0]["references"], "");

    let detail = created.project(View::Detail);
    assert_eq!(detail.len(), list.len() + 1);
    assert_eq!(detail["description"], "full plan");
}

#[test]
fn assigned_only_keeps_books_and_tasks_used_by_tracks() {
    let conn = open_db_in_memory().unwrap();
    let media = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(media.path());
    let ana = signup(&conn, "ana@example.com");
    let books = BookService::new(&conn).unwrap();
    let tasks = TaskService::new(&conn).unwrap();
    let tracks = TrackService::new(&conn, &store).unwrap();

    books.create(&ana, &book("loose")).unwrap();
    tasks.create(&ana, &task("loose")).unwrap();
    let created = tracks
        .create(
            &ana,
            &TrackInput {
                tasks: vec![task("linked")],
                ..with_books("plan", &["linked"])
            },
        )
        .unwrap();

    assert_eq!(books.list(&ana, false).unwrap().len(), 2);
    assert_eq!(books.list(&ana, true).unwrap(), created.books);
    assert_eq!(tasks.list(&ana, false).unwrap().len(), 2);
    assert_eq!(tasks.list(&ana, true).unwrap(), created.tasks);
}
