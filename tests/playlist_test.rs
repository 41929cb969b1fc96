use worship_board::db;
use worship_board::model::{Identity, NewPlaylistEntry, PlaylistUpdate, Role};
use worship_board::music;
use worship_board::playlist::Playlist;
use worship_board::Error;

async fn setup_pool() -> sqlx::SqlitePool {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

fn song(name: &str) -> NewPlaylistEntry {
    NewPlaylistEntry {
        name: name.into(),
        minister: Some("Ana".into()),
        ..Default::default()
    }
}

async fn names_in_order(playlist: &Playlist) -> Vec<(String, i64)> {
    playlist
        .list_ordered()
        .await
        .unwrap()
        .into_iter()
        .map(|e| (e.name, e.rank))
        .collect()
}

async fn seed(playlist: &Playlist, names: &[&str]) -> Vec<String> {
    let mut ids = Vec::new();
    for name in names {
        ids.push(playlist.append(song(name)).await.unwrap().id);
    }
    ids
}

#[tokio::test]
async fn append_assigns_dense_increasing_ranks() {
    let pool = setup_pool().await;
    let playlist = Playlist::new(pool);

    let a = playlist.append(song("A")).await.unwrap();
    let b = playlist.append(song("B")).await.unwrap();
    let c = playlist.append(song("C")).await.unwrap();
    assert_eq!((a.rank, b.rank, c.rank), (1, 2, 3));

    let listed = names_in_order(&playlist).await;
    assert_eq!(
        listed,
        vec![("A".to_string(), 1), ("B".to_string(), 2), ("C".to_string(), 3)]
    );
}

#[tokio::test]
async fn append_rejects_blank_name_without_writing() {
    let pool = setup_pool().await;
    let playlist = Playlist::new(pool);

    let err = playlist.append(song("   ")).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(playlist.list_ordered().await.unwrap().is_empty());
}

#[tokio::test]
async fn append_with_existing_id_conflicts() {
    let pool = setup_pool().await;
    let playlist = Playlist::new(pool);

    let mut first = song("A");
    first.id = Some("fixed".into());
    playlist.append(first).await.unwrap();

    let mut again = song("B");
    again.id = Some("fixed".into());
    let err = playlist.append(again).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(playlist.list_ordered().await.unwrap().len(), 1);
}

#[tokio::test]
async fn append_canonicalizes_link() {
    let pool = setup_pool().await;
    let playlist = Playlist::new(pool);

    let mut entry = song("A");
    entry.link = Some("https://www.youtube.com/watch?v=abc123".into());
    let stored = playlist.append(entry).await.unwrap();
    assert_eq!(
        stored.link.as_deref(),
        Some("https://www.youtube.com/embed/abc123")
    );

    let mut other = song("B");
    other.link = Some("https://vimeo.com/1".into());
    assert_eq!(playlist.append(other).await.unwrap().link, None);
}

#[tokio::test]
async fn moving_last_entry_up_shifts_the_rest_down() {
    let pool = setup_pool().await;
    let playlist = Playlist::new(pool);
    let ids = seed(&playlist, &["A", "B", "C", "D"]).await;

    let patch = PlaylistUpdate {
        name: "D".into(),
        rank: Some(2),
        ..Default::default()
    };
    let moved = playlist.update(&ids[3], &patch).await.unwrap();
    assert_eq!(moved.rank, 2);

    assert_eq!(
        names_in_order(&playlist).await,
        vec![
            ("A".to_string(), 1),
            ("D".to_string(), 2),
            ("B".to_string(), 3),
            ("C".to_string(), 4)
        ]
    );
}

#[tokio::test]
async fn moving_first_entry_down() {
    let pool = setup_pool().await;
    let playlist = Playlist::new(pool);
    let ids = seed(&playlist, &["A", "B", "C", "D"]).await;

    let patch = PlaylistUpdate {
        name: "A".into(),
        rank: Some(3),
        ..Default::default()
    };
    playlist.update(&ids[0], &patch).await.unwrap();
    let names: Vec<String> = names_in_order(&playlist).await.into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["B", "C", "A", "D"]);
}

#[tokio::test]
async fn out_of_range_rank_is_clamped() {
    let pool = setup_pool().await;
    let playlist = Playlist::new(pool);
    let ids = seed(&playlist, &["A", "B", "C"]).await;

    let to_end = PlaylistUpdate {
        name: "A".into(),
        rank: Some(99),
        ..Default::default()
    };
    assert_eq!(playlist.update(&ids[0], &to_end).await.unwrap().rank, 3);

    let to_front = PlaylistUpdate {
        name: "C".into(),
        rank: Some(0),
        ..Default::default()
    };
    assert_eq!(playlist.update(&ids[2], &to_front).await.unwrap().rank, 1);

    let names: Vec<String> = names_in_order(&playlist).await.into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["C", "B", "A"]);
}

#[tokio::test]
async fn update_without_rank_keeps_position_and_fields() {
    let pool = setup_pool().await;
    let playlist = Playlist::new(pool);
    let mut entry = song("A");
    entry.cifra = Some("G".into());
    entry.letter = Some("https://letras.example/a".into());
    let stored = playlist.append(entry).await.unwrap();
    seed(&playlist, &["B"]).await;

    let patch = PlaylistUpdate {
        name: "A (ao vivo)".into(),
        letter: Some(String::new()),
        ..Default::default()
    };
    let updated = playlist.update(&stored.id, &patch).await.unwrap();
    assert_eq!(updated.rank, 1);
    assert_eq!(updated.name, "A (ao vivo)");
    assert_eq!(updated.cifra.as_deref(), Some("G"));
    assert_eq!(updated.letter, None);
    assert_eq!(updated.minister.as_deref(), Some("Ana"));
}

#[tokio::test]
async fn update_unknown_or_blank_is_rejected() {
    let pool = setup_pool().await;
    let playlist = Playlist::new(pool);
    let ids = seed(&playlist, &["A"]).await;

    let patch = PlaylistUpdate {
        name: "X".into(),
        ..Default::default()
    };
    assert!(playlist.update("missing", &patch).await.unwrap_err().is_not_found());

    let blank = PlaylistUpdate {
        name: " ".into(),
        rank: Some(1),
        ..Default::default()
    };
    assert!(matches!(
        playlist.update(&ids[0], &blank).await,
        Err(Error::Validation(_))
    ));
    assert_eq!(names_in_order(&playlist).await, vec![("A".to_string(), 1)]);
}

#[tokio::test]
async fn delete_compacts_and_is_idempotent() {
    let pool = setup_pool().await;
    let playlist = Playlist::new(pool);
    let ids = seed(&playlist, &["A", "B", "C", "D"]).await;

    assert!(playlist.delete(&ids[1]).await.unwrap());
    assert_eq!(
        names_in_order(&playlist).await,
        vec![("A".to_string(), 1), ("C".to_string(), 2), ("D".to_string(), 3)]
    );

    assert!(!playlist.delete(&ids[1]).await.unwrap());
    assert!(!playlist.delete("never-existed").await.unwrap());
    assert_eq!(playlist.list_ordered().await.unwrap().len(), 3);

    let next = playlist.append(song("E")).await.unwrap();
    assert_eq!(next.rank, 4);
}

#[tokio::test]
async fn clear_all_empties_the_list() {
    let pool = setup_pool().await;
    let playlist = Playlist::new(pool);
    seed(&playlist, &["A", "B", "C"]).await;

    assert_eq!(playlist.clear_all().await.unwrap(), 3);
    assert!(playlist.list_ordered().await.unwrap().is_empty());
    assert_eq!(playlist.clear_all().await.unwrap(), 0);
    assert_eq!(playlist.append(song("Z")).await.unwrap().rank, 1);
}

#[tokio::test]
async fn concurrent_appends_stay_dense() {
    let pool = setup_pool().await;
    let playlist = Playlist::new(pool);

    let mut handles = Vec::new();
    for i in 0..8 {
        let p = playlist.clone();
        handles.push(tokio::spawn(async move {
            p.append(song(&format!("song {i}"))).await.unwrap()
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let ranks: Vec<i64> = playlist
        .list_ordered()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.rank)
        .collect();
    assert_eq!(ranks, (1..=8).collect::<Vec<_>>());
}

#[tokio::test]
async fn interleaved_moves_deletes_and_appends_stay_dense() {
    let pool = setup_pool().await;
    let playlist = Playlist::new(pool);
    let names: Vec<String> = (0..10).map(|i| format!("song {i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let ids = seed(&playlist, &refs).await;

    let mut handles = Vec::new();
    for (i, id) in ids.iter().enumerate() {
        let p = playlist.clone();
        let id = id.clone();
        let name = names[i].clone();
        handles.push(tokio::spawn(async move {
            match i % 3 {
                // Drop every third song.
                0 => {
                    assert!(p.delete(&id).await.unwrap());
                }
                // Pull the rest towards the front or push them past the end.
                1 => {
                    let patch = PlaylistUpdate {
                        name,
                        rank: Some(1),
                        ..Default::default()
                    };
                    p.update(&id, &patch).await.unwrap();
                }
                _ => {
                    let patch = PlaylistUpdate {
                        name,
                        rank: Some(50),
                        ..Default::default()
                    };
                    p.update(&id, &patch).await.unwrap();
                }
            }
            p.append(song(&format!("extra {i}"))).await.unwrap().id
        }));
    }
    let mut expected: Vec<String> = ids
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 3 != 0)
        .map(|(_, id)| id.clone())
        .collect();
    for h in handles {
        expected.push(h.await.unwrap());
    }

    let stored = playlist.list_ordered().await.unwrap();
    let ranks: Vec<i64> = stored.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, (1..=expected.len() as i64).collect::<Vec<_>>());

    let mut got: Vec<String> = stored.into_iter().map(|e| e.id).collect();
    got.sort();
    expected.sort();
    assert_eq!(got, expected);
}

fn member(id: &str, roles: Vec<Role>) -> Identity {
    Identity {
        id: id.into(),
        name: format!("Pessoa {id}"),
        nickname: Some(format!("P{id}")),
        email: format!("{id}@example.org"),
        birth_date: None,
        roles,
    }
}

#[tokio::test]
async fn add_to_playlist_resolves_minister_from_caller() {
    let pool = setup_pool().await;
    db::users::insert(&pool, &member("1", vec![Role::Minister])).await.unwrap();
    db::users::insert(&pool, &member("2", vec![Role::Member])).await.unwrap();
    let playlist = Playlist::new(pool);

    let added = music::add_to_playlist(&playlist, "1", song("A")).await.unwrap();
    assert_eq!(added.order, 1);
    let stored = playlist.list_ordered().await.unwrap();
    assert_eq!(stored[0].minister.as_deref(), Some("P1"));
    assert_eq!(stored[0].created_by.as_deref(), Some("1"));

    let no_minister = NewPlaylistEntry {
        name: "B".into(),
        ..Default::default()
    };
    let err = music::add_to_playlist(&playlist, "2", no_minister).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = music::add_to_playlist(&playlist, "ghost", song("C")).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(playlist.list_ordered().await.unwrap().len(), 1);
}
