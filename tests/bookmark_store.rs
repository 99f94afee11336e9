use std::sync::Arc;

use bookmarks::bookmark::{
    BookmarkChanges, BookmarkFilter, BookmarkRepository, ContentRef, CreateOutcome, LibsqlBookmarks,
    NewBookmark,
};
use bookmarks::db::Database;
use bookmarks::error::StoreError;
use uuid::Uuid;

async fn store() -> LibsqlBookmarks {
    let db = Database::in_memory().await.unwrap();
    LibsqlBookmarks::new(Arc::new(db))
}

fn new_bookmark(user_id: Uuid, do_id: &str) -> NewBookmark {
    NewBookmark {
        user_id,
        do_id: do_id.to_string(),
        created_by: Some(user_id.to_string()),
    }
}

async fn create(repo: &LibsqlBookmarks, user_id: Uuid, do_id: &str) -> bookmarks::bookmark::Bookmark {
    match repo.insert_if_absent(new_bookmark(user_id, do_id)).await.unwrap() {
        CreateOutcome::Created(b) => b,
        CreateOutcome::Existing(b) => panic!("expected a new bookmark, got existing {}", b.id),
    }
}

#[tokio::test]
async fn insert_then_get() {
    let repo = store().await;
    let user = Uuid::new_v4();

    let created = create(&repo, user, "do_100").await;
    assert_eq!(created.user_id, user);
    assert_eq!(created.do_id, "do_100");
    assert_eq!(created.created_by, Some(user.to_string()));
    assert_eq!(created.updated_by, None);
    assert_eq!(created.created_at, created.updated_at);

    let loaded = repo.get(created.id).await.unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[tokio::test]
async fn duplicate_pair_returns_existing_row() {
    let repo = store().await;
    let user = Uuid::new_v4();
    let first = create(&repo, user, "do_1").await;

    let second = repo.insert_if_absent(new_bookmark(user, "do_1")).await.unwrap();
    assert_eq!(second, CreateOutcome::Existing(first.clone()));

    let all = repo.list_for_user(user).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, first.id);
}

#[tokio::test]
async fn same_content_for_different_users_is_allowed() {
    let repo = store().await;
    let a = create(&repo, Uuid::new_v4(), "do_1").await;
    let b = create(&repo, Uuid::new_v4(), "do_1").await;
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn concurrent_creates_leave_one_row() {
    let repo = Arc::new(store().await);
    let user = Uuid::new_v4();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.insert_if_absent(new_bookmark(user, "do_77")).await.unwrap()
        }));
    }

    let mut created = 0;
    for handle in handles {
        if let CreateOutcome::Created(_) = handle.await.unwrap() {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(repo.list_for_user(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_changes_only_supplied_fields() {
    let repo = store().await;
    let user = Uuid::new_v4();
    let editor = Uuid::new_v4().to_string();
    let created = create(&repo, user, "do_5").await;

    let updated = repo
        .update(
            created.id,
            BookmarkChanges {
                do_id: None,
                updated_by: Some(editor.clone()),
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.do_id, "do_5");
    assert_eq!(updated.user_id, user);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.created_by, created.created_by);
    assert_eq!(updated.updated_by, Some(editor.clone()));
    assert!(updated.updated_at >= created.updated_at);

    let moved = repo
        .update(
            created.id,
            BookmarkChanges {
                do_id: Some("do_6".to_string()),
                updated_by: Some(editor),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.do_id, "do_6");
    assert_eq!(moved.id, created.id);
}

#[tokio::test]
async fn update_missing_row_returns_none() {
    let repo = store().await;
    let result = repo.update(Uuid::new_v4(), BookmarkChanges::default()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn update_onto_existing_pair_conflicts() {
    let repo = store().await;
    let user = Uuid::new_v4();
    create(&repo, user, "do_1").await;
    let second = create(&repo, user, "do_2").await;

    let err = repo
        .update(
            second.id,
            BookmarkChanges {
                do_id: Some("do_1".to_string()),
                updated_by: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn delete_by_pair_removes_exactly_that_row() {
    let repo = store().await;
    let user = Uuid::new_v4();
    let keep = create(&repo, user, "do_1").await;
    let gone = create(&repo, user, "do_2").await;

    let key = ContentRef {
        user_id: user,
        do_id: "do_2".to_string(),
    };
    let removed = repo.delete_by_user_and_content(&key).await.unwrap().unwrap();
    assert_eq!(removed.id, gone.id);
    assert!(!repo.exists(&key).await.unwrap());

    let left = repo.list_for_user(user).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, keep.id);

    assert!(repo.delete_by_user_and_content(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_by_id() {
    let repo = store().await;
    let created = create(&repo, Uuid::new_v4(), "do_3").await;

    assert_eq!(repo.delete(created.id).await.unwrap().map(|b| b.id), Some(created.id));
    assert!(repo.get(created.id).await.unwrap().is_none());
    assert!(repo.delete(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn list_for_user_is_newest_first() {
    let repo = store().await;
    let user = Uuid::new_v4();

    assert!(repo.list_for_user(user).await.unwrap().is_empty());

    let first = create(&repo, user, "do_1").await;
    let one = repo.list_for_user(user).await.unwrap();
    assert_eq!(one.iter().map(|b| b.id).collect::<Vec<_>>(), vec![first.id]);

    let second = create(&repo, user, "do_2").await;
    let third = create(&repo, user, "do_3").await;
    create(&repo, Uuid::new_v4(), "do_4").await;

    let many = repo.list_for_user(user).await.unwrap();
    assert_eq!(
        many.iter().map(|b| b.id).collect::<Vec<_>>(),
        vec![third.id, second.id, first.id]
    );
}

#[tokio::test]
async fn search_applies_optional_filters() {
    let repo = store().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    create(&repo, alice, "do_1").await;
    create(&repo, alice, "do_2").await;
    create(&repo, bob, "do_1").await;

    assert_eq!(repo.search(&BookmarkFilter::default()).await.unwrap().len(), 3);

    let by_user = repo
        .search(&BookmarkFilter {
            user_id: Some(alice),
            do_id: None,
        })
        .await
        .unwrap();
    assert_eq!(by_user.len(), 2);
    assert!(by_user.iter().all(|b| b.user_id == alice));

    let by_content = repo
        .search(&BookmarkFilter {
            user_id: None,
            do_id: Some("do_1".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(by_content.len(), 2);

    let both = repo
        .search(&BookmarkFilter {
            user_id: Some(bob),
            do_id: Some("do_2".to_string()),
        })
        .await
        .unwrap();
    assert!(both.is_empty());
}
