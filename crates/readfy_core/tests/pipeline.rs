//! End-to-end checks of the create/update/report pipeline over the in-memory store.

use std::sync::Arc;

use readfy_core::{
    BookCatalog, BookFilter, BookPatch, CatalogError, CatalogStats, CatalogStore,
    InMemoryCatalogStore, NewBook, PagePolicy, StatusCounts,
};

fn catalog() -> (Arc<InMemoryCatalogStore>, BookCatalog) {
    let store = Arc::new(InMemoryCatalogStore::new());
    let catalog = BookCatalog::new(store.clone(), PagePolicy::Permissive);
    (store, catalog)
}

fn book(title: &str, genre: &str, pages: f64, status: &str) -> NewBook {
    NewBook {
        title: Some(title.to_string()),
        author: Some("Some Author".to_string()),
        genre: Some(genre.to_string()),
        publication_year: Some(2001.0),
        pages: Some(pages),
        status: Some(status.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn sparse_update_leaves_other_fields_alone() {
    let (_, catalog) = catalog();
    let dune = catalog
        .create_book(book("Dune", "Science Fiction", 412.0, "not_started"))
        .await
        .unwrap();

    let updated = catalog
        .update_book(
            dune.id,
            BookPatch {
                rating: Some(5.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.rating, 5);
    assert_eq!(updated.title, "Dune");
    assert_eq!(updated.pages, 412);
    assert_eq!(updated.genre, dune.genre);
    assert_eq!(updated.status, dune.status);
    assert_eq!(updated.created_at, dune.created_at);
}

#[tokio::test]
async fn two_errors_are_both_reported() {
    let (store, catalog) = catalog();
    let input = NewBook {
        title: Some(String::new()),
        pages: Some(-1.0),
        ..book("x", "Drama", 0.0, "finished")
    };

    let err = catalog.create_book(input).await.unwrap_err();

    match err {
        CatalogError::ValidationFailed(messages) => {
            assert_eq!(messages, ["title is required", "pages must be between 0 and 999999"]);
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
    assert_eq!(store.count_books(None).await.unwrap(), 0);
}

#[tokio::test]
async fn rating_and_progress_bounds() {
    let (_, catalog) = catalog();
    let dune = catalog
        .create_book(book("Dune", "fiction", 412.0, "in_progress"))
        .await
        .unwrap();

    for rating in [-1.0, 6.0] {
        let patch = BookPatch {
            rating: Some(rating),
            ..Default::default()
        };
        assert!(matches!(
            catalog.update_book(dune.id, patch).await,
            Err(CatalogError::ValidationFailed(_))
        ));
    }
    for rating in [5.0, 0.0] {
        let patch = BookPatch {
            rating: Some(rating),
            ..Default::default()
        };
        assert_eq!(
            catalog.update_book(dune.id, patch).await.unwrap().rating,
            rating as i32
        );
    }

    let too_far = BookPatch {
        current_page: Some(413.0),
        ..Default::default()
    };
    assert!(matches!(
        catalog.update_book(dune.id, too_far).await,
        Err(CatalogError::ValidationFailed(_))
    ));
    let last_page = BookPatch {
        current_page: Some(412.0),
        ..Default::default()
    };
    assert_eq!(
        catalog.update_book(dune.id, last_page).await.unwrap().current_page,
        412
    );
}

#[tokio::test]
async fn stats_count_finished_pages_only() {
    let (_, catalog) = catalog();
    catalog
        .create_book(book("Alpha", "fiction", 300.0, "finished"))
        .await
        .unwrap();
    catalog
        .create_book(book("Beta", "fiction", 200.0, "Finished"))
        .await
        .unwrap();
    catalog
        .create_book(book("Gamma", "fiction", 500.0, "in-progress"))
        .await
        .unwrap();

    let stats = catalog.stats().await.unwrap();

    assert_eq!(
        stats,
        CatalogStats {
            counts: StatusCounts {
                not_started: 0,
                in_progress: 1,
                finished: 2,
                total: 3,
            },
            pages_read: 500,
        }
    );
}

#[tokio::test]
async fn empty_catalog_stats_are_zero() {
    let (_, catalog) = catalog();
    assert_eq!(catalog.stats().await.unwrap(), CatalogStats::default());
}

#[tokio::test]
async fn no_op_updates_are_rejected() {
    let (_, catalog) = catalog();
    let dune = catalog
        .create_book(book("Dune", "fiction", 412.0, "not_started"))
        .await
        .unwrap();

    let empty = catalog.update_book(dune.id, BookPatch::default()).await;
    assert!(matches!(empty, Err(CatalogError::NoFieldsToUpdate)));

    let same = BookPatch {
        title: Some("  Dune".to_string()),
        genre: Some("Fiction ".to_string()),
        status: Some("NOT STARTED".to_string()),
        pages: Some(412.0),
        ..Default::default()
    };
    let same = catalog.update_book(dune.id, same).await;
    assert!(matches!(same, Err(CatalogError::NoFieldsToUpdate)));
}

#[tokio::test]
async fn concurrent_registrations_share_one_genre() {
    let (store, catalog) = catalog();

    let (a, b) = tokio::join!(
        catalog.create_book(book("Dune", "Fantasy", 412.0, "not_started")),
        catalog.create_book(book("Emma", " fantasy ", 300.0, "not_started")),
    );

    assert_eq!(a.unwrap().genre, "fantasy");
    assert_eq!(b.unwrap().genre, "fantasy");
    assert_eq!(store.list_genres().await.unwrap().len(), 1);
}

#[tokio::test]
async fn listing_filters_by_genre_and_sorts_by_title() {
    let (_, catalog) = catalog();
    for (title, genre) in [
        ("Neuromancer", "Cyberpunk"),
        ("Dune", "Science Fiction"),
        ("anathem", "science fiction"),
        ("Emma", "Romance"),
    ] {
        catalog
            .create_book(book(title, genre, 100.0, "not_started"))
            .await
            .unwrap();
    }

    let all = catalog.list_books(&BookFilter::default()).await.unwrap();
    let titles: Vec<_> = all.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["anathem", "Dune", "Emma", "Neuromancer"]);

    let filter = BookFilter {
        genre: Some("FICTION".to_string()),
    };
    let fiction = catalog.list_books(&filter).await.unwrap();
    let titles: Vec<_> = fiction.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["anathem", "Dune"]);

    let blank = BookFilter {
        genre: Some("  ".to_string()),
    };
    assert_eq!(catalog.list_books(&blank).await.unwrap().len(), 4);
}

#[tokio::test]
async fn delete_keeps_orphan_genre() {
    let (_, catalog) = catalog();
    let dune = catalog
        .create_book(book("Dune", "Desert Planet", 412.0, "finished"))
        .await
        .unwrap();

    catalog.delete_book(dune.id).await.unwrap();

    assert!(matches!(
        catalog.get_book(dune.id).await,
        Err(CatalogError::NotFound(_))
    ));
    assert!(matches!(
        catalog.delete_book(dune.id).await,
        Err(CatalogError::NotFound(_))
    ));
    let genres = catalog.list_genres().await.unwrap();
    assert_eq!(genres.len(), 1);
    assert_eq!(genres[0].name, "desert planet");
}

#[tokio::test]
async fn storage_failures_surface_as_storage_errors() {
    let (store, catalog) = catalog();
    store.set_fail_book_writes(true).await;

    let err = catalog
        .create_book(book("Dune", "fiction", 412.0, "not_started"))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Storage(_)));
}

#[tokio::test]
async fn strict_policy_rejects_empty_books() {
    let store = Arc::new(InMemoryCatalogStore::new());
    let catalog = BookCatalog::new(store, PagePolicy::Strict);

    let err = catalog
        .create_book(book("Blank", "fiction", 0.0, "not_started"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CatalogError::ValidationFailed(ref m) if m == &["pages must be between 1 and 999999"]
    ));
}
