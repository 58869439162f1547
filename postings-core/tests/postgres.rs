//! Repository tests against a live Postgres.
//!
//! Run with `DATABASE_URL` pointing at a server the test user may create
//! databases on, then `cargo test -- --ignored`.

use chrono::{Duration, SubsecRound, Utc};
use postings_core::domain::category::{
    Budget, Headcount, Location, Period, Season, Theme, Vehicle, WithWho,
};
use postings_core::domain::listing::{Page, PostingFilter, PostingQuery, Sorting};
use postings_core::domain::posting::{NewPosting, Posting, Report, UpdatePosting};
use postings_core::domain::user::User;
use postings_core::{
    DomainError, PostgresPostingRepository, PostgresUserRepository, PostingRepository,
    UserRepository,
};
use sqlx::PgPool;
use uuid::Uuid;

fn new_posting(title: &str, budget: Budget, theme: Vec<Theme>) -> NewPosting {
    NewPosting {
        title: title.to_string(),
        content: String::new(),
        budget,
        headcount: Headcount::Two,
        location: Location::Jeju,
        period: Period::TwoNights,
        season: Season::Spring,
        vehicle: Vehicle::Car,
        theme,
        with_who: vec![WithWho::Friends],
    }
}

async fn writer(pool: &PgPool, nickname: &str) -> User {
    PostgresUserRepository::new(pool.clone())
        .create(User::new(
            format!("{nickname}@example.com"),
            nickname.to_string(),
            None,
        ))
        .await
        .unwrap()
}

/// Saves postings with creation times one minute apart, oldest first.
async fn seed(
    repo: &PostgresPostingRepository,
    writer_id: Uuid,
    news: Vec<NewPosting>,
) -> Vec<Posting> {
    let start = Utc::now().trunc_subsecs(6) - Duration::hours(1);
    let mut saved = Vec::new();
    for (i, new) in news.into_iter().enumerate() {
        let mut posting = Posting::new(writer_id, new, None);
        posting.created_at = start + Duration::minutes(i as i64);
        saved.push(repo.create(posting).await.unwrap());
    }
    saved
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn saved_posting_reads_back_unchanged(pool: PgPool) {
    let repo = PostgresPostingRepository::new(pool.clone());
    let writer = writer(&pool, "mina").await;
    let posting = Posting::new(
        writer.id,
        new_posting("Jeju olle trail", Budget::From300kTo500k, vec![Theme::Nature]),
        Some("static/postings/a.png".to_string()),
    );

    repo.create(posting.clone()).await.unwrap();
    let detail = repo.find_by_id(posting.id).await.unwrap().unwrap();

    assert_eq!(detail.posting, posting);
    assert_eq!(detail.writer.nickname, "mina");
    assert!(detail.reports.is_empty());
    assert!(detail.likeds.is_empty());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn unknown_writer_is_rejected(pool: PgPool) {
    let repo = PostgresPostingRepository::new(pool);
    let stranger = Uuid::new_v4();
    let posting = Posting::new(stranger, new_posting("x", Budget::Under100k, vec![]), None);

    let err = repo.create(posting).await.unwrap_err();
    assert!(matches!(err, DomainError::UserNotFound(id) if id == stranger));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn every_supplied_filter_holds_for_every_result(pool: PgPool) {
    let repo = PostgresPostingRepository::new(pool.clone());
    let writer = writer(&pool, "jun").await;
    seed(
        &repo,
        writer.id,
        vec![
            new_posting("Jeju food trip", Budget::Under100k, vec![Theme::Food, Theme::Nature]),
            new_posting("Jeju hiking", Budget::Under100k, vec![Theme::Nature]),
            new_posting("Seoul food trip", Budget::Under100k, vec![Theme::Food]),
            new_posting("Jeju luxury food", Budget::Over1m, vec![Theme::Food]),
        ],
    )
    .await;

    let query = PostingQuery {
        keyword: "Jeju".to_string(),
        filter: PostingFilter {
            budget: Some(Budget::Under100k),
            theme: vec![Theme::Food],
            ..Default::default()
        },
        ..Default::default()
    };
    let found = repo.find_all(&query).await.unwrap();

    assert_eq!(found.len(), 1);
    for summary in &found {
        assert!(summary.posting.title.contains("Jeju"));
        assert_eq!(summary.posting.budget, Budget::Under100k);
        assert!(summary.posting.theme.contains(&Theme::Food));
    }
    assert_eq!(found[0].posting.title, "Jeju food trip");
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn scalar_filters_each_narrow_the_listing(pool: PgPool) {
    let repo = PostgresPostingRepository::new(pool.clone());
    let writer = writer(&pool, "scalar").await;
    let base = || new_posting("base", Budget::Under100k, vec![]);
    seed(
        &repo,
        writer.id,
        vec![
            base(),
            NewPosting { title: "solo".into(), headcount: Headcount::One, ..base() },
            NewPosting { title: "busan".into(), location: Location::Busan, ..base() },
            NewPosting { title: "day trip".into(), period: Period::DayTrip, ..base() },
            NewPosting { title: "winter".into(), season: Season::Winter, ..base() },
            NewPosting { title: "by bike".into(), vehicle: Vehicle::Bicycle, ..base() },
        ],
    )
    .await;

    let cases = [
        (PostingFilter { headcount: Some(Headcount::One), ..Default::default() }, "solo"),
        (PostingFilter { location: Some(Location::Busan), ..Default::default() }, "busan"),
        (PostingFilter { period: Some(Period::DayTrip), ..Default::default() }, "day trip"),
        (PostingFilter { season: Some(Season::Winter), ..Default::default() }, "winter"),
        (PostingFilter { vehicle: Some(Vehicle::Bicycle), ..Default::default() }, "by bike"),
    ];
    for (filter, title) in cases {
        let query = PostingQuery { filter, ..Default::default() };
        let found = repo.find_all(&query).await.unwrap();
        let titles: Vec<&str> = found.iter().map(|s| s.posting.title.as_str()).collect();
        assert_eq!(titles, vec![title]);
    }

    let combined = PostingQuery {
        filter: PostingFilter {
            headcount: Some(Headcount::Two),
            location: Some(Location::Jeju),
            period: Some(Period::TwoNights),
            season: Some(Season::Spring),
            vehicle: Some(Vehicle::Car),
            ..Default::default()
        },
        ..Default::default()
    };
    let found = repo.find_all(&combined).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].posting.title, "base");
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn set_filters_require_every_given_value(pool: PgPool) {
    let repo = PostgresPostingRepository::new(pool.clone());
    let writer = writer(&pool, "sets").await;
    let with = |title: &str, theme: Vec<Theme>, with_who: Vec<WithWho>| NewPosting {
        with_who,
        ..new_posting(title, Budget::Under100k, theme)
    };
    seed(
        &repo,
        writer.id,
        vec![
            with("family only", vec![Theme::Nature], vec![WithWho::Family]),
            with("family and pet", vec![Theme::Nature, Theme::Photo], vec![WithWho::Family, WithWho::Pet]),
            with("pet only", vec![Theme::Photo], vec![WithWho::Pet]),
            NewPosting {
                location: Location::Seoul,
                ..with("family and pet in seoul", vec![], vec![WithWho::Pet, WithWho::Family])
            },
        ],
    )
    .await;

    let query = PostingQuery {
        filter: PostingFilter {
            location: Some(Location::Jeju),
            vehicle: Some(Vehicle::Car),
            with_who: vec![WithWho::Family, WithWho::Pet],
            ..Default::default()
        },
        ..Default::default()
    };
    let found = repo.find_all(&query).await.unwrap();
    let titles: Vec<&str> = found.iter().map(|s| s.posting.title.as_str()).collect();
    assert_eq!(titles, vec!["family and pet"]);

    let query = PostingQuery {
        filter: PostingFilter {
            theme: vec![Theme::Photo, Theme::Nature],
            ..Default::default()
        },
        ..Default::default()
    };
    let found = repo.find_all(&query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].posting.title, "family and pet");

    let query = PostingQuery {
        filter: PostingFilter {
            with_who: vec![WithWho::Pet],
            ..Default::default()
        },
        ..Default::default()
    };
    let found = repo.find_all(&query).await.unwrap();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|s| s.posting.with_who.contains(&WithWho::Pet)));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn like_and_report_on_missing_rows_are_not_found(pool: PgPool) {
    let repo = PostgresPostingRepository::new(pool.clone());
    let user = writer(&pool, "reader").await;
    let saved = seed(&repo, user.id, vec![new_posting("real", Budget::Under100k, vec![])]).await;
    let missing = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let err = repo.set_liked(missing, user.id, true).await.unwrap_err();
    assert!(matches!(err, DomainError::PostingNotFound(id) if id == missing));
    let err = repo.set_liked(saved[0].id, stranger, true).await.unwrap_err();
    assert!(matches!(err, DomainError::UserNotFound(id) if id == stranger));

    let err = repo
        .report(Report::new(missing, user.id, "spam".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::PostingNotFound(id) if id == missing));
    let err = repo
        .report(Report::new(saved[0].id, stranger, "spam".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::UserNotFound(id) if id == stranger));

    let report = repo
        .report(Report::new(saved[0].id, user.id, "spam".to_string()))
        .await
        .unwrap();
    let detail = repo.find_by_id(saved[0].id).await.unwrap().unwrap();
    assert_eq!(detail.reports.len(), 1);
    assert_eq!(detail.reports[0].id, report.id);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn keyword_is_matched_literally(pool: PgPool) {
    let repo = PostgresPostingRepository::new(pool.clone());
    let writer = writer(&pool, "hana").await;
    seed(
        &repo,
        writer.id,
        vec![
            new_posting("100% healing", Budget::Under100k, vec![]),
            new_posting("1000 steps", Budget::Under100k, vec![]),
        ],
    )
    .await;

    let query = PostingQuery {
        keyword: "100%".to_string(),
        ..Default::default()
    };
    let found = repo.find_all(&query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].posting.title, "100% healing");
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn most_liked_ignores_soft_deleted_likes(pool: PgPool) {
    let repo = PostgresPostingRepository::new(pool.clone());
    let writer = writer(&pool, "writer").await;
    let fans = [
        writer_of(&pool, "a").await,
        writer_of(&pool, "b").await,
        writer_of(&pool, "c").await,
    ];
    let saved = seed(
        &repo,
        writer.id,
        vec![
            new_posting("one like", Budget::Under100k, vec![]),
            new_posting("three then one", Budget::Under100k, vec![]),
            new_posting("two likes", Budget::Under100k, vec![]),
        ],
    )
    .await;

    repo.set_liked(saved[0].id, fans[0], true).await.unwrap();
    for fan in fans {
        repo.set_liked(saved[1].id, fan, true).await.unwrap();
    }
    repo.set_liked(saved[1].id, fans[0], false).await.unwrap();
    repo.set_liked(saved[1].id, fans[1], false).await.unwrap();
    repo.set_liked(saved[2].id, fans[0], true).await.unwrap();
    repo.set_liked(saved[2].id, fans[1], true).await.unwrap();

    let query = PostingQuery {
        sorting: Sorting::MostLiked,
        ..Default::default()
    };
    let found = repo.find_all(&query).await.unwrap();

    let counts: Vec<i64> = found.iter().map(|s| s.liked_count).collect();
    assert_eq!(counts, vec![2, 1, 1]);
    assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(found[0].posting.title, "two likes");
    // equal counts fall back to newest first
    assert_eq!(found[1].posting.title, "three then one");
    assert_eq!(found[2].posting.title, "one like");

    let detail = repo.find_by_id(saved[1].id).await.unwrap().unwrap();
    assert_eq!(detail.liked_count(), 1);
    assert_eq!(detail.likeds[0].user_id, fans[2]);
}

async fn writer_of(pool: &PgPool, nickname: &str) -> Uuid {
    writer(pool, nickname).await.id
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn consecutive_pages_are_disjoint(pool: PgPool) {
    let repo = PostgresPostingRepository::new(pool.clone());
    let writer = writer(&pool, "pager").await;
    let news = (0..25)
        .map(|i| new_posting(&format!("trip {i}"), Budget::Under100k, vec![]))
        .collect();
    seed(&repo, writer.id, news).await;

    let page = |offset| PostingQuery {
        page: Page::new(offset, 10),
        ..Default::default()
    };
    let first = repo.find_all(&page(1)).await.unwrap();
    let second = repo.find_all(&page(2)).await.unwrap();
    let third = repo.find_all(&page(3)).await.unwrap();

    assert_eq!((first.len(), second.len(), third.len()), (10, 10, 5));
    assert_eq!(first[0].posting.title, "trip 24");
    assert_eq!(first[9].posting.title, "trip 15");
    assert_eq!(second[0].posting.title, "trip 14");
    for summary in &second {
        assert!(first.iter().all(|f| f.posting.id != summary.posting.id));
    }

    let clamped = repo.find_all(&page(0)).await.unwrap();
    assert_eq!(clamped[0].posting.id, first[0].posting.id);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn titles_and_writer_listing(pool: PgPool) {
    let repo = PostgresPostingRepository::new(pool.clone());
    let mina = writer(&pool, "mina").await;
    let jun = writer(&pool, "jun").await;
    seed(
        &repo,
        mina.id,
        vec![
            new_posting("Seoul night view", Budget::Under100k, vec![]),
            new_posting("Seoraksan", Budget::Under100k, vec![]),
        ],
    )
    .await;
    seed(&repo, jun.id, vec![new_posting("Busan", Budget::Under100k, vec![])]).await;

    let titles: Vec<String> = repo
        .find_titles("Seo")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["Seoraksan", "Seoul night view"]);

    let by_mina = repo.find_by_writer(mina.id).await.unwrap();
    assert_eq!(by_mina.len(), 2);
    assert_eq!(by_mina[0].posting.title, "Seoraksan");
    assert!(by_mina.iter().all(|s| s.writer.id == mina.id));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn update_thumbnail_and_delete(pool: PgPool) {
    let repo = PostgresPostingRepository::new(pool.clone());
    let owner = writer(&pool, "owner").await;
    let other = writer(&pool, "other").await;
    let saved = seed(&repo, owner.id, vec![new_posting("Gangneung", Budget::Under100k, vec![])]).await;
    let id = saved[0].id;

    let update = UpdatePosting {
        title: Some("Gangneung coffee street".to_string()),
        theme: Some(vec![Theme::Food, Theme::Food]),
        ..Default::default()
    };
    assert!(repo.update(id, other.id, update.clone()).await.unwrap().is_none());
    let updated = repo.update(id, owner.id, update).await.unwrap().unwrap();
    assert_eq!(updated.title, "Gangneung coffee street");
    assert_eq!(updated.theme, vec![Theme::Food]);
    assert_eq!(updated.budget, saved[0].budget);
    assert_eq!(updated.created_at, saved[0].created_at);

    repo.update_thumbnail(id, "static/postings/b.jpg").await.unwrap();
    let detail = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(detail.posting.thumbnail.as_deref(), Some("static/postings/b.jpg"));

    repo.set_liked(id, other.id, true).await.unwrap();
    let err = repo.delete(id, other.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));

    repo.delete(id, owner.id).await.unwrap();
    assert!(repo.find_by_id(id).await.unwrap().is_none());
    let err = repo.delete(id, owner.id).await.unwrap_err();
    assert!(matches!(err, DomainError::PostingNotFound(_)));
}
