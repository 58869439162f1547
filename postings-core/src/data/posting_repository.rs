use crate::data::posting_query::{
    POSTING_COLUMNS, by_id_query, by_writer_query, list_query, title_prefix_query,
};
use crate::domain::category::{ParseCategoryError, parse_set};
use crate::domain::error::DomainError;
use crate::domain::listing::PostingQuery;
use crate::domain::posting::{
    Liked, Posting, PostingDetail, PostingSummary, PostingTitle, Report, UpdatePosting, Writer,
    dedup,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait PostingRepository: Send + Sync {
    async fn create(&self, posting: Posting) -> Result<Posting, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostingDetail>, DomainError>;
    async fn find_all(&self, query: &PostingQuery) -> Result<Vec<PostingSummary>, DomainError>;
    async fn find_titles(&self, keyword: &str) -> Result<Vec<PostingTitle>, DomainError>;
    async fn find_by_writer(&self, writer_id: Uuid) -> Result<Vec<PostingSummary>, DomainError>;
    async fn update(
        &self,
        id: Uuid,
        writer_id: Uuid,
        update: UpdatePosting,
    ) -> Result<Option<Posting>, DomainError>;
    async fn update_thumbnail(&self, id: Uuid, thumbnail: &str) -> Result<(), DomainError>;
    async fn delete(&self, id: Uuid, writer_id: Uuid) -> Result<(), DomainError>;
    async fn set_liked(
        &self,
        posting_id: Uuid,
        user_id: Uuid,
        liked: bool,
    ) -> Result<(), DomainError>;
    async fn report(&self, report: Report) -> Result<Report, DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostingRepository {
    pool: PgPool,
}

impl PostgresPostingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PostingRow {
    id: Uuid,
    writer_id: Uuid,
    title: String,
    content: String,
    thumbnail: Option<String>,
    budget: String,
    headcount: String,
    location: String,
    period: String,
    season: String,
    vehicle: String,
    theme: Vec<String>,
    with_who: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PostingRow> for Posting {
    type Error = ParseCategoryError;

    fn try_from(row: PostingRow) -> Result<Self, Self::Error> {
        Ok(Posting {
            id: row.id,
            writer_id: row.writer_id,
            title: row.title,
            content: row.content,
            thumbnail: row.thumbnail,
            budget: row.budget.parse()?,
            headcount: row.headcount.parse()?,
            location: row.location.parse()?,
            period: row.period.parse()?,
            season: row.season.parse()?,
            vehicle: row.vehicle.parse()?,
            theme: parse_set(&row.theme)?,
            with_who: parse_set(&row.with_who)?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    posting: PostingRow,
    writer_nickname: String,
    writer_profile_image: Option<String>,
    liked_count: i64,
}

impl TryFrom<SummaryRow> for PostingSummary {
    type Error = ParseCategoryError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        let posting = Posting::try_from(row.posting)?;
        Ok(PostingSummary {
            writer: Writer {
                id: posting.writer_id,
                nickname: row.writer_nickname,
                profile_image: row.writer_profile_image,
            },
            posting,
            liked_count: row.liked_count,
        })
    }
}

fn into_summaries(rows: Vec<SummaryRow>) -> Result<Vec<PostingSummary>, DomainError> {
    rows.into_iter()
        .map(|row| PostingSummary::try_from(row).map_err(DomainError::from))
        .collect()
}

fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    err.as_database_error().and_then(|db| db.constraint())
}

#[async_trait]
impl PostingRepository for PostgresPostingRepository {
    async fn create(&self, posting: Posting) -> Result<Posting, DomainError> {
        let theme: Vec<String> = posting.theme.iter().map(|t| t.to_string()).collect();
        let with_who: Vec<String> = posting.with_who.iter().map(|w| w.to_string()).collect();

        sqlx::query(
            r#"
            INSERT INTO postings (id, writer_id, title, content, thumbnail, budget, headcount,
                                  location, period, season, vehicle, theme, with_who, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(posting.id)
        .bind(posting.writer_id)
        .bind(&posting.title)
        .bind(&posting.content)
        .bind(&posting.thumbnail)
        .bind(posting.budget.as_str())
        .bind(posting.headcount.as_str())
        .bind(posting.location.as_str())
        .bind(posting.period.as_str())
        .bind(posting.season.as_str())
        .bind(posting.vehicle.as_str())
        .bind(&theme)
        .bind(&with_who)
        .bind(posting.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violated_constraint(&e) == Some("postings_writer_id_fkey") {
                DomainError::UserNotFound(posting.writer_id)
            } else {
                error!("failed to create posting: {}", e);
                DomainError::Database(e)
            }
        })?;

        info!(posting_id = %posting.id, writer_id = %posting.writer_id, "posting created");
        Ok(posting)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostingDetail>, DomainError> {
        let mut qb = by_id_query(id);
        let row = qb
            .build_query_as::<SummaryRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error find_by_id {}: {}", id, e);
                DomainError::Database(e)
            })?;
        let Some(row) = row else {
            return Ok(None);
        };
        let summary = PostingSummary::try_from(row)?;

        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT id, posting_id, reporter_id, reason, created_at
            FROM reports WHERE posting_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error loading reports of {}: {}", id, e);
            DomainError::Database(e)
        })?;

        let likeds = sqlx::query_as::<_, Liked>(
            r#"
            SELECT posting_id, user_id, is_deleted, created_at
            FROM liked WHERE posting_id = $1 AND is_deleted = FALSE
            ORDER BY created_at
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error loading likes of {}: {}", id, e);
            DomainError::Database(e)
        })?;

        Ok(Some(PostingDetail {
            posting: summary.posting,
            writer: summary.writer,
            reports,
            likeds,
        }))
    }

    async fn find_all(&self, query: &PostingQuery) -> Result<Vec<PostingSummary>, DomainError> {
        let mut qb = list_query(query);
        let rows = qb
            .build_query_as::<SummaryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while listing postings: {}", e);
                DomainError::Database(e)
            })?;
        into_summaries(rows)
    }

    async fn find_titles(&self, keyword: &str) -> Result<Vec<PostingTitle>, DomainError> {
        let mut qb = title_prefix_query(keyword);
        let titles: Vec<(String,)> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while looking up titles: {}", e);
                DomainError::Database(e)
            })?;
        Ok(titles
            .into_iter()
            .map(|(title,)| PostingTitle { title })
            .collect())
    }

    async fn find_by_writer(&self, writer_id: Uuid) -> Result<Vec<PostingSummary>, DomainError> {
        let mut qb = by_writer_query(writer_id);
        let rows = qb
            .build_query_as::<SummaryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("db error listing postings of writer {}: {}", writer_id, e);
                DomainError::Database(e)
            })?;
        into_summaries(rows)
    }

    async fn update(
        &self,
        id: Uuid,
        writer_id: Uuid,
        update: UpdatePosting,
    ) -> Result<Option<Posting>, DomainError> {
        let theme: Option<Vec<String>> = update
            .theme
            .as_ref()
            .map(|set| dedup(set.iter().map(|t| t.to_string()).collect()));
        let with_who: Option<Vec<String>> = update
            .with_who
            .as_ref()
            .map(|set| dedup(set.iter().map(|w| w.to_string()).collect()));

        let sql = format!(
            r#"
            UPDATE postings
            SET
                title = COALESCE($1, title),
                content = COALESCE($2, content),
                budget = COALESCE($3, budget),
                headcount = COALESCE($4, headcount),
                location = COALESCE($5, location),
                period = COALESCE($6, period),
                season = COALESCE($7, season),
                vehicle = COALESCE($8, vehicle),
                theme = COALESCE($9, theme),
                with_who = COALESCE($10, with_who)
            WHERE id = $11 AND writer_id = $12
            RETURNING {POSTING_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostingRow>(&sql)
            .bind(&update.title)
            .bind(&update.content)
            .bind(update.budget.map(|v| v.as_str()))
            .bind(update.headcount.map(|v| v.as_str()))
            .bind(update.location.map(|v| v.as_str()))
            .bind(update.period.map(|v| v.as_str()))
            .bind(update.season.map(|v| v.as_str()))
            .bind(update.vehicle.map(|v| v.as_str()))
            .bind(&theme)
            .bind(&with_who)
            .bind(id)
            .bind(writer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to update posting {}: {}", id, e);
                DomainError::Database(e)
            })?;

        let Some(row) = row else {
            return Ok(None);
        };
        info!(posting_id = %id, "posting updated");
        Ok(Some(Posting::try_from(row)?))
    }

    async fn update_thumbnail(&self, id: Uuid, thumbnail: &str) -> Result<(), DomainError> {
        let updated = sqlx::query("UPDATE postings SET thumbnail = $1 WHERE id = $2")
            .bind(thumbnail)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to update thumbnail of {}: {}", id, e);
                DomainError::Database(e)
            })?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::PostingNotFound(id));
        }
        info!(posting_id = %id, "posting thumbnail updated");
        Ok(())
    }

    async fn delete(&self, id: Uuid, writer_id: Uuid) -> Result<(), DomainError> {
        let deleted = sqlx::query("DELETE FROM postings WHERE id = $1 AND writer_id = $2")
            .bind(id)
            .bind(writer_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to delete posting {}: {}", id, e);
                DomainError::Database(e)
            })?;

        if deleted.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM postings WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| {
                        error!("failed to check posting {}: {}", id, e);
                        DomainError::Database(e)
                    })?;

            return if exists {
                Err(DomainError::Forbidden)
            } else {
                Err(DomainError::PostingNotFound(id))
            };
        }

        info!(posting_id = %id, "posting deleted");
        Ok(())
    }

    async fn set_liked(
        &self,
        posting_id: Uuid,
        user_id: Uuid,
        liked: bool,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO liked (posting_id, user_id, is_deleted)
            VALUES ($1, $2, $3)
            ON CONFLICT (posting_id, user_id)
            DO UPDATE SET is_deleted = EXCLUDED.is_deleted, updated_at = NOW()
            "#,
        )
        .bind(posting_id)
        .bind(user_id)
        .bind(!liked)
        .execute(&self.pool)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some("liked_posting_id_fkey") => DomainError::PostingNotFound(posting_id),
            Some("liked_user_id_fkey") => DomainError::UserNotFound(user_id),
            _ => {
                error!("failed to set like on {}: {}", posting_id, e);
                DomainError::Database(e)
            }
        })?;

        info!(posting_id = %posting_id, user_id = %user_id, liked, "like updated");
        Ok(())
    }

    async fn report(&self, report: Report) -> Result<Report, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO reports (id, posting_id, reporter_id, reason, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(report.id)
        .bind(report.posting_id)
        .bind(report.reporter_id)
        .bind(&report.reason)
        .bind(report.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some("reports_posting_id_fkey") => DomainError::PostingNotFound(report.posting_id),
            Some("reports_reporter_id_fkey") => DomainError::UserNotFound(report.reporter_id),
            _ => {
                error!("failed to report posting {}: {}", report.posting_id, e);
                DomainError::Database(e)
            }
        })?;

        info!(posting_id = %report.posting_id, report_id = %report.id, "posting reported");
        Ok(report)
    }
}
