//! SQL assembly for posting reads.
//!
//! Every read that returns [`PostingSummary`](crate::domain::posting::PostingSummary)
//! rows starts from [`summary_select`], which joins the writer and counts
//! only live likes.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::listing::{Predicate, PostingQuery, Sorting, escape_like};

pub(crate) const POSTING_COLUMNS: &str = "id, writer_id, title, content, thumbnail, budget, \
     headcount, location, period, season, vehicle, theme, with_who, created_at";

const SUMMARY_SELECT: &str = "SELECT p.id, p.writer_id, p.title, p.content, p.thumbnail, \
     p.budget, p.headcount, p.location, p.period, p.season, p.vehicle, p.theme, p.with_who, \
     p.created_at, w.nickname AS writer_nickname, w.profile_image AS writer_profile_image, \
     COUNT(l.user_id) AS liked_count \
     FROM postings p \
     JOIN users w ON w.id = p.writer_id \
     LEFT JOIN liked l ON l.posting_id = p.id AND l.is_deleted = FALSE \
     WHERE TRUE";

const GROUP_BY: &str = " GROUP BY p.id, w.id";
const ORDER_NEWEST: &str = " ORDER BY p.created_at DESC, p.id DESC";
const ORDER_MOST_LIKED: &str = " ORDER BY liked_count DESC, p.created_at DESC, p.id DESC";

pub(crate) fn summary_select() -> QueryBuilder<'static, Postgres> {
    QueryBuilder::new(SUMMARY_SELECT)
}

fn push_predicate(qb: &mut QueryBuilder<'static, Postgres>, predicate: Predicate) {
    qb.push(" AND ");
    match predicate {
        Predicate::TitleLike(pattern) => {
            qb.push("p.title LIKE ").push_bind(pattern);
        }
        Predicate::Equals(column, value) => {
            qb.push("p.")
                .push(column.name())
                .push(" = ")
                .push_bind(value.to_string());
        }
        Predicate::Contains(column, values) => {
            let values: Vec<String> = values.into_iter().map(str::to_string).collect();
            qb.push("p.")
                .push(column.name())
                .push(" @> ")
                .push_bind(values);
        }
    }
}

/// The filtered, sorted and paginated listing.
pub(crate) fn list_query(query: &PostingQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = summary_select();
    for predicate in query.predicates() {
        push_predicate(&mut qb, predicate);
    }
    qb.push(GROUP_BY);
    qb.push(match query.sorting {
        Sorting::MostLiked => ORDER_MOST_LIKED,
        Sorting::Newest => ORDER_NEWEST,
    });
    qb.push(" LIMIT ")
        .push_bind(query.page.limit() as i64)
        .push(" OFFSET ")
        .push_bind(query.page.skip());
    qb
}

pub(crate) fn by_writer_query(writer_id: Uuid) -> QueryBuilder<'static, Postgres> {
    let mut qb = summary_select();
    qb.push(" AND p.writer_id = ").push_bind(writer_id);
    qb.push(GROUP_BY);
    qb.push(ORDER_NEWEST);
    qb
}

pub(crate) fn by_id_query(id: Uuid) -> QueryBuilder<'static, Postgres> {
    let mut qb = summary_select();
    qb.push(" AND p.id = ").push_bind(id);
    qb.push(GROUP_BY);
    qb
}

pub(crate) fn title_prefix_query(keyword: &str) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT title FROM postings WHERE title LIKE ");
    qb.push_bind(format!("{}%", escape_like(keyword)));
    qb.push(" ORDER BY title");
    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::{Budget, Season, Theme, WithWho};
    use crate::domain::listing::{Page, PostingFilter};

    fn sql(qb: &QueryBuilder<'static, Postgres>) -> String {
        qb.sql().to_string()
    }

    #[test]
    fn keyword_only_listing_orders_by_newest() {
        let qb = list_query(&PostingQuery {
            keyword: "busan".to_string(),
            ..Default::default()
        });
        let sql = sql(&qb);

        assert!(sql.contains("WHERE TRUE AND p.title LIKE $1 GROUP BY p.id, w.id"));
        assert!(sql.ends_with("ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn budget_filter_is_and_ed_with_the_keyword() {
        let qb = list_query(&PostingQuery {
            keyword: "jeju".to_string(),
            filter: PostingFilter {
                budget: Some(Budget::Under100k),
                season: Some(Season::Winter),
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(sql(&qb).contains(
            "WHERE TRUE AND p.title LIKE $1 AND p.budget = $2 AND p.season = $3 GROUP BY"
        ));
    }

    #[test]
    fn set_filters_use_array_containment() {
        let qb = list_query(&PostingQuery {
            filter: PostingFilter {
                theme: vec![Theme::Food],
                with_who: vec![WithWho::Family, WithWho::Pet],
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(sql(&qb).contains("AND p.theme @> $2 AND p.with_who @> $3"));
    }

    #[test]
    fn most_liked_counts_only_live_likes_and_breaks_ties() {
        let qb = list_query(&PostingQuery {
            sorting: Sorting::MostLiked,
            page: Page::new(3, 20),
            ..Default::default()
        });
        let sql = sql(&qb);

        assert!(sql.contains("LEFT JOIN liked l ON l.posting_id = p.id AND l.is_deleted = FALSE"));
        assert!(sql.contains("COUNT(l.user_id) AS liked_count"));
        assert!(sql.contains("ORDER BY liked_count DESC, p.created_at DESC, p.id DESC"));
    }

    #[test]
    fn writer_listing_has_no_pagination() {
        let sql = sql(&by_writer_query(Uuid::new_v4()));
        assert!(sql.contains("AND p.writer_id = $1 GROUP BY p.id, w.id ORDER BY p.created_at DESC"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn title_lookup_selects_only_titles() {
        let sql = sql(&title_prefix_query("sun%"));
        assert_eq!(sql, "SELECT title FROM postings WHERE title LIKE $1 ORDER BY title");
    }
}
