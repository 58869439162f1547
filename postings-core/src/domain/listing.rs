//! Parameters of the posting listing: keyword, filters, sort mode and page.
//!
//! Filters are optional. An unset filter is not applied; every set filter
//! narrows the result further, the keyword clause included.

use serde::{Deserialize, Serialize};

use crate::domain::category::{Budget, Headcount, Location, Period, Season, Theme, Vehicle, WithWho};

pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Sorting {
    #[default]
    Newest,
    MostLiked,
}

impl Sorting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sorting::Newest => "newest",
            Sorting::MostLiked => "most-liked",
        }
    }

    /// Unrecognized values fall back to [`Sorting::Newest`].
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim() {
            "most-liked" | "most_liked" | "liked" => Sorting::MostLiked,
            _ => Sorting::Newest,
        }
    }
}

impl From<String> for Sorting {
    fn from(value: String) -> Self {
        Sorting::parse_lenient(&value)
    }
}

impl From<Sorting> for &'static str {
    fn from(value: Sorting) -> Self {
        value.as_str()
    }
}

/// A 1-based page of `limit` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    offset: u32,
    limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    /// Offsets and limits below 1 become 1. Larger limits are kept as given.
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset: offset.clamp(1, u32::MAX as i64) as u32,
            limit: limit.clamp(1, u32::MAX as i64) as u32,
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows to skip before this page starts.
    pub fn skip(&self) -> i64 {
        (self.offset as i64 - 1).saturating_mul(self.limit as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Budget,
    Headcount,
    Location,
    Period,
    Season,
    Vehicle,
    Theme,
    WithWho,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Budget => "budget",
            Column::Headcount => "headcount",
            Column::Location => "location",
            Column::Period => "period",
            Column::Season => "season",
            Column::Vehicle => "vehicle",
            Column::Theme => "theme",
            Column::WithWho => "with_who",
        }
    }
}

/// One conjunct of the listing's WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `LIKE` pattern, already escaped and wrapped.
    TitleLike(String),
    Equals(Column, &'static str),
    /// The stored set must contain every listed value.
    Contains(Column, Vec<&'static str>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostingFilter {
    pub budget: Option<Budget>,
    pub headcount: Option<Headcount>,
    pub location: Option<Location>,
    pub period: Option<Period>,
    pub season: Option<Season>,
    pub vehicle: Option<Vehicle>,
    #[serde(default)]
    pub theme: Vec<Theme>,
    #[serde(default)]
    pub with_who: Vec<WithWho>,
}

impl PostingFilter {
    pub fn predicates(&self) -> Vec<Predicate> {
        let scalars = [
            (Column::Budget, self.budget.map(|v| v.as_str())),
            (Column::Headcount, self.headcount.map(|v| v.as_str())),
            (Column::Location, self.location.map(|v| v.as_str())),
            (Column::Period, self.period.map(|v| v.as_str())),
            (Column::Season, self.season.map(|v| v.as_str())),
            (Column::Vehicle, self.vehicle.map(|v| v.as_str())),
        ];
        let sets = [
            (Column::Theme, self.theme.iter().map(|v| v.as_str()).collect::<Vec<_>>()),
            (Column::WithWho, self.with_who.iter().map(|v| v.as_str()).collect()),
        ];

        let mut predicates: Vec<Predicate> = scalars
            .into_iter()
            .filter_map(|(column, value)| value.map(|v| Predicate::Equals(column, v)))
            .collect();
        predicates.extend(
            sets.into_iter()
                .filter(|(_, values)| !values.is_empty())
                .map(|(column, values)| Predicate::Contains(column, values)),
        );
        predicates
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingQuery {
    pub keyword: String,
    pub sorting: Sorting,
    pub page: Page,
    pub filter: PostingFilter,
}

impl PostingQuery {
    /// The keyword clause followed by every active filter.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = vec![Predicate::TitleLike(format!(
            "%{}%",
            escape_like(&self.keyword)
        ))];
        predicates.extend(self.filter.predicates());
        predicates
    }
}

/// Escapes `LIKE` wildcards so the keyword is matched literally.
pub fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
