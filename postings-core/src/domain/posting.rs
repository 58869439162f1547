use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::category::{Budget, Headcount, Location, Period, Season, Theme, Vehicle, WithWho};
use crate::domain::now;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub id: Uuid,
    pub writer_id: Uuid,
    pub title: String,
    pub content: String,
    pub thumbnail: Option<String>,
    pub budget: Budget,
    pub headcount: Headcount,
    pub location: Location,
    pub period: Period,
    pub season: Season,
    pub vehicle: Vehicle,
    pub theme: Vec<Theme>,
    pub with_who: Vec<WithWho>,
    pub created_at: DateTime<Utc>,
}

impl Posting {
    pub fn new(writer_id: Uuid, new: NewPosting, thumbnail: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            writer_id,
            title: new.title,
            content: new.content,
            thumbnail,
            budget: new.budget,
            headcount: new.headcount,
            location: new.location,
            period: new.period,
            season: new.season,
            vehicle: new.vehicle,
            theme: dedup(new.theme),
            with_who: dedup(new.with_who),
            created_at: now(),
        }
    }

    /// Applies the fields present in `update`, leaving the rest untouched.
    #[cfg(test)]
    pub(crate) fn apply(&mut self, update: UpdatePosting) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(budget) = update.budget {
            self.budget = budget;
        }
        if let Some(headcount) = update.headcount {
            self.headcount = headcount;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(period) = update.period {
            self.period = period;
        }
        if let Some(season) = update.season {
            self.season = season;
        }
        if let Some(vehicle) = update.vehicle {
            self.vehicle = vehicle;
        }
        if let Some(theme) = update.theme {
            self.theme = dedup(theme);
        }
        if let Some(with_who) = update.with_who {
            self.with_who = dedup(with_who);
        }
    }
}

pub(crate) fn dedup<T: PartialEq>(values: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPosting {
    pub title: String,
    pub content: String,
    pub budget: Budget,
    pub headcount: Headcount,
    pub location: Location,
    pub period: Period,
    pub season: Season,
    pub vehicle: Vehicle,
    #[serde(default)]
    pub theme: Vec<Theme>,
    #[serde(default)]
    pub with_who: Vec<WithWho>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePosting {
    pub title: Option<String>,
    pub content: Option<String>,
    pub budget: Option<Budget>,
    pub headcount: Option<Headcount>,
    pub location: Option<Location>,
    pub period: Option<Period>,
    pub season: Option<Season>,
    pub vehicle: Option<Vehicle>,
    pub theme: Option<Vec<Theme>>,
    pub with_who: Option<Vec<WithWho>>,
}

impl UpdatePosting {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.budget.is_none()
            && self.headcount.is_none()
            && self.location.is_none()
            && self.period.is_none()
            && self.season.is_none()
            && self.vehicle.is_none()
            && self.theme.is_none()
            && self.with_who.is_none()
    }
}

/// Public identity of the user who wrote a posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Writer {
    pub id: Uuid,
    pub nickname: String,
    pub profile_image: Option<String>,
}

/// A posting as it appears in listings: joined with its writer and the
/// number of live likes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostingSummary {
    #[serde(flatten)]
    pub posting: Posting,
    pub writer: Writer,
    pub liked_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostingDetail {
    #[serde(flatten)]
    pub posting: Posting,
    pub writer: Writer,
    pub reports: Vec<Report>,
    pub likeds: Vec<Liked>,
}

impl PostingDetail {
    pub fn liked_count(&self) -> usize {
        self.likeds.iter().filter(|l| !l.is_deleted).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingTitle {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub posting_id: Uuid,
    pub reporter_id: Uuid,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn new(posting_id: Uuid, reporter_id: Uuid, reason: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            posting_id,
            reporter_id,
            reason,
            created_at: now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Liked {
    pub posting_id: Uuid,
    pub user_id: Uuid,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}
