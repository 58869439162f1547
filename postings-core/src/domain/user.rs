use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::now;
use crate::domain::posting::Writer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, nickname: String, profile_image: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            nickname,
            profile_image,
            created_at: now(),
        }
    }

    pub fn as_writer(&self) -> Writer {
        Writer {
            id: self.id,
            nickname: self.nickname.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}
