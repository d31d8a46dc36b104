use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub job_id: String,
    pub job_title: String,
    pub job_description: String,
    pub date_posted: NaiveDate,
}
