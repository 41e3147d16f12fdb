use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub id: String,
    pub user_id: String,
    pub question_id: u64,
    pub correct: bool,
    /// Seconds spent on the question.
    pub time_taken: f64,
    pub created_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(user_id: &str, question_id: u64, correct: bool, time_taken: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            question_id,
            correct,
            time_taken,
            created_at: Utc::now(),
        }
    }
}

impl Store {
    pub fn insert_attempt(
        &self,
        user_id: &str,
        question_id: u64,
        correct: bool,
        time_taken: f64,
    ) -> Result<AttemptRecord, StoreError> {
        if !time_taken.is_finite() || time_taken < 0.0 {
            return Err(StoreError::Validation(format!(
                "time taken must be a non-negative number of seconds, got {time_taken}"
            )));
        }

        let record = AttemptRecord::new(user_id, question_id, correct, time_taken);
        let key = keys::attempt_key(user_id, record.created_at.timestamp_millis(), &record.id);
        self.attempts
            .insert(key.as_bytes(), Self::serialize(&record)?)?;
        Ok(record)
    }

    /// All attempts of one learner, newest first.
    pub fn get_attempts_for_user(&self, user_id: &str) -> Result<Vec<AttemptRecord>, StoreError> {
        let prefix = keys::attempt_prefix(user_id);
        let mut out = Vec::new();
        for item in self.attempts.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            out.push(Self::deserialize::<AttemptRecord>(&value)?);
        }
        Ok(out)
    }
}
