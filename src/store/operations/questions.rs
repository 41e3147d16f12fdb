use serde::{Deserialize, Serialize};

use crate::selection::types::{Difficulty, QuestionMeta};
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u64,
    pub text: String,
    pub options: Vec<String>,
    pub correct_option: usize,
    pub difficulty: Difficulty,
    pub domain: String,
}

impl Question {
    pub fn meta(&self) -> QuestionMeta<'_> {
        QuestionMeta {
            domain: &self.domain,
            difficulty: self.difficulty,
        }
    }

    pub fn is_correct(&self, selected_option: usize) -> bool {
        selected_option == self.correct_option
    }
}

impl Store {
    pub fn upsert_question(&self, question: &Question) -> Result<(), StoreError> {
        if question.options.is_empty() || question.correct_option >= question.options.len() {
            return Err(StoreError::Validation(format!(
                "question {} has correct option {} outside {} options",
                question.id,
                question.correct_option,
                question.options.len()
            )));
        }
        let key = keys::question_key(question.id);
        self.questions
            .insert(key.as_bytes(), Self::serialize(question)?)?;
        Ok(())
    }

    pub fn get_question(&self, question_id: u64) -> Result<Option<Question>, StoreError> {
        let key = keys::question_key(question_id);
        match self.questions.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// The whole bank, ordered by id.
    pub fn list_questions(&self) -> Result<Vec<Question>, StoreError> {
        let mut out = Vec::new();
        for item in self.questions.iter() {
            let (_, value) = item?;
            out.push(Self::deserialize::<Question>(&value)?);
        }
        Ok(out)
    }

    pub fn count_questions(&self) -> usize {
        self.questions.len()
    }
}
