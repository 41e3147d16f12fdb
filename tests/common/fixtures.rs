use assessment_backend::selection::types::Difficulty;
use assessment_backend::store::operations::questions::Question;
use assessment_backend::store::operations::users::User;
use assessment_backend::store::Store;

pub fn seed_learner(store: &Store, username: &str) -> User {
    let user = User::new(username);
    store.create_user(&user).expect("create seed learner");
    user
}

pub fn seed_question(store: &Store, id: u64, difficulty: Difficulty, domain: &str) -> Question {
    let question = Question {
        id,
        text: format!("question {id}"),
        options: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        correct_option: 0,
        difficulty,
        domain: domain.to_string(),
    };
    store.upsert_question(&question).expect("upsert seed question");
    question
}

/// Records answers directly in the store, bypassing sessions.
pub fn seed_attempts(store: &Store, user: &User, answers: &[(u64, bool)]) {
    for (question_id, correct) in answers {
        store
            .insert_attempt(&user.id, *question_id, *correct, 20.0)
            .expect("insert seed attempt");
    }
}
