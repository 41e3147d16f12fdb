use crate::constants::DEFAULT_LEARNER_NAME;
use crate::selection::types::Difficulty;
use crate::store::operations::questions::Question;
use crate::store::operations::users::User;
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_seed_question_bank", m001_seed_question_bank),
        ("002_default_learner", m002_default_learner),
    ]
}

/// 执行所有未应用的数据库迁移。
///
/// - 每个迁移函数必须幂等：迁移可能在执行成功后、写入版本号前被中断，重启后会再次执行。
/// - 版本号在每个迁移成功后立即持久化。
/// - 仅向前：set_version 拒绝降级。
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    let all = migrations();

    for (index, (name, func)) in all.iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.config_versions.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: format!("malformed version marker of {} bytes", raw.len()),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .config_versions
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn question(
    id: u64,
    text: &str,
    options: &[&str],
    correct_option: usize,
    difficulty: Difficulty,
    domain: &str,
) -> Question {
    Question {
        id,
        text: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_option,
        difficulty,
        domain: domain.to_string(),
    }
}

/// Small static bank used for the diagnostic phase and demos.
pub fn seed_questions() -> Vec<Question> {
    use Difficulty::{Easy, Hard, Medium};

    vec![
        question(1, "What is the derivative of x^2?", &["2x", "x", "x^2", "1"], 0, Easy, "calculus"),
        question(2, "Solve for x: 2x + 3 = 7", &["1", "2", "3", "4"], 1, Easy, "algebra"),
        question(
            3,
            "Integral of 1/x dx is:",
            &["ln|x| + C", "x + C", "1/x + C", "e^x + C"],
            0,
            Medium,
            "calculus",
        ),
        question(
            4,
            "If matrix A is 2x2 with det(A)=0, then A is:",
            &["Invertible", "Singular", "Orthogonal", "Diagonal"],
            1,
            Medium,
            "linear_algebra",
        ),
        question(
            5,
            "Limit: lim_{x->0} (sin x)/x = ?",
            &["0", "1", "Undefined", "Infinity"],
            1,
            Easy,
            "calculus",
        ),
        question(6, "Which number is prime?", &["21", "25", "29", "27"], 2, Easy, "number_theory"),
        question(
            7,
            "Find eigenvalues of [[2,0],[0,3]]",
            &["2 and 3", "5", "0", "2"],
            0,
            Medium,
            "linear_algebra",
        ),
        question(
            8,
            "Compute derivative of sin(x^2)",
            &["2x cos(x^2)", "cos(x)", "2 sin x", "x cos x"],
            0,
            Hard,
            "calculus",
        ),
    ]
}

fn m001_seed_question_bank(store: &Store) -> Result<(), StoreError> {
    if store.count_questions() > 0 {
        tracing::info!("Question bank already populated, skipping seed");
        return Ok(());
    }
    for q in seed_questions() {
        store.upsert_question(&q)?;
    }
    Ok(())
}

fn m002_default_learner(store: &Store) -> Result<(), StoreError> {
    if store.get_user_by_username(DEFAULT_LEARNER_NAME)?.is_some() {
        return Ok(());
    }
    match store.create_user(&User::new(DEFAULT_LEARNER_NAME)) {
        Ok(()) | Err(StoreError::Conflict { .. }) => Ok(()),
        Err(e) => Err(e),
    }
}
