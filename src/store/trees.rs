pub const USERS: &str = "users";
pub const QUESTIONS: &str = "questions";
pub const ATTEMPTS: &str = "attempts";
pub const CONFIG_VERSIONS: &str = "config_versions";
