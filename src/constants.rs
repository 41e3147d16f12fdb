/// 迁移时创建的默认学习者
pub const DEFAULT_LEARNER_NAME: &str = "demo";

/// 默认模型文件路径
pub const DEFAULT_MODEL_PATH: &str = "./data/scoring_model.json";

/// 会话最长存活时间（秒），超过后由后台任务清理
pub const DEFAULT_SESSION_TTL_SECS: u64 = 6 * 60 * 60;

/// 单个 HTTP 请求超时（秒）
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
