//! 公共验证函数模块：在请求进入引擎前拒绝非法输入。

/// 验证用户名格式：2-50 字符，只允许字母、数字、下划线、连字符和空格
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let char_count = username.chars().count();
    if !(2..=50).contains(&char_count) {
        return Err("username must be 2 to 50 characters long");
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ')
    {
        return Err("username may only contain letters, digits, '_', '-' and spaces");
    }
    Ok(())
}

/// 作答用时必须是有限的非负秒数
pub fn validate_time_taken(time_taken: f64) -> Result<(), &'static str> {
    if !time_taken.is_finite() {
        return Err("timeTaken must be a finite number");
    }
    if time_taken < 0.0 {
        return Err("timeTaken must not be negative");
    }
    Ok(())
}
