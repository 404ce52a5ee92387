use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

// 已规范化（去空白、大写）后的 USN，例如 4KT21CS001
static USN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Z]{4,16}$").expect("Invalid usn regex"));

const COMMON_PASSWORDS: [&str; 7] = [
    "password1",
    "12345678a",
    "qwerty123",
    "admin123",
    "student1",
    "teacher1",
    "abcd1234",
];

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    // 长度 5..=16
    if username.len() < 5 || username.len() > 16 {
        return Err("Username length must be between 5 and 16 characters");
    }
    if !USERNAME_RE.is_match(username) {
        return Err("Username must contain only letters, numbers, underscores or hyphens");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 密码至少 8 位，同时包含字母和数字
pub fn validate_password(password: &str) -> Result<(), String> {
    let mut errors = Vec::new();

    if password.chars().count() < 8 {
        errors.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        errors.push("Password must contain at least one letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }
    if COMMON_PASSWORDS
        .iter()
        .any(|weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

pub fn validate_usn(usn: &str) -> Result<(), &'static str> {
    if !USN_RE.is_match(usn) {
        return Err("USN must be 4 to 16 letters or digits");
    }
    Ok(())
}

/// 解析 YYYY-MM-DD 日期
pub fn parse_date(date: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("teacher_01").is_ok());
        assert!(validate_username("abc").is_err());
        assert!(validate_username("has space").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("hod.cse@ktu.edu.in").is_ok());
        assert!(validate_email("no-at-sign").is_err());
    }

    #[test]
    fn test_password_requires_letters_and_digits() {
        assert!(validate_password("campus2025").is_ok());
        assert!(validate_password("Campus2025").is_ok());
        let err = validate_password("onlyletters").unwrap_err();
        assert!(err.contains("digit"));
        let err = validate_password("1234567890").unwrap_err();
        assert!(err.contains("letter"));
        assert!(validate_password("a1").is_err());
    }

    #[test]
    fn test_common_password_rejected() {
        let err = validate_password("Password1").unwrap_err();
        assert!(err.contains("too common"));
    }

    #[test]
    fn test_usn_rules() {
        assert!(validate_usn("4KT21CS001").is_ok());
        assert!(validate_usn("4kt21cs001").is_err());
        assert!(validate_usn("4KT-21").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2025-03-01").is_some());
        assert!(parse_date(" 2025-03-01 ").is_some());
        assert!(parse_date("01/03/2025").is_none());
        assert!(parse_date("2025-02-30").is_none());
    }
}
