//! Input validation and sanitization for account fields.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles");
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").expect("tag pattern compiles");
}

pub const MAX_EMAIL_LEN: usize = 255;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_BIO_LEN: usize = 500;
pub const MAX_COMPANY_LEN: usize = 100;

/// Strips HTML tags and NUL bytes, then trims.
pub fn sanitize_input(input: &str) -> String {
    let stripped = TAG_RE.replace_all(input, "");
    stripped.replace('\0', "").trim().to_string()
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.trim().is_empty() {
        return Err("Email is required");
    }
    if !EMAIL_RE.is_match(email) {
        return Err("Invalid email format");
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err("Email must be less than 255 characters");
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    let len = password.chars().count();
    if len == 0 {
        return Err("Password is required");
    }
    if len < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters");
    }
    if len > MAX_PASSWORD_LEN {
        return Err("Password must be less than 128 characters");
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name is required");
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err("Name must be less than 100 characters");
    }
    Ok(())
}

pub fn validate_bio(bio: &str) -> Result<(), &'static str> {
    if bio.chars().count() > MAX_BIO_LEN {
        return Err("Bio must be less than 500 characters");
    }
    Ok(())
}

pub fn validate_company(company: &str) -> Result<(), &'static str> {
    if company.chars().count() > MAX_COMPANY_LEN {
        return Err("Company must be less than 100 characters");
    }
    Ok(())
}

/// Sanitizes and lowercases, then validates.
pub fn sanitize_email(raw: &str) -> Result<String, &'static str> {
    let sanitized = sanitize_input(raw).to_lowercase();
    validate_email(&sanitized)?;
    Ok(sanitized)
}

pub fn sanitize_name(raw: &str) -> Result<String, &'static str> {
    let sanitized = sanitize_input(raw);
    validate_name(&sanitized)?;
    Ok(sanitized)
}

pub fn sanitize_bio(raw: &str) -> Result<String, &'static str> {
    let sanitized = sanitize_input(raw);
    validate_bio(&sanitized)?;
    Ok(sanitized)
}

pub fn sanitize_company(raw: &str) -> Result<String, &'static str> {
    let sanitized = sanitize_input(raw);
    validate_company(&sanitized)?;
    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_tags_nul_and_whitespace() {
        assert_eq!(sanitize_input("  <b>Ada</b>\0  "), "Ada");
        assert_eq!(sanitize_input("<script>alert(1)</script>hi"), "alert(1)hi");
        assert_eq!(sanitize_input(""), "");
    }

    #[test]
    fn email_rules() {
        assert_eq!(validate_email(""), Err("Email is required"));
        assert_eq!(validate_email("   "), Err("Email is required"));
        assert_eq!(validate_email("no-at-sign"), Err("Invalid email format"));
        assert_eq!(validate_email("a@b"), Err("Invalid email format"));
        assert_eq!(validate_email("a b@c.io"), Err("Invalid email format"));
        assert!(validate_email("user@example.com").is_ok());

        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            validate_email(&long),
            Err("Email must be less than 255 characters")
        );
    }

    #[test]
    fn password_length_bounds() {
        assert_eq!(validate_password(""), Err("Password is required"));
        assert_eq!(
            validate_password("short"),
            Err("Password must be at least 8 characters")
        );
        assert!(validate_password("exactly8").is_ok());
        assert!(validate_password(&"p".repeat(128)).is_ok());
        assert_eq!(
            validate_password(&"p".repeat(129)),
            Err("Password must be less than 128 characters")
        );
    }

    #[test]
    fn name_bio_company_bounds() {
        assert_eq!(validate_name(" "), Err("Name is required"));
        assert!(validate_name(&"n".repeat(100)).is_ok());
        assert!(validate_name(&"n".repeat(101)).is_err());

        assert!(validate_bio("").is_ok());
        assert!(validate_bio(&"b".repeat(500)).is_ok());
        assert!(validate_bio(&"b".repeat(501)).is_err());

        assert!(validate_company(&"c".repeat(101)).is_err());
    }

    #[test]
    fn sanitize_email_lowercases() {
        assert_eq!(
            sanitize_email("  Ada@Example.COM "),
            Ok("ada@example.com".to_string())
        );
        assert_eq!(sanitize_email("<i></i>"), Err("Email is required"));
    }

    #[test]
    fn sanitize_name_rejects_markup_only_input() {
        assert_eq!(sanitize_name("<p></p>"), Err("Name is required"));
        assert_eq!(sanitize_name(" Grace "), Ok("Grace".to_string()));
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let name = "é".repeat(100);
        assert!(validate_name(&name).is_ok());
    }
}
