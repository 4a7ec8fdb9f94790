use serde::{Deserialize, Serialize};

pub const REFERRAL_CODE_LEN: usize = 8;

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub referral_code: String,
    pub referred_by: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub referral_code: Option<String>,
}

impl NewUser {
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    /// Empty referral codes sent by forms count as no code at all.
    pub fn normalized_referral_code(&self) -> Option<String> {
        self.referral_code
            .as_deref()
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty())
    }

    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_email(&self.normalized_email()) {
            return Err(format!("Invalid email address: {}", self.email));
        }
        if self.full_name.trim().is_empty() {
            return Err("Full name must not be empty".to_string());
        }

        Ok(())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

pub fn generate_referral_code() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(REFERRAL_CODE_LEN)
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, code: Option<&str>) -> NewUser {
        NewUser {
            email: email.to_string(),
            full_name: "Ana Souza".to_string(),
            referral_code: code.map(str::to_string),
        }
    }

    #[test]
    fn referral_codes_are_short_and_uppercase() {
        let code = generate_referral_code();
        assert_eq!(code.len(), REFERRAL_CODE_LEN);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_ne!(code, generate_referral_code());
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ana@example.com"));
        assert!(!is_valid_email("ana.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana@localhost"));
    }

    #[test]
    fn blank_referral_code_is_ignored() {
        assert_eq!(new_user("a@b.co", Some("  ")).normalized_referral_code(), None);
        assert_eq!(
            new_user("a@b.co", Some(" ab12cd34 ")).normalized_referral_code(),
            Some("AB12CD34".to_string())
        );
    }

    #[test]
    fn rejects_blank_name() {
        let mut user = new_user(" Ana@Example.com ", None);
        assert!(user.validate().is_ok());
        assert_eq!(user.normalized_email(), "ana@example.com");

        user.full_name = "   ".to_string();
        assert!(user.validate().is_err());
    }
}
