use crate::domain::value_objects::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub religion: Option<String>,
    pub city_town: Option<String>,
    #[serde(skip_serializing)]
    pub fcm_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// プッシュ通知の宛先トークン。空文字列は未登録として扱う。
    pub fn device_token(&self) -> Option<&str> {
        self.fcm_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub city_town: Option<String>,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    /// 登録前の正規化（メールは小文字、性別は先頭のみ大文字）。
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.gender = self.gender.as_deref().map(capitalize);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSearchCriteria {
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    /// 名前の前方一致（大文字小文字を区別しない）。
    pub name: Option<String>,
    pub location: Option<String>,
    pub religion: Option<String>,
    pub gender: Option<String>,
}

fn capitalize(value: &str) -> String {
    let trimmed = value.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_capitalizes_gender_and_lowercases_email() {
        let user = NewUser::new("  Ravi ", "Ravi@Example.COM")
            .with_gender("fEMALE")
            .normalized();
        assert_eq!(user.name, "Ravi");
        assert_eq!(user.email, "ravi@example.com");
        assert_eq!(user.gender.as_deref(), Some("Female"));
    }

    #[test]
    fn blank_device_token_is_absent() {
        let mut user = User {
            id: UserId::new(1),
            name: "A".into(),
            email: "a@example.com".into(),
            role: Role::User,
            gender: None,
            age: None,
            religion: None,
            city_town: None,
            fcm_token: Some("   ".into()),
            created_at: Utc::now(),
        };
        assert!(user.device_token().is_none());
        user.fcm_token = Some("token-1".into());
        assert_eq!(user.device_token(), Some("token-1"));
    }
}
