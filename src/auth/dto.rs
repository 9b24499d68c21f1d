use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::repo_types::User;
use crate::error::{ApiError, FieldError};

/// Request body for signup and signin.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

impl CredentialsRequest {
    /// Signup rules: non-empty username, password of at least 6 characters.
    pub fn validate_signup(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if self.username.is_empty() {
            errors.push(FieldError {
                field: "username",
                message: "Username is required",
            });
        }
        if self.password.chars().count() < 6 {
            errors.push(FieldError {
                field: "password",
                message: "Password must be at least 6 characters long",
            });
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }

    /// Signin only requires both fields to be present.
    pub fn validate_signin(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if self.username.is_empty() {
            errors.push(FieldError {
                field: "username",
                message: "Username is required",
            });
        }
        if self.password.is_empty() {
            errors.push(FieldError {
                field: "password",
                message: "Password is required",
            });
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Request body for PUT /me.
#[derive(Debug, Deserialize)]
pub struct UpdateDescriptionRequest {
    pub description: String,
}

impl UpdateDescriptionRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.description.chars().count() > 300 {
            return Err(ApiError::Validation(vec![FieldError {
                field: "description",
                message: "Description must be less than 300 characters",
            }]));
        }
        Ok(())
    }
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
    pub success: bool,
}

/// Signin success body carrying the bearer token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub message: &'static str,
    pub success: bool,
    pub token: String,
}

/// Profile payload: every user field except the password hash.
#[derive(Debug, Serialize)]
pub struct UserData {
    pub id: i32,
    pub username: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            description: user.description,
            created_at: user.created_at,
        }
    }
}

/// Envelope for GET /me and PUT /me.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub success: bool,
    pub data: UserData,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(username: &str, password: &str) -> CredentialsRequest {
        CredentialsRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn signup_rejects_empty_username_and_short_password() {
        let err = creds("", "short").validate_signup().unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].field, "username");
                assert_eq!(errors[1].field, "password");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn signup_accepts_six_character_password() {
        assert!(creds("alice", "123456").validate_signup().is_ok());
        assert!(creds("alice", "12345").validate_signup().is_err());
    }

    #[test]
    fn signin_requires_both_fields() {
        assert!(creds("alice", "pw").validate_signin().is_ok());
        assert!(creds("", "pw").validate_signin().is_err());
        assert!(creds("alice", "").validate_signin().is_err());
    }

    #[test]
    fn description_limit_is_exactly_300_characters() {
        let ok = UpdateDescriptionRequest {
            description: "x".repeat(300),
        };
        assert!(ok.validate().is_ok());

        let too_long = UpdateDescriptionRequest {
            description: "x".repeat(301),
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn user_response_carries_no_password_material() {
        let response = UserResponse {
            message: "User data retrieved successfully",
            success: true,
            data: UserData {
                id: 3,
                username: "carol".into(),
                description: None,
                created_at: OffsetDateTime::UNIX_EPOCH,
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(!json.contains("password"));
    }
}
