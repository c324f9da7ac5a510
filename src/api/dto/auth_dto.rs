//! Auth DTOs for the session status endpoint and the HTML forms.

use serde::{Deserialize, Serialize};

use crate::domain::CurrentUser;

/// Response of `GET /api/auth/session`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<CurrentUser>,
}

/// Login form body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Registration form body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, alias = "confirmPassword")]
    pub confirm_password: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}
