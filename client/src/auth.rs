//! Authentication and profile endpoints (`/authMgtApi`).

use crate::api::ApiClient;
use crate::error::ApiError;
use ourbusway_core::session::{Session, SessionUser};
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Path prefix of the authentication service
pub const AUTH_BASE: &str = "/authMgtApi";

/// Credentials for `login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Email
    pub email: String,
    /// Password
    pub password: String,
}

/// Token plus user, returned by `login` and `validate_account`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,
    /// Signed-in user
    pub user: SessionUser,
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self::new(response.token, response.user)
    }
}

/// New account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Email
    pub email: String,
    /// Password
    pub password: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Mobile phone number
    pub mobile: String,
    /// Requested role
    pub role: String,
}

/// Email confirmation code
#[derive(Debug, Clone, Serialize)]
pub struct ValidateAccountRequest {
    /// Email
    pub email: String,
    /// Code received by email
    pub code: String,
}

/// Full profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Account id
    pub id: String,
    /// Email
    pub email: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Mobile phone number
    pub mobile: String,
    /// Date of birth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    /// Gender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Role
    pub role: String,
}

/// Editable profile fields
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Mobile phone number
    pub mobile: String,
    /// Date of birth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    /// Gender
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Postal address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Password change
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Current password
    pub current_password: String,
    /// New password
    pub new_password: String,
}

#[derive(Serialize)]
struct ForgotPasswordRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    email: &'a str,
    code: &'a str,
    new_password: &'a str,
}

/// Authentication service
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    /// Wrap a gateway client
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway; 401 means wrong credentials.
    #[tracing::instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.client
            .send_json(Method::POST, &format!("{AUTH_BASE}/login"), credentials)
            .await
    }

    /// Create an account. The account must be validated before signing in.
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.client
            .send_unit(Method::POST, &format!("{AUTH_BASE}/users/register"), request)
            .await
    }

    /// Confirm an account with the emailed code; signs the user in.
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn validate_account(
        &self,
        request: &ValidateAccountRequest,
    ) -> Result<LoginResponse, ApiError> {
        self.client
            .send_json(Method::POST, &format!("{AUTH_BASE}/validate-account"), request)
            .await
    }

    /// Profile of the signed-in user
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.client
            .get_json(&format!("{AUTH_BASE}/users/profile"))
            .await
    }

    /// Update the signed-in user's profile
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        request: &UpdateProfileRequest,
    ) -> Result<UserProfile, ApiError> {
        self.client
            .send_json(Method::PATCH, &format!("{AUTH_BASE}/users/profile"), request)
            .await
    }

    /// Change the signed-in user's password
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, request))]
    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<(), ApiError> {
        self.client
            .send_unit(
                Method::PATCH,
                &format!("{AUTH_BASE}/users/change-password"),
                request,
            )
            .await
    }

    /// Email a reset code
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        self.client
            .send_unit(
                Method::POST,
                &format!("{AUTH_BASE}/users/forgot-password"),
                &ForgotPasswordRequest { email },
            )
            .await
    }

    /// Set a new password with the emailed code
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self, code, new_password))]
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        self.client
            .send_unit(
                Method::POST,
                &format!("{AUTH_BASE}/users/reset-password"),
                &ResetPasswordRequest {
                    email,
                    code,
                    new_password,
                },
            )
            .await
    }

    /// Invalidate the session token server-side.
    ///
    /// Callers drop their local session whatever the outcome.
    ///
    /// # Errors
    ///
    /// [`ApiError`] from the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.client
            .send_empty(Method::POST, &format!("{AUTH_BASE}/logout"))
            .await
    }
}
