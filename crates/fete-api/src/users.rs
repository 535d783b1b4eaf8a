use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use fete_db::models::UserRow;
use fete_types::api::{
    AuthResponse, Claims, LoginRequest, PreferencesResponse, RegisterRequest,
    UpdatePreferencesRequest, UpdateProfileRequest, UserResponse,
};

use crate::error::ApiError;
use crate::parse_uuid;
use crate::state::AppState;

fn user_response(row: &UserRow) -> Result<UserResponse, ApiError> {
    Ok(UserResponse {
        id: parse_uuid(&row.id)?,
        username: row.username.clone(),
        email: row.email.clone(),
        first_name: row.first_name.clone(),
        last_name: row.last_name.clone(),
        phone_number: row.phone_number.clone(),
        profile_picture: row.profile_picture.clone(),
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.len() < 3 || req.username.len() > 150 {
        return Err(ApiError::validation(
            "username",
            "username must be between 3 and 150 characters",
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::validation(
            "password",
            "password must be at least 8 characters",
        ));
    }
    if req.password != req.password_confirm {
        return Err(ApiError::validation("password", "passwords do not match"));
    }
    if !req.email.contains('@') {
        return Err(ApiError::validation("email", "invalid email address"));
    }
    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::validation(
            "email",
            "a user with this email already exists",
        ));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4();
    state.db.create_user(
        &user_id.to_string(),
        &req.username,
        &req.email,
        &password_hash,
        req.first_name.as_deref().unwrap_or(""),
        req.last_name.as_deref().unwrap_or(""),
        &state.now(),
    )?;

    let user = state
        .db
        .get_user_by_id(&user_id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("user vanished after insert"))?;
    let token = create_token(&state.jwt_secret, user_id, &req.email)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user_response(&user)?,
            token,
        }),
    ))
}

/// Login is by email, not username.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or(ApiError::Authentication)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("corrupt password hash: {}", e))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Authentication)?;

    let user_id = parse_uuid(&user.id)?;
    let token = create_token(&state.jwt_secret, user_id, &user.email)?;

    Ok(Json(AuthResponse {
        user: user_response(&user)?,
        token,
    }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or(ApiError::Authentication)?;
    Ok(Json(user_response(&user)?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or(ApiError::Authentication)?;

    let first_name = req.first_name.unwrap_or(user.first_name);
    let last_name = req.last_name.unwrap_or(user.last_name);
    let phone_number = req.phone_number.unwrap_or(user.phone_number);
    let profile_picture = req.profile_picture.or(user.profile_picture);

    state.db.update_profile(
        &user.id,
        &first_name,
        &last_name,
        &phone_number,
        profile_picture.as_deref(),
    )?;

    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or(ApiError::Authentication)?;
    Ok(Json(user_response(&user)?))
}

pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let prefs = state
        .db
        .get_preferences(&claims.sub.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(PreferencesResponse {
        language: prefs.language,
        notification_email: prefs.notification_email,
        notification_push: prefs.notification_push,
    }))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let prefs = state
        .db
        .get_preferences(&claims.sub.to_string())?
        .ok_or(ApiError::NotFound)?;

    let language = req.language.unwrap_or(prefs.language);
    let notification_email = req.notification_email.unwrap_or(prefs.notification_email);
    let notification_push = req.notification_push.unwrap_or(prefs.notification_push);

    state
        .db
        .update_preferences(&prefs.user_id, &language, notification_email, notification_push)?;

    Ok(Json(PreferencesResponse {
        language,
        notification_email,
        notification_push,
    }))
}

fn create_token(secret: &str, user_id: Uuid, email: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_state;

    fn register_req(email: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            username: "alice".into(),
            email: email.into(),
            password: password.into(),
            password_confirm: confirm.into(),
            first_name: None,
            last_name: None,
        }
    }

    #[tokio::test]
    async fn password_mismatch_is_a_field_error() {
        let state = test_state();
        let Err(err) = register(
            State(state),
            Json(register_req("a@example.com", "secret-password", "other-password")),
        )
        .await
        else {
            panic!("expected validation error");
        };

        match err {
            ApiError::Validation(errors) => assert!(errors.contains_key("password")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_field_error() {
        let state = test_state();
        assert!(
            register(
                State(state.clone()),
                Json(register_req("a@example.com", "secret-password", "secret-password")),
            )
            .await
            .is_ok()
        );

        let Err(err) = register(
            State(state),
            Json(register_req("a@example.com", "secret-password", "secret-password")),
        )
        .await
        else {
            panic!("expected validation error");
        };

        match err {
            ApiError::Validation(errors) => assert!(errors.contains_key("email")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let state = test_state();
        assert!(
            register(
                State(state.clone()),
                Json(register_req("a@example.com", "secret-password", "secret-password")),
            )
            .await
            .is_ok()
        );

        let Err(err) = login(
            State(state),
            Json(LoginRequest {
                email: "a@example.com".into(),
                password: "wrong-password".into(),
            }),
        )
        .await
        else {
            panic!("expected authentication error");
        };
        assert!(matches!(err, ApiError::Authentication));
    }
}
