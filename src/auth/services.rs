use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    claims::Role,
    dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
    password::{hash_password, verify_password},
    repo_types::{DuplicateEmail, NewUser, User},
};
use crate::{
    error::{AppError, AppResult, AuthError},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn respond(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let token = state.jwt.issue(&user.subject())?;
    Ok(AuthResponse {
        token,
        user: PublicUser {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        },
    })
}

pub async fn register(state: &AppState, mut payload: RegisterRequest) -> AppResult<AuthResponse> {
    payload.email = payload.email.trim().to_lowercase();
    let name = payload.name.trim().to_string();

    if payload.email.is_empty() || payload.password.is_empty() || name.is_empty() {
        return Err(AppError::Validation("All fields are required".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation("Password too short".into()));
    }

    if state.users.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let role = if payload.email == state.config.admin_email {
        Role::Admin
    } else {
        Role::User
    };
    let new = NewUser {
        email: payload.email,
        name,
        password_hash: hash_password(&payload.password)?,
        role,
    };

    let user = match state.users.create(new).await {
        Ok(u) => u,
        Err(e) if e.is::<DuplicateEmail>() => {
            return Err(AppError::Conflict("Email already registered".into()))
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");
    respond(state, user)
}

pub async fn login(state: &AppState, mut payload: LoginRequest) -> AppResult<AuthResponse> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation("Email and password are required".into()));
    }

    let Some(user) = state.users.find_by_email(&payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials.into());
    }

    info!(user_id = %user.id, "user logged in");
    respond(state, user)
}
