//! Login, registration and current-user lookup.

use super::password::{hash_password_blocking, verify_password_blocking};
use super::token::{Claims, TokenService};
use crate::config::TableRegistry;
use crate::error::AppError;
use crate::model::{LoginRequest, NewLoginLog, NewUser, RegisterRequest, User};
use crate::service::{QueryEngine, RecordStore, RequestValidator};
use crate::sql::Condition;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(flatten)]
    pub user: User,
    pub token_expires_at: DateTime<Utc>,
}

pub struct SessionService<'a> {
    pool: &'a PgPool,
    registry: &'a TableRegistry,
    tokens: &'a TokenService,
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, AppError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| AppError::Internal(format!("timestamp {} out of range", secs)))
}

impl<'a> SessionService<'a> {
    pub fn new(pool: &'a PgPool, registry: &'a TableRegistry, tokens: &'a TokenService) -> Self {
        SessionService { pool, registry, tokens }
    }

    async fn find_user(&self, user_name: &str) -> Result<Option<User>, AppError> {
        QueryEngine::new(self.pool, self.registry)
            .latest_one::<User>(&[Condition::eq("user_name", user_name)])
            .await
    }

    /// Verify credentials, issue a token and record the login. No token is returned
    /// unless the login row was written.
    pub async fn authenticate(&self, req: LoginRequest, source: &str) -> Result<LoginResponse, AppError> {
        let user_name = RequestValidator::required_text(req.user_name, "userName")?;
        let password = RequestValidator::required(req.password, "password")?;

        let user = self
            .find_user(&user_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{}'", user_name)))?;
        if !verify_password_blocking(password, user.password_hash.clone()).await? {
            tracing::info!(user = %user_name, ip = %source, "login rejected");
            return Err(AppError::WrongPassword);
        }

        let issued = self.tokens.issue(user.meta.id, &user.user_name, user.role)?;
        let now = Utc::now();
        RecordStore::insert(
            self.pool,
            self.registry,
            &NewLoginLog {
                user_name: user.user_name.clone(),
                login_ip: source.to_string(),
                login_time: now,
            },
        )
        .await?;
        tracing::info!(user = %user.user_name, role = %user.role, ip = %source, "login");

        Ok(LoginResponse {
            token: issued.token,
            expires_at: timestamp(issued.claims.exp)?,
            user,
        })
    }

    /// Create an account. A taken user name is Conflict, whether seen here or by the unique index.
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AppError> {
        let reg = req.validate()?;
        if self.find_user(&reg.user_name).await?.is_some() {
            return Err(AppError::Conflict(format!("user '{}' already exists", reg.user_name)));
        }
        let password_hash = hash_password_blocking(reg.password).await?;
        let user = RecordStore::insert(
            self.pool,
            self.registry,
            &NewUser {
                user_name: reg.user_name,
                password_hash,
                role: reg.role,
                nick_name: reg.nick_name,
                phone: reg.phone,
                email: reg.email,
            },
        )
        .await?;
        tracing::info!(user = %user.user_name, role = %user.role, "user registered");
        Ok(user)
    }

    pub async fn user_info(&self, claims: &Claims) -> Result<UserInfo, AppError> {
        let user_id = claims.user_id()?;
        let user = self
            .find_user(&claims.name)
            .await?
            .filter(|u| u.meta.id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("user '{}'", claims.name)))?;
        Ok(UserInfo {
            user,
            token_expires_at: timestamp(claims.exp)?,
        })
    }
}
