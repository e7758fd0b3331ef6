use super::{NewRecord, Record, RecordMeta, Role};
use crate::config::{ColumnDef, SqlType, TableDef};
use crate::error::AppError;
use crate::service::RequestValidator as V;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;

/// An operator account. The password hash never leaves the server.
#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub user_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub nick_name: String,
    pub phone: String,
    pub email: String,
}

impl Record for User {
    const TABLE: &'static str = "app_user";
    const SEARCH_COLUMNS: &'static [&'static str] = &["user_name"];

    fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::new("user_name", SqlType::Text),
                ColumnDef::new("password_hash", SqlType::Text),
                ColumnDef::new("role", SqlType::SmallInt),
                ColumnDef::new("nick_name", SqlType::Text),
                ColumnDef::new("phone", SqlType::Text),
                ColumnDef::new("email", SqlType::Text),
            ],
        )
        .unique("user_name")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub nick_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Registration fields after validation. The password is still plain text here.
#[derive(Debug)]
pub struct Registration {
    pub user_name: String,
    pub password: String,
    pub role: Role,
    pub nick_name: String,
    pub phone: String,
    pub email: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Registration, AppError> {
        let user_name = V::required_text(self.user_name, "userName")?;
        let password = V::required(self.password, "password")?;
        if password.is_empty() {
            return Err(AppError::MissingParameter("password".into()));
        }
        let phone = V::required_text(self.phone, "phone")?;
        let nick_name = V::required_text(self.nick_name, "nickName")?;
        let email = V::required_text(self.email, "email")?;
        let role = V::required_text(self.role, "role")?;

        Ok(Registration {
            user_name: V::business_key(Some(user_name), "userName")?,
            password,
            phone: V::phone(Some(phone), "phone")?,
            nick_name,
            email: V::email(Some(email), "email")?,
            role: V::enumerated(Some(role), "role")?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub user_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct NewUser {
    pub user_name: String,
    pub password_hash: String,
    pub role: Role,
    pub nick_name: String,
    pub phone: String,
    pub email: String,
}

impl NewRecord for NewUser {
    type Record = User;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_name", json!(self.user_name)),
            ("password_hash", json!(self.password_hash)),
            ("role", json!(self.role.code())),
            ("nick_name", json!(self.nick_name)),
            ("phone", json!(self.phone)),
            ("email", json!(self.email)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            user_name: Some("alice".into()),
            password: Some("s3cret!".into()),
            phone: Some("+8613800000000".into()),
            nick_name: Some("Alice".into()),
            email: Some("alice@example.org".into()),
            role: Some("CONTROL".into()),
        }
    }

    #[test]
    fn valid_registration() {
        let r = request().validate().unwrap();
        assert_eq!(r.role, Role::Control);
        assert_eq!(r.user_name, "alice");
    }

    #[test]
    fn required_fields_are_checked_before_formats() {
        let mut req = request();
        req.phone = Some("abc".into());
        req.email = None;
        let err = req.validate().unwrap_err();
        assert!(matches!(err, AppError::MissingParameter(ref f) if f == "email"));
    }

    #[test]
    fn format_and_value_errors() {
        let mut req = request();
        req.phone = Some("123".into());
        assert!(matches!(req.validate(), Err(AppError::InvalidFormat(_))));

        let mut req = request();
        req.role = Some("ADMIN".into());
        assert!(matches!(req.validate(), Err(AppError::InvalidValue(_))));

        let mut req = request();
        req.user_name = Some("al ice".into());
        assert!(matches!(req.validate(), Err(AppError::InvalidFormat(_))));
    }

    #[test]
    fn hash_is_not_serialized() {
        let now = chrono::Utc::now();
        let user = User {
            meta: RecordMeta {
                id: 1,
                created_at: now,
                updated_at: now,
            },
            user_name: "alice".into(),
            password_hash: "$argon2id$...".into(),
            role: Role::Trace,
            nick_name: "Alice".into(),
            phone: "123456".into(),
            email: "a@b.co".into(),
        };
        let v = serde_json::to_value(&user).unwrap();
        assert!(v.get("passwordHash").is_none());
        assert_eq!(v["role"], json!("TRACE"));
    }
}
