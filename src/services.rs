use actix_web::web;
use bcrypt::{hash, verify};
use diesel::prelude::*;
use log::{debug, error, info};

use crate::db::Store;
use crate::errors::{required_text, ApiError};
use crate::models::{LoginRequest, NewPersonnel, Personnel, RegisterRequest};
use crate::session::SessionContext;

/// bcrypt cost for newly registered passwords. Verification uses whatever
/// cost is embedded in the stored hash.
pub const REGISTRATION_COST: u32 = 12;

/// Validated login input.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for Credentials {
    type Error = ApiError;

    fn try_from(req: LoginRequest) -> Result<Self, Self::Error> {
        // Passwords are taken as typed; only emptiness is rejected.
        let password = req.password.filter(|p| !p.is_empty()).ok_or_else(|| ApiError::required("password"))?;
        Ok(Credentials {
            email: required_text(req.email, "email")?,
            password,
        })
    }
}

/// Validated registration input.
#[derive(Debug)]
pub struct Registration {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub password: String,
    pub cargo: String,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = ApiError;

    fn try_from(req: RegisterRequest) -> Result<Self, Self::Error> {
        let nombre = required_text(req.nombre, "nombre")?;
        let apellido = required_text(req.apellido, "apellido")?;
        let email = required_text(req.email, "email")?;
        let password = req.password.filter(|p| !p.is_empty()).ok_or_else(|| ApiError::required("password"))?;
        let cargo = required_text(req.cargo, "cargo")?;
        Ok(Registration { nombre, apellido, email, password, cargo })
    }
}

pub struct AuthService;

impl AuthService {
    pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
        web::block(move || hash(password, cost))
            .await
            .map_err(|e| ApiError::Internal(format!("hashing task failed: {}", e)))?
            .map_err(|e| {
                error!("Failed to hash password: {}", e);
                ApiError::Internal("Failed to hash password".to_string())
            })
    }

    pub async fn verify_password(password: String, password_hash: String) -> Result<bool, ApiError> {
        web::block(move || verify(password, &password_hash))
            .await
            .map_err(|e| ApiError::Internal(format!("verification task failed: {}", e)))?
            .map_err(|e| {
                error!("Failed to verify password: {}", e);
                ApiError::Internal("Failed to verify password".to_string())
            })
    }

    /// Unknown email, inactive account and wrong password all end in the same
    /// `InvalidCredentials` error.
    pub async fn login(credentials: Credentials, store: &Store) -> Result<Personnel, ApiError> {
        let user = match PersonnelService::find_active_by_email(&credentials.email, store).await? {
            Some(user) => user,
            None => {
                debug!("Login failed: no active user with email {}", credentials.email);
                return Err(ApiError::InvalidCredentials);
            }
        };

        let valid = Self::verify_password(credentials.password, user.password_hash.clone()).await?;
        if !valid {
            debug!("Login failed: invalid password for user {}", credentials.email);
            return Err(ApiError::InvalidCredentials);
        }

        info!("User {} logged in successfully", user.email);
        Ok(user)
    }

    pub async fn register(registration: Registration, store: &Store) -> Result<Personnel, ApiError> {
        if PersonnelService::find_by_email(&registration.email, store).await?.is_some() {
            debug!("Registration failed: email already exists {}", registration.email);
            return Err(ApiError::EmailTaken);
        }

        let password_hash = Self::hash_password(registration.password, REGISTRATION_COST).await?;
        let new_user = NewPersonnel {
            nombre: registration.nombre,
            apellido: registration.apellido,
            email: registration.email,
            password_hash,
            cargo: registration.cargo,
        };

        // A concurrent registration can still win the race to the unique index.
        let user = PersonnelService::create(new_user, store).await.map_err(|e| match e {
            ApiError::UniqueViolation => ApiError::EmailTaken,
            other => other,
        })?;

        info!("User {} registered with id {}", user.email, user.id);
        Ok(user)
    }

    /// Resolves a session to its personnel row, which must still be active.
    pub async fn require_active(session: SessionContext, store: &Store) -> Result<Personnel, ApiError> {
        PersonnelService::find_active_by_id(session.user_id, store)
            .await?
            .ok_or_else(|| {
                debug!("Session for user {} does not match an active account", session.user_id);
                ApiError::Unauthorized
            })
    }
}

pub struct PersonnelService;

impl PersonnelService {
    pub async fn find_by_email(email_addr: &str, store: &Store) -> Result<Option<Personnel>, ApiError> {
        let email_copy = email_addr.to_string();
        let user = store
            .run(move |conn| {
                use crate::schema::personal::dsl::*;
                personal.filter(email.eq(email_copy)).first::<Personnel>(conn).optional()
            })
            .await?;
        Ok(user)
    }

    pub async fn find_active_by_email(email_addr: &str, store: &Store) -> Result<Option<Personnel>, ApiError> {
        let email_copy = email_addr.to_string();
        let user = store
            .run(move |conn| {
                use crate::schema::personal::dsl::*;
                personal
                    .filter(email.eq(email_copy))
                    .filter(activo.eq(true))
                    .first::<Personnel>(conn)
                    .optional()
            })
            .await?;
        Ok(user)
    }

    pub async fn find_active_by_id(user_id: i32, store: &Store) -> Result<Option<Personnel>, ApiError> {
        let user = store
            .run(move |conn| {
                use crate::schema::personal::dsl::*;
                personal
                    .find(user_id)
                    .filter(activo.eq(true))
                    .first::<Personnel>(conn)
                    .optional()
            })
            .await?;
        Ok(user)
    }

    pub async fn create(new_user: NewPersonnel, store: &Store) -> Result<Personnel, ApiError> {
        let user = store
            .run(move |conn| {
                use crate::schema::personal::dsl::*;
                diesel::insert_into(personal).values(&new_user).get_result::<Personnel>(conn)
            })
            .await?;
        Ok(user)
    }

    /// Staff members who can still sign in, ordered by id.
    pub async fn list_active(store: &Store) -> Result<Vec<Personnel>, ApiError> {
        let rows = store
            .fetch_all(|conn| {
                use crate::schema::personal::dsl::*;
                personal
                    .filter(activo.eq(true))
                    .order(id.asc())
                    .load::<Personnel>(conn)
            })
            .await?;
        Ok(rows.rows)
    }

    /// Marks a staff member inactive. Rows are never deleted so that events
    /// and observations keep their author.
    pub async fn deactivate(user_id: i32, store: &Store) -> Result<Option<Personnel>, ApiError> {
        let user = store
            .run(move |conn| {
                use crate::schema::personal::dsl::*;
                diesel::update(personal.find(user_id))
                    .set(activo.eq(false))
                    .get_result::<Personnel>(conn)
                    .optional()
            })
            .await?;
        Ok(user)
    }
}
