use std::sync::RwLock;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::backend::{SessionBackend, SessionEvent, orm::identity_from_entity};
use crate::dto::auth::{Claims, NewProfile, ProfileChanges};
use crate::entity::{
    Accounts, Electricians, Profiles,
    accounts::{ActiveModel as AccountActive, Column as AccountCol},
    electricians::ActiveModel as ElectricianActive,
    profiles::ActiveModel as ProfileActive,
};
use crate::error::{AppError, AppResult};
use crate::models::Identity;

/// Session collaborator backed by the `accounts` table. The signed-in state
/// is a JWT held in memory; its expiry is what ends a session out-of-band.
pub struct OrmSessionBackend {
    orm: DatabaseConnection,
    jwt_secret: String,
    ttl: Duration,
    token: RwLock<Option<String>>,
    events: broadcast::Sender<SessionEvent>,
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string())
}

fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub(crate) async fn load_identity<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<Option<Identity>> {
    let row = Profiles::find_by_id(id)
        .find_also_related(Electricians)
        .one(conn)
        .await?;
    row.map(|(profile, electrician)| identity_from_entity(profile, electrician.as_ref()))
        .transpose()
}

impl OrmSessionBackend {
    pub fn new(orm: DatabaseConnection, jwt_secret: impl Into<String>, ttl_hours: i64) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            orm,
            jwt_secret: jwt_secret.into(),
            ttl: Duration::hours(ttl_hours),
            token: RwLock::new(None),
            events,
        }
    }

    fn issue_token(&self, identity: &Identity) -> AppResult<String> {
        let expiration = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: identity.id.to_string(),
            role: identity.role.as_str().to_string(),
            exp: expiration.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    fn start_session(&self, identity: &Identity) -> AppResult<()> {
        let token = self.issue_token(identity)?;
        *self.token.write().unwrap_or_else(|p| p.into_inner()) = Some(token);
        let _ = self.events.send(SessionEvent::SignedIn(identity.id));
        tracing::info!(user_id = %identity.id, role = %identity.role, "session started");
        Ok(())
    }

    fn take_token(&self) -> Option<String> {
        self.token.write().unwrap_or_else(|p| p.into_inner()).take()
    }

    fn current_token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl SessionBackend for OrmSessionBackend {
    async fn sign_up(&self, profile: &NewProfile, password: &str) -> AppResult<Identity> {
        let exist = Accounts::find()
            .filter(AccountCol::Email.eq(profile.email.as_str()))
            .one(&self.orm)
            .await?;
        if exist.is_some() {
            return Err(AppError::BadRequest("Email is already taken".to_string()));
        }

        let password_hash = hash_password(password)?;
        let id = Uuid::new_v4();
        let txn = self.orm.begin().await?;

        ProfileActive {
            id: Set(id),
            name: Set(profile.name.clone()),
            email: Set(profile.email.clone()),
            phone: Set(profile.phone.clone()),
            location: Set(Some(profile.location.as_str().to_string())),
            role: Set(profile.role.as_str().to_string()),
            verified: Set(profile.role.verified_on_signup()),
            avatar_url: Set(None),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;

        AccountActive {
            id: Set(id),
            email: Set(profile.email.clone()),
            password_hash: Set(password_hash),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        if let Some(details) = &profile.electrician {
            ElectricianActive {
                id: Set(id),
                specialties: Set(details.specialties.clone()),
                experience_years: Set(details.experience_years as i32),
                rating: Set(0.0),
                review_count: Set(0),
                certifications: Set(Vec::new()),
                service_areas: Set(vec![profile.location.as_str().to_string()]),
                base_rate: Set(0),
                onsite_rate: Set(0),
                availability: Set(Vec::new()),
                shop_address: Set(None),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }

        let identity = load_identity(&txn, id).await?.ok_or(AppError::NotFound)?;
        txn.commit().await?;

        self.start_session(&identity)?;
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        let email = email.trim().to_lowercase();
        let account = Accounts::find()
            .filter(AccountCol::Email.eq(email.as_str()))
            .one(&self.orm)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        let identity = load_identity(&self.orm, account.id)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        self.start_session(&identity)?;
        Ok(identity)
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.take_token();
        let _ = self.events.send(SessionEvent::SignedOut);
        Ok(())
    }

    async fn current_session(&self) -> AppResult<Option<Identity>> {
        let Some(token) = self.current_token() else {
            return Ok(None);
        };

        let claims = match decode::<Claims>(
            &token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(data) => data.claims,
            Err(err) => {
                self.take_token();
                if matches!(err.kind(), jsonwebtoken::errors::ErrorKind::ExpiredSignature) {
                    tracing::info!("session token expired");
                    let _ = self.events.send(SessionEvent::Expired);
                } else {
                    tracing::warn!(error = %err, "session token rejected");
                    let _ = self.events.send(SessionEvent::SignedOut);
                }
                return Ok(None);
            }
        };

        let id = Uuid::parse_str(&claims.sub)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("bad token subject: {e}")))?;
        let identity = load_identity(&self.orm, id).await?;
        if identity.is_none() {
            self.take_token();
            let _ = self.events.send(SessionEvent::SignedOut);
        }
        Ok(identity)
    }

    async fn update_profile(
        &self,
        actor: &Identity,
        changes: &ProfileChanges,
    ) -> AppResult<Identity> {
        let profile = Profiles::find_by_id(actor.id)
            .one(&self.orm)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ProfileActive = profile.into();
        if let Some(name) = &changes.name {
            active.name = Set(name.clone());
        }
        if let Some(phone) = &changes.phone {
            active.phone = Set(phone.clone());
        }
        if let Some(location) = changes.location {
            active.location = Set(Some(location.as_str().to_string()));
        }
        active.updated_at = Set(Utc::now().into());
        active.update(&self.orm).await?;

        load_identity(&self.orm, actor.id)
            .await?
            .ok_or(AppError::NotFound)
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies_only_the_original() {
        let hash = hash_password("secret123").unwrap();
        assert!(verify_password("secret123", &hash).unwrap());
        assert!(!verify_password("secret124", &hash).unwrap());
    }
}
