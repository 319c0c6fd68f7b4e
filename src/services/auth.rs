// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{TenantRepository, UserRepository},
    models::{
        auth::{AuthResponse, Claims, RegisterUserPayload, User},
        notification::Job,
        tenancy::UserTenant,
    },
    services::jobs::{enqueue, JobQueue},
};

// Validade do link de redefinição de senha.
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    jwt_secret: String,
    jwt_ttl: Duration,
    frontend_url: String,
    jobs: Arc<dyn JobQueue>,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        tenant_repo: TenantRepository,
        jwt_secret: String,
        jwt_ttl: Duration,
        frontend_url: String,
        jobs: Arc<dyn JobQueue>,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, tenant_repo, jwt_secret, jwt_ttl, frontend_url, jobs, pool }
    }

    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<AuthResponse, AppError> {
        // 1. Hashing fora do runtime async (bcrypt é CPU-bound)
        let hashed_password = hash_password(payload.password.clone()).await?;

        let mut tx = self.pool.begin().await?;
        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                payload.email.trim(),
                &hashed_password,
                payload.full_name.trim(),
                payload.phone.as_deref(),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, "👤 Novo usuário registrado");

        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("Usuário"))
    }

    pub async fn get_user_tenants(&self, user_id: Uuid) -> Result<Vec<UserTenant>, AppError> {
        self.tenant_repo.get_tenants_for_user(user_id).await
    }

    /// Gera o token de redefinição e agenda o e-mail.
    /// E-mail desconhecido não é erro: a resposta é sempre a mesma.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.user_repo.find_by_email(email.trim()).await? else {
            tracing::info!("Pedido de redefinição para e-mail não cadastrado");
            return Ok(());
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.user_repo.set_reset_token(user.id, &token, expires_at).await?;

        let link = format!("{}/reset-password?token={}", self.frontend_url.trim_end_matches('/'), token);
        enqueue(
            self.jobs.as_ref(),
            Job::Email {
                to: user.email.clone(),
                subject: "Redefinição de senha".into(),
                body: format!(
                    "Olá, {}!\n\nPara criar uma nova senha acesse:\n{}\n\nO link expira em {} minutos.",
                    user.full_name, link, RESET_TOKEN_TTL_MINUTES
                ),
            },
        )
        .await;

        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_reset_token(token)
            .await?
            .ok_or(AppError::InvalidResetToken)?;

        let still_valid = user.reset_token_expires_at.is_some_and(|exp| Utc::now() < exp);
        if !still_valid {
            return Err(AppError::InvalidResetToken);
        }

        let hashed_password = hash_password(new_password.to_owned()).await?;
        self.user_repo.update_password(user.id, &hashed_password).await?;

        tracing::info!(user_id = %user.id, "🔑 Senha redefinida");
        Ok(())
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        create_token(&self.jwt_secret, user.id, &user.role, self.jwt_ttl)
    }
}

async fn hash_password(password: String) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

fn generate_reset_token() -> String {
    // 256 bits de aleatoriedade (dois UUID v4)
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

pub fn create_token(secret: &str, user_id: Uuid, role: &str, ttl: Duration) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp: (now + ttl).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))?)
}

/// Valida assinatura e expiração. Não consulta o banco.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_keeps_subject_and_role() {
        let user_id = Uuid::new_v4();
        let token = create_token("segredo", user_id, "SUPER_ADMIN", Duration::hours(1)).unwrap();
        let claims = decode_token("segredo", &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, "SUPER_ADMIN");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_token("segredo", Uuid::new_v4(), "USER", Duration::hours(1)).unwrap();
        assert!(matches!(decode_token("outro", &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token("segredo", Uuid::new_v4(), "USER", Duration::hours(-2)).unwrap();
        assert!(matches!(decode_token("segredo", &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn reset_tokens_are_long_and_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
