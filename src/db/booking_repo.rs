// src/db/booking_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{ensure_affected, foreign_key_violation},
        error::AppError,
    },
    models::booking::{
        Appointment, AppointmentStatus, BusySlot, CreateServicePayload, CreateStaffPayload, Service,
        Staff, UpdateServicePayload, UpdateStaffPayload,
    },
};

#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

// Dados do agendamento a ser gravado; o cliente é copiado do usuário.
pub struct NewAppointment<'a> {
    pub tenant_id: Uuid,
    pub staff_id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: &'a str,
    pub customer_email: &'a str,
    pub customer_phone: Option<&'a str>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub notes: Option<&'a str>,
}

fn in_use(entity: &str) -> AppError {
    AppError::Conflict(format!("{} possui agendamentos; desative em vez de excluir.", entity))
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PROFISSIONAIS
    // =========================================================================

    pub async fn create_staff(&self, tenant_id: Uuid, payload: &CreateStaffPayload) -> Result<Staff, AppError> {
        let staff = sqlx::query_as::<_, Staff>(
            r#"
            INSERT INTO staff (tenant_id, name, email, phone, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&payload.name)
        .bind(payload.email.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(staff)
    }

    pub async fn list_staff(&self, tenant_id: Uuid, only_active: bool) -> Result<Vec<Staff>, AppError> {
        let staff = sqlx::query_as::<_, Staff>(
            "SELECT * FROM staff WHERE tenant_id = $1 AND (NOT $2 OR is_active = true) ORDER BY name ASC",
        )
        .bind(tenant_id)
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(staff)
    }

    pub async fn find_staff(&self, tenant_id: Uuid, staff_id: Uuid) -> Result<Option<Staff>, AppError> {
        let staff = sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(staff_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(staff)
    }

    pub async fn update_staff(
        &self,
        tenant_id: Uuid,
        staff_id: Uuid,
        payload: &UpdateStaffPayload,
    ) -> Result<Staff, AppError> {
        sqlx::query_as::<_, Staff>(
            r#"
            UPDATE staff SET
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(staff_id)
        .bind(payload.name.as_deref())
        .bind(payload.email.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Profissional"))
    }

    pub async fn delete_staff(&self, tenant_id: Uuid, staff_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM staff WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(staff_id)
            .execute(&self.pool)
            .await
            .map_err(|e| foreign_key_violation(e, || in_use("O profissional")))?;
        ensure_affected(result.rows_affected(), "Profissional")
    }

    // =========================================================================
    //  SERVIÇOS
    // =========================================================================

    pub async fn create_service(
        &self,
        tenant_id: Uuid,
        payload: &CreateServicePayload,
    ) -> Result<Service, AppError> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (tenant_id, name, description, duration_minutes, price, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&payload.name)
        .bind(payload.description.as_deref())
        .bind(payload.duration_minutes)
        .bind(payload.price)
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(service)
    }

    pub async fn list_services(&self, tenant_id: Uuid, only_active: bool) -> Result<Vec<Service>, AppError> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE tenant_id = $1 AND (NOT $2 OR is_active = true) ORDER BY name ASC",
        )
        .bind(tenant_id)
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(services)
    }

    pub async fn find_service(&self, tenant_id: Uuid, service_id: Uuid) -> Result<Option<Service>, AppError> {
        let service = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(service)
    }

    pub async fn update_service(
        &self,
        tenant_id: Uuid,
        service_id: Uuid,
        payload: &UpdateServicePayload,
    ) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(
            r#"
            UPDATE services SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                duration_minutes = COALESCE($5, duration_minutes),
                price = COALESCE($6, price),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(service_id)
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.duration_minutes)
        .bind(payload.price)
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Serviço"))
    }

    pub async fn delete_service(&self, tenant_id: Uuid, service_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM services WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(service_id)
            .execute(&self.pool)
            .await
            .map_err(|e| foreign_key_violation(e, || in_use("O serviço")))?;
        ensure_affected(result.rows_affected(), "Serviço")
    }

    // =========================================================================
    //  AGENDAMENTOS
    // =========================================================================

    /// Serializa reservas do mesmo profissional até o fim da transação.
    pub async fn lock_staff_schedule<'e, E>(&self, executor: E, tenant_id: Uuid, staff_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT id FROM staff WHERE tenant_id = $1 AND id = $2 FOR UPDATE")
            .bind(tenant_id)
            .bind(staff_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Existe agendamento que ainda ocupa a agenda e cruza [starts_at, ends_at)?
    pub async fn has_overlap<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        staff_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM appointments
                WHERE tenant_id = $1 AND staff_id = $2
                  AND status NOT IN ('CANCELLED', 'NO_SHOW')
                  AND starts_at < $4 AND $3 < ends_at
            )
            "#,
        )
        .bind(tenant_id)
        .bind(staff_id)
        .bind(starts_at)
        .bind(ends_at)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn create_appointment<'e, E>(
        &self,
        executor: E,
        new: &NewAppointment<'_>,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments
                (tenant_id, staff_id, service_id, customer_id, customer_name, customer_email,
                 customer_phone, starts_at, ends_at, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(new.tenant_id)
        .bind(new.staff_id)
        .bind(new.service_id)
        .bind(new.customer_id)
        .bind(new.customer_name)
        .bind(new.customer_email)
        .bind(new.customer_phone)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .bind(new.notes)
        .fetch_one(executor)
        .await?;
        Ok(appointment)
    }

    pub async fn list_appointments(
        &self,
        tenant_id: Uuid,
        customer_id: Option<Uuid>,
        staff_id: Option<Uuid>,
        status: Option<AppointmentStatus>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Appointment>, AppError> {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND ($3::uuid IS NULL OR staff_id = $3)
              AND ($4::appointment_status IS NULL OR status = $4)
              AND ($5::timestamptz IS NULL OR starts_at >= $5)
              AND ($6::timestamptz IS NULL OR starts_at < $6)
            ORDER BY starts_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .bind(staff_id)
        .bind(status)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(appointments)
    }

    pub async fn find_appointment(&self, tenant_id: Uuid, appointment_id: Uuid) -> Result<Option<Appointment>, AppError> {
        let appointment =
            sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE tenant_id = $1 AND id = $2")
                .bind(tenant_id)
                .bind(appointment_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(appointment)
    }

    /// Só altera agendamentos que ainda não chegaram a um estado final.
    /// `None` = inexistente ou já finalizado.
    pub async fn update_appointment_status(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, AppError> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments SET status = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
              AND status NOT IN ('COMPLETED', 'CANCELLED', 'NO_SHOW')
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(appointment_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(appointment)
    }

    /// Intervalos ocupados do profissional em [from, to).
    pub async fn busy_slots(
        &self,
        tenant_id: Uuid,
        staff_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BusySlot>, AppError> {
        let slots = sqlx::query_as::<_, BusySlot>(
            r#"
            SELECT starts_at, ends_at FROM appointments
            WHERE tenant_id = $1 AND staff_id = $2
              AND status NOT IN ('CANCELLED', 'NO_SHOW')
              AND starts_at < $4 AND $3 < ends_at
            ORDER BY starts_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(staff_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(slots)
    }
}
