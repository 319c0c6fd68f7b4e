// src/services/booking_service.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{booking_repo::NewAppointment, BookingRepository, UserRepository},
    models::{
        booking::{
            Appointment, AppointmentFilter, AppointmentStatus, BookAppointmentPayload, BusySlot, CreateServicePayload,
            CreateStaffPayload, Service, Staff, UpdateServicePayload, UpdateStaffPayload,
        },
        notification::Job,
    },
    services::jobs::{enqueue, JobQueue},
};

const DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M";

#[derive(Clone)]
pub struct BookingService {
    repo: BookingRepository,
    user_repo: UserRepository,
    jobs: Arc<dyn JobQueue>,
    pool: PgPool,
}

impl BookingService {
    pub fn new(repo: BookingRepository, user_repo: UserRepository, jobs: Arc<dyn JobQueue>, pool: PgPool) -> Self {
        Self { repo, user_repo, jobs, pool }
    }

    // =========================================================================
    //  PROFISSIONAIS
    // =========================================================================

    pub async fn create_staff(&self, tenant_id: Uuid, payload: &CreateStaffPayload) -> Result<Staff, AppError> {
        self.repo.create_staff(tenant_id, payload).await
    }

    pub async fn list_staff(&self, tenant_id: Uuid, only_active: bool) -> Result<Vec<Staff>, AppError> {
        self.repo.list_staff(tenant_id, only_active).await
    }

    pub async fn get_staff(&self, tenant_id: Uuid, staff_id: Uuid) -> Result<Staff, AppError> {
        self.repo
            .find_staff(tenant_id, staff_id)
            .await?
            .ok_or(AppError::NotFound("Profissional"))
    }

    pub async fn update_staff(
        &self,
        tenant_id: Uuid,
        staff_id: Uuid,
        payload: &UpdateStaffPayload,
    ) -> Result<Staff, AppError> {
        self.repo.update_staff(tenant_id, staff_id, payload).await
    }

    pub async fn delete_staff(&self, tenant_id: Uuid, staff_id: Uuid) -> Result<(), AppError> {
        self.repo.delete_staff(tenant_id, staff_id).await
    }

    // =========================================================================
    //  SERVIÇOS
    // =========================================================================

    pub async fn create_service(&self, tenant_id: Uuid, payload: &CreateServicePayload) -> Result<Service, AppError> {
        self.repo.create_service(tenant_id, payload).await
    }

    pub async fn list_services(&self, tenant_id: Uuid, only_active: bool) -> Result<Vec<Service>, AppError> {
        self.repo.list_services(tenant_id, only_active).await
    }

    pub async fn get_service(&self, tenant_id: Uuid, service_id: Uuid) -> Result<Service, AppError> {
        self.repo
            .find_service(tenant_id, service_id)
            .await?
            .ok_or(AppError::NotFound("Serviço"))
    }

    pub async fn update_service(
        &self,
        tenant_id: Uuid,
        service_id: Uuid,
        payload: &UpdateServicePayload,
    ) -> Result<Service, AppError> {
        self.repo.update_service(tenant_id, service_id, payload).await
    }

    pub async fn delete_service(&self, tenant_id: Uuid, service_id: Uuid) -> Result<(), AppError> {
        self.repo.delete_service(tenant_id, service_id).await
    }

    // =========================================================================
    //  AGENDAMENTOS
    // =========================================================================

    pub async fn book(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        payload: &BookAppointmentPayload,
    ) -> Result<Appointment, AppError> {
        if payload.starts_at <= Utc::now() {
            return Err(AppError::BadRequest("Não é possível agendar no passado.".into()));
        }

        let staff = self
            .repo
            .find_staff(tenant_id, payload.staff_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or(AppError::NotFound("Profissional"))?;
        let service = self
            .repo
            .find_service(tenant_id, payload.service_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or(AppError::NotFound("Serviço"))?;
        let customer = self
            .user_repo
            .find_by_id(customer_id)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        let ends_at = payload.starts_at + Duration::minutes(i64::from(service.duration_minutes));

        // Lock no profissional: duas reservas simultâneas não passam juntas pela checagem.
        let mut tx = self.pool.begin().await?;
        self.repo.lock_staff_schedule(&mut *tx, tenant_id, staff.id).await?;

        if self
            .repo
            .has_overlap(&mut *tx, tenant_id, staff.id, payload.starts_at, ends_at)
            .await?
        {
            return Err(AppError::SlotUnavailable);
        }

        let appointment = self
            .repo
            .create_appointment(
                &mut *tx,
                &NewAppointment {
                    tenant_id,
                    staff_id: staff.id,
                    service_id: service.id,
                    customer_id,
                    customer_name: &customer.full_name,
                    customer_email: &customer.email,
                    customer_phone: customer.phone.as_deref(),
                    starts_at: payload.starts_at,
                    ends_at,
                    notes: payload.notes.as_deref(),
                },
            )
            .await?;
        tx.commit().await?;

        tracing::info!(%tenant_id, appointment_id = %appointment.id, staff_id = %staff.id, "📅 Agendamento criado");

        enqueue(
            self.jobs.as_ref(),
            Job::Email {
                to: appointment.customer_email.clone(),
                subject: "Recebemos seu agendamento".into(),
                body: format!(
                    "Olá, {}!\n\nRecebemos seu pedido de {} com {} em {}. Você será avisado quando for confirmado.",
                    appointment.customer_name,
                    service.name,
                    staff.name,
                    appointment.starts_at.format(DATETIME_FORMAT)
                ),
            },
        )
        .await;

        Ok(appointment)
    }

    pub async fn list_appointments(
        &self,
        tenant_id: Uuid,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, AppError> {
        let status = filter
            .status
            .as_deref()
            .map(str::parse::<AppointmentStatus>)
            .transpose()?;
        self.repo
            .list_appointments(tenant_id, None, filter.staff_id, status, filter.from, filter.to)
            .await
    }

    pub async fn list_my_appointments(&self, tenant_id: Uuid, customer_id: Uuid) -> Result<Vec<Appointment>, AppError> {
        self.repo
            .list_appointments(tenant_id, Some(customer_id), None, None, None, None)
            .await
    }

    pub async fn get_appointment(&self, tenant_id: Uuid, appointment_id: Uuid) -> Result<Appointment, AppError> {
        self.repo
            .find_appointment(tenant_id, appointment_id)
            .await?
            .ok_or(AppError::NotFound("Agendamento"))
    }

    /// Cliente cancelando o próprio agendamento.
    pub async fn cancel_mine(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppError> {
        let current = self.get_appointment(tenant_id, appointment_id).await?;
        if current.customer_id != customer_id {
            return Err(AppError::NotFound("Agendamento"));
        }
        self.transition(tenant_id, current, AppointmentStatus::Cancelled).await
    }

    pub async fn update_status(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
        status: &str,
    ) -> Result<Appointment, AppError> {
        let next: AppointmentStatus = status.parse()?;
        let current = self.get_appointment(tenant_id, appointment_id).await?;
        self.transition(tenant_id, current, next).await
    }

    /// Intervalos ocupados do profissional no dia (UTC).
    pub async fn availability(&self, tenant_id: Uuid, staff_id: Uuid, date: NaiveDate) -> Result<Vec<BusySlot>, AppError> {
        self.get_staff(tenant_id, staff_id).await?;
        let (from, to) = day_bounds(date);
        self.repo.busy_slots(tenant_id, staff_id, from, to).await
    }

    async fn transition(
        &self,
        tenant_id: Uuid,
        current: Appointment,
        next: AppointmentStatus,
    ) -> Result<Appointment, AppError> {
        current.status.can_transition_to(next)?;
        if current.status == next {
            return Ok(current);
        }

        // Outra alteração pode ter finalizado o agendamento depois da leitura.
        let updated = self
            .repo
            .update_appointment_status(tenant_id, current.id, next)
            .await?
            .ok_or_else(|| AppError::StatusLocked("O agendamento já foi finalizado por outra alteração.".into()))?;
        tracing::info!(
            %tenant_id,
            appointment_id = %updated.id,
            from = current.status.as_str(),
            to = next.as_str(),
            "Status do agendamento alterado"
        );

        if next.notifies_customer() {
            for job in status_jobs(&updated) {
                enqueue(self.jobs.as_ref(), job).await;
            }
        }
        Ok(updated)
    }
}

fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// E-mail sempre; WhatsApp só quando o cliente tem telefone.
fn status_jobs(appointment: &Appointment) -> Vec<Job> {
    let when = appointment.starts_at.format(DATETIME_FORMAT).to_string();
    let (subject, verb, template) = match appointment.status {
        AppointmentStatus::Confirmed => ("Agendamento confirmado", "foi confirmado", "appointment_confirmed"),
        AppointmentStatus::Cancelled => ("Agendamento cancelado", "foi cancelado", "appointment_cancelled"),
        _ => return Vec::new(),
    };

    let mut jobs = vec![Job::Email {
        to: appointment.customer_email.clone(),
        subject: subject.into(),
        body: format!("Olá, {}!\n\nSeu agendamento de {} {}.", appointment.customer_name, when, verb),
    }];

    if let Some(phone) = &appointment.customer_phone {
        jobs.push(Job::WhatsAppTemplate {
            tenant_id: appointment.tenant_id,
            to: phone.clone(),
            template: template.into(),
            language: None,
            parameters: vec![appointment.customer_name.clone(), when],
        });
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn appointment(status: AppointmentStatus, phone: Option<&str>) -> Appointment {
        let starts_at = Utc.with_ymd_and_hms(2025, 3, 10, 14, 0, 0).unwrap();
        Appointment {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            customer_name: "Ana".into(),
            customer_email: "ana@email.com".into(),
            customer_phone: phone.map(str::to_string),
            starts_at,
            ends_at: starts_at + Duration::minutes(30),
            status,
            notes: None,
            created_at: starts_at,
            updated_at: starts_at,
        }
    }

    #[test]
    fn day_bounds_cover_exactly_one_day() {
        let (from, to) = day_bounds(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(from, Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap());
        assert_eq!(to - from, Duration::days(1));
    }

    #[test]
    fn confirmation_sends_email_and_whatsapp() {
        let jobs = status_jobs(&appointment(AppointmentStatus::Confirmed, Some("+5511999998888")));
        assert_eq!(jobs.len(), 2);
        assert!(matches!(&jobs[0], Job::Email { to, .. } if to == "ana@email.com"));
        match &jobs[1] {
            Job::WhatsAppTemplate { template, parameters, .. } => {
                assert_eq!(template, "appointment_confirmed");
                assert_eq!(parameters, &vec!["Ana".to_string(), "10/03/2025 14:00".to_string()]);
            }
            other => panic!("job inesperado: {other:?}"),
        }
    }

    #[test]
    fn cancellation_without_phone_only_emails() {
        let jobs = status_jobs(&appointment(AppointmentStatus::Cancelled, None));
        assert_eq!(jobs.len(), 1);
        assert!(matches!(&jobs[0], Job::Email { subject, .. } if subject == "Agendamento cancelado"));
    }

    #[test]
    fn other_statuses_send_nothing() {
        assert!(status_jobs(&appointment(AppointmentStatus::Completed, Some("+55"))).is_empty());
    }
}
