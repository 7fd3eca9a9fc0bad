use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::database::contact_repo;
use crate::error::AppError;
use crate::models::ContactMessageRow;
use crate::services::event_service::non_blank;

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

pub async fn submit_message(pool: &SqlitePool, form: &ContactForm) -> Result<(), AppError> {
    let name = non_blank(Some(&form.name))
        .ok_or_else(|| AppError::Validation("Name is required".into()))?;
    let email = form.email.trim();
    if !looks_like_email(email) {
        return Err(AppError::Validation("Enter a valid email".into()));
    }
    let message = non_blank(Some(&form.message))
        .ok_or_else(|| AppError::Validation("Message is required".into()))?;
    if message.chars().count() > 5000 {
        return Err(AppError::Validation("Message is too long".into()));
    }
    let subject = non_blank(form.subject.as_deref());

    let id = Uuid::new_v4().to_string();
    contact_repo::insert_contact_message(
        pool,
        contact_repo::NewContactMessage {
            id: &id,
            name: &name,
            email,
            subject: subject.as_deref(),
            message: &message,
        },
    )
    .await?;
    info!("Contact message {} received", id);
    Ok(())
}

pub async fn list_messages(pool: &SqlitePool) -> sqlx::Result<Vec<ContactMessageRow>> {
    contact_repo::list_contact_messages(pool, 200).await
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !value.contains(' ')
}
