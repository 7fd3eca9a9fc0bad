use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::team_members_repo::{self, TeamMemberWrite};
use crate::error::AppError;
use crate::models::TeamMemberRow;
use crate::services::event_service::non_blank;

#[derive(Debug, Deserialize)]
pub struct TeamMemberForm {
    pub name: String,
    pub position: String,
    pub image_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub display_order: Option<i64>,
}

struct ValidMember {
    name: String,
    position: String,
    image_url: Option<String>,
    linkedin_url: Option<String>,
    display_order: i64,
}

impl ValidMember {
    fn as_write(&self) -> TeamMemberWrite<'_> {
        TeamMemberWrite {
            name: &self.name,
            position: &self.position,
            image_url: self.image_url.as_deref(),
            linkedin_url: self.linkedin_url.as_deref(),
            display_order: self.display_order,
        }
    }
}

fn validate(form: &TeamMemberForm) -> Result<ValidMember, AppError> {
    let name = non_blank(Some(&form.name))
        .ok_or_else(|| AppError::Validation("Name is required".into()))?;
    let position = non_blank(Some(&form.position))
        .ok_or_else(|| AppError::Validation("Position is required".into()))?;
    let linkedin_url = non_blank(form.linkedin_url.as_deref());
    if let Some(url) = linkedin_url.as_deref() {
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(AppError::Validation(
                "LinkedIn URL must start with http(s)://".into(),
            ));
        }
    }
    Ok(ValidMember {
        name,
        position,
        image_url: non_blank(form.image_url.as_deref()),
        linkedin_url,
        display_order: form.display_order.unwrap_or(0),
    })
}

pub async fn list_members(pool: &SqlitePool) -> sqlx::Result<Vec<TeamMemberRow>> {
    team_members_repo::list_team_members(pool).await
}

pub async fn create_member(pool: &SqlitePool, form: &TeamMemberForm) -> Result<String, AppError> {
    let member = validate(form)?;
    let id = Uuid::new_v4().to_string();
    team_members_repo::insert_team_member(pool, &id, member.as_write()).await?;
    Ok(id)
}

pub async fn update_member(
    pool: &SqlitePool,
    id: &str,
    form: &TeamMemberForm,
) -> Result<(), AppError> {
    let member = validate(form)?;
    if team_members_repo::update_team_member(pool, id, member.as_write()).await? == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn delete_member(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    if team_members_repo::delete_team_member(pool, id).await? == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;

    fn form(name: &str, order: i64) -> TeamMemberForm {
        TeamMemberForm {
            name: name.into(),
            position: "Coordinator".into(),
            image_url: None,
            linkedin_url: Some("https://linkedin.com/in/someone".into()),
            display_order: Some(order),
        }
    }

    #[tokio::test]
    async fn members_are_listed_by_display_order() {
        let pool = database::connect_in_memory().await.unwrap();
        create_member(&pool, &form("Zed", 1)).await.unwrap();
        let id = create_member(&pool, &form("Amy", 2)).await.unwrap();
        update_member(&pool, &id, &form("Amy", 0)).await.unwrap();

        let names: Vec<_> = list_members(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Amy", "Zed"]);

        delete_member(&pool, &id).await.unwrap();
        assert_eq!(list_members(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn linkedin_url_must_be_http() {
        let pool = database::connect_in_memory().await.unwrap();
        let mut f = form("Amy", 0);
        f.linkedin_url = Some("javascript:alert(1)".into());
        assert!(matches!(
            create_member(&pool, &f).await,
            Err(AppError::Validation(_))
        ));
    }
}
