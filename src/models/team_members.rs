// Core E-Cell team shown on the about page; unrelated to event teams.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamMemberRow {
    pub id: String,
    pub name: String,
    pub position: String,
    pub image_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub display_order: i64,
}
