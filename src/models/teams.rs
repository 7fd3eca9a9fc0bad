#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamRow {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub join_code: String,
    pub leader_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamMemberEntryRow {
    pub user_id: String,
    pub role: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
}
