#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GallerySectionRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub display_order: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GalleryCollectionRow {
    pub id: String,
    pub section_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub display_order: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GalleryImageRow {
    pub id: String,
    pub collection_id: Option<String>,
    pub section_id: Option<String>,
    pub image_url: String,
    pub caption: Option<String>,
    pub display_order: i64,
}
