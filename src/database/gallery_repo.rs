use sqlx::SqlitePool;

use crate::models::{GalleryCollectionRow, GalleryImageRow, GallerySectionRow};

pub async fn list_sections(pool: &SqlitePool) -> sqlx::Result<Vec<GallerySectionRow>> {
    sqlx::query_as::<_, GallerySectionRow>(
        r#"
SELECT id, title, description, display_order
FROM gallery_sections
ORDER BY display_order ASC, created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn list_collections(pool: &SqlitePool) -> sqlx::Result<Vec<GalleryCollectionRow>> {
    sqlx::query_as::<_, GalleryCollectionRow>(
        r#"
SELECT id, section_id, title, description, display_order
FROM gallery_collections
ORDER BY display_order ASC, created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn list_images(pool: &SqlitePool) -> sqlx::Result<Vec<GalleryImageRow>> {
    sqlx::query_as::<_, GalleryImageRow>(
        r#"
SELECT id, collection_id, section_id, image_url, caption, display_order
FROM gallery_images
ORDER BY display_order ASC, created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn insert_section(
    pool: &SqlitePool,
    id: &str,
    title: &str,
    description: Option<&str>,
    display_order: i64,
) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO gallery_sections (id, title, description, display_order) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(id)
    .bind(title)
    .bind(description)
    .bind(display_order)
    .execute(pool)
    .await?;
    Ok(())
}

pub struct NewCollection<'a> {
    pub id: &'a str,
    pub section_id: Option<&'a str>,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub display_order: i64,
}

pub async fn insert_collection(pool: &SqlitePool, c: NewCollection<'_>) -> sqlx::Result<()> {
    sqlx::query(
        r#"
INSERT INTO gallery_collections (id, section_id, title, description, display_order)
VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(c.id)
    .bind(c.section_id)
    .bind(c.title)
    .bind(c.description)
    .bind(c.display_order)
    .execute(pool)
    .await?;
    Ok(())
}

pub struct NewImage<'a> {
    pub id: &'a str,
    pub collection_id: Option<&'a str>,
    pub section_id: Option<&'a str>,
    pub image_url: &'a str,
    pub caption: Option<&'a str>,
    pub display_order: i64,
}

pub async fn insert_image(pool: &SqlitePool, img: NewImage<'_>) -> sqlx::Result<()> {
    sqlx::query(
        r#"
INSERT INTO gallery_images (id, collection_id, section_id, image_url, caption, display_order)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(img.id)
    .bind(img.collection_id)
    .bind(img.section_id)
    .bind(img.image_url)
    .bind(img.caption)
    .bind(img.display_order)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_section(pool: &SqlitePool, id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM gallery_sections WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_collection(pool: &SqlitePool, id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM gallery_collections WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_image(pool: &SqlitePool, id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM gallery_images WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count_images(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM gallery_images")
        .fetch_one(pool)
        .await
}
