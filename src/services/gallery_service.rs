use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::gallery_repo;
use crate::error::AppError;
use crate::models::{GalleryCollectionRow, GalleryImageRow, GallerySectionRow};
use crate::services::event_service::non_blank;

#[derive(Debug, Clone)]
pub struct GalleryImageView {
    pub id: String,
    pub image_url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GalleryCollectionView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub images: Vec<GalleryImageView>,
}

impl GalleryCollectionView {
    pub fn cover_url(&self) -> Option<&str> {
        self.images.first().map(|i| i.image_url.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct GallerySectionView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub collections: Vec<GalleryCollectionView>,
    /// Images attached to the section but not to any collection.
    pub images: Vec<GalleryImageView>,
}

impl GallerySectionView {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.collections.iter().all(|c| c.images.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct GalleryView {
    pub sections: Vec<GallerySectionView>,
    /// Collections with no section, or whose section no longer exists.
    pub collections: Vec<GalleryCollectionView>,
    /// Images attached to nothing that still exists.
    pub images: Vec<GalleryImageView>,
}

impl GalleryView {
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.is_empty())
            && self.collections.iter().all(|c| c.images.is_empty())
            && self.images.is_empty()
    }
}

/// Rebuilds section -> collection -> image groups from flat rows.
///
/// Input order is kept within every group. An image with a collection goes to that
/// collection even if it also names a section.
pub fn group_gallery(
    sections: Vec<GallerySectionRow>,
    collections: Vec<GalleryCollectionRow>,
    images: Vec<GalleryImageRow>,
) -> GalleryView {
    let section_ids: HashSet<String> = sections.iter().map(|s| s.id.clone()).collect();
    let collection_ids: HashSet<String> = collections.iter().map(|c| c.id.clone()).collect();

    let mut images_by_collection: HashMap<String, Vec<GalleryImageView>> = HashMap::new();
    let mut images_by_section: HashMap<String, Vec<GalleryImageView>> = HashMap::new();
    let mut loose_images = Vec::new();

    for img in images {
        let view = GalleryImageView {
            id: img.id,
            image_url: img.image_url,
            caption: img.caption.filter(|c| !c.trim().is_empty()),
        };
        match (img.collection_id, img.section_id) {
            (Some(c), _) if collection_ids.contains(&c) => {
                images_by_collection.entry(c).or_default().push(view)
            }
            (_, Some(s)) if section_ids.contains(&s) => {
                images_by_section.entry(s).or_default().push(view)
            }
            _ => loose_images.push(view),
        }
    }

    let mut collections_by_section: HashMap<String, Vec<GalleryCollectionView>> = HashMap::new();
    let mut loose_collections = Vec::new();

    for c in collections {
        let view = GalleryCollectionView {
            images: images_by_collection.remove(&c.id).unwrap_or_default(),
            id: c.id,
            title: c.title,
            description: c.description,
        };
        match c.section_id {
            Some(s) if section_ids.contains(&s) => {
                collections_by_section.entry(s).or_default().push(view)
            }
            _ => loose_collections.push(view),
        }
    }

    let sections = sections
        .into_iter()
        .map(|s| GallerySectionView {
            collections: collections_by_section.remove(&s.id).unwrap_or_default(),
            images: images_by_section.remove(&s.id).unwrap_or_default(),
            id: s.id,
            title: s.title,
            description: s.description,
        })
        .collect();

    GalleryView {
        sections,
        collections: loose_collections,
        images: loose_images,
    }
}

pub async fn load_gallery(pool: &SqlitePool) -> sqlx::Result<GalleryView> {
    let sections = gallery_repo::list_sections(pool).await?;
    let collections = gallery_repo::list_collections(pool).await?;
    let images = gallery_repo::list_images(pool).await?;
    Ok(group_gallery(sections, collections, images))
}

/// Public page: same grouping with empty sections and collections dropped.
pub async fn load_public_gallery(pool: &SqlitePool) -> sqlx::Result<GalleryView> {
    let mut view = load_gallery(pool).await?;
    view.sections.retain(|s| !s.is_empty());
    for s in view.sections.iter_mut() {
        s.collections.retain(|c| !c.images.is_empty());
    }
    view.collections.retain(|c| !c.images.is_empty());
    Ok(view)
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SectionForm {
    pub title: String,
    pub description: Option<String>,
    pub display_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionForm {
    pub title: String,
    pub description: Option<String>,
    pub section_id: Option<String>,
    pub display_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ImageForm {
    pub image_url: String,
    pub caption: Option<String>,
    pub collection_id: Option<String>,
    pub section_id: Option<String>,
    pub display_order: Option<i64>,
}

pub async fn create_section(pool: &SqlitePool, form: &SectionForm) -> Result<String, AppError> {
    let title = required(&form.title, "Section title is required")?;
    let id = Uuid::new_v4().to_string();
    gallery_repo::insert_section(
        pool,
        &id,
        &title,
        non_blank(form.description.as_deref()).as_deref(),
        form.display_order.unwrap_or(0),
    )
    .await?;
    Ok(id)
}

pub async fn create_collection(
    pool: &SqlitePool,
    form: &CollectionForm,
) -> Result<String, AppError> {
    let title = required(&form.title, "Collection title is required")?;
    let id = Uuid::new_v4().to_string();
    let description = non_blank(form.description.as_deref());
    let section_id = non_blank(form.section_id.as_deref());
    gallery_repo::insert_collection(
        pool,
        gallery_repo::NewCollection {
            id: &id,
            section_id: section_id.as_deref(),
            title: &title,
            description: description.as_deref(),
            display_order: form.display_order.unwrap_or(0),
        },
    )
    .await
    .map_err(foreign_key_error)?;
    Ok(id)
}

pub async fn create_image(pool: &SqlitePool, form: &ImageForm) -> Result<String, AppError> {
    let image_url = required(&form.image_url, "Image URL is required")?;
    let id = Uuid::new_v4().to_string();
    let caption = non_blank(form.caption.as_deref());
    let collection_id = non_blank(form.collection_id.as_deref());
    let section_id = non_blank(form.section_id.as_deref());
    gallery_repo::insert_image(
        pool,
        gallery_repo::NewImage {
            id: &id,
            collection_id: collection_id.as_deref(),
            section_id: section_id.as_deref(),
            image_url: &image_url,
            caption: caption.as_deref(),
            display_order: form.display_order.unwrap_or(0),
        },
    )
    .await
    .map_err(foreign_key_error)?;
    Ok(id)
}

pub async fn delete_section(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    found(gallery_repo::delete_section(pool, id).await?)
}

pub async fn delete_collection(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    found(gallery_repo::delete_collection(pool, id).await?)
}

pub async fn delete_image(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    found(gallery_repo::delete_image(pool, id).await?)
}

fn required(value: &str, message: &str) -> Result<String, AppError> {
    non_blank(Some(value)).ok_or_else(|| AppError::Validation(message.to_string()))
}

fn found(rows: u64) -> Result<(), AppError> {
    if rows == 0 {
        Err(AppError::NotFound)
    } else {
        Ok(())
    }
}

fn foreign_key_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::Validation("The selected section or collection no longer exists".into())
        }
        _ => AppError::Database(err),
    }
}
