use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::recipes::repo::{self, Recipe};
use crate::state::AppState;

const UPLOAD_PREFIX: &str = "uploads/recipes";
const PRESIGN_TTL_SECS: u64 = 30 * 60;

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Storage key for a newly uploaded image: a fresh UUID with only the
/// extension carried over from the content type. `None` for non-image types.
pub fn image_object_key(content_type: &str) -> Option<String> {
    let ext = ext_from_mime(content_type)?;
    Some(format!("{}/{}.{}", UPLOAD_PREFIX, Uuid::new_v4(), ext))
}

/// Upload a recipe image, record its key, and drop the replaced object.
/// Nothing is stored or recorded when the payload is not an image.
pub async fn store_recipe_image(
    st: &AppState,
    recipe: &Recipe,
    body: Bytes,
    content_type: &str,
) -> Result<String, ApiError> {
    let key = image_object_key(content_type)
        .ok_or_else(|| ApiError::validation("image", "Upload a valid image"))?;
    if body.is_empty() {
        return Err(ApiError::validation("image", "The submitted file is empty"));
    }

    st.storage
        .put_object(&key, body, content_type)
        .await
        .with_context(|| format!("put_object {key}"))?;
    repo::set_image_key(&st.db, recipe.id, &key).await?;

    if let Some(old) = &recipe.image_key {
        if let Err(e) = st.storage.delete_object(old).await {
            warn!(error = %e, key = %old, "failed to delete replaced image");
        }
    }

    info!(recipe_id = %recipe.id, key = %key, "image stored");
    Ok(key)
}

/// Short-lived download URL for a stored image.
pub async fn presign_image(st: &AppState, key: &str) -> anyhow::Result<String> {
    st.storage
        .presign_get(key, PRESIGN_TTL_SECS)
        .await
        .with_context(|| format!("presign image {key}"))
}

#[cfg(test)]
mod tests {
    use crate::state::AppState;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(super::ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(super::ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(super::ext_from_mime("image/png"), Some("png"));
        assert_eq!(super::ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(super::ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(super::ext_from_mime("application/octet-stream"), None);
        assert_eq!(super::ext_from_mime("text/plain"), None);
    }

    #[test]
    fn object_key_keeps_extension_only() {
        let key = super::image_object_key("image/png").unwrap();
        assert!(key.starts_with("uploads/recipes/"));
        assert!(key.ends_with(".png"));
        // two uploads of the same type never collide
        assert_ne!(key, super::image_object_key("image/png").unwrap());
    }

    #[test]
    fn object_key_rejects_non_images() {
        assert!(super::image_object_key("application/pdf").is_none());
    }

    #[tokio::test]
    async fn presign_builds_url_for_key() {
        let state = AppState::fake();
        let url = super::presign_image(&state, "uploads/recipes/a.jpg")
            .await
            .unwrap();
        assert!(url.contains("uploads/recipes/a.jpg"));
    }
}
