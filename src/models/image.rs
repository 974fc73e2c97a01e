use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Built deployment unit referenced by an assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    /// `<prefix>-<object name>` of the unit stored in the object store
    pub docker_image_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Image {
    /// Object-store name of the built unit: everything after the first `-`
    /// of `docker_image_name`, or the whole name when it carries no prefix.
    pub fn du_object_name(&self) -> Option<&str> {
        let name = self.docker_image_name.as_deref()?;
        if name.is_empty() {
            return None;
        }
        Some(name.split_once('-').map_or(name, |(_, rest)| rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(docker_image_name: Option<&str>) -> Image {
        Image {
            id: 1,
            uuid: Uuid::new_v4(),
            name: "shop".to_string(),
            docker_image_name: docker_image_name.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_object_name_strips_first_prefix_only() {
        assert_eq!(
            image(Some("tenant-shop-v2.tar")).du_object_name(),
            Some("shop-v2.tar")
        );
        assert_eq!(image(Some("shop.tar")).du_object_name(), Some("shop.tar"));
        assert_eq!(image(Some("")).du_object_name(), None);
        assert_eq!(image(None).du_object_name(), None);
    }
}
