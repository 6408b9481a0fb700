use serde::{Deserialize, Serialize};

use crate::error::{GateError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    /// Unique slug, e.g. `car-logo`.
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    /// Image folder the flash cards were imported from.
    pub folder: String,
    pub created_at: String,
    pub updated_at: String,
    /// Number of flash cards in this category.
    pub image_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub folder: String,
}

impl NewCategory {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("display_name", &self.display_name)?;
        require_non_empty("folder", &self.folder)
    }
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub folder: Option<String>,
}

impl CategoryUpdate {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("display_name", &self.display_name),
            ("folder", &self.folder),
        ] {
            if let Some(value) = value {
                require_non_empty(field, value)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashCard {
    pub id: i64,
    pub name: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<Vec<u8>>,
    pub category_id: i64,
    pub created_at: String,
    pub updated_at: String,
    pub category_display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFlashCard {
    pub name: String,
    pub image_url: String,
    pub image_data: Option<Vec<u8>>,
    pub category_id: i64,
}

impl NewFlashCard {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("image_url", &self.image_url)
    }
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashCardUpdate {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub image_data: Option<Vec<u8>>,
    pub category_id: Option<i64>,
}

impl FlashCardUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        if let Some(image_url) = &self.image_url {
            require_non_empty("image_url", image_url)?;
        }
        Ok(())
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GateError::Validation {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Categories seeded into a fresh catalog.
pub fn default_categories() -> Vec<NewCategory> {
    vec![
        NewCategory {
            name: "car-logo".to_string(),
            display_name: "Car Logo".to_string(),
            description: "Learn about different car brands".to_string(),
            icon: "🚗".to_string(),
            color: "from-blue-500 to-blue-700".to_string(),
            folder: "Car Logo".to_string(),
        },
        NewCategory {
            name: "mood".to_string(),
            display_name: "Mood".to_string(),
            description: "Express your feelings".to_string(),
            icon: "😊".to_string(),
            color: "from-yellow-500 to-orange-500".to_string(),
            folder: "Mood".to_string(),
        },
        NewCategory {
            name: "weather".to_string(),
            display_name: "Weather".to_string(),
            description: "Learn about weather conditions".to_string(),
            icon: "☀️".to_string(),
            color: "from-cyan-500 to-blue-500".to_string(),
            folder: "Weather".to_string(),
        },
    ]
}
