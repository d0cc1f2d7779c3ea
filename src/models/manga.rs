use crate::error::{GenerationError, Result};
use crate::models::AspectRatio;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const PANEL_COUNT: usize = 4;

const MAX_NAME_CHARS: usize = 100;
const MAX_CHARACTER_DESCRIPTION_CHARS: usize = 500;
const MAX_SCENE_TEXT_CHARS: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Key used by `Scene::character_states`. Defaults to the list position.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ref_image: Option<String>,
}

impl Character {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_ref_image(mut self, ref_image: impl Into<String>) -> Self {
        self.ref_image = Some(ref_image.into());
        self
    }

    pub fn reference_identifier(&self) -> Option<&str> {
        self.ref_image
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub scene_description: String,
    #[serde(default)]
    pub character_states: IndexMap<String, String>,
    #[serde(default)]
    pub objects_background: String,
}

impl Scene {
    pub fn new(scene_description: impl Into<String>) -> Self {
        Self {
            scene_description: scene_description.into(),
            ..Default::default()
        }
    }

    pub fn with_state(mut self, character_id: impl Into<String>, state: impl Into<String>) -> Self {
        self.character_states
            .insert(character_id.into(), state.into());
        self
    }

    pub fn with_background(mut self, objects_background: impl Into<String>) -> Self {
        self.objects_background = objects_background.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub layout_ref_image: Option<String>,
    #[serde(default)]
    pub characters: Vec<Character>,
    pub scenes: Vec<Scene>,
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(GenerationError::ValidationError(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

impl GenerationRequest {
    pub fn layout_identifier(&self) -> Option<&str> {
        self.layout_ref_image
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn has_layout_reference(&self) -> bool {
        self.layout_identifier().is_some()
    }

    /// Checks the request shape and fills in missing character ids.
    ///
    /// Runs before any reference loading or service call.
    pub fn validated(mut self) -> Result<Self> {
        if self.scenes.len() != PANEL_COUNT {
            return Err(GenerationError::ValidationError(format!(
                "Exactly {} scenes must be provided, got {}",
                PANEL_COUNT,
                self.scenes.len()
            )));
        }

        let mut seen = HashSet::new();
        for (idx, character) in self.characters.iter_mut().enumerate() {
            if character.id.trim().is_empty() {
                character.id = idx.to_string();
            }
            if character.name.trim().is_empty() {
                return Err(GenerationError::ValidationError(format!(
                    "Character {} has an empty name",
                    idx + 1
                )));
            }
            check_len("Character name", &character.name, MAX_NAME_CHARS)?;
            if let Some(description) = &character.description {
                check_len(
                    "Character description",
                    description,
                    MAX_CHARACTER_DESCRIPTION_CHARS,
                )?;
            }
            if !seen.insert(character.id.clone()) {
                return Err(GenerationError::ValidationError(format!(
                    "Duplicate character id '{}'",
                    character.id
                )));
            }
        }

        for scene in &self.scenes {
            check_len("Scene description", &scene.scene_description, MAX_SCENE_TEXT_CHARS)?;
            check_len(
                "Objects/background description",
                &scene.objects_background,
                MAX_SCENE_TEXT_CHARS,
            )?;
        }

        Ok(self)
    }
}
