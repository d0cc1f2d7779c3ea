//! Structured text prompt for four-panel manga generation.
//!
//! Pure string building; no I/O. The scene count is not checked here.

use crate::models::{Character, Scene};
use std::fmt::Write;

pub const CHARACTER_SECTION: &str = "## Character References";
pub const LAYOUT_SECTION: &str = "## Layout Reference";
pub const PANEL_HEADING: &str = "### Panel ";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn character_label(characters: &[Character], id: &str) -> String {
    characters
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| format!("Character {}", id))
}

pub fn build_prompt(characters: &[Character], scenes: &[Scene], has_layout_reference: bool) -> String {
    let mut out = String::new();
    let panels = scenes.len();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "# {}-Panel Manga Generation Request", panels);
    out.push('\n');

    out.push_str("## Overall Instructions\n");
    if has_layout_reference {
        let _ = writeln!(
            out,
            "Generate a {}-panel manga following the specifications below. \
             The panel arrangement MUST match the attached layout reference image exactly. \
             The aspect ratio defines the overall canvas only, not the panel layout inside it.",
            panels
        );
    } else {
        let _ = writeln!(
            out,
            "Generate a {}-panel manga based on the specifications below. \
             You may choose the panel layout freely.",
            panels
        );
    }

    if !characters.is_empty() {
        out.push('\n');
        out.push_str(CHARACTER_SECTION);
        out.push('\n');
        let _ = writeln!(
            out,
            "{} character(s) are provided. Keep each character's appearance consistent with their reference image.",
            characters.len()
        );
        for (idx, character) in characters.iter().enumerate() {
            out.push('\n');
            let _ = writeln!(out, "### Character {}: {}", idx + 1, character.name);
            if let Some(description) = non_empty(character.description.as_deref()) {
                let _ = writeln!(out, "Description: {}", description);
            }
            if character.reference_identifier().is_some() {
                out.push_str("Reference image: attached\n");
            }
        }
    }

    if has_layout_reference {
        out.push('\n');
        out.push_str(LAYOUT_SECTION);
        out.push('\n');
        out.push_str("A layout reference image is provided. Treat it as the blueprint for the page:\n");
        out.push_str("- Copy the position of every panel\n");
        out.push_str("- Match panel widths, heights and proportions\n");
        out.push_str("- Replicate border thickness and style\n");
        out.push_str("- Keep the same gaps between panels\n");
    }

    out.push('\n');
    out.push_str("## Panel Specifications\n");
    for (idx, scene) in scenes.iter().enumerate() {
        out.push('\n');
        let _ = writeln!(out, "{}{}", PANEL_HEADING, idx + 1);
        if let Some(description) = non_empty(Some(scene.scene_description.as_str())) {
            let _ = writeln!(out, "Scene: {}", description);
        }

        let states: Vec<(String, &str)> = scene
            .character_states
            .iter()
            .filter_map(|(id, state)| {
                non_empty(Some(state.as_str())).map(|state| (character_label(characters, id), state))
            })
            .collect();
        if !states.is_empty() {
            out.push_str("Characters:\n");
            for (name, state) in states {
                let _ = writeln!(out, "- {}: {}", name, state);
            }
        }

        if let Some(background) = non_empty(Some(scene.objects_background.as_str())) {
            let _ = writeln!(out, "Background/Objects: {}", background);
        }
    }

    out.push('\n');
    out.push_str("## Output Requirements\n");
    let _ = writeln!(out, "- Generate a single image containing all {} panels", panels);
    if has_layout_reference {
        out.push_str("- Follow the layout reference image EXACTLY; layout takes priority over every other instruction\n");
    }
    out.push_str("- Maintain character consistency across panels\n");
    out.push_str("- Show the scene, characters and background described for each panel\n");
    out.push_str("- Leave speech bubbles completely empty; do not draw letters, words or sound effects\n");
    out.push_str("- Manga symbols are allowed (♪, !, ?, sweat drops, effect lines, emotion marks)\n");
    out.push_str("- Full color illustration with flat, even coloring; bold colors and thicker lines for main characters, muted colors and thinner lines for objects and background\n");
    out.push_str("- Use a manga/comic art style\n");

    out
}
