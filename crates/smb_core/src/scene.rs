//! Scene file: the backdrop, decoration layers and walkers of a level.
//!
//! The floor itself comes from the level layout file; everything else that
//! is drawn is authored here.

use glam::Vec2;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::scroll::{Decoration, DecorationLayer, LayerDrift};
use crate::walker::WalkerSpec;

const SUPPORTED_VERSION: &str = "0.1";

#[derive(Debug, Deserialize, Clone)]
pub struct SceneFile {
    pub version: String,
    pub scene_id: String,
    #[serde(default = "default_clear_color")]
    pub clear_color: [u8; 3],
    #[serde(default)]
    pub background: Option<SceneBackground>,
    #[serde(default)]
    pub layers: Vec<SceneLayer>,
    #[serde(default)]
    pub walkers: Vec<SceneWalker>,
}

/// Fixed full-screen backdrop. Never scrolls.
#[derive(Debug, Deserialize, Clone)]
pub struct SceneBackground {
    pub texture: String,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SceneLayer {
    pub id: String,
    pub drift: LayerDrift,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub sprites: Vec<SceneSprite>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SceneSprite {
    pub id: String,
    pub texture: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SceneWalker {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_walker_step")]
    pub step: f32,
    #[serde(default = "default_walker_min_x")]
    pub min_x: f32,
}

impl SceneFile {
    /// Drawable decoration layers, hidden layers skipped, in file order.
    pub fn decoration_layers(&self) -> Vec<DecorationLayer> {
        self.layers
            .iter()
            .filter(|layer| layer.visible)
            .map(|layer| DecorationLayer {
                id: layer.id.clone(),
                drift: layer.drift,
                items: layer
                    .sprites
                    .iter()
                    .map(|sprite| Decoration {
                        id: sprite.id.clone(),
                        texture: sprite.texture.clone(),
                        position: Vec2::new(sprite.x, sprite.y),
                        size: Vec2::new(sprite.width, sprite.height),
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn walker_specs(&self) -> impl Iterator<Item = (&str, WalkerSpec)> {
        self.walkers.iter().map(|walker| {
            (
                walker.id.as_str(),
                WalkerSpec {
                    position: Vec2::new(walker.x, walker.y),
                    size: Vec2::new(walker.width, walker.height),
                    step: walker.step,
                    min_x: walker.min_x,
                },
            )
        })
    }

    pub fn clear_color_f64(&self) -> [f64; 3] {
        self.clear_color.map(|c| c as f64 / 255.0)
    }

    /// Every texture the scene references, background first.
    pub fn textures(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(background) = &self.background {
            out.push(background.texture.clone());
        }
        for layer in &self.layers {
            out.extend(layer.sprites.iter().map(|s| s.texture.clone()));
        }
        out.sort();
        out.dedup();
        out
    }
}

pub fn load_scene(path: &Path) -> Result<SceneFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read scene file {}: {e}", path.display()))?;
    parse_scene(&raw).map_err(|e| format!("Failed to load scene {}: {e}", path.display()))
}

pub fn parse_scene(raw: &str) -> Result<SceneFile, String> {
    let scene: SceneFile = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    check_scene(&scene)?;
    Ok(scene)
}

/// Layer ids are unique among layers. Sprite and walker ids share one
/// namespace across the whole scene.
fn check_scene(scene: &SceneFile) -> Result<(), String> {
    if scene.version != SUPPORTED_VERSION {
        return Err(format!("unsupported version '{}'", scene.version));
    }

    let mut layer_ids = HashSet::new();
    for layer in &scene.layers {
        if !layer_ids.insert(layer.id.as_str()) {
            return Err(format!("duplicate layer id '{}'", layer.id));
        }
    }

    let mut entities = HashSet::new();
    let sprites = scene.layers.iter().flat_map(|l| &l.sprites);
    for (id, size) in sprites
        .map(|s| (s.id.as_str(), (s.width, s.height)))
        .chain(scene.walkers.iter().map(|w| (w.id.as_str(), (w.width, w.height))))
    {
        if !entities.insert(id) {
            return Err(format!("duplicate sprite id '{id}'"));
        }
        if size.0 <= 0.0 || size.1 <= 0.0 {
            return Err(format!("'{id}' has a non-positive size"));
        }
    }

    for layer in scene.layers.iter().filter(|l| l.sprites.is_empty()) {
        log::warn!("Scene layer '{}' is empty", layer.id);
    }
    Ok(())
}

const fn default_clear_color() -> [u8; 3] {
    [222, 161, 161]
}

const fn default_visible() -> bool {
    true
}

const fn default_walker_step() -> f32 {
    10.0
}

const fn default_walker_min_x() -> f32 {
    -200.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
    {
      "version": "0.1",
      "scene_id": "level0",
      "background": { "texture": "assets/img/main_bg.png", "width": 1600, "height": 900 },
      "layers": [
        {
          "id": "clouds",
          "drift": { "kind": "fixed", "speed": 2.0 },
          "sprites": [
            { "id": "cloud1", "texture": "assets/img/cloud.png", "x": 100, "y": 100, "width": 120, "height": 80 }
          ]
        },
        {
          "id": "bushes",
          "drift": { "kind": "world" },
          "sprites": [
            { "id": "bush1", "texture": "assets/img/bush.png", "x": 0, "y": 500, "width": 120, "height": 80 }
          ]
        },
        {
          "id": "hidden",
          "drift": { "kind": "world" },
          "visible": false,
          "sprites": [
            { "id": "ghost", "texture": "assets/img/bush.png", "x": 0, "y": 0, "width": 1, "height": 1 }
          ]
        }
      ],
      "walkers": [
        { "id": "gomma1", "x": 2000, "y": 480, "width": 70, "height": 70 }
      ]
    }
    "#;

    #[test]
    fn full_scene_converts_to_world_types() {
        let path = std::env::temp_dir().join(format!("smb_scene_{}.json", std::process::id()));
        fs::write(&path, VALID).expect("write scene file");
        let scene = load_scene(&path).expect("valid scene should load");
        let _ = fs::remove_file(&path);

        assert_eq!(scene.scene_id, "level0");
        assert_eq!(scene.clear_color, [222, 161, 161]);
        assert_eq!(scene.layers.len(), 3);

        let layers = scene.decoration_layers();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].drift, LayerDrift::Fixed { speed: 2.0 });
        assert_eq!(layers[1].items[0].position, Vec2::new(0.0, 500.0));

        let walkers: Vec<_> = scene.walker_specs().collect();
        assert_eq!(walkers.len(), 1);
        assert_eq!(walkers[0].0, "gomma1");
        assert_eq!(walkers[0].1.step, 10.0);
        assert_eq!(walkers[0].1.min_x, -200.0);

        assert_eq!(
            scene.textures(),
            vec![
                "assets/img/bush.png".to_string(),
                "assets/img/cloud.png".to_string(),
                "assets/img/main_bg.png".to_string(),
            ]
        );
    }

    #[test]
    fn invalid_scenes_are_rejected() {
        let cases = [
            (r#"{ "version": "2", "scene_id": "s" }"#, "unsupported version '2'"),
            (
                r#"{ "version": "0.1", "scene_id": "s", "layers": [
                    { "id": "a", "drift": { "kind": "world" }, "sprites": [] },
                    { "id": "a", "drift": { "kind": "world" }, "sprites": [] } ] }"#,
                "duplicate layer id 'a'",
            ),
            (
                r#"{ "version": "0.1", "scene_id": "s",
                    "layers": [ { "id": "a", "drift": { "kind": "world" }, "sprites": [
                      { "id": "x", "texture": "t.png", "x": 0, "y": 0, "width": 1, "height": 1 } ] } ],
                    "walkers": [ { "id": "x", "x": 0, "y": 0, "width": 1, "height": 1 } ] }"#,
                "duplicate sprite id 'x'",
            ),
            (
                r#"{ "version": "0.1", "scene_id": "s",
                    "walkers": [ { "id": "g", "x": 0, "y": 0, "width": 0, "height": 1 } ] }"#,
                "'g' has a non-positive size",
            ),
        ];
        for (raw, expected) in cases {
            let err = parse_scene(raw).expect_err(expected);
            assert!(err.contains(expected), "{err}");
        }
    }

    #[test]
    fn minimal_scene_is_valid() {
        let scene = parse_scene(r#"{ "version": "0.1", "scene_id": "s" }"#).expect("valid");
        assert!(scene.background.is_none());
        assert!(scene.decoration_layers().is_empty());
        let [r, _, _] = scene.clear_color_f64();
        assert!((r - 222.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn shipped_level0_scene_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/scenes/level0.json");
        let scene = load_scene(&path).expect("shipped scene is valid");
        let layers = scene.decoration_layers();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].drift, LayerDrift::Fixed { speed: 2.0 });
        assert_eq!(layers[0].items.len(), 7);
        assert_eq!(layers[1].drift, LayerDrift::World);
        assert_eq!(layers[1].items.len(), 12);
        let walkers: Vec<_> = scene.walker_specs().collect();
        assert_eq!(walkers.len(), 1);
        assert_eq!(walkers[0].1.position, Vec2::new(2000.0, 480.0));
    }
}
