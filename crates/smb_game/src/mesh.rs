//! Per-frame sprite mesh: every visible quad, in paint order, batched by
//! texture.

use glam::Vec2;
use smb_core::scene::SceneBackground;
use smb_core::GameWorld;
use smb_render::{SpriteVertex, QUAD_INDICES};
use std::sync::Arc;

use crate::assets::DEBUG_WHITE;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const GAP_TINT: [f32; 4] = [1.0, 0.15, 0.15, 0.35];

/// A contiguous run of indices that share one texture binding.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture_key: Arc<str>,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
}

impl Mesh {
    pub fn with_capacity(quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * 4),
            indices: Vec::with_capacity(quads * 6),
            draw_calls: Vec::with_capacity(16),
        }
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Append an axis-aligned quad given its top-left corner in screen space.
    pub fn push_quad(&mut self, texture_key: &str, top_left: Vec2, size: Vec2, color: [f32; 4]) {
        let base_index = self.vertices.len() as u32;
        self.vertices
            .extend(SpriteVertex::quad(top_left.into(), size.into(), color));

        let draw_start = self.indices.len() as u32;
        self.indices
            .extend(QUAD_INDICES.iter().map(|index| base_index + index));
        self.push_draw_call(texture_key, draw_start, QUAD_INDICES.len() as u32);
    }

    /// Merge with the previous call when the texture matches and the indices
    /// are contiguous, so a row of bricks costs one `draw_indexed`.
    fn push_draw_call(&mut self, texture_key: &str, index_start: u32, index_count: u32) {
        if let Some(last) = self.draw_calls.last_mut() {
            let contiguous = last.index_start + last.index_count == index_start;
            if &*last.texture_key == texture_key && contiguous {
                last.index_count += index_count;
                return;
            }
        }
        self.draw_calls.push(DrawCall {
            texture_key: Arc::from(texture_key),
            index_start,
            index_count,
        });
    }
}

pub struct FrameView<'a> {
    pub background: Option<&'a SceneBackground>,
    pub brick_texture: &'a str,
    pub viewport: Vec2,
    pub show_gaps: bool,
}

impl FrameView<'_> {
    fn visible(&self, top_left: Vec2, size: Vec2) -> bool {
        top_left.x + size.x >= 0.0 && top_left.x <= self.viewport.x
    }
}

/// Paint order: sky, decoration layers, floor, walkers, character, gap bands.
pub fn build_world_mesh(world: &GameWorld, view: &FrameView<'_>) -> Mesh {
    let scroll = world.scroll();
    let mut mesh = Mesh::with_capacity(scroll.bricks().len() / 4 + 64);

    if let Some(background) = view.background {
        mesh.push_quad(
            &background.texture,
            Vec2::ZERO,
            Vec2::new(background.width, background.height),
            WHITE,
        );
    }

    for layer in scroll.layers() {
        for item in &layer.items {
            if view.visible(item.position, item.size) {
                mesh.push_quad(&item.texture, item.position, item.size, WHITE);
            }
        }
    }

    let brick_size = scroll.brick_size();
    for &brick in scroll.bricks() {
        if view.visible(brick, brick_size) {
            mesh.push_quad(view.brick_texture, brick, brick_size, WHITE);
        }
    }

    for walker in world.walkers() {
        if view.visible(walker.position(), walker.size()) {
            mesh.push_quad(walker.texture(), walker.position(), walker.size(), WHITE);
        }
    }

    let character = world.character();
    mesh.push_quad(
        character.texture(),
        character.position(),
        character.size(),
        WHITE,
    );

    if view.show_gaps {
        let level = &world.config().level;
        let depth = level.column_width * level.stack_depth as f32;
        for (start, end) in world.layout().gap_bands() {
            let top_left = Vec2::new(scroll.level_to_screen_x(start), level.stack_top_y);
            let size = Vec2::new(end - start, depth);
            if view.visible(top_left, size) {
                mesh.push_quad(DEBUG_WHITE, top_left, size, GAP_TINT);
            }
        }
    }

    mesh
}

/// Bind-group switches the draw list will cause.
pub fn count_texture_binds(draw_calls: &[DrawCall]) -> usize {
    let mut binds = 0usize;
    let mut current: Option<&str> = None;
    for draw in draw_calls {
        let key: &str = &draw.texture_key;
        if current != Some(key) {
            current = Some(key);
            binds += 1;
        }
    }
    binds
}

#[cfg(test)]
mod tests {
    use super::*;
    use smb_core::{CharacterSprites, GameConfig, LevelLayout};

    fn world_for(markers: &str) -> GameWorld {
        GameWorld::new(
            GameConfig::default(),
            LevelLayout::parse(markers, 50.0),
            CharacterSprites::default(),
        )
    }

    fn view(show_gaps: bool) -> FrameView<'static> {
        FrameView {
            background: None,
            brick_texture: "brick.png",
            viewport: Vec2::new(1600.0, 900.0),
            show_gaps,
        }
    }

    #[test]
    fn quads_sharing_a_texture_batch_into_one_call() {
        let mut mesh = Mesh::default();
        mesh.push_quad("a", Vec2::ZERO, Vec2::ONE, WHITE);
        mesh.push_quad("a", Vec2::ONE, Vec2::ONE, WHITE);
        mesh.push_quad("b", Vec2::ZERO, Vec2::ONE, WHITE);
        mesh.push_quad("a", Vec2::ZERO, Vec2::ONE, WHITE);
        assert_eq!(mesh.quad_count(), 4);
        assert_eq!(mesh.draw_calls.len(), 3);
        assert_eq!(mesh.draw_calls[0].index_count, 12);
        assert_eq!(count_texture_binds(&mesh.draw_calls), 3);
    }

    #[test]
    fn quad_corners_are_top_left_anchored() {
        let mut mesh = Mesh::default();
        mesh.push_quad("a", Vec2::new(10.0, 20.0), Vec2::new(5.0, 6.0), WHITE);
        assert_eq!(mesh.vertices[0].position, [10.0, 20.0]);
        assert_eq!(mesh.vertices[0].tex_coords, [0.0, 0.0]);
        assert_eq!(mesh.vertices[2].position, [15.0, 26.0]);
        assert_eq!(mesh.vertices[2].tex_coords, [1.0, 1.0]);
    }

    #[test]
    fn world_mesh_draws_floor_then_character() {
        let world = world_for("1111");
        let mesh = build_world_mesh(&world, &view(false));
        // 4 columns x 10 rows of bricks plus the character.
        assert_eq!(mesh.quad_count(), 41);
        assert_eq!(mesh.draw_calls.len(), 2);
        assert_eq!(&*mesh.draw_calls[0].texture_key, "brick.png");
        assert_eq!(
            &*mesh.draw_calls[1].texture_key,
            world.character().texture()
        );
    }

    #[test]
    fn off_screen_bricks_are_culled() {
        let world = world_for(&"1".repeat(100));
        let mesh = build_world_mesh(&world, &view(false));
        // Columns starting at 0..=1600 are visible: 33 of them.
        assert_eq!(mesh.quad_count(), 33 * 10 + 1);
    }

    #[test]
    fn gap_overlay_adds_one_quad_per_gap_column() {
        let world = world_for("10011");
        let plain = build_world_mesh(&world, &view(false));
        let with_gaps = build_world_mesh(&world, &view(true));
        assert_eq!(with_gaps.quad_count(), plain.quad_count() + 2);
        let last = with_gaps.draw_calls.last().expect("gap draw call");
        assert_eq!(&*last.texture_key, DEBUG_WHITE);
    }
}
