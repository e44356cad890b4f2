use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Fixed screen-space camera: origin at the top-left, y grows downward, one
/// unit per logical pixel. The world scrolls underneath; this never moves.
pub struct Camera2D {
    pub logical_size: Vec2,
}

impl Camera2D {
    pub fn new(logical_width: u32, logical_height: u32) -> Self {
        Self {
            logical_size: Vec2::new(logical_width as f32, logical_height as f32),
        }
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let proj = Mat4::orthographic_rh(
            0.0,
            self.logical_size.x,
            self.logical_size.y,
            0.0,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn project(camera: &Camera2D, x: f32, y: f32) -> Vec4 {
        let m = Mat4::from_cols_array_2d(&camera.build_uniform().view_proj);
        m * Vec4::new(x, y, 0.0, 1.0)
    }

    #[test]
    fn top_left_maps_to_clip_top_left() {
        let camera = Camera2D::new(1600, 900);
        let p = project(&camera, 0.0, 0.0);
        assert!((p.x + 1.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn bottom_right_maps_to_clip_bottom_right() {
        let camera = Camera2D::new(1600, 900);
        let p = project(&camera, 1600.0, 900.0);
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y + 1.0).abs() < 1e-5);
    }
}
