/// Two triangles over the corners emitted by [`SpriteVertex::quad`].
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// One corner of a screen-space sprite quad. `color` multiplies the texel, so
/// white draws the texture unchanged and a translucent tint over a white
/// texel draws a flat overlay.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

impl SpriteVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Corners of an axis-aligned rectangle with a y-down top-left origin,
    /// clockwise from the top-left. The whole texture is mapped once.
    pub fn quad(top_left: [f32; 2], size: [f32; 2], color: [f32; 4]) -> [SpriteVertex; 4] {
        let [x0, y0] = top_left;
        let (x1, y1) = (x0 + size[0], y0 + size[1]);
        [
            ([x0, y0], [0.0, 0.0]),
            ([x1, y0], [1.0, 0.0]),
            ([x1, y1], [1.0, 1.0]),
            ([x0, y1], [0.0, 1.0]),
        ]
        .map(|(position, tex_coords)| SpriteVertex {
            position,
            tex_coords,
            color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_spans_the_rectangle() {
        let corners = SpriteVertex::quad([10.0, 20.0], [5.0, 6.0], [1.0; 4]);
        assert_eq!(corners[0].position, [10.0, 20.0]);
        assert_eq!(corners[2].position, [15.0, 26.0]);
        assert_eq!(corners[3].tex_coords, [0.0, 1.0]);
    }

    #[test]
    fn attributes_are_tightly_packed() {
        let layout = SpriteVertex::layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes[1].offset, 8);
        assert_eq!(layout.attributes[2].offset, 16);
    }
}
