//! GPU-facing description of the packed vertex and blend modes.

use bytemuck::{Pod, Zeroable};

use super::VERTEX_STRIDE;
use crate::skeleton::BlendMode;

// =============================================================================
// VERTEX FORMAT
// =============================================================================

/// One packed vertex, as the GPU reads it.
///
/// Layout-compatible with [`VERTEX_STRIDE`] words of a batcher's attribute
/// buffer, so the buffer can be viewed as `&[BatchVertex]` with
/// [`bytemuck::cast_slice`].
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BatchVertex {
    /// World position.
    pub position: [f32; 2],
    /// Texture coordinate.
    pub uv: [f32; 2],
    /// `0xAABBGGRR`, read as normalized bytes.
    pub color: u32,
    /// `(texture_slot << 16) | round_pixels`.
    pub texture_round: u32,
}

const _: () = assert!(std::mem::size_of::<BatchVertex>() == VERTEX_STRIDE * 4);

impl BatchVertex {
    /// Shader attribute locations.
    pub const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2, // uv
        2 => Unorm8x4,  // color
        3 => Uint32,    // texture_round
    ];

    /// Vertex buffer layout descriptor.
    #[must_use]
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }

    /// Texture slot encoded in the vertex.
    #[inline]
    #[must_use]
    pub const fn texture_slot(&self) -> u16 {
        (self.texture_round >> 16) as u16
    }

    /// Round-pixel flag encoded in the vertex.
    #[inline]
    #[must_use]
    pub const fn round_pixels(&self) -> bool {
        self.texture_round & 1 == 1
    }
}

// =============================================================================
// BLENDING
// =============================================================================

impl BlendMode {
    /// Blend state for premultiplied-alpha output.
    #[must_use]
    pub const fn blend_state(self) -> wgpu::BlendState {
        use wgpu::{BlendComponent, BlendFactor, BlendOperation, BlendState};

        let color = match self {
            Self::Normal => BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
                operation: BlendOperation::Add,
            },
            Self::Additive => BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::One,
                operation: BlendOperation::Add,
            },
            Self::Multiply => BlendComponent {
                src_factor: BlendFactor::Dst,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
                operation: BlendOperation::Add,
            },
            Self::Screen => BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::OneMinusSrc,
                operation: BlendOperation::Add,
            },
        };
        BlendState {
            color,
            alpha: BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
                operation: BlendOperation::Add,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_stride() {
        let desc = BatchVertex::desc();
        assert_eq!(desc.array_stride, 24);
        assert_eq!(desc.attributes.len(), 4);
        assert_eq!(desc.attributes[2].offset, 16);
        assert_eq!(desc.attributes[3].offset, 20);
    }

    #[test]
    fn test_words_cast_to_vertices() {
        let words: [u32; 6] = [1.0f32.to_bits(), 2.0f32.to_bits(), 0, 0, 0xFFFF_FFFF, 0x0002_0001];
        let vertices: &[BatchVertex] = bytemuck::cast_slice(&words);
        assert_eq!(vertices[0].position, [1.0, 2.0]);
        assert_eq!(vertices[0].texture_slot(), 2);
        assert!(vertices[0].round_pixels());
    }

    #[test]
    fn test_normal_is_premultiplied_over() {
        assert_eq!(BlendMode::Normal.blend_state(), wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING);
        assert_ne!(BlendMode::Additive.blend_state(), BlendMode::Normal.blend_state());
    }
}
