//! Triangle clipping against an arbitrary simple polygon.
//!
//! The clip outline is ear-clipped into triangles once per region. Each
//! input triangle is then clipped against every piece with
//! Sutherland-Hodgman, and the surviving fans are emitted with UVs
//! interpolated barycentrically from the source triangle.

use super::{Clipper, CLIPPED_STRIDE, CLIPPED_STRIDE_TWO_COLOR};
use crate::skeleton::Color;

/// Default [`Clipper`] implementation.
#[derive(Debug)]
pub struct PolygonClipper {
    clip_slot: Option<usize>,
    end_slot: Option<usize>,
    /// Convex decomposition of the clip outline, counter-clockwise.
    pieces: Vec<[f32; 6]>,
    stride: usize,
    clipped_vertices: Vec<f32>,
    clipped_triangles: Vec<u16>,
    scratch: Vec<f32>,
    scratch_out: Vec<f32>,
}

impl Default for PolygonClipper {
    fn default() -> Self {
        Self::new()
    }
}

impl PolygonClipper {
    /// Creates an idle clipper.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clip_slot: None,
            end_slot: None,
            pieces: Vec::new(),
            stride: CLIPPED_STRIDE,
            clipped_vertices: Vec::new(),
            clipped_triangles: Vec::new(),
            scratch: Vec::with_capacity(32),
            scratch_out: Vec::with_capacity(32),
        }
    }

    /// Number of triangles the clip outline was split into.
    #[must_use]
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }
}

impl Clipper for PolygonClipper {
    fn clip_start(&mut self, slot_index: usize, end_slot: Option<usize>, polygon: &[f32]) {
        if self.clip_slot.is_some() {
            return;
        }
        triangulate(polygon, &mut self.pieces);
        if self.pieces.is_empty() {
            return;
        }
        self.clip_slot = Some(slot_index);
        self.end_slot = end_slot;
    }

    fn clip_triangles(
        &mut self,
        vertices: &[f32],
        triangles: &[u16],
        uvs: &[f32],
        light: Color,
        dark: Color,
        two_color: bool,
    ) {
        let Self {
            pieces,
            stride,
            clipped_vertices,
            clipped_triangles,
            scratch,
            scratch_out,
            ..
        } = self;

        *stride = if two_color { CLIPPED_STRIDE_TWO_COLOR } else { CLIPPED_STRIDE };
        clipped_vertices.clear();
        clipped_triangles.clear();

        'triangles: for triangle in triangles.chunks_exact(3) {
            let (Some([x1, y1, u1, v1]), Some([x2, y2, u2, v2]), Some([x3, y3, u3, v3])) = (
                corner(vertices, uvs, triangle[0]),
                corner(vertices, uvs, triangle[1]),
                corner(vertices, uvs, triangle[2]),
            ) else {
                continue;
            };

            let d0 = y2 - y3;
            let d1 = x3 - x2;
            let d2 = x1 - x3;
            let d4 = y3 - y1;
            let det = d0 * d2 + d1 * (y1 - y3);
            if det == 0.0 {
                continue;
            }
            let inv = 1.0 / det;

            for piece in pieces.iter() {
                scratch.clear();
                scratch.extend_from_slice(&[x1, y1, x2, y2, x3, y3]);
                clip_convex(piece, scratch, scratch_out);

                let count = scratch.len() / 2;
                if count < 3 {
                    continue;
                }

                let base = clipped_vertices.len() / *stride;
                let (Ok(first), Ok(last)) = (u16::try_from(base), u16::try_from(base + count - 1)) else {
                    tracing::warn!(vertices = base, "clipped output exceeds 16-bit indices, truncated");
                    break 'triangles;
                };
                for point in scratch.chunks_exact(2) {
                    let (x, y) = (point[0], point[1]);
                    let c0 = x - x3;
                    let c1 = y - y3;
                    let a = (d0 * c0 + d1 * c1) * inv;
                    let b = (d4 * c0 + d2 * c1) * inv;
                    let c = 1.0 - a - b;

                    clipped_vertices.extend_from_slice(&[
                        x,
                        y,
                        light.r,
                        light.g,
                        light.b,
                        light.a,
                        u1 * a + u2 * b + u3 * c,
                        v1 * a + v2 * b + v3 * c,
                    ]);
                    if two_color {
                        clipped_vertices.extend_from_slice(&[dark.r, dark.g, dark.b, dark.a]);
                    }
                }

                for k in first + 1..last {
                    clipped_triangles.extend_from_slice(&[first, k, k + 1]);
                }
            }
        }
    }

    fn clipped_vertices(&self) -> &[f32] {
        &self.clipped_vertices
    }

    fn clipped_triangles(&self) -> &[u16] {
        &self.clipped_triangles
    }

    fn clipped_vertex_stride(&self) -> usize {
        self.stride
    }

    fn is_clipping(&self) -> bool {
        self.clip_slot.is_some()
    }

    fn clip_end_with_slot(&mut self, slot_index: usize) {
        if self.clip_slot.is_some() && self.end_slot == Some(slot_index) {
            self.clip_end();
        }
    }

    fn clip_end(&mut self) {
        self.clip_slot = None;
        self.end_slot = None;
        self.pieces.clear();
        self.clipped_vertices.clear();
        self.clipped_triangles.clear();
    }
}

/// Position and UV of the vertex at `index`, if both lists reach it.
#[inline]
fn corner(vertices: &[f32], uvs: &[f32], index: u16) -> Option<[f32; 4]> {
    let i = usize::from(index) * 2;
    match (vertices.get(i..i + 2), uvs.get(i..i + 2)) {
        (Some(position), Some(uv)) => Some([position[0], position[1], uv[0], uv[1]]),
        _ => None,
    }
}

fn signed_area(polygon: &[f32]) -> f32 {
    let n = polygon.len() / 2;
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += polygon[i * 2] * polygon[j * 2 + 1] - polygon[j * 2] * polygon[i * 2 + 1];
    }
    area * 0.5
}

#[inline]
fn cross(ox: f32, oy: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    (ax - ox) * (by - oy) - (ay - oy) * (bx - ox)
}

/// Ear-clips a simple polygon into counter-clockwise triangles.
///
/// Degenerate input (fewer than three vertices, zero area) yields nothing.
fn triangulate(polygon: &[f32], out: &mut Vec<[f32; 6]>) {
    out.clear();
    let n = polygon.len() / 2;
    if n < 3 {
        return;
    }
    let area = signed_area(polygon);
    if area == 0.0 {
        return;
    }

    let point = |i: usize| (polygon[i * 2], polygon[i * 2 + 1]);
    let mut ring: Vec<usize> = if area > 0.0 { (0..n).collect() } else { (0..n).rev().collect() };

    while ring.len() > 3 {
        let len = ring.len();
        let ear = (0..len).find(|&i| {
            let (ax, ay) = point(ring[(i + len - 1) % len]);
            let (bx, by) = point(ring[i]);
            let (cx, cy) = point(ring[(i + 1) % len]);
            if cross(ax, ay, bx, by, cx, cy) <= 0.0 {
                return false;
            }
            ring.iter().all(|&other| {
                if other == ring[(i + len - 1) % len] || other == ring[i] || other == ring[(i + 1) % len] {
                    return true;
                }
                let (px, py) = point(other);
                !(cross(ax, ay, bx, by, px, py) >= 0.0
                    && cross(bx, by, cx, cy, px, py) >= 0.0
                    && cross(cx, cy, ax, ay, px, py) >= 0.0)
            })
        });

        // Self-intersecting outlines have no ear left; fan what remains.
        let Some(i) = ear else { break };
        let (ax, ay) = point(ring[(i + len - 1) % len]);
        let (bx, by) = point(ring[i]);
        let (cx, cy) = point(ring[(i + 1) % len]);
        out.push([ax, ay, bx, by, cx, cy]);
        ring.remove(i);
    }

    let (ax, ay) = point(ring[0]);
    for k in 1..ring.len() - 1 {
        let (bx, by) = point(ring[k]);
        let (cx, cy) = point(ring[k + 1]);
        if cross(ax, ay, bx, by, cx, cy) > 0.0 {
            out.push([ax, ay, bx, by, cx, cy]);
        }
    }
}

/// Sutherland-Hodgman: clips `subject` in place against a convex
/// counter-clockwise triangle.
fn clip_convex(piece: &[f32; 6], subject: &mut Vec<f32>, scratch: &mut Vec<f32>) {
    for edge in 0..3 {
        if subject.len() < 6 {
            subject.clear();
            return;
        }
        let (ex0, ey0) = (piece[edge * 2], piece[edge * 2 + 1]);
        let next = (edge + 1) % 3;
        let (ex1, ey1) = (piece[next * 2], piece[next * 2 + 1]);

        scratch.clear();
        let n = subject.len() / 2;
        for i in 0..n {
            let prev = (i + n - 1) % n;
            let (px, py) = (subject[prev * 2], subject[prev * 2 + 1]);
            let (cx, cy) = (subject[i * 2], subject[i * 2 + 1]);
            let side_prev = cross(ex0, ey0, ex1, ey1, px, py);
            let side_cur = cross(ex0, ey0, ex1, ey1, cx, cy);

            if side_cur >= 0.0 {
                if side_prev < 0.0 {
                    let t = side_prev / (side_prev - side_cur);
                    scratch.extend_from_slice(&[px + (cx - px) * t, py + (cy - py) * t]);
                }
                scratch.extend_from_slice(&[cx, cy]);
            } else if side_prev >= 0.0 {
                let t = side_prev / (side_prev - side_cur);
                scratch.extend_from_slice(&[px + (cx - px) * t, py + (cy - py) * t]);
            }
        }
        std::mem::swap(subject, scratch);
    }
}
