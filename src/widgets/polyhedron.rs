//! Isometric polyhedron diagrams.
//!
//! Depth is a fixed shear, not a camera model: each back vertex is the
//! corresponding front vertex displaced by `depth * (SHEAR_X, -SHEAR_Y)`.
//!
//! # Vertex indexing schemes
//!
//! Indices are a pure function of the shape type and are part of the public
//! contract — diagonals and labels reference vertices by these numbers,
//! independent of input array order.
//!
//! - `rectangularPrism` (8): front face 0 bottom-left, 1 bottom-right,
//!   2 top-right, 3 top-left; back face 4–7 in the same rotational order
//!   (4 behind 0, 5 behind 1, 6 behind 2, 7 behind 3).
//! - `triangularPrism` (6): front triangle 0 bottom-left, 1 bottom-right,
//!   2 apex; back triangle 3–5 in the same order.
//! - `rectangularPyramid` (5): base 0 front-left, 1 front-right,
//!   2 back-right, 3 back-left; 4 apex.
//! - `triangularPyramid` (4): base 0 front-left, 1 front-right, 2 back;
//!   3 apex.

use crate::error::{GeometryError, GeometryErrorDetail};
use crate::layout::LayoutExtent;
use crate::svg::SvgBuilder;
use crate::widget::{PolyhedronWidget, SolidShape};

/// Pixels per dimension unit.
const SCALE: f64 = 14.0;
/// Back-face displacement per depth pixel.
const SHEAR_X: f64 = 0.5;
const SHEAR_Y: f64 = 0.35;
/// Fixed padding around the content extent.
const PAD: f64 = 18.0;
/// Perpendicular offset of a diagonal label from its segment midpoint.
const DIAGONAL_LABEL_OFFSET: f64 = 10.0;
/// Distance of a vertex label from its vertex, away from the centroid.
const VERTEX_LABEL_OFFSET: f64 = 11.0;

const EDGE_COLOR: &str = "#333333";
const DIAGONAL_COLOR: &str = "#c0392b";
const SHADE_FILL: &str = "#b8d4ee";
const FONT_SIZE: f64 = 12.0;

/// Number of vertices in the shape's indexing scheme.
pub fn vertex_count(shape: SolidShape) -> usize {
    match shape {
        SolidShape::RectangularPrism => 8,
        SolidShape::TriangularPrism => 6,
        SolidShape::RectangularPyramid => 5,
        SolidShape::TriangularPyramid => 4,
    }
}

struct Geometry {
    vertices: Vec<(f64, f64)>,
    faces: Vec<Vec<usize>>,
    visible_edges: Vec<(usize, usize)>,
    hidden_edges: Vec<(usize, usize)>,
}

fn build_geometry(widget: &PolyhedronWidget) -> Result<Geometry, GeometryErrorDetail> {
    let dims = widget.dimensions;
    for (name, value) in [
        ("length", dims.length),
        ("width", dims.width),
        ("height", dims.height),
    ] {
        if !(value > 0.0) {
            return Err(GeometryErrorDetail::NonPositiveDimension { name, value });
        }
    }

    let l = dims.length * SCALE;
    let h = dims.height * SCALE;
    let d = dims.width * SCALE;
    let dx = d * SHEAR_X;
    let dy = d * SHEAR_Y;

    let geometry = match widget.shape {
        SolidShape::RectangularPrism => {
            let front = [(0.0, dy + h), (l, dy + h), (l, dy), (0.0, dy)];
            let mut vertices: Vec<(f64, f64)> = front.to_vec();
            vertices.extend(front.iter().map(|&(x, y)| (x + dx, y - dy)));
            Geometry {
                vertices,
                faces: vec![
                    vec![0, 1, 2, 3], // front
                    vec![4, 5, 6, 7], // back
                    vec![3, 2, 6, 7], // top
                    vec![0, 1, 5, 4], // bottom
                    vec![0, 3, 7, 4], // left
                    vec![1, 2, 6, 5], // right
                ],
                visible_edges: vec![
                    (0, 1),
                    (1, 2),
                    (2, 3),
                    (3, 0),
                    (5, 6),
                    (6, 7),
                    (1, 5),
                    (2, 6),
                    (3, 7),
                ],
                hidden_edges: vec![(4, 5), (7, 4), (0, 4)],
            }
        }
        SolidShape::TriangularPrism => {
            let front = [(0.0, dy + h), (l, dy + h), (l / 2.0, dy)];
            let mut vertices: Vec<(f64, f64)> = front.to_vec();
            vertices.extend(front.iter().map(|&(x, y)| (x + dx, y - dy)));
            Geometry {
                vertices,
                faces: vec![
                    vec![0, 1, 2],    // front
                    vec![3, 4, 5],    // back
                    vec![0, 1, 4, 3], // bottom
                    vec![0, 2, 5, 3], // left slant
                    vec![1, 2, 5, 4], // right slant
                ],
                visible_edges: vec![(0, 1), (1, 2), (2, 0), (4, 5), (1, 4), (2, 5)],
                hidden_edges: vec![(3, 4), (5, 3), (0, 3)],
            }
        }
        SolidShape::RectangularPyramid => {
            let base_y = h + dy;
            let vertices = vec![
                (0.0, base_y),
                (l, base_y),
                (l + dx, base_y - dy),
                (dx, base_y - dy),
                (l / 2.0 + dx / 2.0, base_y - dy / 2.0 - h),
            ];
            Geometry {
                vertices,
                faces: vec![
                    vec![0, 1, 2, 3], // base
                    vec![0, 1, 4],    // front
                    vec![1, 2, 4],    // right
                    vec![2, 3, 4],    // back
                    vec![3, 0, 4],    // left
                ],
                visible_edges: vec![(0, 1), (1, 2), (0, 4), (1, 4), (2, 4)],
                hidden_edges: vec![(2, 3), (3, 0), (3, 4)],
            }
        }
        SolidShape::TriangularPyramid => {
            let base_y = h + dy;
            let back = (l / 2.0 + dx, base_y - dy);
            let apex_x = (0.0 + l + back.0) / 3.0;
            let apex_base_y = (base_y + base_y + back.1) / 3.0;
            let vertices = vec![
                (0.0, base_y),
                (l, base_y),
                back,
                (apex_x, apex_base_y - h),
            ];
            Geometry {
                vertices,
                faces: vec![
                    vec![0, 1, 2], // base
                    vec![0, 1, 3], // front
                    vec![1, 2, 3], // right
                    vec![2, 0, 3], // left
                ],
                visible_edges: vec![(0, 1), (0, 3), (1, 3), (2, 3)],
                hidden_edges: vec![(1, 2), (2, 0)],
            }
        }
    };
    Ok(geometry)
}

pub fn render(
    widget: &PolyhedronWidget,
    slot: &str,
    precision: usize,
) -> Result<String, GeometryError> {
    let fail = |detail| GeometryError {
        widget: slot.to_string(),
        detail,
    };

    let geometry = build_geometry(widget).map_err(fail)?;
    let n = geometry.vertices.len();

    for label in &widget.labels {
        if label.vertex >= n {
            return Err(fail(GeometryErrorDetail::VertexIndexOutOfRange {
                index: label.vertex,
                vertex_count: n,
            }));
        }
    }
    for diagonal in &widget.diagonals {
        for index in [diagonal.from, diagonal.to] {
            if index >= n {
                return Err(fail(GeometryErrorDetail::VertexIndexOutOfRange {
                    index,
                    vertex_count: n,
                }));
            }
        }
    }
    if let Some(face) = widget.shaded_face {
        if face >= geometry.faces.len() {
            return Err(fail(GeometryErrorDetail::FaceIndexOutOfRange {
                index: face,
                face_count: geometry.faces.len(),
            }));
        }
    }

    let mut ext = LayoutExtent::empty();
    for &(x, y) in &geometry.vertices {
        ext = ext.include(x, y);
    }

    let centroid = {
        let (sx, sy) = geometry
            .vertices
            .iter()
            .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
        (sx / n as f64, sy / n as f64)
    };

    let mut svg = SvgBuilder::new(precision);

    // Shaded face under everything else.
    if let Some(face) = widget.shaded_face {
        let points: Vec<(f64, f64)> = geometry.faces[face]
            .iter()
            .map(|&i| geometry.vertices[i])
            .collect();
        svg.polygon(&points, SHADE_FILL, None);
    }

    if widget.show_hidden_edges {
        for &(a, b) in &geometry.hidden_edges {
            let (x1, y1) = geometry.vertices[a];
            let (x2, y2) = geometry.vertices[b];
            svg.dashed_line(x1, y1, x2, y2, EDGE_COLOR, 1.5);
        }
    }
    for &(a, b) in &geometry.visible_edges {
        let (x1, y1) = geometry.vertices[a];
        let (x2, y2) = geometry.vertices[b];
        svg.line(x1, y1, x2, y2, EDGE_COLOR, 1.5);
    }

    for diagonal in &widget.diagonals {
        let (x1, y1) = geometry.vertices[diagonal.from];
        let (x2, y2) = geometry.vertices[diagonal.to];
        svg.dashed_line(x1, y1, x2, y2, DIAGONAL_COLOR, 1.5);

        if let Some(label) = &diagonal.label {
            let mx = (x1 + x2) / 2.0;
            let my = (y1 + y2) / 2.0;
            let len = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();
            // Perpendicular offset; horizontal fallback for a zero-length
            // segment keeps the label finite.
            let (px, py) = if len > 0.0 {
                (-(y2 - y1) / len, (x2 - x1) / len)
            } else {
                (1.0, 0.0)
            };
            let lx = mx + px * DIAGONAL_LABEL_OFFSET;
            let ly = my + py * DIAGONAL_LABEL_OFFSET;
            svg.text_with_halo(lx, ly, label, FONT_SIZE, "middle");
            ext = ext.include_text(lx, ly, label, FONT_SIZE, "middle");
        }
    }

    for label in &widget.labels {
        let (vx, vy) = geometry.vertices[label.vertex];
        let dx = vx - centroid.0;
        let dy = vy - centroid.1;
        let len = (dx * dx + dy * dy).sqrt();
        let (ox, oy) = if len > 0.0 {
            (dx / len, dy / len)
        } else {
            (0.0, -1.0)
        };
        let lx = vx + ox * VERTEX_LABEL_OFFSET;
        let ly = vy + oy * VERTEX_LABEL_OFFSET + FONT_SIZE * 0.35;
        svg.text_with_halo(lx, ly, &label.text, FONT_SIZE, "middle");
        ext = ext.include_text(lx, ly, &label.text, FONT_SIZE, "middle");
    }

    let ext = ext.padded(PAD);
    Ok(svg.finish(ext.min_x, ext.min_y, ext.width(), ext.height()))
}
