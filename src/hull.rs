//! Convex-hull edge analysis of optimized configurations.
//!
//! A near-optimal Thomson configuration implies a polyhedron: the
//! convex hull of the points. Grouping its edges by approximate length
//! exposes the symmetry classes of that polyhedron (all 6 tetrahedron
//! edges in one class, cube edges separate from face diagonals, ...).
//!
//! Everything here is derived data, recomputed fresh on every request.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::constants::{EDGE_GROUP_TOLERANCE, EDGE_KEY_SCALE, HULL_EPSILON};
use crate::geometry::Vec3;

/// One logical hull edge: an endpoint pair plus its Euclidean length.
#[derive(Clone, Debug, Serialize)]
pub struct Edge {
    pub a: Vec3,
    pub b: Vec3,
    pub length: f64,
}

/// A cluster of hull edges of approximately equal length.
///
/// The representative length is the length of the first edge assigned
/// to the group; membership is within `EDGE_GROUP_TOLERANCE` of it.
#[derive(Clone, Debug, Serialize)]
pub struct EdgeGroup {
    pub representative_length: f64,
    pub edges: Vec<Edge>,
}

/// Quantized fixed-point key for an edge length, for visibility maps
/// keyed by length class. Avoids string formatting as a correctness
/// mechanism.
pub fn visibility_key(length: f64) -> i64 {
    (length * EDGE_KEY_SCALE).round() as i64
}

/// Group the hull edges of a point set by approximate length.
///
/// Returns an empty list for fewer than 4 points (no 3D hull) or for
/// degenerate geometry. Raw edges are sorted by length before the
/// greedy first-fit grouping, so the result is deterministic under
/// reordering of hull triangle discovery.
pub fn edge_groups(points: &[Vec3]) -> Vec<EdgeGroup> {
    let mut edges = hull_edges(points);
    edges.sort_by(|a, b| a.length.total_cmp(&b.length));

    let mut groups: Vec<EdgeGroup> = Vec::new();
    for edge in edges {
        match groups
            .iter_mut()
            .find(|g| (g.representative_length - edge.length).abs() < EDGE_GROUP_TOLERANCE)
        {
            Some(group) => group.edges.push(edge),
            None => groups.push(EdgeGroup {
                representative_length: edge.length,
                edges: vec![edge],
            }),
        }
    }

    groups.sort_by(|a, b| a.representative_length.total_cmp(&b.representative_length));
    groups
}

/// Unique edges of the triangulated hull.
///
/// Every geometric edge is produced by two adjacent triangles with
/// independent floating-point noise, so deduplication uses a canonical
/// key built from endpoint coordinates rounded to 4 decimal places.
pub fn hull_edges(points: &[Vec3]) -> Vec<Edge> {
    let faces = convex_hull(points);
    let mut seen: HashSet<([i64; 3], [i64; 3])> = HashSet::new();
    let mut edges = Vec::new();

    for face in &faces {
        for (i, j) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
            let (a, b) = (points[i], points[j]);
            let (ka, kb) = (quantize(&a), quantize(&b));
            let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
            if seen.insert(key) {
                edges.push(Edge {
                    a,
                    b,
                    length: (a - b).norm(),
                });
            }
        }
    }

    edges
}

fn quantize(p: &Vec3) -> [i64; 3] {
    [
        (p.x * EDGE_KEY_SCALE).round() as i64,
        (p.y * EDGE_KEY_SCALE).round() as i64,
        (p.z * EDGE_KEY_SCALE).round() as i64,
    ]
}

/// Triangulated 3D convex hull, as index triples into `points`.
///
/// Incremental beneath-beyond construction: seed a non-degenerate
/// tetrahedron, then for each remaining point delete the faces it can
/// see and fan new faces from the horizon edges. Faces are kept
/// oriented outward relative to the seed tetrahedron's centroid, which
/// stays strictly interior as the hull only grows.
///
/// Returns an empty vector for fewer than 4 points or fully degenerate
/// (coplanar/collinear) input.
pub fn convex_hull(points: &[Vec3]) -> Vec<[usize; 3]> {
    if points.len() < 4 {
        return Vec::new();
    }
    let Some([i0, i1, i2, i3]) = seed_tetrahedron(points) else {
        return Vec::new();
    };
    let interior = (points[i0] + points[i1] + points[i2] + points[i3]) / 4.0;

    let mut faces: Vec<[usize; 3]> = Vec::new();
    for face in [[i0, i1, i2], [i0, i1, i3], [i0, i2, i3], [i1, i2, i3]] {
        if let Some(oriented) = orient_outward(face, points, &interior) {
            faces.push(oriented);
        }
    }

    for p in 0..points.len() {
        if p == i0 || p == i1 || p == i2 || p == i3 {
            continue;
        }
        insert_point(&mut faces, points, p, &interior);
    }

    faces
}

/// Signed distance from `q` to the face plane, along the unit outward
/// normal. `None` for degenerate (near-zero area) faces.
fn plane_distance(face: &[usize; 3], points: &[Vec3], q: &Vec3) -> Option<f64> {
    let p0 = points[face[0]];
    let normal = (points[face[1]] - p0).cross(&(points[face[2]] - p0));
    let norm = normal.norm();
    if norm < HULL_EPSILON {
        return None;
    }
    Some(normal.dot(&(q - p0)) / norm)
}

/// Flip the face winding if its normal points toward the interior.
fn orient_outward(face: [usize; 3], points: &[Vec3], interior: &Vec3) -> Option<[usize; 3]> {
    let dist = plane_distance(&face, points, interior)?;
    if dist > 0.0 {
        Some([face[0], face[2], face[1]])
    } else {
        Some(face)
    }
}

fn insert_point(faces: &mut Vec<[usize; 3]>, points: &[Vec3], p: usize, interior: &Vec3) {
    let pt = points[p];

    let visible: Vec<usize> = faces
        .iter()
        .enumerate()
        .filter(|(_, face)| {
            plane_distance(face, points, &pt).is_some_and(|d| d > HULL_EPSILON)
        })
        .map(|(idx, _)| idx)
        .collect();

    if visible.is_empty() {
        // Point is inside or on the current hull.
        return;
    }

    // Horizon edges: undirected edges used by exactly one visible face.
    let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();
    for &fi in &visible {
        for edge in face_edges(&faces[fi]) {
            *edge_count.entry(canonical(edge)).or_insert(0) += 1;
        }
    }
    let mut horizon: Vec<(usize, usize)> = Vec::new();
    for &fi in &visible {
        for edge in face_edges(&faces[fi]) {
            if edge_count[&canonical(edge)] == 1 {
                horizon.push(edge);
            }
        }
    }

    // Remove the visible faces, then fan new faces from the horizon.
    let visible_set: HashSet<usize> = visible.into_iter().collect();
    let mut idx = 0;
    faces.retain(|_| {
        let keep = !visible_set.contains(&idx);
        idx += 1;
        keep
    });

    for (a, b) in horizon {
        if let Some(face) = orient_outward([a, b, p], points, interior) {
            faces.push(face);
        }
    }
}

fn face_edges(face: &[usize; 3]) -> [(usize, usize); 3] {
    [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])]
}

fn canonical((a, b): (usize, usize)) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Pick four non-coplanar points to start the hull from.
fn seed_tetrahedron(points: &[Vec3]) -> Option<[usize; 4]> {
    // Most extreme point along x, then the farthest point from it.
    let i0 = (0..points.len()).min_by(|&a, &b| points[a].x.total_cmp(&points[b].x))?;
    let i1 = (0..points.len())
        .filter(|&i| i != i0)
        .max_by(|&a, &b| {
            (points[a] - points[i0])
                .norm()
                .total_cmp(&(points[b] - points[i0]).norm())
        })?;
    if (points[i1] - points[i0]).norm() < HULL_EPSILON {
        return None;
    }

    // Widest triangle over the first edge.
    let base = points[i1] - points[i0];
    let i2 = (0..points.len())
        .filter(|&i| i != i0 && i != i1)
        .max_by(|&a, &b| {
            base.cross(&(points[a] - points[i0]))
                .norm()
                .total_cmp(&base.cross(&(points[b] - points[i0])).norm())
        })?;
    let normal = base.cross(&(points[i2] - points[i0]));
    if normal.norm() < HULL_EPSILON {
        return None;
    }

    // Farthest point from the triangle plane.
    let i3 = (0..points.len())
        .filter(|&i| i != i0 && i != i1 && i != i2)
        .max_by(|&a, &b| {
            normal
                .dot(&(points[a] - points[i0]))
                .abs()
                .total_cmp(&normal.dot(&(points[b] - points[i0])).abs())
        })?;
    if normal.dot(&(points[i3] - points[i0])).abs() / normal.norm() < HULL_EPSILON {
        return None;
    }

    Some([i0, i1, i2, i3])
}

/// Multi-line edge-group report for driver output.
pub fn format_edge_report(groups: &[EdgeGroup]) -> String {
    let mut report = String::new();
    let total: usize = groups.iter().map(|g| g.edges.len()).sum();
    report.push_str(&format!(
        "{} edge group(s), {} edges total\n",
        groups.len(),
        total
    ));
    for (i, group) in groups.iter().enumerate() {
        report.push_str(&format!(
            "  group {:2}: {:3} edges, length {:.4}\n",
            i + 1,
            group.edges.len(),
            group.representative_length
        ));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> Vec<Vec3> {
        [
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
        ]
        .iter()
        .map(|v| v.normalize())
        .collect()
    }

    fn octahedron() -> Vec<Vec3> {
        vec![
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
        ]
    }

    fn cube() -> Vec<Vec3> {
        let mut corners = Vec::new();
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    corners.push(Vec3::new(x, y, z).normalize());
                }
            }
        }
        corners
    }

    #[test]
    fn test_too_few_points_yield_empty() {
        assert!(edge_groups(&[]).is_empty());
        assert!(edge_groups(&octahedron()[..3]).is_empty());
    }

    #[test]
    fn test_degenerate_coplanar_points_yield_empty() {
        let flat = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        assert!(edge_groups(&flat).is_empty());
    }

    #[test]
    fn test_tetrahedron_hull() {
        let points = tetrahedron();
        let faces = convex_hull(&points);
        assert_eq!(faces.len(), 4);

        let groups = edge_groups(&points);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].edges.len(), 6);
        let expected = (8.0f64 / 3.0).sqrt();
        assert!((groups[0].representative_length - expected).abs() < 1e-6);
    }

    #[test]
    fn test_octahedron_hull() {
        let points = octahedron();
        let faces = convex_hull(&points);
        assert_eq!(faces.len(), 8);

        let groups = edge_groups(&points);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].edges.len(), 12);
        assert!((groups[0].representative_length - 2.0f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_cube_has_two_edge_classes() {
        // Triangulating the 6 square faces adds one diagonal per face:
        // 12 cube edges plus 6 diagonals, two well-separated lengths.
        let points = cube();
        let groups = edge_groups(&points);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].edges.len(), 12);
        assert_eq!(groups[1].edges.len(), 6);
        let edge = 2.0 / 3.0f64.sqrt();
        assert!((groups[0].representative_length - edge).abs() < 1e-6);
        assert!((groups[1].representative_length - edge * 2.0f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_edge_groups_idempotent() {
        let points = cube();
        let first = edge_groups(&points);
        let second = edge_groups(&points);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.edges.len(), b.edges.len());
            assert!((a.representative_length - b.representative_length).abs() < 1e-12);
        }
    }

    #[test]
    fn test_faces_are_oriented_outward() {
        let points = octahedron();
        let interior = Vec3::zeros();
        for face in convex_hull(&points) {
            let dist = plane_distance(&face, &points, &interior).unwrap();
            assert!(dist < 0.0, "interior on positive side of {face:?}");
        }
    }

    #[test]
    fn test_visibility_key_quantizes() {
        assert_eq!(visibility_key(1.15470), visibility_key(1.154703));
        assert_ne!(visibility_key(1.1547), visibility_key(1.1549));
    }
}
