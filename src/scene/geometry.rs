use glam::{Mat4, Vec3};

/// Triangle geometry kept CPU-side. Backends upload it on demand;
/// `dispose` releases the buffers and the disposed state is observable so
/// teardown can be verified.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    disposed: bool,
}

impl Geometry {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            disposed: false,
        }
    }

    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        Self::new(positions, Vec::new())
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release the vertex and index buffers. The geometry stays in whatever
    /// node holds it but renders as nothing from here on.
    pub fn dispose(&mut self) {
        self.positions = Vec::new();
        self.indices = Vec::new();
        self.disposed = true;
    }

    pub fn aabb(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Aabb {
            min: first,
            max: first,
        };
        for point in iter {
            bounds.min = bounds.min.min(point);
            bounds.max = bounds.max.max(point);
        }
        Some(bounds)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Bounding box of this box's corners mapped through `matrix`.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = self.corners().map(|corner| matrix.transform_point3(corner));
        // A box always has corners, so the unwrap-free fallback never fires.
        Aabb::from_points(corners).unwrap_or(*self)
    }

    /// Sphere enclosing the box: its center and half-diagonal radius.
    pub fn bounding_sphere(&self) -> (Vec3, f32) {
        (self.center(), self.size().length() * 0.5)
    }
}

// ── Procedural line geometry for helper visuals ──────────────────────────

/// The 12 edges of `bounds` as segment pairs (24 points).
pub fn box_edges(bounds: &Aabb) -> Vec<Vec3> {
    let mut points = Vec::with_capacity(24);
    box_edges_into(bounds, &mut points);
    points
}

/// In-place variant of [`box_edges`] so a tracked box can be refreshed each
/// frame without reallocating.
pub fn box_edges_into(bounds: &Aabb, points: &mut Vec<Vec3>) {
    const EDGES: [(usize, usize); 12] = [
        (0, 1),
        (1, 3),
        (3, 2),
        (2, 0),
        (4, 5),
        (5, 7),
        (7, 6),
        (6, 4),
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ];
    let corners = bounds.corners();
    points.clear();
    for (a, b) in EDGES {
        points.push(corners[a]);
        points.push(corners[b]);
    }
}

/// Three great circles (xy, xz, yz planes) around the origin as segment
/// pairs.
pub fn wire_sphere(radius: f32, segments: u32) -> Vec<Vec3> {
    let segments = segments.max(3);
    let mut points = Vec::with_capacity(segments as usize * 6);
    let ring = |f: &dyn Fn(f32, f32) -> Vec3, points: &mut Vec<Vec3>| {
        for i in 0..segments {
            let a0 = i as f32 / segments as f32 * std::f32::consts::TAU;
            let a1 = (i + 1) as f32 / segments as f32 * std::f32::consts::TAU;
            points.push(f(a0.cos() * radius, a0.sin() * radius));
            points.push(f(a1.cos() * radius, a1.sin() * radius));
        }
    };
    ring(&|u, v| Vec3::new(u, v, 0.0), &mut points);
    ring(&|u, v| Vec3::new(u, 0.0, v), &mut points);
    ring(&|u, v| Vec3::new(0.0, u, v), &mut points);
    points
}

/// Shaft plus a four-line head, pointing along `direction` from the origin.
pub fn arrow_lines(direction: Vec3, length: f32, head_length: f32, head_width: f32) -> Vec<Vec3> {
    let dir = direction.normalize_or_zero();
    let tip = dir * length;
    let base = dir * (length - head_length);
    // Any vector not parallel to dir works as a side reference.
    let reference = if dir.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let side = dir.cross(reference).normalize_or_zero() * (head_width * 0.5);
    let side2 = dir.cross(side).normalize_or_zero() * (head_width * 0.5);
    vec![
        Vec3::ZERO,
        tip,
        tip,
        base + side,
        tip,
        base - side,
        tip,
        base + side2,
        tip,
        base - side2,
    ]
}

/// Ground grid in the xz plane. Returns the two center lines separately so
/// they can carry a brighter color, the way the reference stage draws them.
pub fn grid_lines(size: f32, divisions: u32) -> (Vec<Vec3>, Vec<Vec3>) {
    let divisions = divisions.max(1);
    let half = size * 0.5;
    let step = size / divisions as f32;
    let mut center = Vec::with_capacity(4);
    let mut rest = Vec::with_capacity(divisions as usize * 4);
    for i in 0..=divisions {
        let offset = -half + i as f32 * step;
        let target = if i * 2 == divisions {
            &mut center
        } else {
            &mut rest
        };
        target.push(Vec3::new(offset, 0.0, -half));
        target.push(Vec3::new(offset, 0.0, half));
        target.push(Vec3::new(-half, 0.0, offset));
        target.push(Vec3::new(half, 0.0, offset));
    }
    (center, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_from_points_tracks_extremes() {
        let bounds = Aabb::from_points([
            Vec3::new(1.0, -2.0, 3.0),
            Vec3::new(-1.0, 5.0, 0.0),
            Vec3::new(0.5, 0.0, -4.0),
        ])
        .unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, -4.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 5.0, 3.0));
        assert_eq!(bounds.center(), Vec3::new(0.0, 1.5, -0.5));
    }

    #[test]
    fn aabb_transformed_covers_scaled_corners() {
        let bounds = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let scaled = bounds.transformed(&Mat4::from_scale(Vec3::splat(2.0)));
        assert_eq!(scaled.min, Vec3::splat(-2.0));
        assert_eq!(scaled.max, Vec3::splat(2.0));
    }

    #[test]
    fn dispose_releases_buffers() {
        let mut geometry = Geometry::new(vec![Vec3::ZERO, Vec3::ONE], vec![0, 1, 0]);
        geometry.dispose();
        assert!(geometry.is_disposed());
        assert!(geometry.positions().is_empty());
        assert!(geometry.indices().is_empty());
        assert!(geometry.aabb().is_none());
    }

    #[test]
    fn box_edges_emit_twelve_segments() {
        let bounds = Aabb {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        };
        assert_eq!(box_edges(&bounds).len(), 24);
    }

    #[test]
    fn grid_separates_center_lines() {
        let (center, rest) = grid_lines(10.0, 20);
        assert_eq!(center.len(), 4);
        assert_eq!(rest.len(), 20 * 4);
    }
}
