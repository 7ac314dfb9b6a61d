//! Quadtree used for proximity queries during a frame.
//!
//! The tree is rebuilt from scratch every frame and is read-only afterwards.
//! It stores pool indices rather than particle references so that callers
//! can mutate the particles returned by a query once it has completed.

use glam::Vec2;

/// Points held by a node before it subdivides.
pub const DEFAULT_CAPACITY: usize = 4;
/// Depth at which nodes stop subdividing and simply grow, which bounds the
/// recursion for coincident points.
pub const MAX_DEPTH: usize = 16;

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub position: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn has_area(&self) -> bool {
        self.size.x > 0.0 && self.size.y > 0.0
    }

    /// Half-open containment so that sibling quadrants never share a point.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.position.x
            && point.x < self.position.x + self.size.x
            && point.y >= self.position.y
            && point.y < self.position.y + self.size.y
    }

    /// Smallest rectangle holding `self` and every finite point, grown by
    /// `padding` on each side so that points on the far edges stay inside
    /// the half-open bounds.
    pub fn covering<I>(self, points: I, padding: f32) -> Self
    where
        I: IntoIterator<Item = Vec2>,
    {
        let (min, max) = points
            .into_iter()
            .filter(|point| point.is_finite())
            .fold(
                (self.position, self.position + self.size),
                |(min, max), point| (min.min(point), max.max(point)),
            );
        let padding = Vec2::splat(padding.max(0.0));
        let min = min - padding;
        let max = max + padding;
        Self {
            position: min,
            size: max - min,
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.position.x < other.position.x + other.size.x
            && self.position.x + self.size.x > other.position.x
            && self.position.y < other.position.y + other.size.y
            && self.position.y + self.size.y > other.position.y
    }
}

/// Shape of a query region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Region {
    Circle { center: Vec2, radius: f32 },
    Rect(Rect),
}

impl Region {
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self::Circle { center, radius }
    }

    /// Regions with no area never match anything.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Circle { radius, .. } => !(*radius > 0.0),
            Self::Rect(rect) => !rect.has_area(),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        match self {
            Self::Circle { center, radius } => point.distance_squared(*center) <= radius * radius,
            Self::Rect(rect) => {
                point.x >= rect.position.x
                    && point.x <= rect.position.x + rect.size.x
                    && point.y >= rect.position.y
                    && point.y <= rect.position.y + rect.size.y
            }
        }
    }

    pub fn intersects(&self, bounds: &Rect) -> bool {
        match self {
            Self::Circle { center, radius } => {
                let min = bounds.position;
                let max = bounds.position + bounds.size;
                let nearest = center.clamp(min, max);
                nearest.distance_squared(*center) <= radius * radius
            }
            Self::Rect(rect) => {
                rect.position.x <= bounds.position.x + bounds.size.x
                    && rect.position.x + rect.size.x >= bounds.position.x
                    && rect.position.y <= bounds.position.y + bounds.size.y
                    && rect.position.y + rect.size.y >= bounds.position.y
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    position: Vec2,
    index: usize,
}

#[derive(Debug)]
struct Node {
    bounds: Rect,
    depth: usize,
    entries: Vec<Entry>,
    children: Option<Box<[Node; 4]>>,
}

impl Node {
    fn new(bounds: Rect, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            entries: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, entry: Entry, capacity: usize) -> bool {
        if !self.bounds.contains(entry.position) {
            return false;
        }

        if self.children.is_none() {
            if self.entries.len() < capacity || self.depth >= MAX_DEPTH {
                self.entries.push(entry);
                return true;
            }
            self.subdivide();
        }

        let placed = self
            .children
            .as_mut()
            .is_some_and(|children| children.iter_mut().any(|child| child.insert(entry, capacity)));
        // Rounded child edges can leave a sliver of this node uncovered.
        if !placed {
            self.entries.push(entry);
        }
        true
    }

    fn subdivide(&mut self) {
        let half = self.bounds.size / 2.0;
        let Vec2 { x, y } = self.bounds.position;
        let depth = self.depth + 1;

        self.children = Some(Box::new([
            Node::new(Rect::new(x, y, half.x, half.y), depth),
            Node::new(Rect::new(x + half.x, y, half.x, half.y), depth),
            Node::new(Rect::new(x, y + half.y, half.x, half.y), depth),
            Node::new(Rect::new(x + half.x, y + half.y, half.x, half.y), depth),
        ]));
    }

    fn query<F>(&self, region: &Region, check: &mut F, found: &mut Vec<usize>)
    where
        F: FnMut(usize) -> bool,
    {
        if !region.intersects(&self.bounds) {
            return;
        }

        for entry in &self.entries {
            if region.contains(entry.position) && check(entry.index) {
                found.push(entry.index);
            }
        }

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(region, check, found);
            }
        }
    }
}

/// Region quadtree over particle positions.
#[derive(Debug)]
pub struct QuadTree {
    root: Node,
    capacity: usize,
    len: usize,
}

impl QuadTree {
    pub fn new(bounds: Rect) -> Self {
        Self::with_capacity(bounds, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(bounds: Rect, capacity: usize) -> Self {
        Self {
            root: Node::new(bounds, 0),
            capacity: capacity.max(1),
            len: 0,
        }
    }

    /// Resets the tree and inserts every `(index, position)` pair. Points
    /// outside `bounds` are not indexed; see [`Rect::covering`].
    pub fn build<I>(&mut self, bounds: Rect, points: I)
    where
        I: IntoIterator<Item = (usize, Vec2)>,
    {
        self.root = Node::new(bounds, 0);
        self.len = 0;
        for (index, position) in points {
            self.insert(index, position);
        }
    }

    /// Inserts a point; points outside the root bounds are ignored.
    pub fn insert(&mut self, index: usize, position: Vec2) -> bool {
        if !position.is_finite() {
            return false;
        }
        let inserted = self.root.insert(Entry { position, index }, self.capacity);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bounds(&self) -> Rect {
        self.root.bounds
    }

    /// Every indexed point inside `region` accepted by `check`, in no
    /// particular order.
    pub fn query<F>(&self, region: &Region, mut check: F) -> Vec<usize>
    where
        F: FnMut(usize) -> bool,
    {
        let mut found = Vec::new();
        if region.is_degenerate() || self.is_empty() {
            return found;
        }
        self.root.query(region, &mut check, &mut found);
        found
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn uniform_points(count: usize, size: f32) -> Vec<(usize, Vec2)> {
        let mut rng = StdRng::seed_from_u64(11);
        (0..count)
            .map(|index| {
                let position = Vec2::new(rng.gen_range(0.0..size), rng.gen_range(0.0..size));
                (index, position)
            })
            .collect()
    }

    #[test]
    fn full_bounds_query_returns_each_point_once() {
        let bounds = Rect::new(0.0, 0.0, 500.0, 500.0);
        let points = uniform_points(1_000, 500.0);
        let mut tree = QuadTree::new(bounds);
        tree.build(bounds, points.iter().copied());

        let found = tree.query(&Region::Rect(bounds), |_| true);
        let unique: HashSet<_> = found.iter().copied().collect();

        assert_eq!(found.len(), 1_000);
        assert_eq!(unique.len(), 1_000);
    }

    #[test]
    fn circle_query_matches_brute_force() {
        let bounds = Rect::new(0.0, 0.0, 300.0, 300.0);
        let points = uniform_points(400, 300.0);
        let mut tree = QuadTree::new(bounds);
        tree.build(bounds, points.iter().copied());

        let center = Vec2::new(120.0, 170.0);
        let region = Region::circle(center, 60.0);
        let mut found = tree.query(&region, |_| true);
        found.sort_unstable();

        let mut expected: Vec<usize> = points
            .iter()
            .filter(|(_, p)| p.distance(center) <= 60.0)
            .map(|(i, _)| *i)
            .collect();
        expected.sort_unstable();

        assert_eq!(found, expected);
    }

    #[test]
    fn predicate_filters_results() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut tree = QuadTree::new(bounds);
        tree.build(bounds, uniform_points(50, 100.0));

        let found = tree.query(&Region::Rect(bounds), |index| index % 2 == 0);
        assert_eq!(found.len(), 25);
        assert!(found.iter().all(|index| index % 2 == 0));
    }

    #[test]
    fn zero_radius_query_is_empty() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut tree = QuadTree::new(bounds);
        tree.build(bounds, [(0, Vec2::new(10.0, 10.0))]);

        assert!(tree
            .query(&Region::circle(Vec2::new(40.0, 40.0), 0.0), |_| true)
            .is_empty());
        assert!(tree
            .query(&Region::circle(Vec2::new(10.0, 10.0), -5.0), |_| true)
            .is_empty());
        assert!(tree
            .query(&Region::Rect(Rect::new(0.0, 0.0, 0.0, 10.0)), |_| true)
            .is_empty());
    }

    #[test]
    fn empty_tree_returns_nothing() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let tree = QuadTree::new(bounds);
        assert!(tree.query(&Region::Rect(bounds), |_| true).is_empty());
    }

    #[test]
    fn coincident_points_do_not_recurse_forever() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut tree = QuadTree::new(bounds);
        tree.build(bounds, (0..500).map(|i| (i, Vec2::new(42.0, 42.0))));

        assert_eq!(tree.len(), 500);
        let found = tree.query(&Region::circle(Vec2::new(42.0, 42.0), 1.0), |_| true);
        assert_eq!(found.len(), 500);
    }

    #[test]
    fn ignores_points_outside_bounds() {
        let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
        let mut tree = QuadTree::new(bounds);
        tree.build(
            bounds,
            [(0, Vec2::new(5.0, 5.0)), (1, Vec2::new(50.0, 5.0)), (2, Vec2::NAN)],
        );
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn keeps_points_on_rounded_child_edges() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let bounds = Rect::new(
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
                rng.gen_range(0.1..300.0),
                rng.gen_range(0.1..300.0),
            );
            let right = bounds.position.x + bounds.size.x;
            let bottom = bounds.position.y + bounds.size.y;
            let points: Vec<(usize, Vec2)> = (0..64)
                .map(|index| {
                    let mut x = right;
                    let mut y = bottom;
                    for _ in 0..1 + index % 3 {
                        x = next_down(x);
                        y = next_down(y);
                    }
                    let t = index as f32 / 64.0;
                    let point = match index % 2 {
                        0 => Vec2::new(x, bounds.position.y + bounds.size.y * t),
                        _ => Vec2::new(bounds.position.x + bounds.size.x * t, y),
                    };
                    (index, point)
                })
                .filter(|(_, point)| bounds.contains(*point))
                .collect();

            let mut tree = QuadTree::new(bounds);
            tree.build(bounds, points.iter().copied());

            assert_eq!(tree.len(), points.len());
            let found = tree.query(&Region::Rect(bounds), |_| true);
            let unique: HashSet<_> = found.iter().copied().collect();
            assert_eq!(found.len(), points.len());
            assert_eq!(unique.len(), points.len());
        }
    }

    #[test]
    fn covering_grows_around_outliers() {
        let canvas = Rect::new(0.0, 0.0, 100.0, 50.0);
        let bounds = canvas.covering(
            [Vec2::new(-30.0, 10.0), Vec2::new(140.0, 60.0), Vec2::NAN],
            1.0,
        );

        assert_eq!(bounds, Rect::new(-31.0, -1.0, 172.0, 62.0));
        assert!(bounds.contains(Vec2::new(140.0, 60.0)));
        assert_eq!(canvas.covering([], 0.0), canvas);
    }

    fn next_down(value: f32) -> f32 {
        let bits = value.to_bits();
        let bits = if value > 0.0 {
            bits - 1
        } else if value < 0.0 {
            bits + 1
        } else {
            (-f32::MIN_POSITIVE).to_bits()
        };
        f32::from_bits(bits)
    }
}
