//! Cross-check the Delaunay walk against a KD-tree

use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use voronoi_stipple::*;

fn kd_tree(points: &[f64]) -> ImmutableKdTree<f64, usize, 2, 32> {
    let entries: Vec<[f64; 2]> = points.chunks_exact(2).map(|p| [p[0], p[1]]).collect();
    ImmutableKdTree::new_from_slice(&entries)
}

fn distance_squared(points: &[f64], i: usize, x: f64, y: f64) -> f64 {
    (points[2 * i] - x).powi(2) + (points[2 * i + 1] - y).powi(2)
}

#[test]
fn walk_agrees_with_kd_tree() {
    let mut rng = ChaCha8Rng::seed_from_u64(31);
    for &count in &[3usize, 10, 100, 1000] {
        let points: Vec<f64> = (0..count * 2).map(|_| rng.gen_range(0.0..256.0)).collect();
        let bounds = Bounds::new(0.0, 0.0, 256.0, 256.0).unwrap();
        let locator = NearestSiteLocator::build(points, bounds).unwrap();
        let tree = kd_tree(locator.points());

        let mut hint = 0;
        for _ in 0..1000 {
            let x = rng.gen_range(-64.0..320.0);
            let y = rng.gen_range(-64.0..320.0);
            let found = locator.find(x, y, hint).unwrap();
            let expected = tree.nearest_one::<SquaredEuclidean>(&[x, y]);

            let d = distance_squared(locator.points(), found, x, y);
            assert!(
                (d - expected.distance).abs() <= 1e-9 * expected.distance.max(1.0),
                "count={} query=({}, {}) found {} at {}, kd-tree {} at {}",
                count,
                x,
                y,
                found,
                d,
                expected.item,
                expected.distance
            );
            hint = found;
        }
    }
}

#[test]
fn raster_scan_with_hints_agrees_with_kd_tree() {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let (width, height) = (64, 48);
    let points: Vec<f64> = (0..80)
        .flat_map(|_| [rng.gen_range(0.0..64.0), rng.gen_range(0.0..48.0)])
        .collect();
    let bounds = Bounds::new(0.0, 0.0, width as f64, height as f64).unwrap();
    let mut locator = NearestSiteLocator::build(points, bounds).unwrap();

    for _ in 0..3 {
        let tree = kd_tree(locator.points());
        let mut hint = 0;
        for y in 0..height {
            for x in 0..width {
                let (qx, qy) = (x as f64 + 0.5, y as f64 + 0.5);
                let found = locator.find(qx, qy, hint).unwrap();
                let expected = tree.nearest_one::<SquaredEuclidean>(&[qx, qy]);
                let d = distance_squared(locator.points(), found, qx, qy);
                assert!((d - expected.distance).abs() < 1e-9);
                hint = found;
            }
        }

        // Shift every site and rebuild
        for (i, c) in locator.points_mut().iter_mut().enumerate() {
            *c += if i % 2 == 0 { 1.5 } else { -0.75 };
        }
        locator.update();
    }
}
