//! Behavioural properties of the correspondence solver
//!
//! These tests exercise the solver end to end through the public API, on
//! small hand-built scenes and on seeded random clouds.

use approx::assert_relative_eq;
use itertools::Itertools;
use meshcorr_algorithms::*;
use meshcorr_core::{NearestNeighborSearch, Point3d, PointCloud3d};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random points in a cube of the given half-width
fn random_cloud(seed: u64, count: usize, half_width: f64) -> Vec<Point3d> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Point3d::new(
                rng.gen_range(-half_width..half_width),
                rng.gen_range(-half_width..half_width),
                rng.gen_range(-half_width..half_width),
            )
        })
        .collect()
}

/// A face-sized source and a denser, noisier target around it
fn template_and_scan() -> (Vec<Point3d>, Vec<Point3d>) {
    let source = random_cloud(11, 300, 0.1);
    let mut rng = StdRng::seed_from_u64(12);
    let mut target: Vec<Point3d> = source
        .iter()
        .map(|p| {
            Point3d::new(
                p.x + rng.gen_range(-0.002..0.002),
                p.y + rng.gen_range(-0.002..0.002),
                p.z + rng.gen_range(-0.002..0.002),
            )
        })
        .collect();
    target.extend(random_cloud(13, 700, 0.1));
    (source, target)
}

#[test]
fn test_self_match_identity() {
    let points = random_cloud(1, 1000, 1.0);
    let tree = KdTree::new(&points).unwrap();

    let set = match_plain(&tree, &points).unwrap();
    assert_eq!(set.records.len(), points.len());
    for (i, record) in set.records.iter().enumerate() {
        assert_eq!(record.source_id, i);
        assert_eq!(record.target_id, i);
        assert_eq!(record.distance, 0.0);
    }
}

#[test]
fn test_plain_yields_one_record_per_source_point() {
    let (source, target) = template_and_scan();
    let tree = KdTree::new(&target).unwrap();

    let set = match_plain(&tree, &source).unwrap();
    assert_eq!(set.records.len(), source.len());
    assert!(set.unmatched.is_empty());
    assert!(set.is_complete());
    assert_eq!(
        set.matched_source_ids(),
        (0..source.len()).collect::<Vec<_>>()
    );
}

#[test]
fn test_mask_grows_with_each_match() {
    let (source, target) = template_and_scan();
    let tree = KdTree::new(&target).unwrap();
    let solver = CorrespondenceSolver::new(&tree, CorrespondenceConfig::unique(8, 0.01)).unwrap();
    let mut assigner = solver.unique_assigner().unwrap();

    let mut matched = 0;
    let mut previous = 0;
    for (i, point) in source.iter().enumerate() {
        if assigner.assign(i, point).is_some() {
            matched += 1;
        }
        let claimed = assigner.mask().len();
        assert_eq!(claimed, matched, "after source point {}", i);
        assert!(claimed >= previous);
        previous = claimed;
    }
    assert_eq!(assigner.mask().capacity(), target.len());
}

#[test]
fn test_unique_policy_is_injective() {
    let source = random_cloud(21, 800, 1.0);
    let target = random_cloud(22, 600, 1.0);
    let tree = KdTree::new(&target).unwrap();

    let set = match_unique(&tree, &source, 32, 0.5).unwrap();
    assert!(set.records.len() <= target.len());
    assert!(set.records.iter().map(|r| r.target_id).all_unique());
    assert_eq!(set.records.len() + set.unmatched.len(), source.len());
}

#[test]
fn test_threshold_respected() {
    let source = random_cloud(31, 500, 1.0);
    let target = random_cloud(32, 500, 1.0);
    let tree = KdTree::new(&target).unwrap();
    let max_distance = 0.15;

    let set = match_unique(&tree, &source, 16, max_distance).unwrap();
    assert!(!set.records.is_empty());
    assert!(!set.unmatched.is_empty());
    assert!(set.records.iter().all(|r| r.distance < max_distance));
    for record in &set.records {
        let expected = (source[record.source_id] - target[record.target_id]).norm();
        assert_relative_eq!(record.distance, expected, epsilon = 1e-12);
    }
}

#[test]
fn test_runs_are_deterministic() {
    let (source, target) = template_and_scan();
    let tree = KdTree::new(&target).unwrap();

    let first = match_unique(&tree, &source, 8, 0.01).unwrap();
    let second = match_unique(&KdTree::new(&target).unwrap(), &source, 8, 0.01).unwrap();

    assert_eq!(first, second);
    assert_eq!(format!("{:?}", first), format!("{:?}", second));
}

#[test]
fn test_exhausted_candidates_leave_later_point_unmatched() {
    let target = vec![Point3d::new(0.0, 0.0, 0.0)];
    // The second source point is the geometrically closer one
    let source = vec![Point3d::new(0.5, 0.0, 0.0), Point3d::new(0.1, 0.0, 0.0)];
    let tree = KdTree::new(&target).unwrap();

    let set = match_unique(&tree, &source, 1, 10.0).unwrap();
    assert_eq!(set.records.len(), 1);
    assert_eq!(set.records[0].source_id, 0);
    assert_eq!(set.records[0].target_id, 0);
    assert_eq!(set.unmatched, vec![1]);
}

#[test]
fn test_source_order_decides_contested_target() {
    let target = vec![Point3d::new(0.0, 0.0, 0.0)];
    let near = Point3d::new(0.1, 0.0, 0.0);
    let far = Point3d::new(0.0, 0.3, 0.0);
    let tree = KdTree::new(&target).unwrap();

    let forward = match_unique(&tree, &[near, far], 1, 1.0).unwrap();
    assert_eq!(forward.records.len(), 1);
    assert_eq!([near, far][forward.records[0].source_id], near);

    let reversed = match_unique(&tree, &[far, near], 1, 1.0).unwrap();
    assert_eq!(reversed.records.len(), 1);
    assert_eq!([far, near][reversed.records[0].source_id], far);
    assert_eq!(reversed.unmatched, vec![1]);
}

#[test]
fn test_uniform_scaling_keeps_assignment() {
    let source = PointCloud3d::from_points(random_cloud(41, 400, 1.0));
    let target = PointCloud3d::from_points(random_cloud(42, 400, 1.0));
    let max_distance = 0.2;

    let base_tree = KdTree::new(target.as_slice()).unwrap();
    let base = match_unique(&base_tree, source.as_slice(), 12, max_distance).unwrap();

    // Powers of two keep every intermediate value exact
    for factor in [4.0, 0.5] {
        let scaled_source = source.scaled(factor);
        let scaled_target = target.scaled(factor);
        let tree = KdTree::new(scaled_target.as_slice()).unwrap();
        let scaled =
            match_unique(&tree, scaled_source.as_slice(), 12, max_distance * factor).unwrap();

        assert_eq!(scaled.target_ids(), base.target_ids());
        assert_eq!(scaled.matched_source_ids(), base.matched_source_ids());
        assert_eq!(scaled.unmatched, base.unmatched);
        for (a, b) in scaled.records.iter().zip(&base.records) {
            assert_relative_eq!(a.distance, b.distance * factor, max_relative = 1e-12);
        }
    }
}

#[test]
fn test_empty_target_fails() {
    assert!(KdTree::new(&[]).is_err());
}

#[test]
fn test_shared_index_across_threads() {
    let (source, target) = template_and_scan();
    let tree = KdTree::new(&target).unwrap();
    let expected = match_unique(&tree, &source, 8, 0.01).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| match_unique(&tree, &source, 8, 0.01).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_trait_object_index() {
    let target = random_cloud(51, 100, 1.0);
    let tree = KdTree::new(&target).unwrap();
    let index: &(dyn NearestNeighborSearch + Sync) = &tree;

    let set = match_plain(index, &target).unwrap();
    assert_eq!(set.records.len(), 100);
}
