//! Tests for the empirical noise model.

use super::*;
use rand::rngs::StdRng;

fn uniform_0_10() -> EmpiricalDistribution {
    EmpiricalDistribution::new(CdfTable {
        cdf_x: vec![0.0, 10.0],
        cdf_y: vec![0.0, 1.0],
    })
    .unwrap()
}

#[test]
fn test_inverse_cdf_interpolates_linearly() {
    let dist = EmpiricalDistribution::new(CdfTable {
        cdf_x: vec![0.0, 2.0, 4.0],
        cdf_y: vec![0.0, 0.5, 1.0],
    })
    .unwrap();

    assert_eq!(dist.inverse_cdf(0.0), 0.0);
    assert!((dist.inverse_cdf(0.25) - 1.0).abs() < 1e-12);
    assert!((dist.inverse_cdf(0.5) - 2.0).abs() < 1e-12);
    assert!((dist.inverse_cdf(0.75) - 3.0).abs() < 1e-12);
    assert_eq!(dist.inverse_cdf(1.0), 4.0);
}

#[test]
fn test_inverse_cdf_clamps_outside_table() {
    let dist = EmpiricalDistribution::new(CdfTable {
        cdf_x: vec![1.0, 3.0],
        cdf_y: vec![0.2, 0.8],
    })
    .unwrap();
    assert_eq!(dist.inverse_cdf(0.0), 1.0);
    assert_eq!(dist.inverse_cdf(0.99), 3.0);
}

#[test]
fn test_flat_cdf_segment_does_not_divide_by_zero() {
    let dist = EmpiricalDistribution::new(CdfTable {
        cdf_x: vec![0.0, 1.0, 2.0, 3.0],
        cdf_y: vec![0.0, 0.5, 0.5, 1.0],
    })
    .unwrap();
    let x = dist.inverse_cdf(0.5);
    assert!(x.is_finite());
    assert_eq!(x, 1.0);
}

#[test]
fn test_samples_stay_in_table_range() {
    let dist = uniform_0_10();
    let mut rng = StdRng::seed_from_u64(42);
    let samples = dist.sample_with(&mut rng, 1000);

    assert_eq!(samples.len(), 1000);
    assert!(samples.iter().all(|&v| (0.0..=10.0).contains(&v)));

    let mean = samples.iter().map(|&v| v as f64).sum::<f64>() / samples.len() as f64;
    assert!((mean - 5.0).abs() < 0.5, "mean {mean}");
}

#[test]
fn test_seeded_sampling_is_reproducible() {
    let dist = uniform_0_10();
    let a = dist.sample_with(&mut StdRng::seed_from_u64(7), 16);
    let b = dist.sample_with(&mut StdRng::seed_from_u64(7), 16);
    assert_eq!(a, b);
}

#[test]
fn test_trait_sample_count() {
    let dist: &dyn NoiseDistribution = &uniform_0_10();
    assert_eq!(dist.sample(0).len(), 0);
    assert_eq!(dist.sample(5).len(), 5);
}

#[test]
fn test_validation_rejects_bad_tables() {
    let cases = [
        (vec![0.0, 1.0], vec![0.0]),
        (vec![0.0], vec![0.0]),
        (vec![0.0, f64::NAN], vec![0.0, 1.0]),
        (vec![1.0, 1.0], vec![0.0, 1.0]),
        (vec![0.0, 1.0], vec![0.6, 0.4]),
    ];
    for (cdf_x, cdf_y) in cases {
        let result = EmpiricalDistribution::new(CdfTable { cdf_x, cdf_y });
        assert!(matches!(result, Err(NoiseModelError::InvalidTable(_))));
    }
}

#[test]
fn test_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise_cdf.json");
    std::fs::write(&path, r#"{"cdf_x": [-1.0, 0.0, 3.0], "cdf_y": [0.0, 0.4, 1.0]}"#).unwrap();

    let dist = EmpiricalDistribution::from_file(&path).unwrap();
    assert_eq!(dist.table().cdf_x, vec![-1.0, 0.0, 3.0]);
}

#[test]
fn test_from_file_reports_path_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");

    let err = EmpiricalDistribution::from_file(&path).unwrap_err();
    assert!(matches!(err, NoiseModelError::Load { .. }));
    assert!(err.to_string().contains("missing.json"));
}
