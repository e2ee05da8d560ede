//! Tests for tailcut cleaning.

use super::*;
use crate::report::ReportValue;
use crate::testing::synthetic::{noisy_shower, single_peak};

fn selected(mask: &BitBuffer2) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for y in 0..mask.height() {
        for x in 0..mask.width() {
            if mask.get_xy(x, y) {
                out.push((x, y));
            }
        }
    }
    out
}

// =============================================================================
// Dilation
// =============================================================================

#[test]
fn test_dilate_single_pixel_is_full_ring() {
    let mut mask = BitBuffer2::new_default(5, 5);
    mask.set_xy(2, 2, true);

    let dilated = dilate_one_ring(&mask);

    let mut expected = Vec::new();
    for y in 1..=3 {
        for x in 1..=3 {
            expected.push((x, y));
        }
    }
    assert_eq!(selected(&dilated), expected);
}

#[test]
fn test_dilate_matches_documented_pattern() {
    // Two seeds on one row produce two 3x3 blocks separated by a column.
    let mut mask = BitBuffer2::new_default(9, 5);
    mask.set_xy(2, 2, true);
    mask.set_xy(6, 2, true);

    let dilated = dilate_one_ring(&mask);

    let expected_row = [false, true, true, true, false, true, true, true, false];
    for y in 0..5 {
        for (x, &expected) in expected_row.iter().enumerate() {
            let want = (1..=3).contains(&y) && expected;
            assert_eq!(dilated.get_xy(x, y), want, "pixel ({}, {})", x, y);
        }
    }
}

#[test]
fn test_dilate_corner_grows_inward_only() {
    let mut mask = BitBuffer2::new_default(4, 3);
    mask.set_xy(3, 0, true);

    let dilated = dilate_one_ring(&mask);

    assert_eq!(selected(&dilated), vec![(2, 0), (3, 0), (2, 1), (3, 1)]);
}

#[test]
fn test_dilate_crosses_word_boundary() {
    let mut mask = BitBuffer2::new_default(130, 3);
    mask.set_xy(63, 1, true);
    mask.set_xy(128, 1, true);

    let dilated = dilate_one_ring(&mask);

    for y in 0..3 {
        assert!(dilated.get_xy(62, y));
        assert!(dilated.get_xy(64, y));
        assert!(dilated.get_xy(127, y));
        assert!(dilated.get_xy(129, y));
        assert!(!dilated.get_xy(65, y));
        assert!(!dilated.get_xy(126, y));
    }
    assert_eq!(dilated.count_ones(), 3 * 3 + 3 * 3);
}

#[test]
fn test_dilate_empty_and_degenerate_sizes() {
    let empty = BitBuffer2::new_default(0, 0);
    assert_eq!(dilate_one_ring(&empty).count_ones(), 0);

    let mut column = BitBuffer2::new_default(1, 3);
    column.set_xy(0, 0, true);
    let dilated = dilate_one_ring(&column);
    assert_eq!(selected(&dilated), vec![(0, 0), (0, 1)]);
}

// =============================================================================
// Tailcut
// =============================================================================

#[test]
fn test_single_peak_keeps_only_center() {
    // Neighbors are zero, so they are in the ring but below the low threshold.
    let image = single_peak(5, 5, 2, 2, 100.0);
    let cleaned = Tailcut::new(TailcutConfig::new(50.0, 50.0))
        .clean(&image, None)
        .unwrap();

    assert_eq!(cleaned.shape(), image.shape());
    for (i, &v) in cleaned.pixels().iter().enumerate() {
        if i == 2 * 5 + 2 {
            assert_eq!(v, 100.0);
        } else {
            assert_eq!(v, 0.0);
        }
    }
}

#[test]
fn test_mask_is_seed_widened_by_one_ring_when_low_admits_all() {
    let image = single_peak(5, 5, 2, 2, 100.0);
    let buffer = image.to_buffer().unwrap();
    let config = TailcutConfig::new(50.0, -1.0);

    // low below everything: the surviving set is exactly the one ring
    let mask = tailcut_mask(&buffer, &config);
    let mut expected = Vec::new();
    for y in 1..=3 {
        for x in 1..=3 {
            expected.push((x, y));
        }
    }
    assert_eq!(selected(&mask), expected);
}

#[test]
fn test_low_neighbors_survive_only_next_to_high() {
    #[rustfmt::skip]
    let pixels = vec![
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        0.0, 6.0, 0.0, 0.0, 0.0, 6.0,
        0.0, 0.0, 12.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 6.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 6.0, 0.0,
    ];
    let image = Image::new(6, 5, pixels);

    let cleaned = Tailcut::default().clean(&image, None).unwrap();
    let out = cleaned.to_buffer().unwrap();

    assert_eq!(out[(2, 2)], 12.0);
    // diagonal neighbors of the seed
    assert_eq!(out[(1, 1)], 6.0);
    assert_eq!(out[(3, 3)], 6.0);
    // two steps away from the seed
    assert_eq!(out[(4, 4)], 0.0);
    assert_eq!(out[(5, 1)], 0.0);
}

#[test]
fn test_nan_and_rejected_pixels_become_zero() {
    let mut image = single_peak(4, 4, 1, 1, 20.0).into_pixels();
    image[0] = f32::NAN;
    image[15] = f32::NAN;
    let image = Image::new(4, 4, image);

    let cleaned = Tailcut::default().clean(&image, None).unwrap();

    assert!(cleaned.pixels().iter().all(|v| v.is_finite()));
    assert_eq!(cleaned.pixels()[0], 0.0);
    assert_eq!(cleaned.pixels()[15], 0.0);
    assert_eq!(cleaned.pixels()[5], 20.0);
}

#[test]
fn test_input_is_not_modified() {
    let image = noisy_shower(16, 12, 7);
    let before = image.clone();
    let _ = Tailcut::default().clean(&image, None).unwrap();
    assert_eq!(image.pixels().len(), before.pixels().len());
    for (a, b) in image.pixels().iter().zip(before.pixels()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_idempotent_on_cleaned_image() {
    let image = noisy_shower(24, 20, 3);
    let tailcut = Tailcut::new(TailcutConfig::new(8.0, 4.0));

    let once = tailcut.clean(&image, None).unwrap();
    let twice = tailcut.clean(&once, None).unwrap();

    let config = tailcut.config();
    let mask_once = tailcut_mask(&once.to_buffer().unwrap(), config);
    let mask_twice = tailcut_mask(&twice.to_buffer().unwrap(), config);
    assert_eq!(mask_once, mask_twice);
    assert_eq!(once, twice);
}

#[test]
fn test_low_above_high_reduces_to_low_filter_next_to_seeds() {
    // With low > high every high pixel is also checked against low.
    let image = Image::new(3, 1, vec![4.0, 7.0, 2.0]);
    let cleaned = Tailcut::new(TailcutConfig::new(3.0, 5.0))
        .clean(&image, None)
        .unwrap();
    assert_eq!(cleaned.pixels(), &[0.0, 7.0, 0.0]);
}

#[test]
fn test_non_finite_threshold_is_rejected() {
    let image = single_peak(3, 3, 1, 1, 1.0);
    let err = Tailcut::new(TailcutConfig::new(f32::NAN, 1.0))
        .clean(&image, None)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameterCombination(_)));
}

#[test]
fn test_non_2d_input_is_shape_error() {
    let cube = Image::from_shape(vec![2, 2, 2], vec![1.0; 8]).unwrap();
    let err = Tailcut::default().clean(&cube, None).unwrap_err();
    assert!(matches!(err, Error::Shape { .. }));
}

#[test]
fn test_reports_selected_pixel_count() {
    let image = single_peak(5, 5, 2, 2, 100.0);
    let mut report = Report::new();
    Tailcut::new(TailcutConfig::new(50.0, 50.0))
        .clean(&image, Some(&mut report))
        .unwrap();
    assert_eq!(
        report.get("tailcut_num_selected_pixels"),
        Some(&ReportValue::Count(1))
    );
}

#[test]
fn test_config_from_yaml_uses_defaults_for_missing_fields() {
    let config: TailcutConfig = serde_yml::from_str("high_threshold: 7.5\n").unwrap();
    assert_eq!(config.high_threshold, 7.5);
    assert_eq!(config.low_threshold, 5.0);
}
