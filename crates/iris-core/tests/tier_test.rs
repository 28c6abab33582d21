use iris_core::models::QualityTier;
use iris_core::IrisError;
use proptest::prelude::*;

const UNIT: u64 = 28 * 28;

#[test]
fn tier_table_matches_published_bounds() {
    let expected = [
        ("fast", 128 * UNIT, 256 * UNIT),
        ("balanced", 256 * UNIT, 512 * UNIT),
        ("high", 256 * UNIT, 768 * UNIT),
        ("ultra", 256 * UNIT, 1024 * UNIT),
    ];
    for (label, min, max) in expected {
        let bounds = label.parse::<QualityTier>().unwrap().bounds();
        assert_eq!(bounds.min_pixels, min, "{label} min");
        assert_eq!(bounds.max_pixels, max, "{label} max");
    }
}

#[test]
fn unknown_label_names_allowed_set() {
    let err = "Fast".parse::<QualityTier>().unwrap_err();
    match err {
        IrisError::InvalidConfiguration { reason } => {
            assert!(reason.contains("fast|balanced|high|ultra"), "{reason}");
        }
        other => panic!("expected InvalidConfiguration, got {other:?}"),
    }
}

#[test]
fn lower_walks_down_to_fast() {
    assert_eq!(QualityTier::Ultra.lower(), Some(QualityTier::High));
    assert_eq!(QualityTier::High.lower(), Some(QualityTier::Balanced));
    assert_eq!(QualityTier::Balanced.lower(), Some(QualityTier::Fast));
    assert_eq!(QualityTier::Fast.lower(), None);
}

fn arb_tier() -> impl Strategy<Value = QualityTier> {
    prop_oneof![
        Just(QualityTier::Fast),
        Just(QualityTier::Balanced),
        Just(QualityTier::High),
        Just(QualityTier::Ultra),
    ]
}

proptest! {
    #[test]
    fn resolution_is_pure(tier in arb_tier()) {
        let a = tier.label().parse::<QualityTier>().unwrap().bounds();
        let b = tier.label().parse::<QualityTier>().unwrap().bounds();
        prop_assert_eq!(a, b);
        prop_assert!(a.min_pixels <= a.max_pixels);
    }

    #[test]
    fn unknown_labels_always_fail(label in "[a-z]{1,12}") {
        prop_assume!(!["fast", "balanced", "high", "ultra"].contains(&label.as_str()));
        let is_invalid = matches!(
            label.parse::<QualityTier>(),
            Err(IrisError::InvalidConfiguration { .. })
        );
        prop_assert!(is_invalid);
    }
}
