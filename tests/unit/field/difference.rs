//! Tests for standardized four-neighbour lag differences

#[cfg(test)]
mod tests {
    use crate::noise_field;
    use approx::assert_relative_eq;
    use ndarray::{Array2, Array3, array};
    use tsallis::TsallisError;
    use tsallis::field::LagDifferenceField;
    use tsallis::field::moments::FiniteMoments;

    // Tests the four-neighbour stencil on a single impulse
    // Verified by dropping one of the four shifts
    #[test]
    fn test_impulse_response() {
        let mut field = Array2::<f64>::zeros((5, 5));
        field[[2, 2]] = 1.0;

        let diff = LagDifferenceField::compute(&field, 1).unwrap();
        let values = diff.values();

        // Raw centre is -1, each neighbour 1/4, everything else 0
        let centre = values[[2, 2]];
        let neighbour = values[[1, 2]];
        let background = values[[0, 0]];

        assert_relative_eq!(values[[3, 2]], neighbour);
        assert_relative_eq!(values[[2, 1]], neighbour);
        assert_relative_eq!(values[[2, 3]], neighbour);
        assert_relative_eq!(centre - background, -4.0 * (neighbour - background), epsilon = 1e-12);
        assert!(centre < background && background < neighbour);
    }

    // Tests that the output is standardized over finite entries
    // Verified by skipping the standardization step
    #[test]
    fn test_output_is_standardized() {
        let field = noise_field(32, 48, 7);
        let diff = LagDifferenceField::compute(&field, 3).unwrap();

        assert_eq!(diff.dim(), (32, 48));
        assert_eq!(diff.lag(), 3);

        let moments = FiniteMoments::of(diff.values()).unwrap();
        assert_eq!(moments.count, 32 * 48);
        assert_relative_eq!(moments.mean, 0.0, epsilon = 1e-10);
        assert_relative_eq!(moments.std_dev, 1.0, epsilon = 1e-10);
    }

    // Tests that every lag up to 64 keeps the input shape
    // Verified by cropping the output to the unshifted overlap
    #[test]
    fn test_shape_preserved_for_all_lags() {
        let field = noise_field(67, 70, 13);
        for lag in 1..=64 {
            let diff = LagDifferenceField::compute(&field, lag).unwrap();
            assert_eq!(diff.dim(), (67, 70), "lag {lag}");
        }
    }

    // Tests that shifts wrap around the field edges
    // Verified by clamping shifts at the boundary
    #[test]
    fn test_cyclic_wrap() {
        let field = noise_field(6, 6, 11);
        let lag_one = LagDifferenceField::compute(&field, 1).unwrap();
        let lag_seven = LagDifferenceField::compute(&field, 7).unwrap();

        for (a, b) in lag_one.values().iter().zip(lag_seven.values()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    // Tests that a lag equal to the field size collapses to zero difference
    // Verified by treating the zero-variance field as valid
    #[test]
    fn test_lag_equal_to_size_is_degenerate() {
        let field = noise_field(8, 8, 3);
        let result = LagDifferenceField::compute(&field, 8);

        assert!(matches!(
            result,
            Err(TsallisError::DegenerateInput {
                stage: "lag difference",
                ..
            })
        ));
    }

    #[test]
    fn test_constant_field_is_degenerate() {
        let field = Array2::from_elem((10, 10), 3.5);
        let result = LagDifferenceField::compute(&field, 1);
        assert!(matches!(result, Err(TsallisError::DegenerateInput { .. })));
    }

    #[test]
    fn test_zero_lag_rejected() {
        let field = noise_field(4, 4, 1);
        let result = LagDifferenceField::compute(&field, 0);
        assert!(matches!(
            result,
            Err(TsallisError::InvalidParameter {
                parameter: "lag",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_axis_rejected() {
        let field = Array2::<f64>::zeros((0, 5));
        let result = LagDifferenceField::compute(&field, 1);
        assert!(matches!(result, Err(TsallisError::Shape { .. })));
    }

    // Tests that non-finite input stays non-finite and only spreads to its stencil
    // Verified by replacing NaN with zero before differencing
    #[test]
    fn test_nan_propagates_to_stencil() {
        let mut field = noise_field(7, 7, 5);
        field[[3, 3]] = f64::NAN;

        let diff = LagDifferenceField::compute(&field, 1).unwrap();
        let values = diff.values();

        for index in [[3, 3], [2, 3], [4, 3], [3, 2], [3, 4]] {
            assert!(values[index].is_nan(), "expected NaN at {index:?}");
        }
        assert_eq!(diff.finite_values().count(), 49 - 5);
    }

    // Tests that single-precision input matches double-precision input
    // Verified by truncating to f32 after differencing
    #[test]
    fn test_single_precision_input() {
        let doubles = array![[1.0, 5.0, 2.0], [7.0, 0.0, 3.0], [4.0, 4.0, 9.0]];
        let singles = doubles.mapv(|v: f64| v as f32);

        let from_doubles = LagDifferenceField::compute(&doubles, 1).unwrap();
        let from_singles = LagDifferenceField::compute(&singles, 1).unwrap();
        assert_eq!(from_singles, from_doubles);
    }

    #[test]
    fn test_dynamic_shape_checked() {
        let cube = Array3::<f64>::zeros((2, 3, 4)).into_dyn();
        let result = LagDifferenceField::compute_dyn(&cube.view(), 1);
        assert!(matches!(
            result,
            Err(TsallisError::Shape { ref found, .. }) if found == &vec![2, 3, 4]
        ));

        let plane = noise_field(5, 6, 2);
        let dynamic = plane.clone().into_dyn();
        let from_dyn = LagDifferenceField::compute_dyn(&dynamic.view(), 2).unwrap();
        let from_static = LagDifferenceField::compute(&plane, 2).unwrap();
        assert_eq!(from_dyn, from_static);
    }

    #[test]
    fn test_into_values() {
        let field = noise_field(4, 5, 9);
        let diff = LagDifferenceField::compute(&field, 1).unwrap();
        let expected = diff.values().clone();
        assert_eq!(diff.into_values(), expected);
    }
}
