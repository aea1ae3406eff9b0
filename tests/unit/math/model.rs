//! Tests for the log10-form Tsallis model and its gradient

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::DVector;
    use tsallis::math::least_squares::CurveModel;
    use tsallis::math::model::{TsallisModel, TsallisParameters, tsallis_function};

    const PARAMETERS: TsallisParameters = TsallisParameters {
        log_amplitude: 0.7,
        width_squared: 1.8,
        shape: 1.4,
    };

    // Tests the closed form at a few points
    // Verified by using the natural logarithm instead of log10
    #[test]
    fn test_function_values() {
        assert_relative_eq!(tsallis_function(0.0, 0.5, 1.0, 2.0), -0.5);
        assert_relative_eq!(tsallis_function(1.0, 0.0, 1.0, 2.0), -(2.0_f64.log10()));
        assert_relative_eq!(
            tsallis_function(2.0, 0.3, 2.0, 1.5),
            -(2.0_f64.log10() + 0.3) / 0.5
        );
    }

    // Tests that the curve is symmetric in x
    // Verified by replacing x² with x
    #[test]
    fn test_symmetry() {
        for x in [0.25, 1.0, 3.5] {
            assert_relative_eq!(PARAMETERS.evaluate(x), PARAMETERS.evaluate(-x));
        }
    }

    // Tests the analytic gradient against central differences
    // Verified by dropping the cross term of the shape derivative
    #[test]
    fn test_gradient_matches_finite_differences() {
        let h = 1e-6;
        for x in [-1.5, -0.3, 0.0, 0.8, 2.0] {
            let gradient = PARAMETERS.gradient(x);

            let numeric = [0, 1, 2].map(|index| {
                let mut up = PARAMETERS.to_vector();
                let mut down = PARAMETERS.to_vector();
                up[index] += h;
                down[index] -= h;
                let up = TsallisParameters::from_vector(&up).evaluate(x);
                let down = TsallisParameters::from_vector(&down).evaluate(x);
                (up - down) / (2.0 * h)
            });

            for (analytic, numeric) in gradient.iter().zip(numeric) {
                assert_relative_eq!(*analytic, numeric, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_vector_conversion() {
        let values = PARAMETERS.to_vector();
        assert_eq!(values, DVector::from_vec(vec![0.7, 1.8, 1.4]));
        assert_eq!(TsallisParameters::from_vector(&values), PARAMETERS);

        let short = DVector::from_vec(vec![1.0]);
        let partial = TsallisParameters::from_vector(&short);
        assert_eq!(partial.log_amplitude, 1.0);
        assert!(partial.width_squared.is_nan());
        assert!(partial.shape.is_nan());
    }

    #[test]
    fn test_curve_model_delegates() {
        let values = PARAMETERS.to_vector();
        assert_relative_eq!(TsallisModel.value(0.9, &values), PARAMETERS.evaluate(0.9));
        assert_eq!(
            TsallisModel.gradient(0.9, &values).as_slice(),
            PARAMETERS.gradient(0.9).as_slice()
        );
        assert_eq!(TsallisParameters::NAMES.len(), 3);
    }
}
