//! Tests for the multi-lag statistic and its failure handling

#[cfg(test)]
mod tests {
    use crate::noise_field;
    use ndarray::Array2;
    use tsallis::analysis::statistic::FailurePolicy;
    use tsallis::io::visualization::PlotCapture;
    use tsallis::{TsallisConfig, TsallisError, TsallisStatistic};

    fn small_config(lags: &[usize]) -> TsallisConfig {
        TsallisConfig::default().with_lags(lags).with_num_bins(20)
    }

    // Tests that every lag produces its own analysis, in the configured order
    // Verified by sorting lags before analysis
    #[test]
    fn test_lag_order_preserved() {
        let field = noise_field(24, 24, 21);
        let statistic = TsallisStatistic::compute(&field, &small_config(&[4, 1, 2])).unwrap();

        assert_eq!(statistic.lags(), &[4, 1, 2]);
        assert_eq!(statistic.len(), 3);
        assert!(!statistic.is_empty());
        assert_eq!(statistic.num_bins(), 20);

        for (outcome, &lag) in statistic.analyses().iter().zip(&[4, 1, 2]) {
            let analysis = outcome.as_ref().unwrap();
            assert_eq!(analysis.lag, lag);
            assert_eq!(analysis.difference.lag(), lag);
            assert_eq!(analysis.difference.dim(), (24, 24));
            assert_eq!(analysis.distribution.num_bins(), 20);
        }
    }

    // Tests that identical inputs give identical statistics
    // Verified by seeding the fit from a random initial guess
    #[test]
    fn test_deterministic() {
        let field = noise_field(32, 32, 8);
        let config = small_config(&[1, 2]);
        let first = TsallisStatistic::compute(&field, &config).unwrap();
        let second = TsallisStatistic::compute(&field.view(), &config).unwrap();
        assert_eq!(first, second);
    }

    // Tests that a failing lag is recorded without discarding the others
    // Verified by aborting on the first failure under the partial policy
    #[test]
    fn test_partial_failure_keeps_other_lags() {
        let field = noise_field(32, 32, 4);
        let statistic = TsallisStatistic::compute(&field, &small_config(&[1, 32])).unwrap();

        assert!(statistic.analysis(0).unwrap().is_ok());
        let failure = statistic.analysis(1).unwrap().as_ref().unwrap_err();
        assert_eq!(failure.lag(), Some(32));
        assert!(matches!(
            failure.root_cause(),
            TsallisError::DegenerateInput {
                stage: "lag difference",
                ..
            }
        ));

        assert!(!statistic.is_complete());
        assert!(statistic.fits()[1].is_none());
        assert!(statistic.fit(1).is_err());
        assert!(
            statistic
                .failures()
                .iter()
                .any(|error| error.lag() == Some(32))
        );

        let table = statistic.fit_table();
        assert_eq!(table.dim(), (2, 7));
        assert!(table.row(1).iter().all(|v| v.is_nan()));
        assert_eq!(
            table.row(0).iter().all(|v| v.is_finite()),
            statistic.fit(0).is_ok()
        );
    }

    // Tests that the strict policy returns the first failure in lag order
    // Verified by returning the last failure instead
    #[test]
    fn test_strict_failure() {
        let field = noise_field(16, 16, 6);
        let config = small_config(&[16, 1]).with_failure_policy(FailurePolicy::Strict);

        let error = TsallisStatistic::compute(&field, &config).unwrap_err();
        assert_eq!(error.lag(), Some(16));
    }

    // Tests that a checkerboard fails differently at each lag
    // Verified by skipping empty bins before clipping
    #[test]
    fn test_checkerboard_failures() {
        let field = Array2::from_shape_fn((8, 8), |(i, j)| if (i + j) % 2 == 0 { 1.0 } else { -1.0 });
        let statistic = TsallisStatistic::compute(&field, &small_config(&[1, 2])).unwrap();

        // Lag 1 has only two occupied bins, lag 2 has no variance at all
        let lag_one = statistic.analysis(0).unwrap().as_ref().unwrap();
        assert!(matches!(
            lag_one.fit.as_ref().map_err(TsallisError::root_cause),
            Err(TsallisError::DegenerateInput { stage: "fit", .. })
        ));
        assert!(statistic.analysis(1).unwrap().is_err());
        assert_eq!(statistic.failures().len(), 2);
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let field = noise_field(8, 8, 1);
        for config in [
            small_config(&[]),
            small_config(&[1, 0]),
            small_config(&[1]).with_num_bins(0),
        ] {
            assert!(matches!(
                TsallisStatistic::compute(&field, &config),
                Err(TsallisError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_fit_index_out_of_range() {
        let field = noise_field(16, 16, 2);
        let statistic = TsallisStatistic::compute(&field, &small_config(&[1])).unwrap();
        assert!(matches!(
            statistic.fit(5),
            Err(TsallisError::InvalidParameter {
                parameter: "index",
                ..
            })
        ));
        assert!(statistic.analysis(5).is_none());
    }

    // Tests that the reporter sees every analysed lag only when verbose
    // Verified by reporting regardless of the verbose flag
    #[test]
    fn test_reporting_follows_verbose() {
        let field = noise_field(16, 16, 12);

        let mut quiet = PlotCapture::new();
        TsallisStatistic::compute_with_reporter(&field, &small_config(&[1, 2]), &mut quiet).unwrap();
        assert!(quiet.images().is_empty());
        assert!(quiet.overlays().is_empty());

        let mut verbose = PlotCapture::new();
        let config = small_config(&[1, 2]).with_verbose(true);
        let statistic =
            TsallisStatistic::compute_with_reporter(&field, &config, &mut verbose).unwrap();

        let lags: Vec<usize> = verbose.images().iter().map(|(lag, _)| *lag).collect();
        assert_eq!(lags, vec![1, 2]);
        assert_eq!(verbose.overlays().len(), 2);
        for (overlay, fit) in verbose.overlays().iter().zip(statistic.fits()) {
            assert_eq!(overlay.model.is_some(), fit.is_some());
            assert_eq!(overlay.bin_centres.len(), 20);
        }

        let mut replay = PlotCapture::new();
        statistic.report(&mut replay);
        let replayed: Vec<usize> = replay.overlays().iter().map(|overlay| overlay.lag).collect();
        assert_eq!(replayed, vec![1, 2]);
        assert_eq!(replay.images(), verbose.images());
    }
}
