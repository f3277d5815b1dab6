use crate::config::BudgetConfig;
use crate::ffmpeg::progress::scale_percent;
use anyhow::Result;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Something that can (re)produce the output file at a given resolution factor
pub trait Transcode {
    /// Encode the output, `None` meaning original resolution
    fn transcode(&mut self, scale: Option<f64>) -> Result<()>;

    /// Current size of the output in bytes
    fn output_size(&self) -> u64;
}

/// Result of fitting the output under the size budget
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    /// Output is within budget
    Fits {
        size: u64,
        scale: Option<f64>,
        attempts: usize,
    },
    /// Every scale factor was tried and the output is still too large
    Oversize { size: u64, attempts: usize },
}

impl FitOutcome {
    pub fn size(&self) -> u64 {
        match self {
            FitOutcome::Fits { size, .. } | FitOutcome::Oversize { size, .. } => *size,
        }
    }

    pub fn attempts(&self) -> usize {
        match self {
            FitOutcome::Fits { attempts, .. } | FitOutcome::Oversize { attempts, .. } => *attempts,
        }
    }

    /// Final message for the user
    pub fn report(&self, budget: &BudgetConfig) -> String {
        let limit = budget_label(budget.max_size_bytes);
        match self {
            FitOutcome::Fits { size, .. } => {
                let kb = *size as f64 / 1024.0;
                format!(
                    "✨ Successfully created MP4 under {} size limit.\nFinal file size: {:.2} KB ({:.2} MB)",
                    limit,
                    kb,
                    kb / 1024.0
                )
            }
            FitOutcome::Oversize { .. } => format!(
                "⚠️  Warning: File still exceeds {} after trying all resolution reductions.",
                limit
            ),
        }
    }
}

/// Encode at original resolution, then walk the descending scale factors
/// until the output fits the budget.
///
/// Encode failures abort immediately. Running out of factors is not an error.
pub fn fit_to_budget<T: Transcode>(job: &mut T, budget: &BudgetConfig) -> Result<FitOutcome> {
    job.transcode(None)?;
    let mut attempts = 1;
    let mut scale = None;

    for &factor in &budget.scale_factors {
        let size = job.output_size();
        tracing::debug!(size, attempts, "checked output size");
        if size <= budget.max_size_bytes {
            return Ok(FitOutcome::Fits {
                size,
                scale,
                attempts,
            });
        }

        println!(
            "\n📉 File exceeds {}, retrying with {}% resolution...",
            budget_label(budget.max_size_bytes),
            scale_percent(factor)
        );
        job.transcode(Some(factor))?;
        attempts += 1;
        scale = Some(factor);
    }

    let size = job.output_size();
    tracing::debug!(size, attempts, "checked output size");
    if size <= budget.max_size_bytes {
        Ok(FitOutcome::Fits {
            size,
            scale,
            attempts,
        })
    } else {
        Ok(FitOutcome::Oversize { size, attempts })
    }
}

/// "10MB" for whole mebibytes, otherwise KB or bytes
pub fn budget_label(bytes: u64) -> String {
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    /// Produces a scripted size per attempt and records the requested scales
    struct ScriptedJob {
        sizes: Vec<u64>,
        calls: Vec<Option<f64>>,
        fail_on_call: Option<usize>,
    }

    impl ScriptedJob {
        fn new(sizes: &[u64]) -> Self {
            Self {
                sizes: sizes.to_vec(),
                calls: Vec::new(),
                fail_on_call: None,
            }
        }
    }

    impl Transcode for ScriptedJob {
        fn transcode(&mut self, scale: Option<f64>) -> Result<()> {
            if self.fail_on_call == Some(self.calls.len()) {
                anyhow::bail!("encoder exited with status 1");
            }
            self.calls.push(scale);
            Ok(())
        }

        fn output_size(&self) -> u64 {
            self.sizes[self.calls.len() - 1]
        }
    }

    fn budget() -> BudgetConfig {
        AppConfig::default().budget
    }

    const OVER: u64 = 12 * 1024 * 1024;
    const UNDER: u64 = 4 * 1024 * 1024;

    #[test]
    fn test_fits_first_time_no_rescale() {
        let mut job = ScriptedJob::new(&[UNDER]);
        let outcome = fit_to_budget(&mut job, &budget()).unwrap();

        assert_eq!(job.calls, vec![None]);
        assert_eq!(
            outcome,
            FitOutcome::Fits {
                size: UNDER,
                scale: None,
                attempts: 1
            }
        );
    }

    #[test]
    fn test_exactly_at_budget_fits() {
        let limit = budget().max_size_bytes;
        let mut job = ScriptedJob::new(&[limit]);
        let outcome = fit_to_budget(&mut job, &budget()).unwrap();
        assert_eq!(outcome.attempts(), 1);
        assert!(matches!(outcome, FitOutcome::Fits { .. }));
    }

    #[test]
    fn test_stops_at_first_fitting_factor() {
        let mut job = ScriptedJob::new(&[OVER, OVER, UNDER]);
        let outcome = fit_to_budget(&mut job, &budget()).unwrap();

        assert_eq!(job.calls, vec![None, Some(0.8), Some(0.6)]);
        assert_eq!(
            outcome,
            FitOutcome::Fits {
                size: UNDER,
                scale: Some(0.6),
                attempts: 3
            }
        );
    }

    #[test]
    fn test_last_factor_fits() {
        let mut job = ScriptedJob::new(&[OVER, OVER, OVER, OVER, UNDER]);
        let outcome = fit_to_budget(&mut job, &budget()).unwrap();

        assert_eq!(
            job.calls,
            vec![None, Some(0.8), Some(0.6), Some(0.4), Some(0.2)]
        );
        assert_eq!(outcome.size(), UNDER);
        assert!(matches!(outcome, FitOutcome::Fits { scale: Some(s), .. } if s == 0.2));
    }

    #[test]
    fn test_exhausted_factors_is_oversize_not_error() {
        let mut job = ScriptedJob::new(&[OVER; 5]);
        let outcome = fit_to_budget(&mut job, &budget()).unwrap();

        assert_eq!(job.calls.len(), 5);
        assert_eq!(
            outcome,
            FitOutcome::Oversize {
                size: OVER,
                attempts: 5
            }
        );
        assert!(outcome.report(&budget()).contains("Warning"));
    }

    #[test]
    fn test_encode_failure_on_retry_is_fatal() {
        let mut job = ScriptedJob::new(&[OVER, OVER, OVER]);
        job.fail_on_call = Some(2);

        let result = fit_to_budget(&mut job, &budget());
        assert!(result.is_err());
        assert_eq!(job.calls, vec![None, Some(0.8)]);
    }

    #[test]
    fn test_custom_budget_and_factors() {
        let custom = BudgetConfig {
            max_size_bytes: 1000,
            scale_factors: vec![0.5],
        };
        let mut job = ScriptedJob::new(&[2000, 1500]);
        let outcome = fit_to_budget(&mut job, &custom).unwrap();

        assert_eq!(job.calls, vec![None, Some(0.5)]);
        assert_eq!(outcome.attempts(), 2);
        assert!(matches!(outcome, FitOutcome::Oversize { .. }));
    }

    #[test]
    fn test_success_report_sizes() {
        let outcome = FitOutcome::Fits {
            size: 2 * 1024 * 1024 + 512 * 1024,
            scale: Some(0.8),
            attempts: 2,
        };
        let report = outcome.report(&budget());
        assert!(report.contains("under 10MB size limit"));
        assert!(report.contains("2560.00 KB (2.50 MB)"));
    }

    #[test]
    fn test_budget_label() {
        assert_eq!(budget_label(10 * 1024 * 1024), "10MB");
        assert_eq!(budget_label(512 * 1024), "512KB");
        assert_eq!(budget_label(1000), "1000 bytes");
    }
}
