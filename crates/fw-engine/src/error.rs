//! Engine error types.

use thiserror::Error;

/// An invalid judge table. Raised once at construction; callers abort.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("timing window W{band} ({value}s) must be positive")]
    NonPositiveWindow { band: usize, value: f64 },
    #[error("timing window W{band} ({value}s) must be wider than the previous window")]
    WindowsNotIncreasing { band: usize, value: f64 },
    #[error("{name} window ({value}s) must be positive")]
    NonPositiveSpecial { name: &'static str, value: f64 },
    #[error("grade thresholds must be descending, threshold {index} ({value}) is out of order")]
    GradesNotDescending { index: usize, value: f64 },
}
