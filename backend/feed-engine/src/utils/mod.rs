// Utility functions for feed-engine

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Half-life decay: 1.0 at age 0, 0.5 after one half-life, approaches 0 but never crosses it.
pub fn exponential_decay(age_hours: f64, half_life_hours: f64) -> f64 {
    if !age_hours.is_finite() || half_life_hours <= 0.0 {
        return 0.0;
    }
    (-age_hours.max(0.0) / half_life_hours * std::f64::consts::LN_2).exp()
}

/// `ln(1 + count)`; flattens large engagement counts.
pub fn log_damped(count: u32) -> f64 {
    (count as f64).ln_1p()
}

/// Install a fmt subscriber filtered by `RUST_LOG`. For hosts that have no subscriber of their own.
///
/// Safe to call more than once; later calls are no-ops.
///
/// ```
/// feed_engine::utils::init_tracing();
/// feed_engine::utils::init_tracing();
/// tracing::info!("feed engine ready");
/// ```
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init();
}
