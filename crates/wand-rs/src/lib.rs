//! Public SDK surface for wand.
//!
//! Re-exports the record editing and correction building blocks, plus the
//! argument parsing and report rendering used by the `wand` binary.

/// Re-export for convenience.
pub use wand_rs_config as config;
pub use wand_rs_core as core;
/// Re-export for convenience.
pub use wand_rs_protocol as protocol;

pub mod edit;
pub mod report;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// Output is controlled through `RUST_LOG`. Without the feature this is a
/// no-op.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
