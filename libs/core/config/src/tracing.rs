use crate::Environment;
use tracing::debug;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre for binaries.
///
/// Shows the error location, hides the environment section. Calling it more
/// than once is harmless.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Initialize the global subscriber for the given environment.
///
/// - **Production**: flattened JSON events, no module targets, default
///   filter `warn`.
/// - **Development**: pretty output, default filter `info`.
///
/// `RUST_LOG` overrides the default filter in both modes (e.g.
/// `RUST_LOG=domain_pricing=debug` to see every degrade-to-unknown decision).
/// Both modes attach `tracing_error::ErrorLayer` so eyre reports carry span
/// traces.
///
/// Subsequent calls are no-ops, which keeps tests that share a process happy.
pub fn init_tracing(environment: &Environment) {
    let is_production = environment.is_production();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_production {
            EnvFilter::new("warn")
        } else {
            EnvFilter::new("info")
        }
    });

    let result = if is_production {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(()) => debug!(?environment, "tracing initialized"),
        Err(_) => debug!("tracing already initialized, skipping"),
    }
}
