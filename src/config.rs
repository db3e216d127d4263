//! Driver-argument boundary parsing.
//!
//! A comma-separated `key=value` driver argument string is the CLI
//! surface; CLI parsing proper is out of scope, but the values it produces
//! (`legacy_capa`, `sym_enq_threshold`) are consumed by queue-pair setup.
//! A small, dependency-free parser at the edge rather than a full
//! argument-parsing crate, since this is a single comma-separated string,
//! not a program's argv.

use crate::error::{QatError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct DriverArgs {
    /// Gates legacy algorithms.
    pub legacy_capa: bool,
    /// Tuning knob for symmetric enqueue admission; `None` means "use the
    /// engine default".
    pub sym_enq_threshold: Option<u32>,
}

impl DriverArgs {
    /// Parse a comma-separated `key=value` driver argument string, e.g.
    /// `"legacy_capa=1,sym_enq_threshold=32"`. Unknown keys are ignored
    /// (firmware/driver argument strings commonly carry keys this core
    /// does not consume).
    pub fn parse(arg_string: &str) -> Result<Self> {
        let mut args = Self::default();

        for token in arg_string.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| QatError::invalid(format!("malformed driver arg token: {token:?}")))?;

            match key {
                "legacy_capa" => {
                    args.legacy_capa = matches!(value, "1" | "true" | "yes");
                }
                "sym_enq_threshold" => {
                    let parsed = value
                        .parse::<u32>()
                        .map_err(|_| QatError::invalid(format!("sym_enq_threshold not a number: {value:?}")))?;
                    args.sym_enq_threshold = Some(parsed);
                }
                _ => {}
            }
        }

        Ok(args)
    }
}
