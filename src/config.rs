//! Harness configuration.
//!
//! All process-wide knobs live in one immutable [`HarnessConfig`] populated
//! at startup and passed by reference into the planner, generator and
//! verifier. Values come from environment variables:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `SCATTERCHECK_DEBUG` | `debug` verbosity (0, 1, 2) | 0 |
//! | `SCATTERCHECK_DISP_STRIDE` | gap size for skip mode | 2 |
//! | `SCATTERCHECK_NONBLOCKING` | exercise nonblocking cases | true |
//! | `SCATTERCHECK_COUNT` | target elements per rank | 4096 |
//! | `SCATTERCHECK_UNIFORM` | uniform-count target (total) | unset |

use std::env;
use std::str::FromStr;

/// Immutable per-process configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// This rank's ordinal in `[0, world_size)`.
    pub world_rank: i32,
    /// Number of cooperating ranks.
    pub world_size: i32,
    /// Diagnostic verbosity: 1 logs planner rows, 2 logs per-element checks.
    pub debug: u8,
    /// Gap size (in elements) preceding every slice in skip mode.
    pub disp_stride: usize,
    /// Whether the suite also exercises the nonblocking invocation.
    pub allow_nonblocked: bool,
    /// Total integer elements for the packed case.
    pub total_int: usize,
    /// Total complex elements for the packed case.
    pub total_complex: usize,
    /// When set, totals derive from the uniform count calculator instead.
    pub uniform_count: Option<usize>,
}

impl HarnessConfig {
    /// Defaults for a world of `world_size` ranks, no environment consulted.
    pub fn new(world_rank: i32, world_size: i32) -> Self {
        let per_rank = 4096usize;
        HarnessConfig {
            world_rank,
            world_size,
            debug: 0,
            disp_stride: 2,
            allow_nonblocked: true,
            total_int: per_rank * world_size as usize,
            total_complex: per_rank * world_size as usize / 4,
            uniform_count: None,
        }
    }

    /// Configuration from `SCATTERCHECK_*` environment variables.
    pub fn from_env(world_rank: i32, world_size: i32) -> Self {
        let mut cfg = HarnessConfig::new(world_rank, world_size);
        cfg.debug = parse_or(env::var("SCATTERCHECK_DEBUG").ok().as_deref(), cfg.debug);
        cfg.disp_stride = parse_or(
            env::var("SCATTERCHECK_DISP_STRIDE").ok().as_deref(),
            cfg.disp_stride,
        );
        cfg.allow_nonblocked = parse_flag(
            env::var("SCATTERCHECK_NONBLOCKING").ok().as_deref(),
            cfg.allow_nonblocked,
        );
        if let Some(per_rank) = env::var("SCATTERCHECK_COUNT")
            .ok()
            .as_deref()
            .and_then(parse_opt::<usize>)
        {
            cfg.total_int = per_rank * world_size as usize;
            cfg.total_complex = (per_rank * world_size as usize / 4).max(world_size as usize);
        }
        cfg.uniform_count = env::var("SCATTERCHECK_UNIFORM")
            .ok()
            .as_deref()
            .and_then(parse_opt);
        cfg
    }
}

fn parse_opt<T: FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

fn parse_or<T: FromStr>(value: Option<&str>, default: T) -> T {
    value.and_then(parse_opt).unwrap_or(default)
}

/// Boolean flag parsing: `0`, `false`, `no`, `off` disable; `1`, `true`,
/// `yes`, `on` enable; anything else keeps the default.
fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = HarnessConfig::new(1, 4);
        assert_eq!(cfg.world_rank, 1);
        assert_eq!(cfg.world_size, 4);
        assert_eq!(cfg.disp_stride, 2);
        assert!(cfg.allow_nonblocked);
        assert_eq!(cfg.total_int, 4096 * 4);
        assert!(cfg.uniform_count.is_none());
    }

    #[test]
    fn flag_parsing() {
        assert!(!parse_flag(Some("0"), true));
        assert!(!parse_flag(Some("no"), true));
        assert!(!parse_flag(Some("OFF"), true));
        assert!(parse_flag(Some("1"), false));
        assert!(parse_flag(Some("yes"), false));
        assert!(parse_flag(Some("garbage"), true));
        assert!(parse_flag(None, true));
        assert!(!parse_flag(None, false));
    }

    /// Only this test touches `SCATTERCHECK_*` variables, so it cannot race
    /// other tests reading the environment.
    #[test]
    fn count_env_var_scales_totals() {
        env::set_var("SCATTERCHECK_COUNT", "100");
        let cfg = HarnessConfig::from_env(0, 4);
        env::remove_var("SCATTERCHECK_COUNT");
        assert_eq!(cfg.total_int, 400);
        assert_eq!(cfg.total_complex, 100);
    }

    #[test]
    fn numeric_parsing_falls_back_on_garbage() {
        assert_eq!(parse_or(Some("7"), 2usize), 7);
        assert_eq!(parse_or(Some("x"), 2usize), 2);
        assert_eq!(parse_or(None, 2usize), 2);
        assert_eq!(parse_or(Some(" 3 "), 0u8), 3);
    }
}
