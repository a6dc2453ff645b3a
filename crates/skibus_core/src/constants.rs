//! # Run Limits
//!
//! Valid ranges for every configuration value. A value outside its range is
//! rejected before any shared state exists.

// =============================================================================
// POPULATION
// =============================================================================

/// Smallest accepted skier count.
pub const MIN_SKIERS: u32 = 1;

/// Largest accepted skier count.
pub const MAX_SKIERS: u32 = 19_999;

// =============================================================================
// ROUTE
// =============================================================================

/// Smallest accepted number of boarding stops.
pub const MIN_STOPS: u8 = 1;

/// Largest accepted number of boarding stops.
pub const MAX_STOPS: u8 = 10;

/// Smallest accepted bus capacity.
pub const MIN_CAPACITY: u16 = 10;

/// Largest accepted bus capacity.
pub const MAX_CAPACITY: u16 = 100;

// =============================================================================
// TIMING (microseconds)
// =============================================================================

/// Upper bound for the longest walk a skier may take to its stop.
pub const MAX_SKIER_WAIT_US: u32 = 10_000;

/// Upper bound for the longest drive between two stops.
pub const MAX_BUS_DRIVE_US: u32 = 1_000;

// =============================================================================
// OUTPUT
// =============================================================================

/// Log file written when no `--output` is given.
pub const DEFAULT_OUTPUT: &str = "skibus.out";

/// Number of positional values the CLI expects.
pub const POSITIONAL_ARGS: usize = 5;
