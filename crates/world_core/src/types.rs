//! Core identity types shared across the world server.
//!
//! Every region and avatar is identified by a UUID wrapped in a dedicated
//! newtype so the two id spaces cannot be mixed up at compile time. Grid
//! placement gets its own pair of types: [`GridPosition`] for the map
//! coordinates an operator assigns, and [`RegionHandle`] for the packed
//! 64-bit key the simulation layer uses for spatial lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Length of one region edge in meters. Grid coordinates are scaled by this
/// factor before being packed into a [`RegionHandle`].
pub const REGION_EDGE_METERS: u64 = 256;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a region.
///
/// Assigned once when the region is first configured and stable across
/// restarts of the hosting process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId(pub Uuid);

impl RegionId {
    /// Creates a new random region identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a region identifier from an existing UUID string.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RegionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s)
    }
}

/// Unique identifier for an avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvatarId(pub Uuid);

impl AvatarId {
    /// Creates a new random avatar identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an avatar identifier from an existing UUID string.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AvatarId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AvatarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AvatarId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s)
    }
}

// ============================================================================
// Grid Placement
// ============================================================================

/// Location of a region on the world grid, in region units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    /// East-west grid coordinate.
    pub x: u32,
    /// North-south grid coordinate.
    pub y: u32,
}

impl GridPosition {
    /// Creates a grid position from raw coordinates.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Packed 64-bit spatial key derived from a region's grid position.
///
/// The scaled X coordinate occupies the high 32 bits and the scaled Y
/// coordinate the low 32 bits, so handles sort by column first. Two regions
/// at the same grid position always produce the same handle.
///
/// ```
/// use world_core::{GridPosition, RegionHandle};
///
/// let handle = RegionHandle::from_grid(GridPosition::new(1000, 1000));
/// assert_eq!(handle, RegionHandle::from_grid(GridPosition::new(1000, 1000)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionHandle(pub u64);

impl RegionHandle {
    /// Packs scaled grid coordinates into a spatial key.
    pub fn from_grid(position: GridPosition) -> Self {
        let x = position.x as u64 * REGION_EDGE_METERS;
        let y = position.y as u64 * REGION_EDGE_METERS;
        Self((x << 32) | y)
    }
}

impl fmt::Display for RegionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_handle_packs_scaled_coordinates() {
        let handle = RegionHandle::from_grid(GridPosition::new(1000, 1000));
        assert_eq!(handle.0, (256_000u64 << 32) | 256_000);
    }

    #[test]
    fn test_region_handle_is_deterministic_and_order_sensitive() {
        let origin = RegionHandle::from_grid(GridPosition::new(1000, 1000));
        assert_eq!(origin, RegionHandle::from_grid(GridPosition::new(1000, 1000)));
        assert_ne!(origin, RegionHandle::from_grid(GridPosition::new(1000, 1001)));
        assert_ne!(origin, RegionHandle::from_grid(GridPosition::new(1001, 1000)));
        assert_ne!(
            RegionHandle::from_grid(GridPosition::new(1000, 1001)),
            RegionHandle::from_grid(GridPosition::new(1001, 1000)),
        );
    }

    #[test]
    fn test_identifier_newtypes_are_distinct() {
        assert_ne!(RegionId::new(), RegionId::new());
        assert_ne!(AvatarId::new(), AvatarId::new());
    }

    #[test]
    fn test_identifier_display_round_trips() {
        let id = RegionId::new();
        let parsed = RegionId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(RegionId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_grid_position_display() {
        assert_eq!(GridPosition::new(1000, 998).to_string(), "(1000, 998)");
    }
}
