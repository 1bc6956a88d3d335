//! Estate policy settings attached lazily to a region descriptor.

use serde::{Deserialize, Serialize};

/// Policy knobs for the estate a region belongs to.
///
/// A descriptor does not populate these at load time. The first caller that
/// asks for them receives this default set, which then stays pinned to the
/// descriptor for its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstateSettings {
    pub estate_id: u32,
    pub estate_name: String,
    pub parent_estate_id: u32,
    /// Maximum number of concurrent root agents allowed into the region.
    pub max_agents: u32,
    pub billable_factor: f32,
    pub object_bonus_factor: f32,
    pub sun_hour: f32,
    pub terrain_raise_limit: f32,
    pub terrain_lower_limit: f32,
    pub use_global_time: bool,
    pub fixed_sun: bool,
    /// Height of the water plane in meters.
    pub water_height: f32,
    pub price_per_meter: u32,
    pub redirect_grid_x: u32,
    pub redirect_grid_y: u32,
}

impl Default for EstateSettings {
    fn default() -> Self {
        Self {
            estate_id: 100,
            estate_name: "My Estate".to_string(),
            parent_estate_id: 1,
            max_agents: 40,
            billable_factor: 0.0,
            object_bonus_factor: 1.0,
            sun_hour: 0.0,
            terrain_raise_limit: 100.0,
            terrain_lower_limit: -100.0,
            use_global_time: true,
            fixed_sun: false,
            water_height: 20.0,
            price_per_meter: 1,
            redirect_grid_x: 0,
            redirect_grid_y: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_estate_limits() {
        let estate = EstateSettings::default();
        assert_eq!(estate.max_agents, 40);
        assert_eq!(estate.water_height, 20.0);
        assert_eq!(estate.estate_id, 100);
        assert!(estate.use_global_time);
        assert!(!estate.fixed_sun);
    }

    #[test]
    fn test_estate_settings_serialize() {
        let estate = EstateSettings::default();
        let json = serde_json::to_string(&estate).unwrap();
        let decoded: EstateSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, estate);
    }
}
