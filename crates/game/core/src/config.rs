/// Tunable combat constants shared by every cast in a region.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// Damage multiplier applied when a hit turns critical.
    pub critical_multiplier: f32,
    /// Upper bound on effective critical chance, in percent.
    pub critical_chance_cap: f32,
    /// Floor applied after defense and protection for hits that carried
    /// any damage at all.
    pub min_hit_damage: f32,
    /// Base seed mixed into every roll.
    pub game_seed: u64,
}

impl CombatConfig {
    pub const DEFAULT_CRITICAL_MULTIPLIER: f32 = 1.5;
    pub const DEFAULT_CRITICAL_CHANCE_CAP: f32 = 30.0;
    pub const DEFAULT_MIN_HIT_DAMAGE: f32 = 1.0;

    pub fn new() -> Self {
        Self {
            critical_multiplier: Self::DEFAULT_CRITICAL_MULTIPLIER,
            critical_chance_cap: Self::DEFAULT_CRITICAL_CHANCE_CAP,
            min_hit_damage: Self::DEFAULT_MIN_HIT_DAMAGE,
            game_seed: 0,
        }
    }

    pub fn with_game_seed(mut self, game_seed: u64) -> Self {
        self.game_seed = game_seed;
        self
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
