use std::time::Duration;

/// How turns of computer-controlled squads are hosted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AiTurnPolicy {
    /// AI squads pass their turn after [`BattleConfig::auto_skip_delay`].
    #[default]
    AutoSkip,
    /// AI squads attack a target chosen by the AI picker.
    Attack,
}

/// Battle configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleConfig {
    /// Real-time delay before an auto-skip action resolves.
    pub auto_skip_delay: Duration,
    /// When true, attacks stay suspended until the receiver acknowledges the
    /// damage presentation step.
    pub await_damage_ack: bool,
    pub ai_turn_policy: AiTurnPolicy,
    /// Number of columns per side on the reference formation grid.
    pub grid_columns: u8,
    /// Rounds after which an undecided battle ends as a flee. Zero disables
    /// the limit.
    pub max_rounds: u32,
}

impl BattleConfig {
    // ===== compile-time constants used as type parameters =====
    pub const MAX_SQUADS_PER_SIDE: usize = 8;
    pub const MAX_STAT_DELTAS: usize = 4;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_AUTO_SKIP_DELAY: Duration = Duration::from_millis(600);
    pub const DEFAULT_GRID_COLUMNS: u8 = 3;
    pub const DEFAULT_MAX_ROUNDS: u32 = 200;

    pub fn new() -> Self {
        Self {
            auto_skip_delay: Self::DEFAULT_AUTO_SKIP_DELAY,
            await_damage_ack: true,
            ai_turn_policy: AiTurnPolicy::AutoSkip,
            grid_columns: Self::DEFAULT_GRID_COLUMNS,
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_ai_turn_policy(mut self, policy: AiTurnPolicy) -> Self {
        self.ai_turn_policy = policy;
        self
    }

    pub fn with_damage_ack(mut self, await_damage_ack: bool) -> Self {
        self.await_damage_ack = await_damage_ack;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_auto_skip_delay(mut self, delay: Duration) -> Self {
        self.auto_skip_delay = delay;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
