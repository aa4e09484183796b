use crate::engine::san::PromotionPolicy;

/// Engine configuration parsed from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// How a pawn move to the last rank without a named piece is treated.
    pub promotion: PromotionPolicy,
    /// Upper bound on out-of-order moves a timeline holds while waiting for a gap to fill.
    pub max_pending_appends: usize,
}

impl EngineConfig {
    pub const DEFAULT_MAX_PENDING_APPENDS: usize = 256;

    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`], reading values through `lookup`.
    /// Unparseable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        EngineConfig {
            promotion: lookup("CHESS_PROMOTION_POLICY")
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            max_pending_appends: lookup("CHESS_MAX_PENDING_APPENDS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(Self::DEFAULT_MAX_PENDING_APPENDS),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            promotion: PromotionPolicy::Explicit,
            max_pending_appends: Self::DEFAULT_MAX_PENDING_APPENDS,
        }
    }
}
