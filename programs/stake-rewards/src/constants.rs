// PDA Seeds for deterministic address generation

/// Seed for RewardPool PDAs: ["pool", authority.key(), pool_id]
/// One authority can run several pools side by side
pub const POOL_SEED: &[u8] = b"pool";

/// Seed for UserPosition PDAs: ["position", pool.key(), user.key()]
/// One position per depositor per pool
pub const POSITION_SEED: &[u8] = b"position";

/// Seed for the token account holding staked amounts: ["stake_vault", pool.key()]
/// Kept apart from the reward vault even when both use the same mint
pub const STAKE_VAULT_SEED: &[u8] = b"stake_vault";

/// Seed for the token account holding reward tokens: ["reward_vault", pool.key()]
pub const REWARD_VAULT_SEED: &[u8] = b"reward_vault";

/// Seed for StakedItem PDAs: ["item", pool.key(), item_mint.key()]
/// Records which depositor an item currently belongs to
pub const ITEM_SEED: &[u8] = b"item";

// Precision and Mathematical Constants

/// Scale of `acc_per_weight` (1e18)
/// Keeps small rates over large total weights from truncating to zero
pub const REWARD_PRECISION: u128 = 1_000_000_000_000_000_000;

// Pool Configuration Limits

/// Smallest accepted reward rate (reward base units per second)
pub const MIN_REWARD_RATE: u64 = 1;

/// Smallest accepted lifetime reward cap
pub const MIN_REWARD_CAP: u64 = 1;

/// How far in the future a pool may schedule its start (365 days)
pub const MAX_START_DELAY: i64 = 365 * 24 * 60 * 60;

/// Maximum number of items one position can hold in an id-set pool
pub const MAX_HELD_ITEMS: usize = 32;

// Account Space Constants

/// Anchor discriminator size (8 bytes)
pub const DISCRIMINATOR_SIZE: usize = 8;

// Utility Functions for Constants

/// Check if a reward rate is valid
pub fn is_valid_reward_rate(rate: u64) -> bool {
    rate >= MIN_REWARD_RATE
}

/// Check if a reward cap is valid
/// A cap below one second of emission is allowed; the stream then ends in its first second
pub fn is_valid_reward_cap(cap: u64) -> bool {
    cap >= MIN_REWARD_CAP
}

/// Check if a requested start time is acceptable relative to `now`
/// Past start times are fine: the pool then starts at creation
pub fn is_valid_start_time(start_time: i64, now: i64) -> bool {
    start_time <= now.saturating_add(MAX_START_DELAY)
}

/// Seconds of continuous emission until the cap is spent
pub fn cap_runway_seconds(reward_cap: u64, reward_rate: u64) -> u64 {
    reward_cap.checked_div(reward_rate).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_functions() {
        // Reward rate validation
        assert!(is_valid_reward_rate(MIN_REWARD_RATE));
        assert!(!is_valid_reward_rate(0));

        // Cap validation
        assert!(is_valid_reward_cap(MIN_REWARD_CAP));
        assert!(!is_valid_reward_cap(0));

        // Start time validation
        let now = 1_700_000_000;
        assert!(is_valid_start_time(0, now));
        assert!(is_valid_start_time(now + MAX_START_DELAY, now));
        assert!(!is_valid_start_time(now + MAX_START_DELAY + 1, now));
    }

    #[test]
    fn test_cap_runway() {
        assert_eq!(cap_runway_seconds(5_000, 1_000), 5);
        assert_eq!(cap_runway_seconds(5_500, 1_000), 5);
        assert_eq!(cap_runway_seconds(5_000, 0), 0);
    }
}
