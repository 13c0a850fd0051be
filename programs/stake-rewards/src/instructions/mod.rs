// Export all instruction modules

pub mod claim_rewards;
pub mod fund_rewards;
pub mod get_pending_reward;
pub mod initialize_pool;
pub mod stake;
pub mod stake_item;
pub mod unstake;
pub mod unstake_item;
pub mod update_pool;

// Re-export the instruction structs for easy access
pub use claim_rewards::*;
pub use fund_rewards::*;
pub use get_pending_reward::*;
pub use initialize_pool::*;
pub use stake::*;
pub use stake_item::*;
pub use unstake::*;
pub use unstake_item::*;
pub use update_pool::*;
