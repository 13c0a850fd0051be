use anchor_lang::prelude::*;

use crate::state::PoolKind;

/// Emitted once when a pool is created
#[event]
pub struct PoolInitialized {
    pub pool: Pubkey,
    pub authority: Pubkey,
    pub kind: PoolKind,
    pub staked_asset: Pubkey,
    pub reward_mint: Pubkey,
    pub start_time: i64,
    pub reward_rate: u64,
    pub reward_cap: u64,
}

/// Weight added to a position, by amount or by item
#[event]
pub struct Staked {
    pub pool: Pubkey,
    pub user: Pubkey,
    pub delta: u64,
    /// Position weight after the stake
    pub weight: u64,
    /// Pool weight after the stake
    pub total_weight: u64,
    pub timestamp: i64,
}

/// Weight removed from a position
#[event]
pub struct Unstaked {
    pub pool: Pubkey,
    pub user: Pubkey,
    pub delta: u64,
    pub weight: u64,
    pub total_weight: u64,
    pub timestamp: i64,
}

/// Only emitted when something was actually paid
#[event]
pub struct RewardClaimed {
    pub pool: Pubkey,
    pub user: Pubkey,
    pub amount: u64,
    pub total_claimed: u64,
    pub timestamp: i64,
}

#[event]
pub struct RewardsFunded {
    pub pool: Pubkey,
    pub funder: Pubkey,
    pub amount: u64,
    /// Reward vault balance after the deposit
    pub vault_balance: u64,
}
