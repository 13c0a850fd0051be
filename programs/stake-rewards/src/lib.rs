use anchor_lang::prelude::*;

// Import our modules
pub mod accrual;
pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod state;

// Import instruction handlers
use accrual::RewardQuote;
use instructions::*;
use state::PoolKind;

declare_id!("2SdUJh7xTuZi9eCMyLwrkW6yUSPB6zcF9FKNu1S2f8ky");

#[program]
pub mod stake_rewards {
    use super::*;

    /// Create a reward pool with a fixed per-second rate and lifetime cap
    /// A start time in the past starts the pool immediately
    pub fn initialize_pool(
        ctx: Context<InitializePool>,
        pool_id: u64,
        kind: PoolKind,
        start_time: i64,
        reward_rate: u64,
        reward_cap: u64,
    ) -> Result<()> {
        ctx.accounts.initialize_pool(
            pool_id,
            kind,
            start_time,
            reward_rate,
            reward_cap,
            &ctx.bumps,
        )
    }

    /// Stake an amount into a fungible or fixed-id pool
    pub fn stake(ctx: Context<Stake>, amount: u64) -> Result<()> {
        ctx.accounts.stake(amount, &ctx.bumps)
    }

    /// Withdraw part or all of a staked amount
    pub fn unstake(ctx: Context<Unstake>, amount: u64) -> Result<()> {
        ctx.accounts.unstake(amount)
    }

    /// Deposit one collection item into an id-set pool
    pub fn stake_item(ctx: Context<StakeItem>) -> Result<()> {
        ctx.accounts.stake_item(&ctx.bumps)
    }

    /// Withdraw one previously deposited item
    pub fn unstake_item(ctx: Context<UnstakeItem>) -> Result<()> {
        ctx.accounts.unstake_item(&ctx.bumps)
    }

    /// Claim accumulated rewards without touching the staked weight
    pub fn claim_rewards(ctx: Context<ClaimRewards>) -> Result<()> {
        ctx.accounts.claim_rewards()
    }

    /// Quote pending and claimable reward for a position
    pub fn get_pending_reward(ctx: Context<GetPendingReward>) -> Result<RewardQuote> {
        ctx.accounts.get_pending_reward()
    }

    /// Advance the pool accumulator; callable by anyone
    pub fn update_pool(ctx: Context<UpdatePool>) -> Result<()> {
        ctx.accounts.update_pool()
    }

    /// Deposit reward tokens into the pool's reward vault
    pub fn fund_rewards(ctx: Context<FundRewards>, amount: u64) -> Result<()> {
        ctx.accounts.fund_rewards(amount)
    }
}
