use anchor_lang::prelude::*;

use crate::{
    constants::{POOL_SEED, REWARD_PRECISION},
    error::{safe_add_u128, safe_add_u64, safe_div_u128, safe_mul_u128, safe_sub_u64, to_u64},
};

/// What a pool counts as weight
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum PoolKind {
    /// Weight is the staked amount of the `staked_asset` mint
    Fungible,
    /// Weight is the staked amount of one predetermined semi-fungible id
    FixedId { id: Pubkey },
    /// Weight is the number of distinct collection items staked
    ItemSet,
}

impl PoolKind {
    /// Fungible and fixed-id pools are driven by `stake`/`unstake` amounts
    pub fn is_amount_weighted(&self) -> bool {
        !matches!(self, PoolKind::ItemSet)
    }
}

/// The reward pool: global accumulator, timing and cap bookkeeping
/// One per deployment, created once and never reset
#[account]
#[derive(InitSpace)]
pub struct RewardPool {
    /// Authority that created the pool
    pub authority: Pubkey,

    /// Caller-chosen id, part of the PDA seeds
    pub pool_id: u64,

    /// Which weight source this pool uses
    pub kind: PoolKind,

    /// Fungible pools: the staked mint. Fixed-id and item-set pools: the collection
    pub staked_asset: Pubkey,

    /// The token paid out as rewards
    pub reward_mint: Pubkey,

    /// Pool-owned token account holding reward tokens for distribution
    pub reward_vault: Pubkey,

    /// No accrual happens before this instant
    pub start_time: i64,

    /// Reward units emitted per second, split across all staked weight
    pub reward_rate: u64,

    /// Lifetime maximum the pool will ever credit
    pub reward_cap: u64,

    /// Sum of all positions' weight
    pub total_weight: u64,

    /// Reward credited into the accumulator so far (never above `reward_cap`)
    pub total_distributed: u64,

    /// Accumulated reward per unit of weight, scaled by REWARD_PRECISION
    pub acc_per_weight: u128,

    /// Instant the accumulator was last advanced
    pub last_update_time: i64,

    /// When this pool was created
    pub created_at: i64,

    /// Bump seed for PDA derivation
    pub bump: u8,
}

/// Result of advancing (or previewing) the accumulator to an instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    pub acc_per_weight: u128,
    pub total_distributed: u64,
    /// Reward added by this step
    pub due: u64,
    /// Reward that was emitted while nobody was staked and is gone for good
    pub forfeited: u64,
    pub update_time: i64,
}

impl RewardPool {
    /// The accrual clock never runs before `start_time`
    pub fn accrual_time(&self, now: i64) -> i64 {
        now.max(self.start_time)
    }

    /// Seconds not yet folded into the accumulator
    pub fn elapsed(&self, now: i64) -> u64 {
        let elapsed = self.accrual_time(now).saturating_sub(self.last_update_time);
        u64::try_from(elapsed).unwrap_or(0)
    }

    pub fn remaining_rewards(&self) -> u64 {
        self.reward_cap.saturating_sub(self.total_distributed)
    }

    pub fn is_exhausted(&self) -> bool {
        self.total_distributed >= self.reward_cap
    }

    /// Compute the accumulator as of `now` without writing anything
    pub fn project(&self, now: i64) -> Result<Accrual> {
        let update_time = self.accrual_time(now).max(self.last_update_time);
        let mut accrual = Accrual {
            acc_per_weight: self.acc_per_weight,
            total_distributed: self.total_distributed,
            due: 0,
            forfeited: 0,
            update_time,
        };

        let elapsed = self.elapsed(now);
        if elapsed == 0 {
            return Ok(accrual);
        }

        // Emission for the interval, clipped to what the cap still allows
        let emitted = safe_mul_u128(elapsed as u128, self.reward_rate as u128)?;
        let due = to_u64(emitted.min(self.remaining_rewards() as u128))?;

        if self.total_weight == 0 {
            // Nobody to credit: the interval is skipped, not banked
            accrual.forfeited = due;
            return Ok(accrual);
        }

        let increment = safe_div_u128(
            safe_mul_u128(due as u128, REWARD_PRECISION)?,
            self.total_weight as u128,
        )?;

        accrual.acc_per_weight = safe_add_u128(self.acc_per_weight, increment)?;
        accrual.total_distributed = safe_add_u64(self.total_distributed, due)?;
        accrual.due = due;

        Ok(accrual)
    }

    /// Advance the accumulator to `now` ("touch pool")
    /// Must run before anything reads `acc_per_weight` or changes `total_weight`
    pub fn touch(&mut self, now: i64) -> Result<Accrual> {
        let accrual = self.project(now)?;

        self.acc_per_weight = accrual.acc_per_weight;
        self.total_distributed = accrual.total_distributed;
        self.last_update_time = accrual.update_time;

        Ok(accrual)
    }

    pub fn add_weight(&mut self, delta: u64) -> Result<()> {
        self.total_weight = safe_add_u64(self.total_weight, delta)?;
        Ok(())
    }

    pub fn remove_weight(&mut self, delta: u64) -> Result<()> {
        self.total_weight = safe_sub_u64(self.total_weight, delta)?;
        Ok(())
    }

    /// Run `f` with the signer seeds of the pool PDA
    pub fn with_signer_seeds<R>(&self, f: impl FnOnce(&[&[&[u8]]]) -> R) -> R {
        let pool_id = self.pool_id.to_le_bytes();
        let bump = [self.bump];
        let seeds: [&[u8]; 4] = [POOL_SEED, self.authority.as_ref(), &pool_id, &bump];
        f(&[&seeds[..]])
    }

    /// Get pool statistics for display
    pub fn get_stats(&self) -> (u64, u64, u64, u128) {
        (
            self.total_weight,
            self.total_distributed,
            self.remaining_rewards(),
            self.acc_per_weight,
        )
    }
}
