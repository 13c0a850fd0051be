use anchor_lang::prelude::*;
use anchor_spl::{
    metadata::MetadataAccount,
    token::{Mint, Token, TokenAccount},
};

use crate::{
    constants::*,
    error::RewardPoolError,
    events::PoolInitialized,
    log_error,
    state::{is_collection_member, PoolKind, RewardPool},
};

/// Create a reward pool and its reward vault
/// The pool PDA can only be initialized once; a second attempt fails in `init`
#[derive(Accounts)]
#[instruction(pool_id: u64)]
pub struct InitializePool<'info> {
    /// Pays for the accounts and is recorded as the pool authority
    #[account(mut)]
    pub authority: Signer<'info>,

    /// The reward pool account - global accumulator and cap bookkeeping
    /// PDA: ["pool", authority.key(), pool_id]
    /// One authority can run several pools with different IDs
    #[account(
        init,
        payer = authority,
        space = DISCRIMINATOR_SIZE + RewardPool::INIT_SPACE,
        seeds = [POOL_SEED, authority.key().as_ref(), pool_id.to_le_bytes().as_ref()],
        bump
    )]
    pub pool: Account<'info, RewardPool>,

    /// Fungible pools: the staked mint
    /// Fixed-id and item-set pools: the collection mint
    pub staked_asset: Account<'info, Mint>,

    /// The token paid out as rewards
    pub reward_mint: Account<'info, Mint>,

    /// Token account that holds reward tokens for distribution
    /// PDA: ["reward_vault", pool.key()]
    /// Filled through fund_rewards before claims can be paid
    #[account(
        init,
        payer = authority,
        seeds = [REWARD_VAULT_SEED, pool.key().as_ref()],
        bump,
        token::mint = reward_mint,
        token::authority = pool,
    )]
    pub reward_vault: Account<'info, TokenAccount>,

    /// Fixed-id pools only: Metaplex metadata of the id
    /// Must name the id as its mint and carry the verified staked_asset collection
    pub id_metadata: Option<Account<'info, MetadataAccount>>,

    /// Required system programs
    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
    pub rent: Sysvar<'info, Rent>,
}

impl<'info> InitializePool<'info> {
    /// Initialize the reward pool with the provided parameters
    pub fn initialize_pool(
        &mut self,
        pool_id: u64,
        kind: PoolKind,
        start_time: i64,
        reward_rate: u64,
        reward_cap: u64,
        bumps: &InitializePoolBumps,
    ) -> Result<()> {
        // Get current timestamp for pool creation
        let current_time = Clock::get()?.unix_timestamp;

        // Validate input parameters before proceeding
        validate_pool_params(kind, start_time, reward_rate, reward_cap, current_time)?;

        // Fixed-id pools: the id has to belong to the staked collection
        if let PoolKind::FixedId { id } = kind {
            let metadata = self.id_metadata.as_ref().map(|metadata| {
                let member_of = metadata
                    .collection
                    .as_ref()
                    .map(|collection| (collection.key, collection.verified));
                (metadata.mint, member_of)
            });
            check_fixed_id_metadata(&id, &self.staked_asset.key(), metadata)?;
        }

        // A start time in the past means "start now"
        let start_time = start_time.max(current_time);

        let pool = &mut self.pool;

        // Set pool authority and asset configuration
        pool.authority = self.authority.key();
        pool.pool_id = pool_id;
        pool.kind = kind;
        pool.staked_asset = self.staked_asset.key();
        pool.reward_mint = self.reward_mint.key();
        pool.reward_vault = self.reward_vault.key();

        // Set the reward stream
        pool.start_time = start_time;
        pool.reward_rate = reward_rate;
        pool.reward_cap = reward_cap;

        // Initialize accrual state; the clock starts at start_time
        pool.total_weight = 0;
        pool.total_distributed = 0;
        pool.acc_per_weight = 0;
        pool.last_update_time = start_time;

        pool.created_at = current_time;
        pool.bump = bumps.pool;

        // Log pool creation for monitoring and debugging
        msg!(
            "Reward pool initialized: ID={}, Authority={}, Kind={:?}, StakedAsset={}, RewardMint={}",
            pool_id,
            pool.authority,
            pool.kind,
            pool.staked_asset,
            pool.reward_mint
        );

        msg!(
            "Pool parameters: StartTime={}, RewardRate={}/s, RewardCap={}, Runway={} seconds",
            pool.start_time,
            pool.reward_rate,
            pool.reward_cap,
            cap_runway_seconds(pool.reward_cap, pool.reward_rate)
        );

        emit!(PoolInitialized {
            pool: pool.key(),
            authority: pool.authority,
            kind: pool.kind,
            staked_asset: pool.staked_asset,
            reward_mint: pool.reward_mint,
            start_time: pool.start_time,
            reward_rate: pool.reward_rate,
            reward_cap: pool.reward_cap,
        });

        Ok(())
    }
}

/// Tie a fixed id to the pool collection
/// `metadata` is the id metadata's (mint, (collection key, verified)) view, if supplied
pub fn check_fixed_id_metadata(
    id: &Pubkey,
    collection: &Pubkey,
    metadata: Option<(Pubkey, Option<(Pubkey, bool)>)>,
) -> Result<()> {
    let (mint, member_of) = metadata.ok_or(RewardPoolError::InvalidFixedId)?;

    if mint != *id {
        msg!("Metadata describes mint {}, not fixed id {}", mint, id);
        return Err(RewardPoolError::InvalidFixedId.into());
    }

    if !is_collection_member(member_of, collection) {
        let error = RewardPoolError::ItemNotInCollection;
        log_error!(error, "fixed id collection check");
        return Err(error.into());
    }

    Ok(())
}

/// Check the pool parameters before anything is written
pub fn validate_pool_params(
    kind: PoolKind,
    start_time: i64,
    reward_rate: u64,
    reward_cap: u64,
    current_time: i64,
) -> Result<()> {
    if !is_valid_reward_rate(reward_rate) {
        msg!(
            "Invalid reward rate: {}. Must be at least {}",
            reward_rate,
            MIN_REWARD_RATE
        );
        return Err(RewardPoolError::InvalidRewardRate.into());
    }

    if !is_valid_reward_cap(reward_cap) {
        msg!(
            "Invalid reward cap: {}. Must be at least {}",
            reward_cap,
            MIN_REWARD_CAP
        );
        return Err(RewardPoolError::InvalidRewardCap.into());
    }

    if !is_valid_start_time(start_time, current_time) {
        let error = RewardPoolError::InvalidStartTime;
        log_error!(error, "start time beyond the scheduling window");
        return Err(error.into());
    }

    if let PoolKind::FixedId { id } = kind {
        if id == Pubkey::default() {
            return Err(RewardPoolError::InvalidFixedId.into());
        }
    }

    Ok(())
}
