use anchor_lang::prelude::*;

use crate::{
    accrual::{self, RewardQuote},
    constants::POSITION_SEED,
    state::{RewardPool, UserPosition},
};

/// Read-only quote of what `claim_rewards` would pay right now
/// Nothing is written; the answer travels back as return data
#[derive(Accounts)]
pub struct GetPendingReward<'info> {
    /// The pool being quoted
    pub pool: Account<'info, RewardPool>,

    /// CHECK: Only used to derive the position address
    pub user: UncheckedAccount<'info>,

    /// User's position, which may never have been opened
    /// PDA: ["position", pool.key(), user.key()]
    /// CHECK: Address is pinned by the seeds; contents are decoded in the handler
    #[account(
        seeds = [POSITION_SEED, pool.key().as_ref(), user.key().as_ref()],
        bump,
    )]
    pub position: UncheckedAccount<'info>,
}

impl<'info> GetPendingReward<'info> {
    /// Quote the position; an address that never staked gets zeros
    pub fn get_pending_reward(&self) -> Result<RewardQuote> {
        let current_time = Clock::get()?.unix_timestamp;

        // Decode the position only if this program ever created it
        let data = self.position.try_borrow_data()?;
        let position = load_position(self.position.owner, &data)?;

        let quote = quote_position(&self.pool, position.as_ref(), current_time)?;

        msg!(
            "Pending reward for {}: pending={}, claimable={}",
            self.user.key(),
            quote.pending,
            quote.claimable
        );

        Ok(quote)
    }
}

/// Position behind an account, or None if the account was never initialized
pub fn load_position(owner: &Pubkey, data: &[u8]) -> Result<Option<UserPosition>> {
    if owner != &crate::ID || data.is_empty() {
        return Ok(None);
    }
    Ok(Some(UserPosition::try_deserialize(&mut &data[..])?))
}

/// Quote for an optional position
pub fn quote_position(
    pool: &RewardPool,
    position: Option<&UserPosition>,
    now: i64,
) -> Result<RewardQuote> {
    match position {
        Some(position) => accrual::quote(pool, position, now),
        None => Ok(RewardQuote {
            pending: 0,
            claimable: 0,
        }),
    }
}
