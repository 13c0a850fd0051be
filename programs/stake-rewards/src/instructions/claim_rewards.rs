use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{self, Mint, Token, TokenAccount, Transfer},
};

use crate::{
    accrual,
    constants::*,
    error::RewardPoolError,
    events::RewardClaimed,
    state::{RewardPool, UserPosition},
};

/// Pay out everything the caller has earned so far
/// Works the same for every pool kind and leaves the staked weight untouched
#[derive(Accounts)]
pub struct ClaimRewards<'info> {
    /// The user claiming rewards
    /// Must be the owner of the position
    #[account(mut)]
    pub user: Signer<'info>,

    /// The pool paying the rewards; settled before the payout
    #[account(mut)]
    pub pool: Account<'info, RewardPool>,

    /// User's position, which must belong to the signer
    #[account(
        mut,
        seeds = [POSITION_SEED, pool.key().as_ref(), user.key().as_ref()],
        bump = position.bump,
        constraint = position.owner == user.key() @ RewardPoolError::InvalidAccount,
    )]
    pub position: Account<'info, UserPosition>,

    /// The reward token mint
    #[account(
        constraint = reward_mint.key() == pool.reward_mint @ RewardPoolError::InvalidTokenMint,
    )]
    pub reward_mint: Account<'info, Mint>,

    /// Pool vault containing reward tokens
    #[account(
        mut,
        constraint = reward_vault.key() == pool.reward_vault @ RewardPoolError::InvalidTokenAccount,
    )]
    pub reward_vault: Account<'info, TokenAccount>,

    /// User's token account to receive the rewards
    #[account(
        init_if_needed,
        payer = user,
        associated_token::mint = reward_mint,
        associated_token::authority = user,
    )]
    pub user_reward_account: Account<'info, TokenAccount>,

    /// Required system programs
    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
}

impl<'info> ClaimRewards<'info> {
    /// Execute the claim operation
    pub fn claim_rewards(&mut self) -> Result<()> {
        let current_time = Clock::get()?.unix_timestamp;

        // Settle the position and take everything earned but unpaid
        let payable = accrual::claim(&mut self.pool, &mut self.position, current_time)?;

        // Nothing earned yet is not an error
        if payable == 0 {
            msg!("No rewards to claim");
            return Ok(());
        }

        // Transfer rewards from the vault to the user
        self.transfer_reward_tokens(payable)?;

        // Log the claim event
        self.log_claim_event(payable, current_time);

        Ok(())
    }

    /// Pay rewards out of the vault, signed by the pool PDA
    fn transfer_reward_tokens(&self, amount: u64) -> Result<()> {
        if self.reward_vault.amount < amount {
            msg!(
                "Insufficient reward vault balance: has {}, needs {}",
                self.reward_vault.amount,
                amount
            );
            return Err(RewardPoolError::InsufficientRewardTokens.into());
        }

        // Pool PDA signs for the vault
        self.pool.with_signer_seeds(|signer_seeds| {
            let transfer_ctx = CpiContext::new_with_signer(
                self.token_program.to_account_info(),
                Transfer {
                    from: self.reward_vault.to_account_info(),
                    to: self.user_reward_account.to_account_info(),
                    authority: self.pool.to_account_info(),
                },
                signer_seeds,
            );
            token::transfer(transfer_ctx, amount)
        })?;

        msg!("Transferred {} reward tokens to user", amount);

        Ok(())
    }

    fn log_claim_event(&self, claimed_amount: u64, current_time: i64) {
        let pool = &self.pool;
        let position = &self.position;

        msg!(
            "CLAIM EVENT: user={}, pool={}, claimed_amount={}, weight={}, total_claimed={}",
            self.user.key(),
            pool.key(),
            claimed_amount,
            position.weight,
            position.total_claimed
        );

        msg!(
            "Pool status: distributed={}/{}, remaining={}",
            pool.total_distributed,
            pool.reward_cap,
            pool.remaining_rewards()
        );

        emit!(RewardClaimed {
            pool: pool.key(),
            user: self.user.key(),
            amount: claimed_amount,
            total_claimed: position.total_claimed,
            timestamp: current_time,
        });
    }
}
