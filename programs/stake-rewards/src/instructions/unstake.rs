use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{self, Mint, Token, TokenAccount, Transfer},
};

use crate::{
    accrual::{self, AmountDeposit, AmountWeight, WeightChange},
    constants::*,
    error::RewardPoolError,
    events::Unstaked,
    state::{RewardPool, UserPosition},
};

/// Withdraw part or all of a staked amount
/// The position stays open so its lifetime totals remain readable
#[derive(Accounts)]
pub struct Unstake<'info> {
    /// The user who is unstaking tokens
    /// Must be the owner of the position
    #[account(mut)]
    pub user: Signer<'info>,

    /// The pool to unstake from; only fungible and fixed-id pools take amounts
    #[account(
        mut,
        constraint = pool.kind.is_amount_weighted() @ RewardPoolError::WrongPoolKind,
    )]
    pub pool: Account<'info, RewardPool>,

    /// User's position, which must belong to the signer
    #[account(
        mut,
        seeds = [POSITION_SEED, pool.key().as_ref(), user.key().as_ref()],
        bump = position.bump,
        constraint = position.owner == user.key() @ RewardPoolError::InvalidAccount,
    )]
    pub position: Account<'info, UserPosition>,

    /// The staked token being withdrawn
    pub stake_mint: Account<'info, Mint>,

    /// User's token account to receive the withdrawn tokens
    /// Recreated if the user closed it while staked
    #[account(
        init_if_needed,
        payer = user,
        associated_token::mint = stake_mint,
        associated_token::authority = user,
    )]
    pub user_token_account: Account<'info, TokenAccount>,

    /// Pool vault containing the staked tokens
    #[account(
        mut,
        seeds = [STAKE_VAULT_SEED, pool.key().as_ref()],
        bump,
        constraint = stake_vault.mint == stake_mint.key() @ RewardPoolError::InvalidTokenMint,
    )]
    pub stake_vault: Account<'info, TokenAccount>,

    /// Required system programs
    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
}

impl<'info> Unstake<'info> {
    /// Execute the unstaking operation
    pub fn unstake(&mut self, amount: u64) -> Result<()> {
        let current_time = Clock::get()?.unix_timestamp;

        // Settle and remove the weight before any token moves
        let mut adapter = AmountWeight::for_pool(&self.pool)?;
        let deposit = AmountDeposit {
            mint: self.stake_mint.key(),
            amount,
        };
        let change = accrual::unstake(
            &mut self.pool,
            &mut self.position,
            &mut adapter,
            &deposit,
            current_time,
        )?;

        // Transfer staked tokens back to the user
        self.transfer_tokens_to_user(amount)?;

        // Log the unstaking event
        self.log_unstake_event(&change, current_time);

        Ok(())
    }

    /// Pay staked tokens back out of the vault, signed by the pool PDA
    fn transfer_tokens_to_user(&self, amount: u64) -> Result<()> {
        self.pool.with_signer_seeds(|signer_seeds| {
            let transfer_ctx = CpiContext::new_with_signer(
                self.token_program.to_account_info(),
                Transfer {
                    from: self.stake_vault.to_account_info(),
                    to: self.user_token_account.to_account_info(),
                    authority: self.pool.to_account_info(),
                },
                signer_seeds,
            );
            token::transfer(transfer_ctx, amount)
        })?;

        msg!("Returned {} staked tokens to user", amount);

        Ok(())
    }

    /// Log the unstaking event for monitoring and indexing
    fn log_unstake_event(&self, change: &WeightChange, current_time: i64) {
        msg!(
            "UNSTAKE EVENT: user={}, pool={}, delta={}, remaining_weight={}, total_weight={}, settled={}",
            self.user.key(),
            self.pool.key(),
            change.delta,
            change.weight,
            change.total_weight,
            change.pending
        );

        if change.weight == 0 {
            let (_, earned, claimed, _) = self.position.get_summary();
            msg!("Position fully withdrawn; earned={}, claimed={}", earned, claimed);
        }

        emit!(Unstaked {
            pool: self.pool.key(),
            user: self.user.key(),
            delta: change.delta,
            weight: change.weight,
            total_weight: change.total_weight,
            timestamp: current_time,
        });
    }
}
