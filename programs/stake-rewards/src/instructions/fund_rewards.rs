use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{self, Mint, Token, TokenAccount, Transfer},
};

use crate::{
    error::RewardPoolError,
    events::RewardsFunded,
    state::RewardPool,
};

/// Top up the reward vault
/// Anyone may fund a pool; funding never changes the accrual rate or cap
#[derive(Accounts)]
pub struct FundRewards<'info> {
    /// Anyone holding reward tokens
    pub funder: Signer<'info>,

    /// The pool whose vault is topped up
    pub pool: Account<'info, RewardPool>,

    /// The reward token mint
    #[account(
        constraint = reward_mint.key() == pool.reward_mint @ RewardPoolError::InvalidTokenMint,
    )]
    pub reward_mint: Account<'info, Mint>,

    /// Funder's token account the rewards come from
    #[account(
        mut,
        associated_token::mint = reward_mint,
        associated_token::authority = funder,
    )]
    pub funder_token_account: Account<'info, TokenAccount>,

    /// Pool vault receiving the rewards
    #[account(
        mut,
        constraint = reward_vault.key() == pool.reward_vault @ RewardPoolError::InvalidTokenAccount,
    )]
    pub reward_vault: Account<'info, TokenAccount>,

    /// Required programs
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
}

impl<'info> FundRewards<'info> {
    /// Execute the funding transfer
    pub fn fund_rewards(&mut self, amount: u64) -> Result<()> {
        // Validate amount and funder balance
        self.validate_funding(amount)?;

        // Transfer reward tokens into the vault
        let transfer_ctx = CpiContext::new(
            self.token_program.to_account_info(),
            Transfer {
                from: self.funder_token_account.to_account_info(),
                to: self.reward_vault.to_account_info(),
                authority: self.funder.to_account_info(),
            },
        );
        token::transfer(transfer_ctx, amount)?;

        // Refresh the vault so the log shows the new balance
        self.reward_vault.reload()?;

        msg!(
            "Reward vault funded: pool={}, amount={}, vault_balance={}, still_to_emit={}",
            self.pool.key(),
            amount,
            self.reward_vault.amount,
            self.pool.remaining_rewards()
        );

        emit!(RewardsFunded {
            pool: self.pool.key(),
            funder: self.funder.key(),
            amount,
            vault_balance: self.reward_vault.amount,
        });

        Ok(())
    }

    /// Reject zero or unfunded top-ups
    fn validate_funding(&self, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(RewardPoolError::ZeroAmount.into());
        }

        if self.funder_token_account.amount < amount {
            msg!(
                "Insufficient balance: has {}, needs {}",
                self.funder_token_account.amount,
                amount
            );
            return Err(RewardPoolError::InsufficientBalance.into());
        }

        Ok(())
    }
}
