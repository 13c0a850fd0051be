use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{self, Mint, Token, TokenAccount, Transfer},
};

use crate::{
    accrual::{self, AmountDeposit, AmountWeight, WeightChange},
    constants::*,
    error::RewardPoolError,
    events::Staked,
    state::{RewardPool, UserPosition},
};

/// Stake an amount into a fungible or fixed-id pool
/// Opens the caller's position on first use
#[derive(Accounts)]
pub struct Stake<'info> {
    /// The user who is staking tokens
    /// Must sign the transaction and pay for account creation
    #[account(mut)]
    pub user: Signer<'info>,

    /// The pool to stake into; only fungible and fixed-id pools take amounts
    #[account(
        mut,
        constraint = pool.kind.is_amount_weighted() @ RewardPoolError::WrongPoolKind,
    )]
    pub pool: Account<'info, RewardPool>,

    /// User's position - tracks weight and earned reward
    /// PDA: ["position", pool.key(), user.key()]
    #[account(
        init_if_needed,
        payer = user,
        space = DISCRIMINATOR_SIZE + UserPosition::INIT_SPACE,
        seeds = [POSITION_SEED, pool.key().as_ref(), user.key().as_ref()],
        bump
    )]
    pub position: Account<'info, UserPosition>,

    /// The token being staked
    /// Checked against the pool kind by the weight adapter
    pub stake_mint: Account<'info, Mint>,

    /// User's token account containing the tokens to stake
    #[account(
        mut,
        associated_token::mint = stake_mint,
        associated_token::authority = user,
    )]
    pub user_token_account: Account<'info, TokenAccount>,

    /// Pool vault where staked tokens are held
    /// PDA: ["stake_vault", pool.key()]
    #[account(
        init_if_needed,
        payer = user,
        seeds = [STAKE_VAULT_SEED, pool.key().as_ref()],
        bump,
        token::mint = stake_mint,
        token::authority = pool,
    )]
    pub stake_vault: Account<'info, TokenAccount>,

    /// Required system programs
    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub rent: Sysvar<'info, Rent>,
}

impl<'info> Stake<'info> {
    /// Execute the staking operation
    pub fn stake(&mut self, amount: u64, bumps: &StakeBumps) -> Result<()> {
        let current_time = Clock::get()?.unix_timestamp;

        // Check the user can cover the deposit
        self.validate_stake(amount)?;

        // First deposit fills in the position identity
        self.position.open_if_needed(
            self.user.key(),
            self.pool.key(),
            current_time,
            bumps.position,
        );

        // Settle and add the weight; ledger first, tokens last
        let mut adapter = AmountWeight::for_pool(&self.pool)?;
        let deposit = AmountDeposit {
            mint: self.stake_mint.key(),
            amount,
        };
        let change = accrual::stake(
            &mut self.pool,
            &mut self.position,
            &mut adapter,
            &deposit,
            current_time,
        )?;

        // Transfer tokens from user to the stake vault
        self.transfer_tokens_to_vault(amount)?;

        // Log the staking event
        self.log_stake_event(&change, current_time);

        Ok(())
    }

    /// Validate the user's balance before anything is settled
    fn validate_stake(&self, amount: u64) -> Result<()> {
        if self.user_token_account.amount < amount {
            msg!(
                "Insufficient balance: has {}, needs {}",
                self.user_token_account.amount,
                amount
            );
            return Err(RewardPoolError::InsufficientBalance.into());
        }
        Ok(())
    }

    /// Transfer tokens from user account to the stake vault
    fn transfer_tokens_to_vault(&self, amount: u64) -> Result<()> {
        let transfer_ctx = CpiContext::new(
            self.token_program.to_account_info(),
            Transfer {
                from: self.user_token_account.to_account_info(),
                to: self.stake_vault.to_account_info(),
                authority: self.user.to_account_info(),
            },
        );

        token::transfer(transfer_ctx, amount)?;

        msg!("Transferred {} tokens to stake vault", amount);

        Ok(())
    }

    /// Log the staking event for monitoring and indexing
    fn log_stake_event(&self, change: &WeightChange, current_time: i64) {
        msg!(
            "STAKE EVENT: user={}, pool={}, delta={}, weight={}, total_weight={}, settled={}",
            self.user.key(),
            self.pool.key(),
            change.delta,
            change.weight,
            change.total_weight,
            change.pending
        );

        emit!(Staked {
            pool: self.pool.key(),
            user: self.user.key(),
            delta: change.delta,
            weight: change.weight,
            total_weight: change.total_weight,
            timestamp: current_time,
        });
    }
}
