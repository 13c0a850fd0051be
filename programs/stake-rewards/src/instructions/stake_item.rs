use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    metadata::{Metadata, MetadataAccount},
    token::{self, Mint, Token, TokenAccount, Transfer},
};

use crate::{
    accrual::{self, ItemSetWeight, WeightChange},
    constants::*,
    error::RewardPoolError,
    events::Staked,
    log_error,
    state::{is_collection_member, ItemSlot, PoolKind, RewardPool, StakedItem, UserPosition},
};

/// Deposit one collection item into an id-set pool
/// Several of these in one transaction stake a list of items atomically
#[derive(Accounts)]
pub struct StakeItem<'info> {
    /// The depositor; pays for any account created on the way
    #[account(mut)]
    pub user: Signer<'info>,

    /// The id-set pool receiving the item
    #[account(
        mut,
        constraint = pool.kind == PoolKind::ItemSet @ RewardPoolError::WrongPoolKind,
    )]
    pub pool: Account<'info, RewardPool>,

    /// User's position, opened on first deposit
    /// PDA: ["position", pool.key(), user.key()]
    #[account(
        init_if_needed,
        payer = user,
        space = DISCRIMINATOR_SIZE + UserPosition::INIT_SPACE,
        seeds = [POSITION_SEED, pool.key().as_ref(), user.key().as_ref()],
        bump
    )]
    pub position: Account<'info, UserPosition>,

    /// The item being deposited: zero decimals and a supply of exactly one
    #[account(
        constraint = item_mint.decimals == 0 && item_mint.supply == 1 @ RewardPoolError::NotAnItem,
    )]
    pub item_mint: Account<'info, Mint>,

    /// Metaplex metadata of the item, used for the collection check
    #[account(
        seeds = [b"metadata", metadata_program.key().as_ref(), item_mint.key().as_ref()],
        seeds::program = metadata_program.key(),
        bump,
    )]
    pub metadata: Account<'info, MetadataAccount>,

    /// PDA: ["item", pool.key(), item_mint.key()]
    /// Left in place while staked so a second deposit reports ItemAlreadyStaked
    #[account(
        init_if_needed,
        payer = user,
        space = DISCRIMINATOR_SIZE + StakedItem::INIT_SPACE,
        seeds = [ITEM_SEED, pool.key().as_ref(), item_mint.key().as_ref()],
        bump
    )]
    pub item_record: Account<'info, StakedItem>,

    /// User's token account currently holding the item
    #[account(
        mut,
        associated_token::mint = item_mint,
        associated_token::authority = user,
    )]
    pub user_item_account: Account<'info, TokenAccount>,

    /// Pool custody for this item, owned by the pool PDA
    #[account(
        init_if_needed,
        payer = user,
        associated_token::mint = item_mint,
        associated_token::authority = pool,
    )]
    pub item_vault: Account<'info, TokenAccount>,

    /// Required system programs
    pub metadata_program: Program<'info, Metadata>,
    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub rent: Sysvar<'info, Rent>,
}

impl<'info> StakeItem<'info> {
    /// Execute the item deposit
    pub fn stake_item(&mut self, bumps: &StakeItemBumps) -> Result<()> {
        let current_time = Clock::get()?.unix_timestamp;

        // Collection membership and possession
        self.validate_item()?;

        // First deposit fills in the position identity
        self.position.open_if_needed(
            self.user.key(),
            self.pool.key(),
            current_time,
            bumps.position,
        );

        // Settle, record the depositor and add one unit of weight
        let item = self.item_mint.key();
        let mut slot = ItemSlot::new(
            &mut self.item_record,
            self.pool.key(),
            item,
            bumps.item_record,
        );
        let mut adapter = ItemSetWeight::new(&mut slot);
        let change = accrual::stake(
            &mut self.pool,
            &mut self.position,
            &mut adapter,
            &[item][..],
            current_time,
        )?;

        // Move the item only after the ledger is up to date
        self.transfer_item_to_vault()?;

        // Log the staking event
        self.log_stake_event(&change, current_time);

        Ok(())
    }

    /// Validate that the item belongs to the pool collection and to the user
    fn validate_item(&self) -> Result<()> {
        let member_of = self
            .metadata
            .collection
            .as_ref()
            .map(|collection| (collection.key, collection.verified));

        if !is_collection_member(member_of, &self.pool.staked_asset) {
            let error = RewardPoolError::ItemNotInCollection;
            log_error!(error, "item metadata collection check");
            return Err(error.into());
        }

        if self.user_item_account.amount != 1 {
            msg!("User does not hold item {}", self.item_mint.key());
            return Err(RewardPoolError::InsufficientBalance.into());
        }

        Ok(())
    }

    /// Transfer the item from the user into pool custody
    fn transfer_item_to_vault(&self) -> Result<()> {
        let transfer_ctx = CpiContext::new(
            self.token_program.to_account_info(),
            Transfer {
                from: self.user_item_account.to_account_info(),
                to: self.item_vault.to_account_info(),
                authority: self.user.to_account_info(),
            },
        );

        token::transfer(transfer_ctx, 1)?;

        msg!("Item {} moved into pool custody", self.item_mint.key());

        Ok(())
    }

    fn log_stake_event(&self, change: &WeightChange, current_time: i64) {
        msg!(
            "STAKE ITEM EVENT: user={}, pool={}, item={}, items_held={}, total_weight={}, settled={}",
            self.user.key(),
            self.pool.key(),
            self.item_mint.key(),
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
