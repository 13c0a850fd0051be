use anchor_lang::{prelude::*, system_program};
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{self, Mint, Token, TokenAccount, Transfer},
};

use crate::{
    accrual::{self, ItemSetWeight, WeightChange},
    constants::*,
    error::{safe_add_u64, RewardPoolError},
    events::Unstaked,
    state::{ItemSlot, PoolKind, RewardPool, StakedItem, UserPosition},
};

/// Withdraw one item from an id-set pool
/// Only the recorded depositor can take an item back out
#[derive(Accounts)]
pub struct UnstakeItem<'info> {
    /// The user taking the item back; receives the record rent
    #[account(mut)]
    pub user: Signer<'info>,

    /// The id-set pool holding the item
    #[account(
        mut,
        constraint = pool.kind == PoolKind::ItemSet @ RewardPoolError::WrongPoolKind,
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

    /// The item being withdrawn
    pub item_mint: Account<'info, Mint>,

    /// Custody record of the item, closed on success
    /// PDA: ["item", pool.key(), item_mint.key()]
    /// CHECK: Address is pinned by the seeds; an item never staked here has no record
    /// and is reported as ItemNotOwned by the handler
    #[account(
        mut,
        seeds = [ITEM_SEED, pool.key().as_ref(), item_mint.key().as_ref()],
        bump,
    )]
    pub item_record: UncheckedAccount<'info>,

    /// User's token account to receive the item
    #[account(
        init_if_needed,
        payer = user,
        associated_token::mint = item_mint,
        associated_token::authority = user,
    )]
    pub user_item_account: Account<'info, TokenAccount>,

    /// Pool custody for this item
    #[account(
        mut,
        associated_token::mint = item_mint,
        associated_token::authority = pool,
    )]
    pub item_vault: Account<'info, TokenAccount>,

    /// Required system programs
    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
}

impl<'info> UnstakeItem<'info> {
    /// Execute the item withdrawal
    pub fn unstake_item(&mut self, bumps: &UnstakeItemBumps) -> Result<()> {
        let current_time = Clock::get()?.unix_timestamp;

        // A missing record means the item was never deposited here
        let mut record = {
            let data = self.item_record.try_borrow_data()?;
            load_item_record(self.item_record.owner, &data)?
        };

        // Settle, check the depositor and drop one unit of weight
        let item = self.item_mint.key();
        let mut slot = ItemSlot::new(&mut record, self.pool.key(), item, bumps.item_record);
        let mut adapter = ItemSetWeight::new(&mut slot);
        let change = accrual::unstake(
            &mut self.pool,
            &mut self.position,
            &mut adapter,
            &[item][..],
            current_time,
        )?;

        // Return the item, then release the record rent
        self.transfer_item_to_user()?;
        self.close_item_record()?;

        // Log the unstaking event
        self.log_unstake_event(&change, current_time);

        Ok(())
    }

    /// Transfer the item out of pool custody, signed by the pool PDA
    fn transfer_item_to_user(&self) -> Result<()> {
        self.pool.with_signer_seeds(|signer_seeds| {
            let transfer_ctx = CpiContext::new_with_signer(
                self.token_program.to_account_info(),
                Transfer {
                    from: self.item_vault.to_account_info(),
                    to: self.user_item_account.to_account_info(),
                    authority: self.pool.to_account_info(),
                },
                signer_seeds,
            );
            token::transfer(transfer_ctx, 1)
        })?;

        msg!("Item {} returned to {}", self.item_mint.key(), self.user.key());

        Ok(())
    }

    /// Move the record's lamports to the user and hand the account back to the system program
    fn close_item_record(&self) -> Result<()> {
        let record = self.item_record.to_account_info();
        let user = self.user.to_account_info();

        let refund = record.lamports();
        **user.try_borrow_mut_lamports()? = safe_add_u64(user.lamports(), refund)?;
        **record.try_borrow_mut_lamports()? = 0;

        record.assign(&system_program::ID);
        record.realloc(0, false)?;

        Ok(())
    }

    fn log_unstake_event(&self, change: &WeightChange, current_time: i64) {
        msg!(
            "UNSTAKE ITEM EVENT: user={}, pool={}, item={}, items_held={}, total_weight={}, settled={}",
            self.user.key(),
            self.pool.key(),
            self.item_mint.key(),
            change.weight,
            change.total_weight,
            change.pending
        );

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

/// Decode the custody record behind an item PDA
/// An account this program never initialized means the item is not staked
pub fn load_item_record(owner: &Pubkey, data: &[u8]) -> Result<StakedItem> {
    if owner != &crate::ID || data.is_empty() {
        msg!("No custody record for this item");
        return Err(RewardPoolError::ItemNotOwned.into());
    }
    StakedItem::try_deserialize(&mut &data[..])
}
