use anchor_lang::prelude::*;

use crate::{accrual::ItemRegistry, error::RewardPoolError};

/// Custody record for one deposited item in an id-set pool
/// PDA: ["item", pool.key(), mint.key()] - at most one live record per item
#[account]
#[derive(InitSpace, Debug)]
pub struct StakedItem {
    pub pool: Pubkey,
    pub mint: Pubkey,
    /// Current depositor, default while the item is not staked
    pub depositor: Pubkey,
    pub staked_at: i64,
    pub bump: u8,
}

impl StakedItem {
    pub fn is_staked(&self) -> bool {
        self.depositor != Pubkey::default()
    }
}

/// A verified collection entry equal to `collection`
/// `member_of` is a metadata account's (collection key, verified) pair, if any
pub fn is_collection_member(member_of: Option<(Pubkey, bool)>, collection: &Pubkey) -> bool {
    matches!(member_of, Some((key, true)) if key == *collection)
}

/// The slice of the item registry one instruction can see: a single record
pub struct ItemSlot<'a> {
    record: &'a mut StakedItem,
    pool: Pubkey,
    mint: Pubkey,
    bump: u8,
}

impl<'a> ItemSlot<'a> {
    pub fn new(record: &'a mut StakedItem, pool: Pubkey, mint: Pubkey, bump: u8) -> Self {
        Self {
            record,
            pool,
            mint,
            bump,
        }
    }

    fn check(&self, item: &Pubkey) -> Result<()> {
        if *item != self.mint {
            msg!("No record for item {} was passed in", item);
            return Err(RewardPoolError::InvalidAccount.into());
        }
        Ok(())
    }
}

impl ItemRegistry for ItemSlot<'_> {
    fn depositor_of(&self, item: &Pubkey) -> Result<Option<Pubkey>> {
        self.check(item)?;
        Ok(self.record.is_staked().then_some(self.record.depositor))
    }

    fn record(&mut self, item: Pubkey, depositor: Pubkey, now: i64) -> Result<()> {
        self.check(&item)?;
        self.record.pool = self.pool;
        self.record.mint = item;
        self.record.depositor = depositor;
        self.record.staked_at = now;
        self.record.bump = self.bump;
        Ok(())
    }

    fn release(&mut self, item: &Pubkey) -> Result<()> {
        self.check(item)?;
        self.record.depositor = Pubkey::default();
        Ok(())
    }
}
