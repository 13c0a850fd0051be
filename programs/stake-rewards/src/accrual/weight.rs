use anchor_lang::prelude::*;

use crate::{
    constants::MAX_HELD_ITEMS,
    error::RewardPoolError,
    state::{PoolKind, RewardPool, UserPosition},
};

/// A weight source the accrual engine can drive.
///
/// `stake_delta` / `unstake_delta` only validate and size a request; they run
/// before anything is settled so a rejected request leaves no trace. The
/// `record_*` hooks do the custody bookkeeping once the request is accepted.
pub trait WeightAdapter {
    type Deposit: ?Sized;

    fn stake_delta(&self, position: &UserPosition, deposit: &Self::Deposit) -> Result<u64>;

    fn unstake_delta(&self, position: &UserPosition, deposit: &Self::Deposit) -> Result<u64>;

    fn record_stake(
        &mut self,
        _position: &mut UserPosition,
        _deposit: &Self::Deposit,
        _now: i64,
    ) -> Result<()> {
        Ok(())
    }

    fn record_unstake(&mut self, _position: &mut UserPosition, _deposit: &Self::Deposit) -> Result<()> {
        Ok(())
    }
}

/// An amount of one token, as moved by `stake` / `unstake`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountDeposit {
    pub mint: Pubkey,
    pub amount: u64,
}

fn amount_delta(deposit: &AmountDeposit) -> Result<u64> {
    if deposit.amount == 0 {
        return Err(RewardPoolError::ZeroAmount.into());
    }
    Ok(deposit.amount)
}

fn withdrawable(position: &UserPosition, deposit: &AmountDeposit) -> Result<u64> {
    let delta = amount_delta(deposit)?;
    if delta > position.weight {
        msg!(
            "Unstake of {} exceeds staked weight {}",
            delta,
            position.weight
        );
        return Err(RewardPoolError::InsufficientWeight.into());
    }
    Ok(delta)
}

/// Weight = amount of the pool's fungible mint
pub struct FungibleWeight {
    pub asset: Pubkey,
}

impl WeightAdapter for FungibleWeight {
    type Deposit = AmountDeposit;

    fn stake_delta(&self, _position: &UserPosition, deposit: &AmountDeposit) -> Result<u64> {
        if deposit.mint != self.asset {
            return Err(RewardPoolError::WrongStakeMint.into());
        }
        amount_delta(deposit)
    }

    fn unstake_delta(&self, position: &UserPosition, deposit: &AmountDeposit) -> Result<u64> {
        if deposit.mint != self.asset {
            return Err(RewardPoolError::WrongStakeMint.into());
        }
        withdrawable(position, deposit)
    }
}

/// Weight = amount of one predetermined semi-fungible id
pub struct FixedIdWeight {
    pub id: Pubkey,
}

impl WeightAdapter for FixedIdWeight {
    type Deposit = AmountDeposit;

    fn stake_delta(&self, _position: &UserPosition, deposit: &AmountDeposit) -> Result<u64> {
        if deposit.mint != self.id {
            return Err(RewardPoolError::WrongTokenId.into());
        }
        amount_delta(deposit)
    }

    fn unstake_delta(&self, position: &UserPosition, deposit: &AmountDeposit) -> Result<u64> {
        if deposit.mint != self.id {
            return Err(RewardPoolError::WrongTokenId.into());
        }
        withdrawable(position, deposit)
    }
}

/// Adapter for the pool kinds driven by `stake` / `unstake` amounts
pub enum AmountWeight {
    Fungible(FungibleWeight),
    FixedId(FixedIdWeight),
}

impl AmountWeight {
    pub fn for_pool(pool: &RewardPool) -> Result<Self> {
        match pool.kind {
            PoolKind::Fungible => Ok(AmountWeight::Fungible(FungibleWeight {
                asset: pool.staked_asset,
            })),
            PoolKind::FixedId { id } => Ok(AmountWeight::FixedId(FixedIdWeight { id })),
            PoolKind::ItemSet => Err(RewardPoolError::WrongPoolKind.into()),
        }
    }
}

impl WeightAdapter for AmountWeight {
    type Deposit = AmountDeposit;

    fn stake_delta(&self, position: &UserPosition, deposit: &AmountDeposit) -> Result<u64> {
        match self {
            AmountWeight::Fungible(adapter) => adapter.stake_delta(position, deposit),
            AmountWeight::FixedId(adapter) => adapter.stake_delta(position, deposit),
        }
    }

    fn unstake_delta(&self, position: &UserPosition, deposit: &AmountDeposit) -> Result<u64> {
        match self {
            AmountWeight::Fungible(adapter) => adapter.unstake_delta(position, deposit),
            AmountWeight::FixedId(adapter) => adapter.unstake_delta(position, deposit),
        }
    }
}

/// The pool-wide item -> depositor map of an id-set pool
pub trait ItemRegistry {
    fn depositor_of(&self, item: &Pubkey) -> Result<Option<Pubkey>>;

    fn record(&mut self, item: Pubkey, depositor: Pubkey, now: i64) -> Result<()>;

    fn release(&mut self, item: &Pubkey) -> Result<()>;
}

/// Weight = number of distinct items held
pub struct ItemSetWeight<'r, R: ItemRegistry> {
    pub registry: &'r mut R,
}

impl<'r, R: ItemRegistry> ItemSetWeight<'r, R> {
    pub fn new(registry: &'r mut R) -> Self {
        Self { registry }
    }
}

fn check_item_list(items: &[Pubkey]) -> Result<u64> {
    if items.is_empty() {
        return Err(RewardPoolError::EmptyItemList.into());
    }
    for (index, item) in items.iter().enumerate() {
        if items[..index].contains(item) {
            return Err(RewardPoolError::DuplicateItem.into());
        }
    }
    u64::try_from(items.len()).map_err(|_| RewardPoolError::MathOverflow.into())
}

impl<'r, R: ItemRegistry> WeightAdapter for ItemSetWeight<'r, R> {
    type Deposit = [Pubkey];

    fn stake_delta(&self, position: &UserPosition, items: &[Pubkey]) -> Result<u64> {
        let delta = check_item_list(items)?;

        if position.held_items.len() + items.len() > MAX_HELD_ITEMS {
            return Err(RewardPoolError::TooManyItems.into());
        }

        for item in items {
            if let Some(depositor) = self.registry.depositor_of(item)? {
                msg!("Item {} is already staked by {}", item, depositor);
                return Err(RewardPoolError::ItemAlreadyStaked.into());
            }
        }

        Ok(delta)
    }

    fn unstake_delta(&self, position: &UserPosition, items: &[Pubkey]) -> Result<u64> {
        let delta = check_item_list(items)?;

        for item in items {
            let recorded = self.registry.depositor_of(item)?;
            if !position.holds_item(item) || recorded != Some(position.owner) {
                msg!("Item {} is not held by {}", item, position.owner);
                return Err(RewardPoolError::ItemNotOwned.into());
            }
        }

        Ok(delta)
    }

    fn record_stake(&mut self, position: &mut UserPosition, items: &[Pubkey], now: i64) -> Result<()> {
        for item in items {
            self.registry.record(*item, position.owner, now)?;
            position.push_item(*item)?;
        }
        Ok(())
    }

    fn record_unstake(&mut self, position: &mut UserPosition, items: &[Pubkey]) -> Result<()> {
        for item in items {
            self.registry.release(item)?;
            position.remove_item(item)?;
        }
        Ok(())
    }
}
