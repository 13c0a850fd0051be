use anchor_lang::prelude::*;

use crate::{
    constants::{MAX_HELD_ITEMS, REWARD_PRECISION},
    error::{safe_add_u64, safe_div_u128, safe_mul_u128, safe_sub_u64, to_u64, RewardPoolError},
};

/// Individual depositor account - one per user per pool
/// Created on first stake and never closed, so lifetime totals survive a full exit
#[account]
#[derive(InitSpace)]
pub struct UserPosition {
    /// The depositor who owns this position
    pub owner: Pubkey,

    /// Which reward pool this position belongs to
    pub pool: Pubkey,

    /// Currently locked weight (amount, or item count for id-set pools)
    pub weight: u64,

    /// Pool acc_per_weight at the last checkpoint
    pub acc_per_weight_paid: u128,

    /// Reward ever credited to this position
    pub total_earned: u64,

    /// Reward ever paid out (never above total_earned)
    pub total_claimed: u64,

    /// Item mints deposited by this owner (id-set pools only)
    #[max_len(MAX_HELD_ITEMS)]
    pub held_items: Vec<Pubkey>,

    /// When the position was first opened
    pub opened_at: i64,

    /// Bump seed for PDA derivation
    pub bump: u8,
}

impl UserPosition {
    pub fn is_open(&self) -> bool {
        self.owner != Pubkey::default()
    }

    /// Fill in identity fields the first time a position is used
    pub fn open_if_needed(&mut self, owner: Pubkey, pool: Pubkey, now: i64, bump: u8) {
        if self.is_open() {
            return;
        }
        self.owner = owner;
        self.pool = pool;
        self.opened_at = now;
        self.bump = bump;
        msg!("Position opened: owner={}, pool={}", owner, pool);
    }

    /// Reward earned since the last checkpoint, at a given accumulator value
    /// weight * (acc - paid) / PRECISION: only the interval is floored, and the
    /// product stays bounded by the reward credited since the checkpoint
    pub fn pending_at(&self, acc_per_weight: u128) -> Result<u64> {
        let delta = acc_per_weight.saturating_sub(self.acc_per_weight_paid);
        to_u64(safe_div_u128(
            safe_mul_u128(self.weight as u128, delta)?,
            REWARD_PRECISION,
        )?)
    }

    /// Fold pending reward into total_earned and reset the checkpoint ("touch user")
    /// Must run before the weight changes
    pub fn settle(&mut self, acc_per_weight: u128) -> Result<u64> {
        let pending = self.pending_at(acc_per_weight)?;
        self.total_earned = safe_add_u64(self.total_earned, pending)?;
        self.checkpoint(acc_per_weight);
        Ok(pending)
    }

    /// Snapshot the accumulator; later pending is measured from here
    pub fn checkpoint(&mut self, acc_per_weight: u128) {
        self.acc_per_weight_paid = acc_per_weight;
    }

    pub fn add_weight(&mut self, delta: u64) -> Result<()> {
        self.weight = safe_add_u64(self.weight, delta)?;
        Ok(())
    }

    pub fn remove_weight(&mut self, delta: u64) -> Result<()> {
        if delta > self.weight {
            return Err(RewardPoolError::InsufficientWeight.into());
        }
        self.weight = safe_sub_u64(self.weight, delta)?;
        Ok(())
    }

    /// Earned but not yet paid out
    pub fn claimable(&self) -> u64 {
        self.total_earned.saturating_sub(self.total_claimed)
    }

    /// Mark everything earned as paid and return the amount to transfer
    pub fn take_claimable(&mut self) -> u64 {
        let payable = self.claimable();
        if payable > 0 {
            self.total_claimed = self.total_earned;
        }
        payable
    }

    pub fn holds_item(&self, mint: &Pubkey) -> bool {
        self.held_items.contains(mint)
    }

    pub fn push_item(&mut self, mint: Pubkey) -> Result<()> {
        if self.held_items.len() >= MAX_HELD_ITEMS {
            return Err(RewardPoolError::TooManyItems.into());
        }
        self.held_items.push(mint);
        Ok(())
    }

    pub fn remove_item(&mut self, mint: &Pubkey) -> Result<()> {
        let index = self
            .held_items
            .iter()
            .position(|held| held == mint)
            .ok_or(RewardPoolError::ItemNotOwned)?;
        self.held_items.swap_remove(index);
        Ok(())
    }

    /// Get position summary: (weight, total_earned, total_claimed, items held)
    pub fn get_summary(&self) -> (u64, u64, u64, usize) {
        (
            self.weight,
            self.total_earned,
            self.total_claimed,
            self.held_items.len(),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anchor_lang::error::Error;

    pub(crate) fn create_mock_position(owner: Pubkey) -> UserPosition {
        UserPosition {
            owner,
            pool: Pubkey::default(),
            weight: 0,
            acc_per_weight_paid: 0,
            total_earned: 0,
            total_claimed: 0,
            held_items: Vec::new(),
            opened_at: 0,
            bump: 0,
        }
    }

    #[test]
    fn test_settle_credits_and_checkpoints() {
        let mut position = create_mock_position(Pubkey::new_unique());
        position.weight = 2;

        let acc = 1_500 * REWARD_PRECISION;
        assert_eq!(position.pending_at(acc).unwrap(), 3_000);
        assert_eq!(position.settle(acc).unwrap(), 3_000);
        assert_eq!(position.total_earned, 3_000);
        assert_eq!(position.pending_at(acc).unwrap(), 0);

        // A second settle at the same accumulator credits nothing
        assert_eq!(position.settle(acc).unwrap(), 0);
        assert_eq!(position.total_earned, 3_000);
    }

    #[test]
    fn test_weight_change_never_overpays() {
        let mut position = create_mock_position(Pubkey::new_unique());
        position.weight = 1;

        // 0.99 of a unit per weight sits in the accumulator when the weight changes
        let acc = REWARD_PRECISION * 99 / 100;
        assert_eq!(position.settle(acc).unwrap(), 0);
        position.add_weight(1).unwrap();
        position.checkpoint(acc);

        // Another 0.01 per unit of weight is 0.02 in total: still nothing owed
        let later = REWARD_PRECISION;
        assert_eq!(position.pending_at(later).unwrap(), 0);
    }

    #[test]
    fn test_pending_rounds_down() {
        let mut position = create_mock_position(Pubkey::new_unique());
        position.weight = 1;

        // 0.999... of a unit truncates to zero
        assert_eq!(position.pending_at(REWARD_PRECISION - 1).unwrap(), 0);
        assert_eq!(position.pending_at(REWARD_PRECISION).unwrap(), 1);
    }

    #[test]
    fn test_take_claimable() {
        let mut position = create_mock_position(Pubkey::new_unique());
        position.total_earned = 700;
        position.total_claimed = 200;

        assert_eq!(position.take_claimable(), 500);
        assert_eq!(position.total_claimed, 700);
        assert_eq!(position.take_claimable(), 0);
        assert_eq!(position.total_claimed, 700);
    }

    #[test]
    fn test_remove_weight_bounds() {
        let mut position = create_mock_position(Pubkey::new_unique());
        position.add_weight(3).unwrap();

        assert_eq!(
            position.remove_weight(4).unwrap_err(),
            Error::from(RewardPoolError::InsufficientWeight)
        );
        position.remove_weight(3).unwrap();
        assert_eq!(position.weight, 0);
    }

    #[test]
    fn test_held_items_bookkeeping() {
        let mut position = create_mock_position(Pubkey::new_unique());
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());

        position.push_item(a).unwrap();
        position.push_item(b).unwrap();
        assert!(position.holds_item(&a));

        position.remove_item(&a).unwrap();
        assert!(!position.holds_item(&a));
        assert!(position.holds_item(&b));
        assert_eq!(
            position.remove_item(&a).unwrap_err(),
            Error::from(RewardPoolError::ItemNotOwned)
        );

        for _ in 1..MAX_HELD_ITEMS {
            position.push_item(Pubkey::new_unique()).unwrap();
        }
        assert_eq!(
            position.push_item(Pubkey::new_unique()).unwrap_err(),
            Error::from(RewardPoolError::TooManyItems)
        );
    }

    #[test]
    fn test_open_if_needed_only_once() {
        let mut position = create_mock_position(Pubkey::default());
        assert!(!position.is_open());

        let (owner, pool) = (Pubkey::new_unique(), Pubkey::new_unique());
        position.open_if_needed(owner, pool, 42, 254);
        position.open_if_needed(Pubkey::new_unique(), Pubkey::new_unique(), 99, 1);

        assert_eq!(position.owner, owner);
        assert_eq!(position.pool, pool);
        assert_eq!(position.opened_at, 42);
        assert_eq!(position.bump, 254);
    }
}
