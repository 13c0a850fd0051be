//! The accrual engine shared by every pool kind.
//!
//! Each entry point runs the same order: validate the request against the
//! weight adapter, touch the pool, touch the caller, apply the weight delta,
//! re-checkpoint the caller's accumulator snapshot. Token movement is left to
//! the caller and must happen only after these functions return.

pub mod weight;

pub use weight::*;

use anchor_lang::prelude::*;

use crate::{
    error::safe_add_u64,
    state::{RewardPool, UserPosition},
};

/// Outcome of settling one position against the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    /// Reward the pool credited since its last touch
    pub due: u64,
    /// Reward folded into the position's total_earned
    pub pending: u64,
}

/// Outcome of a stake or unstake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightChange {
    pub delta: u64,
    pub weight: u64,
    pub total_weight: u64,
    pub pending: u64,
}

/// Read-only answer to "what would claim pay right now"
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardQuote {
    /// Earned since the position's last settlement
    pub pending: u64,
    /// Everything claim_rewards would transfer at this instant
    pub claimable: u64,
}

/// Touch pool, then touch user
pub fn settle(pool: &mut RewardPool, position: &mut UserPosition, now: i64) -> Result<Settlement> {
    let accrual = pool.touch(now)?;
    let pending = position.settle(pool.acc_per_weight)?;

    if accrual.forfeited > 0 {
        msg!(
            "Forfeited {} reward units emitted while the pool was empty",
            accrual.forfeited
        );
    }

    Ok(Settlement {
        due: accrual.due,
        pending,
    })
}

pub fn stake<A: WeightAdapter + ?Sized>(
    pool: &mut RewardPool,
    position: &mut UserPosition,
    adapter: &mut A,
    deposit: &A::Deposit,
    now: i64,
) -> Result<WeightChange> {
    let delta = adapter.stake_delta(position, deposit)?;

    let settlement = settle(pool, position, now)?;

    adapter.record_stake(position, deposit, now)?;
    position.add_weight(delta)?;
    pool.add_weight(delta)?;
    position.checkpoint(pool.acc_per_weight);

    Ok(WeightChange {
        delta,
        weight: position.weight,
        total_weight: pool.total_weight,
        pending: settlement.pending,
    })
}

pub fn unstake<A: WeightAdapter + ?Sized>(
    pool: &mut RewardPool,
    position: &mut UserPosition,
    adapter: &mut A,
    deposit: &A::Deposit,
    now: i64,
) -> Result<WeightChange> {
    let delta = adapter.unstake_delta(position, deposit)?;

    let settlement = settle(pool, position, now)?;

    adapter.record_unstake(position, deposit)?;
    position.remove_weight(delta)?;
    pool.remove_weight(delta)?;
    position.checkpoint(pool.acc_per_weight);

    Ok(WeightChange {
        delta,
        weight: position.weight,
        total_weight: pool.total_weight,
        pending: settlement.pending,
    })
}

/// Settle and mark everything earned as paid; returns the amount to transfer
/// Zero is a valid answer, not an error
pub fn claim(pool: &mut RewardPool, position: &mut UserPosition, now: i64) -> Result<u64> {
    settle(pool, position, now)?;
    Ok(position.take_claimable())
}

/// Replay settle against `now` without writing anything
pub fn quote(pool: &RewardPool, position: &UserPosition, now: i64) -> Result<RewardQuote> {
    let accrual = pool.project(now)?;
    let pending = position.pending_at(accrual.acc_per_weight)?;

    Ok(RewardQuote {
        pending,
        claimable: safe_add_u64(position.claimable(), pending)?,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{
        error::RewardPoolError,
        state::{
            pool::tests::create_mock_pool, position::tests::create_mock_position, PoolKind,
        },
    };
    use anchor_lang::error::Error;

    const RATE: u64 = 1_000;

    fn fungible_pool() -> (RewardPool, FungibleWeight, Pubkey) {
        let asset = Pubkey::new_unique();
        let mut pool = create_mock_pool(PoolKind::Fungible, 0, RATE, u64::MAX);
        pool.staked_asset = asset;
        (pool, FungibleWeight { asset }, asset)
    }

    fn amount(asset: Pubkey, amount: u64) -> AmountDeposit {
        AmountDeposit {
            mint: asset,
            amount,
        }
    }

    #[test]
    fn test_single_depositor() {
        let (mut pool, mut adapter, asset) = fungible_pool();
        let mut alice = create_mock_position(Pubkey::new_unique());

        stake(&mut pool, &mut alice, &mut adapter, &amount(asset, 1), 0).unwrap();

        assert_eq!(quote(&pool, &alice, 1).unwrap().pending, 1_000);
        assert_eq!(quote(&pool, &alice, 5).unwrap().pending, 5_000);

        let paid = claim(&mut pool, &mut alice, 5).unwrap();
        assert_eq!(paid, 5_000);
        assert_eq!(alice.total_claimed, 5_000);
        assert_eq!(alice.total_earned, alice.total_claimed);

        // Pending grows from zero again after the claim
        assert_eq!(quote(&pool, &alice, 5).unwrap(), RewardQuote { pending: 0, claimable: 0 });
        assert_eq!(quote(&pool, &alice, 6).unwrap().pending, 1_000);
    }

    #[test]
    fn test_late_joiner_earns_only_from_joining() {
        let (mut pool, mut adapter, asset) = fungible_pool();
        let mut alice = create_mock_position(Pubkey::new_unique());
        let mut bob = create_mock_position(Pubkey::new_unique());

        stake(&mut pool, &mut alice, &mut adapter, &amount(asset, 1), 0).unwrap();
        assert_eq!(claim(&mut pool, &mut alice, 5).unwrap(), 5_000);

        stake(&mut pool, &mut bob, &mut adapter, &amount(asset, 1), 5).unwrap();
        assert_eq!(bob.total_earned, 0);

        assert_eq!(quote(&pool, &alice, 6).unwrap().pending, RATE / 2);
        assert_eq!(quote(&pool, &bob, 6).unwrap().pending, RATE / 2);

        // Second deposit one second later settles bob's half first
        stake(&mut pool, &mut bob, &mut adapter, &amount(asset, 1), 6).unwrap();
        assert_eq!(bob.total_earned, RATE / 2);
        assert_eq!(pool.total_weight, 3);
    }

    #[test]
    fn test_partial_unstake_keeps_earning() {
        let (mut pool, mut adapter, asset) = fungible_pool();
        let mut alice = create_mock_position(Pubkey::new_unique());
        let mut bob = create_mock_position(Pubkey::new_unique());

        stake(&mut pool, &mut alice, &mut adapter, &amount(asset, 2), 0).unwrap();
        stake(&mut pool, &mut bob, &mut adapter, &amount(asset, 2), 0).unwrap();

        let change = unstake(&mut pool, &mut alice, &mut adapter, &amount(asset, 1), 4).unwrap();
        assert_eq!(change.delta, 1);
        assert_eq!(change.weight, 1);
        assert_eq!(change.total_weight, 3);
        assert_eq!(alice.total_earned, 2_000);

        // From here alice holds 1 of 3 units of weight
        assert_eq!(quote(&pool, &alice, 7).unwrap().pending, 1_000);
        assert_eq!(quote(&pool, &bob, 7).unwrap().pending, 4_000);

        // The withdrawn unit cannot be withdrawn twice
        unstake(&mut pool, &mut alice, &mut adapter, &amount(asset, 1), 7).unwrap();
        assert_eq!(
            unstake(&mut pool, &mut alice, &mut adapter, &amount(asset, 1), 7).unwrap_err(),
            Error::from(RewardPoolError::InsufficientWeight)
        );
        assert_eq!(alice.weight, 0);
        assert_eq!(pool.total_weight, 2);
    }

    #[test]
    fn test_empty_pool_gap_is_never_credited() {
        let (mut pool, mut adapter, asset) = fungible_pool();
        let mut alice = create_mock_position(Pubkey::new_unique());

        stake(&mut pool, &mut alice, &mut adapter, &amount(asset, 1), 0).unwrap();
        unstake(&mut pool, &mut alice, &mut adapter, &amount(asset, 1), 2).unwrap();
        assert_eq!(alice.total_earned, 2_000);

        // Ten empty seconds, then a new deposit
        stake(&mut pool, &mut alice, &mut adapter, &amount(asset, 1), 12).unwrap();
        assert_eq!(alice.total_earned, 2_000);
        assert_eq!(pool.total_distributed, 2_000);

        assert_eq!(quote(&pool, &alice, 13).unwrap().claimable, 3_000);
    }

    #[test]
    fn test_cap_exhaustion_stops_everyone() {
        let (mut pool, mut adapter, asset) = fungible_pool();
        pool.reward_cap = 4_500;
        let mut alice = create_mock_position(Pubkey::new_unique());
        let mut bob = create_mock_position(Pubkey::new_unique());

        stake(&mut pool, &mut alice, &mut adapter, &amount(asset, 1), 0).unwrap();
        stake(&mut pool, &mut bob, &mut adapter, &amount(asset, 1), 0).unwrap();

        let alice_claim = claim(&mut pool, &mut alice, 10).unwrap();
        assert!(pool.is_exhausted());
        assert_eq!(alice_claim, 2_250);

        let bob_before = quote(&pool, &bob, 10).unwrap();
        let bob_later = quote(&pool, &bob, 10_000).unwrap();
        assert_eq!(bob_before, bob_later);
        assert_eq!(bob_later.pending, 2_250);

        assert_eq!(claim(&mut pool, &mut alice, 10_000).unwrap(), 0);
    }

    #[test]
    fn test_start_time_delays_accrual() {
        let (mut pool, mut adapter, asset) = fungible_pool();
        pool.start_time = 100;
        pool.last_update_time = 100;
        let mut alice = create_mock_position(Pubkey::new_unique());

        stake(&mut pool, &mut alice, &mut adapter, &amount(asset, 1), 40).unwrap();
        assert_eq!(quote(&pool, &alice, 99).unwrap().pending, 0);
        assert_eq!(quote(&pool, &alice, 103).unwrap().pending, 3_000);
    }

    #[test]
    fn test_large_stake_after_long_solo_period() {
        let (mut pool, mut adapter, asset) = fungible_pool();
        let mut alice = create_mock_position(Pubkey::new_unique());
        let mut bob = create_mock_position(Pubkey::new_unique());
        let year = 31_536_000;

        // One base unit alone for a year drives acc_per_weight very high
        stake(&mut pool, &mut alice, &mut adapter, &amount(asset, 1), 0).unwrap();

        let hundred_tokens = 100_000_000_000;
        stake(&mut pool, &mut bob, &mut adapter, &amount(asset, hundred_tokens), year).unwrap();
        assert_eq!(bob.total_earned, 0);

        let bob_quote = quote(&pool, &bob, year + 1).unwrap();
        assert!(bob_quote.pending > 990 && bob_quote.pending <= RATE);
        assert_eq!(quote(&pool, &alice, year + 1).unwrap().pending, year as u64 * RATE);

        let withdraw = amount(asset, hundred_tokens);
        let change = unstake(&mut pool, &mut bob, &mut adapter, &withdraw, year + 1).unwrap();
        assert_eq!(change.weight, 0);
        assert_eq!(bob.total_earned, bob_quote.pending);
    }

    #[test]
    fn test_quote_matches_claim() {
        let (mut pool, mut adapter, asset) = fungible_pool();
        let mut alice = create_mock_position(Pubkey::new_unique());
        let mut bob = create_mock_position(Pubkey::new_unique());

        stake(&mut pool, &mut alice, &mut adapter, &amount(asset, 3), 0).unwrap();
        stake(&mut pool, &mut bob, &mut adapter, &amount(asset, 7), 3).unwrap();
        claim(&mut pool, &mut alice, 4).unwrap();

        let quoted = quote(&pool, &alice, 17).unwrap();
        let again = quote(&pool, &alice, 17).unwrap();
        assert_eq!(quoted, again);

        let paid = claim(&mut pool, &mut alice, 17).unwrap();
        assert_eq!(paid, quoted.claimable);
    }

    #[test]
    fn test_rejected_request_changes_nothing() {
        let (mut pool, mut adapter, asset) = fungible_pool();
        let mut alice = create_mock_position(Pubkey::new_unique());
        stake(&mut pool, &mut alice, &mut adapter, &amount(asset, 1), 0).unwrap();

        let (pool_before, alice_before) = (pool.clone(), alice.clone());
        let wrong = AmountDeposit {
            mint: Pubkey::new_unique(),
            amount: 1,
        };
        assert!(stake(&mut pool, &mut alice, &mut adapter, &wrong, 9).is_err());
        assert!(unstake(&mut pool, &mut alice, &mut adapter, &amount(asset, 2), 9).is_err());

        assert_eq!(pool.acc_per_weight, pool_before.acc_per_weight);
        assert_eq!(pool.last_update_time, pool_before.last_update_time);
        assert_eq!(pool.total_weight, pool_before.total_weight);
        assert_eq!(alice.total_earned, alice_before.total_earned);
        assert_eq!(alice.acc_per_weight_paid, alice_before.acc_per_weight_paid);
    }

    #[test]
    fn test_fixed_id_pool_weights_by_amount() {
        let id = Pubkey::new_unique();
        let mut pool = create_mock_pool(PoolKind::FixedId { id }, 0, RATE, u64::MAX);
        let mut adapter = FixedIdWeight { id };
        let mut alice = create_mock_position(Pubkey::new_unique());
        let mut bob = create_mock_position(Pubkey::new_unique());

        let one = AmountDeposit { mint: id, amount: 1 };
        let three = AmountDeposit { mint: id, amount: 3 };
        stake(&mut pool, &mut alice, &mut adapter, &one, 0).unwrap();
        stake(&mut pool, &mut bob, &mut adapter, &three, 0).unwrap();

        assert_eq!(quote(&pool, &alice, 4).unwrap().pending, 1_000);
        assert_eq!(quote(&pool, &bob, 4).unwrap().pending, 3_000);
    }

    #[test]
    fn test_item_set_pool_weights_by_count() {
        let mut registry: BTreeMap<Pubkey, Pubkey> = BTreeMap::new();
        let mut pool = create_mock_pool(PoolKind::ItemSet, 0, RATE, u64::MAX);
        let mut alice = create_mock_position(Pubkey::new_unique());
        let mut bob = create_mock_position(Pubkey::new_unique());
        let items: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();

        {
            let mut adapter = ItemSetWeight::new(&mut registry);
            stake(&mut pool, &mut alice, &mut adapter, &items[..1], 0).unwrap();
            stake(&mut pool, &mut bob, &mut adapter, &items[1..3], 0).unwrap();

            // Someone else's item, or one already in the pool, is refused
            assert_eq!(
                stake(&mut pool, &mut alice, &mut adapter, &items[1..2], 1).unwrap_err(),
                Error::from(RewardPoolError::ItemAlreadyStaked)
            );
            assert_eq!(
                unstake(&mut pool, &mut alice, &mut adapter, &items[2..3], 1).unwrap_err(),
                Error::from(RewardPoolError::ItemNotOwned)
            );
        }

        assert_eq!(pool.total_weight, 3);
        assert_eq!(quote(&pool, &alice, 3).unwrap().pending, 1_000);
        assert_eq!(quote(&pool, &bob, 3).unwrap().pending, 2_000);

        {
            let mut adapter = ItemSetWeight::new(&mut registry);
            let change = unstake(&mut pool, &mut bob, &mut adapter, &items[1..2], 3).unwrap();
            assert_eq!(change.weight, 1);
            assert_eq!(bob.held_items, vec![items[2]]);
        }

        assert_eq!(registry.get(&items[1]), None);
        assert_eq!(registry.get(&items[2]), Some(&bob.owner));
        assert_eq!(bob.total_earned, 2_000);
    }

    /// Deterministic mixed workload checking the ledger invariants after every step
    #[test]
    fn test_invariants_hold_over_mixed_activity() {
        let (mut pool, mut adapter, asset) = fungible_pool();
        pool.reward_cap = 250_000;
        let mut positions: Vec<UserPosition> = (0..4)
            .map(|_| create_mock_position(Pubkey::new_unique()))
            .collect();

        let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut now = 0;
        let mut last_acc = 0;
        let mut last_earned = vec![0u64; positions.len()];

        for _ in 0..400 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;

            now += (seed % 4) as i64;
            let who = (seed >> 8) as usize % positions.len();
            let size = (seed >> 16) % 9 + 1;
            let deposit = amount(asset, size);
            let position = &mut positions[who];

            match (seed >> 24) % 3 {
                0 => {
                    stake(&mut pool, position, &mut adapter, &deposit, now).unwrap();
                }
                1 => {
                    let _ = unstake(&mut pool, position, &mut adapter, &deposit, now);
                }
                _ => {
                    claim(&mut pool, position, now).unwrap();
                }
            }

            let weight_sum: u64 = positions.iter().map(|p| p.weight).sum();
            let earned_sum: u64 = positions.iter().map(|p| p.total_earned).sum();
            assert_eq!(weight_sum, pool.total_weight);
            assert!(earned_sum <= pool.total_distributed);
            assert!(pool.total_distributed <= pool.reward_cap);
            assert!(pool.acc_per_weight >= last_acc);
            last_acc = pool.acc_per_weight;

            for (index, p) in positions.iter().enumerate() {
                assert!(p.total_claimed <= p.total_earned);
                assert!(p.total_earned >= last_earned[index]);
                last_earned[index] = p.total_earned;
            }
        }
    }
}
