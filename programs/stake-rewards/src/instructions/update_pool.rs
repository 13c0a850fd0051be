use anchor_lang::prelude::*;

use crate::state::{Accrual, RewardPool};

/// Advance the pool accumulator to the current time
/// Lightweight keeper call that anyone can make; stake, unstake and claim
/// do the same thing implicitly
#[derive(Accounts)]
pub struct UpdatePool<'info> {
    /// The pool whose accumulator is advanced
    #[account(mut)]
    pub pool: Account<'info, RewardPool>,

    /// The caller of this instruction (can be anyone)
    /// CHECK: This account is not validated as anyone can call this instruction
    pub caller: UncheckedAccount<'info>,
}

impl<'info> UpdatePool<'info> {
    /// Execute the accumulator update
    pub fn update_pool(&mut self) -> Result<()> {
        let current_time = Clock::get()?.unix_timestamp;

        // Store previous value for logging
        let previous_acc = self.pool.acc_per_weight;
        let accrual = self.pool.touch(current_time)?;

        // Log the update event
        self.log_update_event(previous_acc, &accrual);

        Ok(())
    }

    fn log_update_event(&self, previous_acc: u128, accrual: &Accrual) {
        let pool = &self.pool;

        msg!(
            "POOL UPDATE: pool={}, caller={}, updated_to={}",
            pool.key(),
            self.caller.key(),
            accrual.update_time
        );

        msg!(
            "Accumulator: previous={}, new={}, credited={}, forfeited={}",
            previous_acc,
            accrual.acc_per_weight,
            accrual.due,
            accrual.forfeited
        );

        let (total_weight, distributed, remaining, _) = pool.get_stats();
        msg!(
            "Pool status: total_weight={}, distributed={}, remaining={}, exhausted={}",
            total_weight,
            distributed,
            remaining,
            pool.is_exhausted()
        );
    }
}
