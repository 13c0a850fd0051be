use anchor_lang::prelude::*;

/// Custom error types for the reward pool
/// Grouped the same way callers are expected to react to them
#[error_code]
pub enum RewardPoolError {
    // Configuration Errors
    #[msg("Reward rate must be at least one unit per second")]
    InvalidRewardRate,

    #[msg("Reward cap must be at least one unit")]
    InvalidRewardCap,

    #[msg("Start time is too far in the future")]
    InvalidStartTime,

    #[msg("Fixed-id pools need a non-default token id")]
    InvalidFixedId,

    // Precondition Errors
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Item list is empty")]
    EmptyItemList,

    #[msg("Item appears more than once in the request")]
    DuplicateItem,

    #[msg("Item is already staked in this pool")]
    ItemAlreadyStaked,

    #[msg("Position cannot hold more items")]
    TooManyItems,

    #[msg("Requested amount exceeds the staked weight")]
    InsufficientWeight,

    #[msg("Item is not held by the caller in this pool")]
    ItemNotOwned,

    #[msg("Instruction does not apply to this pool kind")]
    WrongPoolKind,

    #[msg("Token is not the asset this pool accepts")]
    WrongStakeMint,

    #[msg("Token id is not the id this pool accepts")]
    WrongTokenId,

    #[msg("Mint is not a single non-fungible item")]
    NotAnItem,

    #[msg("Item is not a verified member of the pool collection")]
    ItemNotInCollection,

    #[msg("Insufficient token balance to stake")]
    InsufficientBalance,

    // Custody and Account Errors
    #[msg("Invalid token mint provided")]
    InvalidTokenMint,

    #[msg("Invalid token account provided")]
    InvalidTokenAccount,

    #[msg("Invalid account provided")]
    InvalidAccount,

    #[msg("Insufficient reward tokens in vault")]
    InsufficientRewardTokens,

    // Math Errors
    #[msg("Mathematical overflow in calculations")]
    MathOverflow,

    #[msg("Division by zero in reward calculations")]
    DivisionByZero,
}

impl RewardPoolError {
    /// Get error code as u32 for logging
    pub fn error_code(&self) -> u32 {
        match self {
            // Configuration errors: 1000-1099
            RewardPoolError::InvalidRewardRate => 1001,
            RewardPoolError::InvalidRewardCap => 1002,
            RewardPoolError::InvalidStartTime => 1003,
            RewardPoolError::InvalidFixedId => 1004,

            // Precondition errors: 1100-1199
            RewardPoolError::ZeroAmount => 1101,
            RewardPoolError::EmptyItemList => 1102,
            RewardPoolError::DuplicateItem => 1103,
            RewardPoolError::ItemAlreadyStaked => 1104,
            RewardPoolError::TooManyItems => 1105,
            RewardPoolError::InsufficientWeight => 1106,
            RewardPoolError::ItemNotOwned => 1107,
            RewardPoolError::WrongPoolKind => 1108,
            RewardPoolError::WrongStakeMint => 1109,
            RewardPoolError::WrongTokenId => 1110,
            RewardPoolError::NotAnItem => 1111,
            RewardPoolError::ItemNotInCollection => 1112,
            RewardPoolError::InsufficientBalance => 1113,

            // Custody errors: 1200-1299
            RewardPoolError::InvalidTokenMint => 1201,
            RewardPoolError::InvalidTokenAccount => 1202,
            RewardPoolError::InvalidAccount => 1203,
            RewardPoolError::InsufficientRewardTokens => 1204,

            // Math errors: 1300-1399
            RewardPoolError::MathOverflow => 1301,
            RewardPoolError::DivisionByZero => 1302,
        }
    }

    /// Get human-readable error category
    pub fn category(&self) -> &'static str {
        match self.error_code() {
            1000..=1099 => "Configuration",
            1100..=1199 => "Precondition",
            1200..=1299 => "Custody",
            1300..=1399 => "Mathematical Operations",
            _ => "Unknown",
        }
    }
}

/// Helper macro for logging errors with context
#[macro_export]
macro_rules! log_error {
    ($error:expr, $context:expr) => {
        msg!(
            "Error {}: {} in context: {}",
            $error.error_code(),
            $error.category(),
            $context
        );
    };
}

/// Helper function to safely add two u64 values
pub fn safe_add_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(RewardPoolError::MathOverflow.into())
}

/// Helper function to safely subtract two u64 values
pub fn safe_sub_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(RewardPoolError::MathOverflow.into())
}

/// Helper function to safely add two u128 values
pub fn safe_add_u128(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(RewardPoolError::MathOverflow.into())
}

/// Helper function to safely multiply two u128 values
pub fn safe_mul_u128(a: u128, b: u128) -> Result<u128> {
    a.checked_mul(b).ok_or(RewardPoolError::MathOverflow.into())
}

/// Helper function to safely divide two u128 values (rounds down)
pub fn safe_div_u128(a: u128, b: u128) -> Result<u128> {
    if b == 0 {
        return Err(RewardPoolError::DivisionByZero.into());
    }
    Ok(a / b)
}

/// Narrow a u128 intermediate back to a token amount
pub fn to_u64(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| RewardPoolError::MathOverflow.into())
}
