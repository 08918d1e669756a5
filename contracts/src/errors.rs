//! Protocol error definitions.

use odra::prelude::*;

/// Result alias used by the pure protocol core.
pub type ZkUsdResult<T> = Result<T, ZkUsdError>;

/// zkUSD protocol errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ZkUsdError {
    // Vault errors (1xx)
    VaultNotFound = 100,
    VaultAlreadyExists = 101,
    HealthFactorTooLow = 102,
    HealthFactorTooHigh = 103,
    InsufficientCollateral = 104,
    AmountExceedsDebt = 105,

    // Oracle errors (2xx)
    InvalidWhitelist = 200,
    SenderNotWhitelisted = 201,
    PendingActionExists = 202,
    FeePoolInsufficient = 203,
    MalformedSubmission = 204,

    // Circuit breaker errors (3xx)
    EmergencyHalt = 300,

    // Access control errors (4xx)
    Unauthorized = 400,
    UnauthorizedMinter = 401,

    // Token errors (5xx)
    InsufficientBalance = 500,

    // Input errors (6xx)
    AmountZero = 600,

    // Arithmetic errors (7xx)
    DivisionByZero = 700,
    DivisionInvariant = 701,
    Overflow = 702,

    // Configuration errors (9xx)
    InvalidConfig = 900,
}

impl ZkUsdError {
    pub const fn message(&self) -> &'static str {
        match self {
            // Vault
            ZkUsdError::VaultNotFound => "Vault not found",
            ZkUsdError::VaultAlreadyExists => "Vault already exists for this owner",
            ZkUsdError::HealthFactorTooLow => "Health factor too low",
            ZkUsdError::HealthFactorTooHigh => "Health factor too high to liquidate",
            ZkUsdError::InsufficientCollateral => "Insufficient collateral",
            ZkUsdError::AmountExceedsDebt => "Amount exceeds vault debt",

            // Oracle
            ZkUsdError::InvalidWhitelist => "Oracle whitelist does not match commitment",
            ZkUsdError::SenderNotWhitelisted => "Sender is not a whitelisted oracle",
            ZkUsdError::PendingActionExists => "Oracle already has a pending submission",
            ZkUsdError::FeePoolInsufficient => "Oracle fee pool cannot cover the fee",
            ZkUsdError::MalformedSubmission => "Packed price submission is malformed",

            // Circuit breaker
            ZkUsdError::EmergencyHalt => "Operation blocked: emergency stop active",

            // Access control
            ZkUsdError::Unauthorized => "Unauthorized: caller is not admin",
            ZkUsdError::UnauthorizedMinter => "Unauthorized: caller is not a minter",

            // Token
            ZkUsdError::InsufficientBalance => "Insufficient token balance",

            // Input
            ZkUsdError::AmountZero => "Amount must be greater than zero",

            // Arithmetic
            ZkUsdError::DivisionByZero => "Division by zero",
            ZkUsdError::DivisionInvariant => "Division witness failed verification",
            ZkUsdError::Overflow => "Arithmetic overflow",

            // Config
            ZkUsdError::InvalidConfig => "Invalid configuration parameter",
        }
    }
}

impl core::fmt::Display for ZkUsdError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<ZkUsdError> for OdraError {
    fn from(error: ZkUsdError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error as u16)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error as u16, error.message())
        }
    }
}
