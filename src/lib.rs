//! Fungible-token ledger for the BlockNet stack.
//!
//! Two modules carry the whole state machine:
//!
//! * [`ledger`] implements balances, allowances, and the transfer, approve
//!   and delegated-transfer operations with strict pre-checks.
//! * [`mint`] adds owner-configured, cooldown-gated self-service minting on
//!   top of the ledger's internal supply-expanding credit.
//!
//! Caller identity and the current time are explicit arguments everywhere, so
//! every operation is deterministic and testable without any execution
//! environment around it. Failed operations leave the state byte-for-byte
//! unchanged.

pub mod ledger;
pub mod mint;

pub use ledger::{
    AccountId, Amount, LedgerError, LedgerSnapshot, TokenEvent, TokenLedger, DEFAULT_DECIMALS,
    UNIT,
};
pub use mint::{MintController, MintError, MINT_COOLDOWN_SECS};
