use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ledger::{AccountId, Amount, LedgerError, TokenLedger};

/// Minimum spacing between two successful mints by the same account.
pub const MINT_COOLDOWN_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum MintError {
    #[error("caller lacks permission")]
    PermissionDenied,
    #[error("mint cooldown active for account {account}: {remaining}s remaining")]
    CooldownActive { account: AccountId, remaining: u64 },
    #[error("mint credit failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// Owner-configured faucet: any account may claim the configured amount once
/// per cooldown window.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MintController {
    owner: AccountId,
    mint_amount: Amount,
    last_mint: BTreeMap<AccountId, u64>,
}

impl MintController {
    /// New controller with minting disabled (amount zero) until the owner
    /// configures it.
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            mint_amount: 0,
            last_mint: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn mint_amount(&self) -> Amount {
        self.mint_amount
    }

    /// Unix time of the account's last successful mint; zero means never.
    pub fn last_mint(&self, account: &AccountId) -> u64 {
        self.last_mint.get(account).copied().unwrap_or(0)
    }

    /// Seconds until the account may mint again. Zero for accounts that never
    /// minted, whatever the clock reads.
    pub fn cooldown_remaining(&self, account: &AccountId, now: u64) -> u64 {
        let last = self.last_mint(account);
        if last == 0 {
            return 0;
        }
        MINT_COOLDOWN_SECS.saturating_sub(now.saturating_sub(last))
    }

    pub fn set_mint_amount(&mut self, caller: &AccountId, amount: Amount) -> Result<(), MintError> {
        if *caller != self.owner {
            return Err(MintError::PermissionDenied);
        }
        self.mint_amount = amount;
        Ok(())
    }

    /// Credit the configured amount to the caller and start its cooldown
    /// window. The window is per account; other accounts are unaffected.
    pub fn mint(
        &mut self,
        ledger: &mut TokenLedger,
        caller: &AccountId,
        now: u64,
    ) -> Result<Amount, MintError> {
        let remaining = self.cooldown_remaining(caller, now);
        if remaining > 0 {
            return Err(MintError::CooldownActive {
                account: caller.clone(),
                remaining,
            });
        }
        ledger.credit(caller, self.mint_amount)?;
        self.last_mint.insert(caller.clone(), now);
        Ok(self.mint_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{DEFAULT_DECIMALS, UNIT};

    const T0: u64 = 1_700_000_000;

    fn setup() -> (TokenLedger, MintController) {
        let owner: AccountId = "owner".into();
        let ledger = TokenLedger::initialize(
            "PauliNCoin".into(),
            "PNC".into(),
            DEFAULT_DECIMALS,
            1_000 * UNIT,
            &owner,
        );
        let minter = MintController::new(owner);
        (ledger, minter)
    }

    #[test]
    fn set_mint_amount_requires_owner() {
        let (_, mut minter) = setup();
        let err = minter
            .set_mint_amount(&"other".to_string(), 1_000)
            .unwrap_err();
        assert!(matches!(err, MintError::PermissionDenied));
        assert_eq!(err.to_string(), "caller lacks permission");
        assert_eq!(minter.mint_amount(), 0);
    }

    #[test]
    fn owner_configures_mint_amount() {
        let (_, mut minter) = setup();
        assert_eq!(minter.owner(), "owner");
        minter.set_mint_amount(&"owner".to_string(), 1_000).unwrap();
        assert_eq!(minter.mint_amount(), 1_000);
    }

    #[test]
    fn cooldown_remaining_counts_down() {
        let (mut ledger, mut minter) = setup();
        let caller: AccountId = "other".into();
        assert_eq!(minter.cooldown_remaining(&caller, 0), 0);
        minter.mint(&mut ledger, &caller, T0).unwrap();
        assert_eq!(minter.cooldown_remaining(&caller, T0), MINT_COOLDOWN_SECS);
        assert_eq!(
            minter.cooldown_remaining(&caller, T0 + MINT_COOLDOWN_SECS / 2),
            MINT_COOLDOWN_SECS / 2
        );
        assert_eq!(
            minter.cooldown_remaining(&caller, T0 + MINT_COOLDOWN_SECS),
            0
        );
    }

    #[test]
    fn mint_credits_configured_amount() {
        let (mut ledger, mut minter) = setup();
        minter.set_mint_amount(&"owner".to_string(), 1_000).unwrap();
        let minted = minter
            .mint(&mut ledger, &"other".to_string(), T0)
            .unwrap();
        assert_eq!(minted, 1_000);
        assert_eq!(ledger.balance_of(&"other".to_string()), 1_000);
        assert_eq!(ledger.total_supply(), 1_000 * UNIT + 1_000);
        assert_eq!(minter.last_mint(&"other".to_string()), T0);
    }

    #[test]
    fn mint_respects_per_account_cooldown() {
        let (mut ledger, mut minter) = setup();
        minter.set_mint_amount(&"owner".to_string(), 1_000).unwrap();
        let caller: AccountId = "other".into();
        minter.mint(&mut ledger, &caller, T0).unwrap();
        let err = minter.mint(&mut ledger, &caller, T0 + 1).unwrap_err();
        assert!(matches!(err, MintError::CooldownActive { .. }));
        minter
            .mint(&mut ledger, &caller, T0 + 2 * MINT_COOLDOWN_SECS)
            .unwrap();
        assert_eq!(ledger.balance_of(&caller), 2_000);
    }

    #[test]
    fn cooldown_boundary_is_inclusive() {
        let (mut ledger, mut minter) = setup();
        minter.set_mint_amount(&"owner".to_string(), 10).unwrap();
        let caller: AccountId = "other".into();
        minter.mint(&mut ledger, &caller, T0).unwrap();
        let err = minter
            .mint(&mut ledger, &caller, T0 + MINT_COOLDOWN_SECS - 1)
            .unwrap_err();
        assert!(matches!(
            err,
            MintError::CooldownActive { remaining: 1, .. }
        ));
        minter
            .mint(&mut ledger, &caller, T0 + MINT_COOLDOWN_SECS)
            .unwrap();
        assert_eq!(ledger.balance_of(&caller), 20);
    }

    #[test]
    fn accounts_mint_independently() {
        let (mut ledger, mut minter) = setup();
        minter.set_mint_amount(&"owner".to_string(), 7).unwrap();
        minter.mint(&mut ledger, &"alice".to_string(), T0).unwrap();
        minter
            .mint(&mut ledger, &"bob".to_string(), T0 + 10)
            .unwrap();
        assert_eq!(ledger.balance_of(&"alice".to_string()), 7);
        assert_eq!(ledger.balance_of(&"bob".to_string()), 7);
    }

    #[test]
    fn first_mint_succeeds_near_the_epoch() {
        let (mut ledger, mut minter) = setup();
        minter.set_mint_amount(&"owner".to_string(), 5).unwrap();
        // now is far less than the cooldown width; a fresh account still mints.
        minter.mint(&mut ledger, &"other".to_string(), 5).unwrap();
        assert_eq!(ledger.balance_of(&"other".to_string()), 5);
    }

    #[test]
    fn zero_mint_amount_still_arms_cooldown() {
        let (mut ledger, mut minter) = setup();
        let caller: AccountId = "other".into();
        let minted = minter.mint(&mut ledger, &caller, T0).unwrap();
        assert_eq!(minted, 0);
        assert_eq!(ledger.total_supply(), 1_000 * UNIT);
        let err = minter.mint(&mut ledger, &caller, T0 + 1).unwrap_err();
        assert!(matches!(err, MintError::CooldownActive { .. }));
    }

    #[test]
    fn rejected_mint_leaves_state_untouched() {
        let (mut ledger, mut minter) = setup();
        minter.set_mint_amount(&"owner".to_string(), 1_000).unwrap();
        let caller: AccountId = "other".into();
        minter.mint(&mut ledger, &caller, T0).unwrap();
        let supply = ledger.total_supply();
        let events = ledger.events().len();
        minter.mint(&mut ledger, &caller, T0 + 60).unwrap_err();
        assert_eq!(ledger.total_supply(), supply);
        assert_eq!(ledger.balance_of(&caller), 1_000);
        assert_eq!(ledger.events().len(), events);
        assert_eq!(minter.last_mint(&caller), T0);
    }

    #[test]
    fn clock_regression_keeps_cooldown_active() {
        let (mut ledger, mut minter) = setup();
        minter.set_mint_amount(&"owner".to_string(), 1).unwrap();
        let caller: AccountId = "other".into();
        minter.mint(&mut ledger, &caller, T0).unwrap();
        let err = minter.mint(&mut ledger, &caller, T0 - 100).unwrap_err();
        assert!(matches!(err, MintError::CooldownActive { .. }));
    }

    #[test]
    fn supply_overflow_aborts_the_mint() {
        let owner: AccountId = "owner".into();
        let mut ledger =
            TokenLedger::initialize("Max".into(), "MAX".into(), 0, Amount::MAX, &owner);
        let mut minter = MintController::new(owner);
        minter.set_mint_amount(&"owner".to_string(), 1).unwrap();
        let caller: AccountId = "other".into();
        let err = minter.mint(&mut ledger, &caller, T0).unwrap_err();
        assert!(matches!(
            err,
            MintError::Ledger(LedgerError::SupplyOverflow { .. })
        ));
        assert_eq!(minter.last_mint(&caller), 0);
        assert_eq!(ledger.total_supply(), Amount::MAX);
    }
}
