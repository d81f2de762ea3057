use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type AccountId = String;
pub type Amount = u128;

pub const DEFAULT_DECIMALS: u8 = 18;
pub const UNIT: Amount = 1_000_000_000_000_000_000; // 1 token = 1e18 base units

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient balance in account {account}: have {have}, need {need}")]
    InsufficientBalance {
        account: AccountId,
        have: Amount,
        need: Amount,
    },
    #[error("insufficient allowance for spender {spender} on account {owner}: have {have}, need {need}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        have: Amount,
        need: Amount,
    },
    #[error("supply overflow: crediting {amount} exceeds the representable total supply")]
    SupplyOverflow { amount: Amount },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenEvent {
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    Approval {
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    },
    Mint {
        to: AccountId,
        amount: Amount,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: Amount,
    pub balances: BTreeMap<AccountId, Amount>,
    pub allowances: BTreeMap<AccountId, BTreeMap<AccountId, Amount>>,
    pub events: Vec<TokenEvent>,
    pub merkle_root: [u8; 32],
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenLedger {
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: Amount,
    balances: BTreeMap<AccountId, Amount>,
    allowances: BTreeMap<AccountId, BTreeMap<AccountId, Amount>>,
    events: Vec<TokenEvent>,
}

impl TokenLedger {
    /// Create a ledger with the full initial supply credited to `creator`.
    pub fn initialize(
        name: String,
        symbol: String,
        decimals: u8,
        initial_supply: Amount,
        creator: &AccountId,
    ) -> Self {
        let mut balances = BTreeMap::new();
        balances.insert(creator.clone(), initial_supply);
        Self {
            name,
            symbol,
            decimals,
            total_supply: initial_supply,
            balances,
            allowances: BTreeMap::new(),
            events: vec![TokenEvent::Mint {
                to: creator.clone(),
                amount: initial_supply,
            }],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn events(&self) -> &[TokenEvent] {
        &self.events
    }

    pub fn transfer(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.debit_balance(caller, amount)?;
        self.credit_balance(to, amount);
        self.events.push(TokenEvent::Transfer {
            from: caller.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    /// Replaces any prior allowance for the pair; the cap is not additive.
    pub fn approve(&mut self, caller: &AccountId, spender: &AccountId, amount: Amount) {
        self.allowances
            .entry(caller.clone())
            .or_default()
            .insert(spender.clone(), amount);
        self.events.push(TokenEvent::Approval {
            owner: caller.clone(),
            spender: spender.clone(),
            amount,
        });
    }

    /// Delegated transfer. The balance of `from` is checked before the
    /// caller's allowance, so a caller lacking both always sees the balance
    /// error; all three mutations apply together or not at all.
    pub fn transfer_from(
        &mut self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let have = self.balance_of(from);
        if have < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from.clone(),
                have,
                need: amount,
            });
        }
        let approved = self.allowance(from, caller);
        if approved < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: from.clone(),
                spender: caller.clone(),
                have: approved,
                need: amount,
            });
        }
        self.debit_balance(from, amount)?;
        self.credit_balance(to, amount);
        self.allowances
            .entry(from.clone())
            .or_default()
            .insert(caller.clone(), approved - amount);
        self.events.push(TokenEvent::Transfer {
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    /// Supply-expanding credit with no matching debit. Crate-internal so the
    /// supply can only grow through initialization and the mint path.
    pub(crate) fn credit(
        &mut self,
        account: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow { amount })?;
        self.total_supply = new_supply;
        self.credit_balance(account, amount);
        self.events.push(TokenEvent::Mint {
            to: account.clone(),
            amount,
        });
        Ok(())
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            total_supply: self.total_supply,
            balances: self.balances.clone(),
            allowances: self.allowances.clone(),
            events: self.events.clone(),
            merkle_root: compute_merkle_root(&self.balances, &self.allowances),
        }
    }

    // Cannot overflow once the supply fits: every balance is bounded by the
    // total supply.
    fn credit_balance(&mut self, account: &AccountId, amount: Amount) {
        *self.balances.entry(account.clone()).or_insert(0) += amount;
    }

    fn debit_balance(&mut self, account: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        let have = self.balance_of(account);
        if have < amount {
            return Err(LedgerError::InsufficientBalance {
                account: account.clone(),
                have,
                need: amount,
            });
        }
        *self.balances.entry(account.clone()).or_insert(0) -= amount;
        Ok(())
    }
}

fn compute_merkle_root(
    balances: &BTreeMap<AccountId, Amount>,
    allowances: &BTreeMap<AccountId, BTreeMap<AccountId, Amount>>,
) -> [u8; 32] {
    let mut leaves: Vec<[u8; 32]> = Vec::new();
    for (account, amount) in balances {
        let mut hasher = Sha256::new();
        hasher.update(b"bal");
        hasher.update(account.as_bytes());
        hasher.update(amount.to_le_bytes());
        leaves.push(hasher.finalize().into());
    }
    for (owner, spenders) in allowances {
        for (spender, amount) in spenders {
            let mut hasher = Sha256::new();
            hasher.update(b"allw");
            hasher.update(owner.as_bytes());
            hasher.update(spender.as_bytes());
            hasher.update(amount.to_le_bytes());
            leaves.push(hasher.finalize().into());
        }
    }
    build_merkle(leaves)
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"token-ledger-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(&chunk[0]);
            if chunk.len() == 2 {
                hasher.update(&chunk[1]);
            } else {
                hasher.update(&chunk[0]);
            }
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}
