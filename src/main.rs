use std::{
    fs,
    path::{Path, PathBuf},
    process,
    time::{SystemTime, UNIX_EPOCH},
};

use clap::{Parser, Subcommand};
use ed25519_dalek::SigningKey;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use token_ledger::{
    AccountId, Amount, MintController, TokenLedger, DEFAULT_DECIMALS, MINT_COOLDOWN_SECS,
};

//==================== State file ====================//

#[derive(Serialize, Deserialize)]
struct TokenState {
    version: u8,
    ledger: TokenLedger,
    minter: MintController,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(2);
}

fn read_state(path: &Path) -> TokenState {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => fail(format!("cannot read {}: {err}", path.display())),
    };
    match serde_json::from_slice(&bytes) {
        Ok(state) => state,
        Err(err) => fail(format!("cannot parse {}: {err}", path.display())),
    }
}

fn write_state(path: &Path, state: &TokenState) {
    let json = match serde_json::to_vec_pretty(state) {
        Ok(json) => json,
        Err(err) => fail(format!("cannot encode state: {err}")),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    if let Err(err) = fs::write(path, json) {
        fail(format!("cannot write {}: {err}", path.display()));
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

//==================== CLI surface ====================//

/// Fungible-token ledger: balances, allowances and cooldown-gated minting,
/// kept in a single JSON state file.
#[derive(Parser)]
#[command(name = "token-ledger", version)]
struct Cli {
    /// Path to the JSON state file
    #[arg(short, long, global = true, default_value = "token_state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a fresh state file with the full supply credited to the owner
    Init {
        /// Token name
        #[arg(long)]
        name: String,
        /// Token symbol
        #[arg(long)]
        symbol: String,
        /// Fixed-point scale of the token
        #[arg(long, default_value_t = DEFAULT_DECIMALS)]
        decimals: u8,
        /// Initial supply in base units
        #[arg(long)]
        supply: Amount,
        /// Account that receives the supply and owns the mint configuration
        #[arg(long)]
        owner: AccountId,
    },
    /// Show token metadata, supply and mint configuration
    Info,
    /// Show one account balance in base units
    Balance { account: AccountId },
    /// Show the approved allowance for an owner/spender pair
    Allowance {
        owner: AccountId,
        spender: AccountId,
    },
    /// Move tokens from the caller to a recipient
    Transfer {
        #[arg(long)]
        caller: AccountId,
        #[arg(long)]
        to: AccountId,
        #[arg(long)]
        amount: Amount,
    },
    /// Let a spender move up to the given amount out of the caller's account
    Approve {
        #[arg(long)]
        caller: AccountId,
        #[arg(long)]
        spender: AccountId,
        #[arg(long)]
        amount: Amount,
    },
    /// Move tokens out of another account against its allowance
    TransferFrom {
        #[arg(long)]
        caller: AccountId,
        #[arg(long)]
        from: AccountId,
        #[arg(long)]
        to: AccountId,
        #[arg(long)]
        amount: Amount,
    },
    /// Configure the per-mint amount (owner only)
    SetMintAmount {
        #[arg(long)]
        caller: AccountId,
        #[arg(long)]
        amount: Amount,
    },
    /// Credit the configured amount to the caller, once per cooldown window
    Mint {
        #[arg(long)]
        caller: AccountId,
        /// Unix time in seconds; defaults to the system clock
        #[arg(long)]
        now: Option<u64>,
    },
    /// Print every recorded state change as JSON lines
    History,
    /// Write a full snapshot with its merkle root as JSON
    Snapshot {
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate an Ed25519 keypair and derive an account id from it
    Keygen {
        /// Directory receiving sk.hex and pk.hex
        #[arg(long)]
        out_dir: PathBuf,
    },
}

//==================== Commands ====================//

fn init_cmd(
    path: &Path,
    name: String,
    symbol: String,
    decimals: u8,
    supply: Amount,
    owner: AccountId,
) {
    if path.exists() {
        fail(format!("state file {} already exists", path.display()));
    }
    let ledger = TokenLedger::initialize(name, symbol, decimals, supply, &owner);
    let minter = MintController::new(owner);
    let state = TokenState {
        version: 1,
        ledger,
        minter,
    };
    write_state(path, &state);
    println!(
        "Initialized {} ({}) → {}",
        state.ledger.name(),
        state.ledger.symbol(),
        path.display()
    );
}

fn info_cmd(path: &Path) {
    let state = read_state(path);
    let root = state.ledger.snapshot().merkle_root;
    println!("name:          {}", state.ledger.name());
    println!("symbol:        {}", state.ledger.symbol());
    println!("decimals:      {}", state.ledger.decimals());
    println!("total supply:  {}", state.ledger.total_supply());
    println!("owner:         {}", state.minter.owner());
    println!("mint amount:   {}", state.minter.mint_amount());
    println!("mint cooldown: {}s", MINT_COOLDOWN_SECS);
    println!("merkle root:   {}", hex::encode(root));
}

fn balance_cmd(path: &Path, account: AccountId) {
    let state = read_state(path);
    println!("{}", state.ledger.balance_of(&account));
}

fn allowance_cmd(path: &Path, owner: AccountId, spender: AccountId) {
    let state = read_state(path);
    println!("{}", state.ledger.allowance(&owner, &spender));
}

fn transfer_cmd(path: &Path, caller: AccountId, to: AccountId, amount: Amount) {
    let mut state = read_state(path);
    if let Err(err) = state.ledger.transfer(&caller, &to, amount) {
        fail(err);
    }
    write_state(path, &state);
    println!("Transferred {amount} base units: {caller} → {to}");
}

fn approve_cmd(path: &Path, caller: AccountId, spender: AccountId, amount: Amount) {
    let mut state = read_state(path);
    state.ledger.approve(&caller, &spender, amount);
    write_state(path, &state);
    println!("Approval set: {caller} → {spender} = {amount}");
}

fn transfer_from_cmd(
    path: &Path,
    caller: AccountId,
    from: AccountId,
    to: AccountId,
    amount: Amount,
) {
    let mut state = read_state(path);
    if let Err(err) = state.ledger.transfer_from(&caller, &from, &to, amount) {
        fail(err);
    }
    write_state(path, &state);
    println!("Transferred {amount} base units: {from} → {to} (spender {caller})");
}

fn set_mint_amount_cmd(path: &Path, caller: AccountId, amount: Amount) {
    let mut state = read_state(path);
    if let Err(err) = state.minter.set_mint_amount(&caller, amount) {
        fail(err);
    }
    write_state(path, &state);
    println!("Mint amount set → {amount}");
}

fn mint_cmd(path: &Path, caller: AccountId, now: Option<u64>) {
    let mut state = read_state(path);
    let now = now.unwrap_or_else(unix_now);
    let minted = match state.minter.mint(&mut state.ledger, &caller, now) {
        Ok(minted) => minted,
        Err(err) => fail(err),
    };
    write_state(path, &state);
    println!("Minted {minted} base units → {caller}");
}

fn history_cmd(path: &Path) {
    let state = read_state(path);
    for event in state.ledger.events() {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(err) => fail(err),
        }
    }
}

fn snapshot_cmd(path: &Path, out: Option<PathBuf>) {
    let state = read_state(path);
    let snapshot = state.ledger.snapshot();
    let json = match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => json,
        Err(err) => fail(err),
    };
    match out {
        Some(out_path) => {
            if let Err(err) = fs::write(&out_path, json) {
                fail(format!("cannot write {}: {err}", out_path.display()));
            }
            println!(
                "Snapshot → {} (root {})",
                out_path.display(),
                hex::encode(snapshot.merkle_root)
            );
        }
        None => println!("{json}"),
    }
}

//==================== Service: keygen ====================//

fn keygen_cmd(out_dir: &Path) {
    if let Err(err) = fs::create_dir_all(out_dir) {
        fail(format!("cannot create {}: {err}", out_dir.display()));
    }

    // random 32-byte secret, account id = hex of the public key
    let mut sk_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut sk_bytes);
    let sk = SigningKey::from_bytes(&sk_bytes);
    let pk = sk.verifying_key();
    let account: AccountId = hex::encode(pk.as_bytes());

    if let Err(err) = fs::write(out_dir.join("sk.hex"), hex::encode(sk_bytes)) {
        fail(format!("cannot write sk.hex: {err}"));
    }
    if let Err(err) = fs::write(out_dir.join("pk.hex"), hex::encode(pk.as_bytes())) {
        fail(format!("cannot write pk.hex: {err}"));
    }
    println!("account id: {account}");
    println!("keypair written → {}", out_dir.display());
}

//==================== main ====================//

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Init {
            name,
            symbol,
            decimals,
            supply,
            owner,
        } => init_cmd(&cli.state, name, symbol, decimals, supply, owner),
        Command::Info => info_cmd(&cli.state),
        Command::Balance { account } => balance_cmd(&cli.state, account),
        Command::Allowance { owner, spender } => allowance_cmd(&cli.state, owner, spender),
        Command::Transfer { caller, to, amount } => {
            transfer_cmd(&cli.state, caller, to, amount)
        }
        Command::Approve {
            caller,
            spender,
            amount,
        } => approve_cmd(&cli.state, caller, spender, amount),
        Command::TransferFrom {
            caller,
            from,
            to,
            amount,
        } => transfer_from_cmd(&cli.state, caller, from, to, amount),
        Command::SetMintAmount { caller, amount } => {
            set_mint_amount_cmd(&cli.state, caller, amount)
        }
        Command::Mint { caller, now } => mint_cmd(&cli.state, caller, now),
        Command::History => history_cmd(&cli.state),
        Command::Snapshot { out } => snapshot_cmd(&cli.state, out),
        Command::Keygen { out_dir } => keygen_cmd(&out_dir),
    }
}
