//! CLI Commands

use anyhow::{bail, Context};
use statedb_core::{LedgerConfig, LedgerError, Tx};
use statedb_ledger::{bootstrap, Genesis, Ledger};
use tracing::{error, info};

/// Parse a `name=amount` allocation
pub fn parse_allocation(s: &str) -> Result<(String, u64), String> {
    let (name, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=amount, got `{}`", s))?;
    if name.is_empty() {
        return Err(format!("missing account name in `{}`", s));
    }
    let amount = amount
        .parse::<u64>()
        .map_err(|e| format!("invalid amount in `{}`: {}", s, e))?;
    Ok((name.to_string(), amount))
}

pub fn init(
    config: &LedgerConfig,
    chain_id: String,
    allocations: Vec<(String, u64)>,
    force: bool,
) -> anyhow::Result<()> {
    let genesis = allocations
        .into_iter()
        .fold(Genesis::new(chain_id), |genesis, (name, amount)| {
            genesis.with_allocation(name, amount)
        });
    let supply = genesis.total_supply()?;

    bootstrap(config, &genesis, force)
        .with_context(|| format!("cannot initialize {}", config.data_dir.display()))?;

    println!("Initialized chain '{}' in {}", genesis.chain_id, config.data_dir.display());
    println!("Accounts:     {}", genesis.balances.len());
    println!("Total supply: {}", supply);
    Ok(())
}

pub fn balances(config: &LedgerConfig) -> anyhow::Result<()> {
    let ledger = open(config)?;
    let balances = ledger.balances();

    if balances.is_empty() {
        println!("No accounts.");
        return Ok(());
    }

    println!("{:<24} {:>20}", "Account", "Balance");
    println!("{:-<24} {:->20}", "", "");
    for (account, balance) in &balances {
        println!("{:<24} {:>20}", account, balance);
    }
    Ok(())
}

pub fn send(
    config: &LedgerConfig,
    from: String,
    to: String,
    value: u64,
    data: String,
) -> anyhow::Result<()> {
    if data == statedb_core::REWARD_MARKER {
        bail!("use `statedb reward` to credit rewards");
    }
    submit(config, Tx::transfer(from, to, value).with_data(data))
}

pub fn reward(config: &LedgerConfig, from: String, to: String, value: u64) -> anyhow::Result<()> {
    submit(config, Tx::reward(from, to, value))
}

pub fn status(config: &LedgerConfig) -> anyhow::Result<()> {
    let ledger = open(config)?;
    let genesis = ledger.genesis();
    let snapshot = ledger.snapshot();

    let genesis_time = match genesis.genesis_time_utc() {
        Some(time) => time.to_rfc2822(),
        None => genesis.genesis_time.clone(),
    };
    let total = snapshot
        .total()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "overflow".to_string());

    println!("statedb ledger status");
    println!("=====================");
    println!("Chain ID:      {}", genesis.chain_id);
    println!("Genesis time:  {}", genesis_time);
    println!("Genesis hash:  {}", genesis.hash()?.to_hex());
    println!("Ledger file:   {}", config.ledger_path().display());
    println!("Records:       {}", snapshot.records);
    println!("Accounts:      {}", snapshot.len());
    println!("Total supply:  {}", total);
    println!("State root:    {}", snapshot.root.to_hex());
    Ok(())
}

pub fn verify(config: &LedgerConfig) -> anyhow::Result<()> {
    let first = open(config)?.snapshot();
    let second = open(config)?.snapshot();

    if first != second || !first.verify() {
        bail!(
            "replay is not deterministic: {} vs {}",
            first.root.to_hex(),
            second.root.to_hex()
        );
    }

    println!(
        "OK: {} record(s) replay to state root {}",
        first.records,
        first.root.to_hex()
    );
    Ok(())
}

/// Attach `action` to a ledger error, flagging errors that need manual repair
fn report(config: &LedgerConfig, err: LedgerError, action: &str) -> anyhow::Error {
    if err.is_fatal() {
        error!("Ledger in {} needs repair: {}", config.data_dir.display(), err);
        anyhow::Error::new(err).context(format!(
            "{}: ledger data in {} is unusable until repaired",
            action,
            config.data_dir.display()
        ))
    } else {
        anyhow::Error::new(err).context(action.to_string())
    }
}

fn open(config: &LedgerConfig) -> anyhow::Result<Ledger> {
    Ledger::open_with_config(config).map_err(|e| {
        report(
            config,
            e,
            &format!("cannot open ledger in {}", config.data_dir.display()),
        )
    })
}

fn submit(config: &LedgerConfig, tx: Tx) -> anyhow::Result<()> {
    let ledger = open(config)?;
    let summary = tx.to_string();

    ledger
        .add(tx)
        .map_err(|e| report(config, e, "transaction rejected"))?;
    ledger
        .persist()
        .map_err(|e| report(config, e, "transaction accepted but not persisted"))?;
    info!("Committed {}", summary);

    println!("Committed: {}", summary);
    println!("Records:   {}", ledger.records());
    Ok(())
}
