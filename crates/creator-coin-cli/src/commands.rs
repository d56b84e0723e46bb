//! CLI command implementations

use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use creator_coin_core::{
    creator_coin_address, Address, Hash256, LocalWallet, Permit, RecoverableSignature,
};
use creator_coin_ledger::{Ledger, Role, SidechainExit};

use crate::config::CliConfig;
use crate::error::{CliError, Result};
use crate::state::StateStore;

/// Creator coin operator tooling
#[derive(Parser)]
#[command(name = "ccoin")]
#[command(about = "Deploy creator coins and move them between mainnet and the sidechain")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to $CCOIN_CONFIG, then the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Ledger state file, overriding the configured one
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy the factory and bridge and point the factory at the bridge
    Init {
        /// Deploying account; becomes factory owner and bridge admin
        #[arg(long)]
        deployer: Address,
    },

    /// Deploy a coin if needed and mint `amount` whole coins to a receiver
    DeployCoin {
        /// Factory owner and bridge minter
        #[arg(long)]
        from: Address,

        #[arg(long)]
        symbol: String,

        /// Defaults to "<symbol> Coin"
        #[arg(long)]
        name: Option<String>,

        /// Defaults to "<symbol>fakePricingCurveId"
        #[arg(long)]
        curve_id: Option<String>,

        /// Decimals for a newly deployed coin
        #[arg(long)]
        decimals: Option<u8>,

        #[arg(long)]
        receiver: Address,

        /// Whole coins, scaled by the coin's decimals
        #[arg(long, default_value_t = 100)]
        amount: u128,

        /// Sidechain supply to record after the mint
        #[arg(long, default_value_t = 0)]
        sidechain_supply: u128,
    },

    /// Predict the address of the coin for a curve id
    Address {
        curve_id: String,

        /// Factory to derive from instead of the deployed one
        #[arg(long)]
        factory: Option<Address>,

        /// Coin init code hash to derive with
        #[arg(long)]
        init_code_hash: Option<Hash256>,
    },

    /// Mint coins debited on the sidechain
    BridgeToMainnet {
        /// Bridge minter
        #[arg(long)]
        from: Address,

        #[arg(long)]
        curve_id: String,

        #[arg(long)]
        receiver: Address,

        /// Base units
        #[arg(long)]
        amount: u128,

        /// Sidechain supply after the debit
        #[arg(long)]
        sidechain_supply: u128,
    },

    /// Sign a permit with the holder key and burn coins toward the sidechain
    BridgeToSidechain {
        /// Holder private key (hex)
        #[arg(long)]
        key: String,

        #[arg(long)]
        curve_id: String,

        /// Base units
        #[arg(long)]
        amount: u128,

        /// Permit deadline in seconds; never expires if omitted
        #[arg(long)]
        deadline: Option<u64>,

        /// Submit on the holder's behalf from this account
        #[arg(long)]
        relayer: Option<Address>,
    },

    /// Record a coin's total sidechain supply
    SetSidechainSupply {
        /// Bridge minter
        #[arg(long)]
        from: Address,

        #[arg(long)]
        curve_id: String,

        #[arg(long)]
        amount: u128,
    },

    /// Move coins between accounts
    Transfer {
        #[arg(long)]
        from: Address,

        #[arg(long)]
        curve_id: String,

        #[arg(long)]
        to: Address,

        /// Base units
        #[arg(long)]
        amount: u128,
    },

    /// Grant a bridge role
    GrantRole {
        /// Admin granting the role
        #[arg(long)]
        from: Address,

        /// ADMIN or MINTER
        role: Role,

        account: Address,
    },

    /// Revoke a bridge role
    RevokeRole {
        /// Admin revoking the role
        #[arg(long)]
        from: Address,

        /// ADMIN or MINTER
        role: Role,

        account: Address,
    },

    /// Give up a bridge role held by the caller
    RenounceRole {
        #[arg(long)]
        from: Address,

        role: Role,
    },

    /// List bridge role members
    Roles,

    /// Show an account's balance of a coin
    Balance {
        #[arg(long)]
        curve_id: String,

        account: Address,
    },

    /// Show coin details
    Coin {
        curve_id: String,
    },

    /// Show committed events
    Events {
        /// Only events from this contract
        #[arg(long)]
        emitter: Option<Address>,

        /// Show only the last N events
        #[arg(short = 'n', long)]
        last: Option<usize>,
    },

    /// Generate a new holder key
    Keygen,

    /// Ledger clock
    #[command(subcommand)]
    Clock(ClockCommands),
}

#[derive(Subcommand)]
pub enum ClockCommands {
    /// Show the current block timestamp
    Show,

    /// Set the block timestamp; it may not be earlier than the current one
    Set { timestamp: u64 },

    /// Move the clock forward
    Advance { seconds: u64 },
}

/// Parameters of `deploy-coin`
#[derive(Debug, Clone)]
pub struct DeployCoinArgs {
    pub from: Address,
    pub symbol: String,
    pub name: Option<String>,
    pub curve_id: Option<String>,
    pub decimals: Option<u8>,
    pub receiver: Address,
    pub amount: u128,
    pub sidechain_supply: u128,
}

/// Outcome of `deploy-coin`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedCoin {
    pub address: Address,
    pub curve_id: String,
    pub name: String,
    pub symbol: String,
    /// False if the coin already existed
    pub newly_deployed: bool,
    /// Base units minted to the receiver
    pub minted: u128,
}

/// Contracts created by `init`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub factory: Address,
    pub bridge: Address,
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    let config_path = CliConfig::resolve_path(cli.config);
    let config = CliConfig::load_or_create(&config_path)?;
    let store = StateStore::new(cli.state.unwrap_or(config.state_path));
    let mut ledger = store.load_or_new(&config.ledger)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if execute(&mut ledger, cli.command, &mut out)? {
        store.save(&ledger)?;
    }
    Ok(())
}

/// Execute one command against `ledger`, returning whether it changed
pub fn execute(ledger: &mut Ledger, command: Commands, out: &mut dyn Write) -> Result<bool> {
    match command {
        Commands::Init { deployer } => {
            let deployment = init(ledger, deployer)?;
            writeln!(out, "Factory address: {}", deployment.factory)?;
            writeln!(out, "Bridge address: {}", deployment.bridge)?;
            Ok(true)
        }

        Commands::DeployCoin {
            from,
            symbol,
            name,
            curve_id,
            decimals,
            receiver,
            amount,
            sidechain_supply,
        } => {
            let args = DeployCoinArgs {
                from,
                symbol,
                name,
                curve_id,
                decimals,
                receiver,
                amount,
                sidechain_supply,
            };
            let coin = deploy_coin(ledger, &args)?;
            let status = if coin.newly_deployed {
                "deployed to"
            } else {
                "already deployed to"
            };
            writeln!(
                out,
                "Creator coin: {} ({}) {} {} {}",
                coin.name, coin.symbol, coin.curve_id, status, coin.address
            )?;
            writeln!(out, "{} {} sent to {}", args.amount, coin.symbol, receiver)?;
            Ok(true)
        }

        Commands::Address {
            curve_id,
            factory,
            init_code_hash,
        } => {
            let init_code_hash = init_code_hash
                .unwrap_or_else(|| ledger.config().factory_options().init_code_hash);
            let address = match factory {
                Some(factory) => creator_coin_address(&factory, &curve_id, &init_code_hash),
                None => creator_coin_address(&ledger.factory()?.address(), &curve_id, &init_code_hash),
            };
            writeln!(out, "{}", address)?;
            Ok(false)
        }

        Commands::BridgeToMainnet {
            from,
            curve_id,
            receiver,
            amount,
            sidechain_supply,
        } => {
            ledger.bridge_to_mainnet(from, &curve_id, receiver, amount, sidechain_supply)?;
            writeln!(out, "Bridged {} of {} to {}", amount, curve_id, receiver)?;
            Ok(true)
        }

        Commands::BridgeToSidechain {
            key,
            curve_id,
            amount,
            deadline,
            relayer,
        } => {
            let holder = LocalWallet::from_hex(&key)?;
            let deadline = deadline.unwrap_or(u64::MAX);
            let signature = sign_bridge_out(ledger, &holder, &curve_id, amount, deadline)?;
            let exit = SidechainExit::new(amount, deadline, signature);
            match relayer {
                Some(relayer) => {
                    ledger.bridge_to_sidechain_for(relayer, holder.address(), &curve_id, &exit)?
                }
                None => ledger.bridge_to_sidechain(holder.address(), &curve_id, &exit)?,
            }
            writeln!(out, "Permit signature: {}", signature.to_hex())?;
            writeln!(
                out,
                "Bridged {} of {} to the sidechain from {}",
                amount,
                curve_id,
                holder.address()
            )?;
            Ok(true)
        }

        Commands::SetSidechainSupply {
            from,
            curve_id,
            amount,
        } => {
            ledger.set_total_sidechain_supply(from, &curve_id, amount)?;
            writeln!(out, "Total sidechain supply of {} set to {}", curve_id, amount)?;
            Ok(true)
        }

        Commands::Transfer {
            from,
            curve_id,
            to,
            amount,
        } => {
            let token = ledger.bridge_coin_for(&curve_id)?;
            ledger.transfer(from, &token, to, amount)?;
            writeln!(out, "Transferred {} of {} to {}", amount, curve_id, to)?;
            Ok(true)
        }

        Commands::GrantRole {
            from,
            role,
            account,
        } => {
            ledger.grant_role(from, role, account)?;
            writeln!(out, "Granted {} to {}", role, account)?;
            Ok(true)
        }

        Commands::RevokeRole {
            from,
            role,
            account,
        } => {
            ledger.revoke_role(from, role, account)?;
            writeln!(out, "Revoked {} from {}", role, account)?;
            Ok(true)
        }

        Commands::RenounceRole { from, role } => {
            ledger.renounce_role(from, role, from)?;
            writeln!(out, "{} renounced {}", from, role)?;
            Ok(true)
        }

        Commands::Roles => {
            let bridge = ledger.bridge()?;
            for role in Role::ALL {
                writeln!(
                    out,
                    "{} ({}), administered by {}:",
                    role,
                    role.id(),
                    bridge.get_role_admin(role)
                )?;
                for member in bridge.roles().members(role) {
                    writeln!(out, "  {}", member)?;
                }
            }
            Ok(false)
        }

        Commands::Balance { curve_id, account } => {
            let coin = ledger.coin_for(&curve_id)?;
            let balance = coin.balance_of(&account);
            writeln!(
                out,
                "{} {} ({} base units)",
                format_units(balance, coin.decimals()),
                coin.symbol(),
                balance
            )?;
            Ok(false)
        }

        Commands::Coin { curve_id } => {
            let coin = ledger.coin_for(&curve_id)?;
            writeln!(out, "Creator Coin:")?;
            writeln!(out, "  Name: {}", coin.name())?;
            writeln!(out, "  Symbol: {}", coin.symbol())?;
            writeln!(out, "  Address: {}", coin.address())?;
            writeln!(out, "  Curve ID: {}", coin.curve_id())?;
            writeln!(out, "  Curve ID Hash: {}", coin.curve_id_hash())?;
            writeln!(out, "  Factory: {}", coin.factory())?;
            writeln!(out, "  Decimals: {}", coin.decimals())?;
            writeln!(
                out,
                "  Total Supply: {}",
                format_units(coin.total_supply(), coin.decimals())
            )?;
            writeln!(
                out,
                "  Total Sidechain Supply: {}",
                format_units(coin.total_sidechain_supply(), coin.decimals())
            )?;
            writeln!(
                out,
                "  Current Sidechain Supply: {}",
                format_units(coin.current_sidechain_supply(), coin.decimals())
            )?;
            writeln!(out, "  Holders: {}", coin.holders().count())?;
            writeln!(out, "  Domain Separator: {}", coin.domain_separator())?;
            Ok(false)
        }

        Commands::Events { emitter, last } => {
            let logs: Vec<_> = ledger
                .logs()
                .iter()
                .enumerate()
                .filter(|(_, log)| emitter.map_or(true, |e| log.emitter == e))
                .collect();
            let skip = last.map_or(0, |n| logs.len().saturating_sub(n));
            for (index, log) in logs.into_iter().skip(skip) {
                writeln!(
                    out,
                    "#{} {} {} {}",
                    index,
                    log.emitter,
                    log.event.name(),
                    serde_json::to_string(&log.event)?
                )?;
            }
            Ok(false)
        }

        Commands::Keygen => {
            let wallet = LocalWallet::random();
            writeln!(out, "Address: {}", wallet.address())?;
            writeln!(out, "Private key: {}", wallet.to_hex().as_str())?;
            Ok(false)
        }

        Commands::Clock(cmd) => {
            let changed = match cmd {
                ClockCommands::Show => false,
                ClockCommands::Set { timestamp } => {
                    ledger.set_timestamp(timestamp)?;
                    true
                }
                ClockCommands::Advance { seconds } => {
                    ledger.advance_time(seconds)?;
                    true
                }
            };
            let ts = ledger.timestamp();
            writeln!(out, "Block timestamp: {} ({})", ts, format_timestamp(ts))?;
            Ok(changed)
        }
    }
}

/// Deploy the factory and bridge from `deployer` and wire them together
pub fn init(ledger: &mut Ledger, deployer: Address) -> Result<Deployment> {
    let factory = ledger.deploy_factory(deployer)?;
    let bridge = ledger.deploy_bridge(deployer)?;
    ledger.set_bridge(deployer, bridge)?;
    info!("Initialized factory {} and bridge {}", factory, bridge);
    Ok(Deployment { factory, bridge })
}

/// Deploy the coin for a symbol if it does not exist yet, then mint
/// `amount` whole coins to the receiver through the bridge
pub fn deploy_coin(ledger: &mut Ledger, args: &DeployCoinArgs) -> Result<DeployedCoin> {
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| format!("{} Coin", args.symbol));
    let curve_id = args
        .curve_id
        .clone()
        .unwrap_or_else(|| format!("{}fakePricingCurveId", args.symbol));

    let mut address = ledger.get_creator_coin_from_curve_id(&curve_id)?;
    let newly_deployed = address.is_zero();
    if newly_deployed {
        address = match args.decimals {
            Some(decimals) => ledger.deploy_creator_coin_with_decimals(
                args.from,
                &curve_id,
                &name,
                &args.symbol,
                decimals,
            )?,
            None => ledger.deploy_creator_coin(args.from, &curve_id, &name, &args.symbol)?,
        };
    }

    let coin = ledger.coin(&address)?;
    let (name, symbol) = (coin.name().to_string(), coin.symbol().to_string());
    let minted = scale_amount(args.amount, coin.decimals())?;
    ledger.bridge_to_mainnet(
        args.from,
        &curve_id,
        args.receiver,
        minted,
        args.sidechain_supply,
    )?;

    Ok(DeployedCoin {
        address,
        curve_id,
        name,
        symbol,
        newly_deployed,
        minted,
    })
}

/// Sign a permit letting the bridge pull `amount` of the holder's coins
pub fn sign_bridge_out(
    ledger: &Ledger,
    holder: &LocalWallet,
    curve_id: &str,
    amount: u128,
    deadline: u64,
) -> Result<RecoverableSignature> {
    let token = ledger.bridge_coin_for(curve_id)?;
    let coin = ledger.coin(&token)?;
    let permit = Permit {
        owner: holder.address(),
        spender: ledger.bridge()?.address(),
        value: amount,
        nonce: coin.nonces(&holder.address()),
        deadline,
    };
    Ok(holder.sign_permit(coin.domain(), &permit)?)
}

/// `amount` whole coins in base units
pub fn scale_amount(amount: u128, decimals: u8) -> Result<u128> {
    10u128
        .checked_pow(u32::from(decimals))
        .and_then(|unit| amount.checked_mul(unit))
        .ok_or_else(|| {
            CliError::InvalidArgument(format!(
                "{} with {} decimals does not fit in 128 bits",
                amount, decimals
            ))
        })
}

/// Render base units as a decimal amount
pub fn format_units(value: u128, decimals: u8) -> String {
    let Some(unit) = 10u128.checked_pow(u32::from(decimals)) else {
        return value.to_string();
    };
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = usize::from(decimals));
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

fn format_timestamp(ts: u64) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "never".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOYER: Address = Address([0xd0; 20]);
    const RECEIVER: Address = Address([0x21; 20]);

    fn initialized() -> (Ledger, Deployment) {
        let mut ledger = Ledger::default();
        let deployment = init(&mut ledger, DEPLOYER).unwrap();
        (ledger, deployment)
    }

    fn deploy_args(symbol: &str) -> DeployCoinArgs {
        DeployCoinArgs {
            from: DEPLOYER,
            symbol: symbol.to_string(),
            name: None,
            curve_id: None,
            decimals: None,
            receiver: RECEIVER,
            amount: 100,
            sidechain_supply: 0,
        }
    }

    fn run_cmd(ledger: &mut Ledger, command: Commands) -> (bool, String) {
        let mut out = Vec::new();
        let changed = execute(ledger, command, &mut out).unwrap();
        (changed, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_init_uses_create_addresses() {
        let (ledger, deployment) = initialized();
        assert_eq!(
            deployment.factory,
            creator_coin_core::create_address(&DEPLOYER, 0)
        );
        assert_eq!(ledger.factory().unwrap().bridge(), deployment.bridge);
        assert!(ledger.has_role(Role::Minter, &DEPLOYER).unwrap());
    }

    #[test]
    fn test_deploy_coin_defaults() {
        let (mut ledger, _) = initialized();
        let coin = deploy_coin(&mut ledger, &deploy_args("JONO")).unwrap();
        assert!(coin.newly_deployed);
        assert_eq!(coin.name, "JONO Coin");
        assert_eq!(coin.curve_id, "JONOfakePricingCurveId");
        assert_eq!(coin.minted, 100_000_000);
        assert_eq!(
            ledger.coin(&coin.address).unwrap().balance_of(&RECEIVER),
            100_000_000
        );
    }

    #[test]
    fn test_deploy_coin_reuses_existing() {
        let (mut ledger, _) = initialized();
        let first = deploy_coin(&mut ledger, &deploy_args("JONO")).unwrap();
        let second = deploy_coin(&mut ledger, &deploy_args("JONO")).unwrap();
        assert!(!second.newly_deployed);
        assert_eq!(first.address, second.address);
        assert_eq!(ledger.coin(&first.address).unwrap().total_supply(), 200_000_000);
    }

    #[test]
    fn test_deploy_coin_with_decimals() {
        let (mut ledger, _) = initialized();
        let args = DeployCoinArgs {
            decimals: Some(18),
            amount: 2,
            ..deploy_args("WIDE")
        };
        let coin = deploy_coin(&mut ledger, &args).unwrap();
        assert_eq!(coin.minted, 2_000_000_000_000_000_000);
    }

    #[test]
    fn test_bridge_out_through_cli() {
        let (mut ledger, _) = initialized();
        let holder = LocalWallet::random();
        let args = DeployCoinArgs {
            receiver: holder.address(),
            ..deploy_args("JONO")
        };
        let coin = deploy_coin(&mut ledger, &args).unwrap();

        let (changed, output) = run_cmd(
            &mut ledger,
            Commands::BridgeToSidechain {
                key: holder.to_hex().to_string(),
                curve_id: coin.curve_id.clone(),
                amount: 40_000_000,
                deadline: None,
                relayer: None,
            },
        );
        assert!(changed);
        assert!(output.contains("Bridged 40000000"));

        let (_, output) = run_cmd(
            &mut ledger,
            Commands::Balance {
                curve_id: coin.curve_id,
                account: holder.address(),
            },
        );
        assert!(output.starts_with("60 JONO"));
    }

    #[test]
    fn test_rejected_call_reports_reason() {
        let (mut ledger, _) = initialized();
        deploy_coin(&mut ledger, &deploy_args("JONO")).unwrap();
        let err = execute(
            &mut ledger,
            Commands::BridgeToMainnet {
                from: RECEIVER,
                curve_id: "JONOfakePricingCurveId".to_string(),
                receiver: RECEIVER,
                amount: 1,
                sidechain_supply: 0,
            },
            &mut Vec::<u8>::new(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "caller is not a minter");
    }

    #[test]
    fn test_address_prediction_matches_deployment() {
        let (mut ledger, deployment) = initialized();
        let (changed, predicted) = run_cmd(
            &mut ledger,
            Commands::Address {
                curve_id: "JONOfakePricingCurveId".to_string(),
                factory: Some(deployment.factory),
                init_code_hash: None,
            },
        );
        assert!(!changed);
        let coin = deploy_coin(&mut ledger, &deploy_args("JONO")).unwrap();
        assert_eq!(predicted.trim(), coin.address.to_string());
    }

    #[test]
    fn test_events_tail() {
        let (mut ledger, deployment) = initialized();
        deploy_coin(&mut ledger, &deploy_args("JONO")).unwrap();
        let (_, output) = run_cmd(
            &mut ledger,
            Commands::Events {
                emitter: Some(deployment.bridge),
                last: Some(1),
            },
        );
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("CreatorCoinBridgedToMainnet"));
    }

    #[test]
    fn test_clock_commands() {
        let mut ledger = Ledger::default();
        let (changed, output) = run_cmd(&mut ledger, Commands::Clock(ClockCommands::Set { timestamp: 0 }));
        assert!(changed);
        assert!(output.contains("1970-01-01T00:00:00+00:00"));
        run_cmd(&mut ledger, Commands::Clock(ClockCommands::Advance { seconds: 60 }));
        assert_eq!(ledger.timestamp(), 60);

        let err = execute(
            &mut ledger,
            Commands::Clock(ClockCommands::Set { timestamp: 59 }),
            &mut Vec::<u8>::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("before the current block time"));
        assert_eq!(ledger.timestamp(), 60);
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(100_000_000, 6), "100");
        assert_eq!(format_units(1_500_000, 6), "1.5");
        assert_eq!(format_units(1, 6), "0.000001");
        assert_eq!(format_units(7, 0), "7");
    }

    #[test]
    fn test_scale_amount_overflow() {
        assert_eq!(scale_amount(3, 2).unwrap(), 300);
        assert!(scale_amount(u128::MAX, 1).is_err());
        assert!(scale_amount(1, 40).is_err());
    }

    #[test]
    fn test_cli_parses_roles_and_addresses() {
        let cli = Cli::try_parse_from([
            "ccoin",
            "grant-role",
            "--from",
            "0xd0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0",
            "minter",
            "0x2121212121212121212121212121212121212121",
        ])
        .unwrap();
        match cli.command {
            Commands::GrantRole { from, role, account } => {
                assert_eq!(from, DEPLOYER);
                assert_eq!(role, Role::Minter);
                assert_eq!(account, RECEIVER);
            }
            _ => panic!("wrong command"),
        }
    }
}
