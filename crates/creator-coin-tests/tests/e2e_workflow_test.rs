//! End-to-end workflow tests for creator coins
//!
//! These tests drive the full lifecycle through the operator tooling:
//! contract deployment, coin deployment, bridging in both directions and
//! administrative bridge re-pointing, with state persisted between steps.

use std::path::Path;

use creator_coin_cli::{
    commands::{deploy_coin, init, sign_bridge_out, DeployCoinArgs},
    execute, CliConfig, ClockCommands, Commands, StateStore,
};
use creator_coin_core::{create_address, Address, LocalWallet};
use creator_coin_ledger::{Event, Ledger, LedgerError, Role, SidechainExit};

/// Hardhat's first development account
const DEPLOYER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn reopen(store: &StateStore, config: &CliConfig) -> Ledger {
    store.load_or_new(&config.ledger).unwrap()
}

fn run(store: &StateStore, config: &CliConfig, command: Commands) -> String {
    let mut ledger = reopen(store, config);
    let mut out = Vec::new();
    if execute(&mut ledger, command, &mut out).unwrap() {
        store.save(&ledger).unwrap();
    }
    String::from_utf8(out).unwrap()
}

fn setup(dir: &Path) -> (StateStore, CliConfig) {
    let config_path = dir.join("config.toml");
    let mut config = CliConfig::load_or_create(&config_path).unwrap();
    config.state_path = dir.join("state.json");
    config.save(&config_path).unwrap();
    let config = CliConfig::load(&config_path).unwrap();
    (StateStore::new(&config.state_path), config)
}

/// Simulates the complete lifecycle of a coin across both ledgers
#[test]
fn test_full_bridge_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let (store, config) = setup(dir.path());
    let deployer = LocalWallet::from_hex(DEPLOYER_KEY).unwrap().address();
    assert_eq!(
        deployer.to_string(),
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
    );

    // ==========================================
    // STEP 1: Deploy factory and bridge
    // ==========================================
    let output = run(&store, &config, Commands::Init { deployer });
    assert!(output.contains("Factory address: 0x5FbDB2315678afecb367f032d93F642f64180aa3"));
    assert!(output.contains("Bridge address: 0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"));

    let ledger = reopen(&store, &config);
    let factory = ledger.factory().unwrap().address();
    let bridge = ledger.bridge().unwrap().address();
    assert_eq!(factory, create_address(&deployer, 0));
    assert_eq!(ledger.factory().unwrap().bridge(), bridge);

    // ==========================================
    // STEP 2: Predict, deploy and fund a coin
    // ==========================================
    let holder = LocalWallet::random();
    let predicted = run(
        &store,
        &config,
        Commands::Address {
            curve_id: "JONOfakePricingCurveId".to_string(),
            factory: None,
            init_code_hash: None,
        },
    );

    let output = run(
        &store,
        &config,
        Commands::DeployCoin {
            from: deployer,
            symbol: "JONO".to_string(),
            name: None,
            curve_id: None,
            decimals: None,
            receiver: holder.address(),
            amount: 100,
            sidechain_supply: 900_000_000,
        },
    );
    assert!(output.contains("JONO Coin (JONO) JONOfakePricingCurveId deployed to"));
    assert!(output.contains(predicted.trim()));

    let ledger = reopen(&store, &config);
    let coin = ledger.coin_for("JONOfakePricingCurveId").unwrap();
    assert_eq!(coin.address().to_string(), predicted.trim());
    assert_eq!(coin.balance_of(&holder.address()), 100_000_000);
    assert_eq!(coin.total_supply(), 100_000_000);
    assert_eq!(coin.current_sidechain_supply(), 900_000_000);

    // ==========================================
    // STEP 3: Holder bridges part of it back
    // ==========================================
    run(&store, &config, Commands::Clock(ClockCommands::Set { timestamp: 1_700_000_000 }));
    let output = run(
        &store,
        &config,
        Commands::BridgeToSidechain {
            key: holder.to_hex().to_string(),
            curve_id: "JONOfakePricingCurveId".to_string(),
            amount: 25_000_000,
            deadline: Some(1_700_000_600),
            relayer: None,
        },
    );
    assert!(output.contains("Permit signature: 0x"));

    let ledger = reopen(&store, &config);
    let coin = ledger.coin_for("JONOfakePricingCurveId").unwrap();
    assert_eq!(coin.balance_of(&holder.address()), 75_000_000);
    assert_eq!(coin.total_supply(), 75_000_000);
    assert_eq!(coin.nonces(&holder.address()), 1);

    // ==========================================
    // STEP 4: Expired permits are refused
    // ==========================================
    let mut ledger = reopen(&store, &config);
    ledger.advance_time(3_600).unwrap();
    let sig = sign_bridge_out(&ledger, &holder, "JONOfakePricingCurveId", 1, 1_700_000_600).unwrap();
    let err = ledger
        .bridge_to_sidechain(
            holder.address(),
            "JONOfakePricingCurveId",
            &SidechainExit::new(1, 1_700_000_600, sig),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::PermitExpired));

    // ==========================================
    // STEP 5: Audit trail
    // ==========================================
    let output = run(
        &store,
        &config,
        Commands::Events {
            emitter: Some(bridge),
            last: None,
        },
    );
    let names: Vec<_> = output
        .lines()
        .filter_map(|line| line.split_whitespace().nth(2))
        .collect();
    assert_eq!(
        names,
        vec![
            "RoleGranted",
            "RoleGranted",
            "CreatorCoinBridgedToMainnet",
            "CreatorCoinBridgedToSideChain",
        ]
    );
}

/// The owner temporarily points the factory at itself to adjust a coin,
/// then restores the bridge
#[test]
fn test_administrative_bridge_repointing() {
    let mut ledger = Ledger::default();
    let owner = Address::new([0x0a; 20]);
    let deployment = init(&mut ledger, owner).unwrap();
    let coin = deploy_coin(
        &mut ledger,
        &DeployCoinArgs {
            from: owner,
            symbol: "TKN".to_string(),
            name: Some("token".to_string()),
            curve_id: Some("28ba2e93-b83a-4c1b-936f-99bc91c264ee".to_string()),
            decimals: None,
            receiver: owner,
            amount: 1,
            sidechain_supply: 0,
        },
    )
    .unwrap();

    // ==========================================
    // STEP 1: Redirect privileged calls to the owner
    // ==========================================
    ledger.set_bridge(owner, owner).unwrap();
    ledger
        .update_current_sidechain_supply(owner, &coin.address, 42)
        .unwrap();
    let err = ledger
        .bridge_to_mainnet(owner, &coin.curve_id, owner, 1, 0)
        .unwrap_err();
    assert!(matches!(err, LedgerError::OnlyBridge));

    // ==========================================
    // STEP 2: Restore the bridge
    // ==========================================
    ledger.set_bridge(owner, deployment.bridge).unwrap();
    let err = ledger
        .update_current_sidechain_supply(owner, &coin.address, 7)
        .unwrap_err();
    assert!(matches!(err, LedgerError::OnlyBridge));
    ledger
        .bridge_to_mainnet(owner, &coin.curve_id, owner, 1, 0)
        .unwrap();

    let state = ledger.coin(&coin.address).unwrap();
    assert_eq!(state.current_sidechain_supply(), 0);
    assert_eq!(state.total_supply(), 1_000_001);
}

/// Minting rights follow role changes and ownership follows transfers
#[test]
fn test_operator_handover() {
    let mut ledger = Ledger::default();
    let founder = Address::new([0x01; 20]);
    let operator = Address::new([0x02; 20]);
    init(&mut ledger, founder).unwrap();
    ledger
        .deploy_creator_coin(founder, "curve", "token", "tkn")
        .unwrap();

    // ==========================================
    // STEP 1: Hand over minting and administration
    // ==========================================
    ledger.grant_role(founder, Role::Minter, operator).unwrap();
    ledger.grant_role(founder, Role::Admin, operator).unwrap();
    ledger.renounce_role(founder, Role::Minter, founder).unwrap();
    ledger.renounce_role(founder, Role::Admin, founder).unwrap();
    ledger.transfer_ownership(founder, operator).unwrap();

    // ==========================================
    // STEP 2: The founder has no authority left
    // ==========================================
    assert!(matches!(
        ledger.bridge_to_mainnet(founder, "curve", founder, 1, 0),
        Err(LedgerError::OnlyMinter)
    ));
    assert!(matches!(
        ledger.grant_role(founder, Role::Minter, founder),
        Err(LedgerError::MissingRoleAdmin)
    ));
    assert!(matches!(
        ledger.deploy_creator_coin(founder, "curve-2", "t", "t"),
        Err(LedgerError::NotOwner)
    ));

    // ==========================================
    // STEP 3: The operator carries on
    // ==========================================
    ledger
        .bridge_to_mainnet(operator, "curve", operator, 10, 5)
        .unwrap();
    ledger
        .deploy_creator_coin(operator, "curve-2", "t", "t")
        .unwrap();

    let ownership: Vec<_> = ledger
        .logs()
        .iter()
        .filter_map(|log| match log.event {
            Event::OwnershipTransferred { new_owner, .. } => Some(new_owner),
            _ => None,
        })
        .collect();
    assert_eq!(ownership, vec![founder, operator]);
}
