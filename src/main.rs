//! Deed module simulation.
//!
//! Walks positions through the deed layer against an in-memory margin engine:
//! hand-off, delegated closes, denials, transfer out and rollback.

use deed_core::*;
use rust_decimal_macros::dec;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ENGINE: u64 = 0xe4;
const MODULE: u64 = 0xd00d;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deed_core=info")))
        .init();

    println!("Position Deed Simulation");
    println!("One engine, one deed module, full lifecycle\n");

    scenario_1_hand_off()?;
    scenario_2_delegated_close()?;
    scenario_3_denied_close()?;
    scenario_4_transfer_out()?;
    scenario_5_rollback()?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

fn setup() -> Result<(SimulatedMarginEngine, DeedModule), DeedError> {
    let mut engine = SimulatedMarginEngine::new(Address::from_low_u64(ENGINE));
    engine.set_time(Timestamp::now());
    let config = ModuleConfig::for_environment(
        Address::from_low_u64(MODULE),
        Address::from_low_u64(ENGINE),
        Environment::Development,
    );
    let mut module = DeedModule::new(config)?;
    module.set_time(Timestamp::now());
    Ok((engine, module))
}

fn amount(v: rust_decimal::Decimal) -> Amount {
    Amount::new_unchecked(v)
}

/// Trader routes a position through the module and gets a deed.
fn scenario_1_hand_off() -> Result<(), Box<dyn std::error::Error>> {
    println!("Scenario 1: Hand-off\n");

    let (mut engine, mut module) = setup()?;
    let alice = Address::from_low_u64(1);

    let position = engine.open_position(alice, amount(dec!(10000)));
    engine.hand_to_module(&mut module, alice, position)?;

    println!("  Alice opens {} and hands it to the module", position);
    println!("  Engine owner: {:?}", engine.position_owner(position).map(|a| a.to_string()));
    println!("  Deed holder:  {}", module.holder_of(position)?);

    match engine.hand_to_module(&mut module, alice, position) {
        Ok(()) => println!("  Unexpected: second hand-off accepted"),
        Err(e) => println!("  Second hand-off rejected: {}\n", e),
    }
    Ok(())
}

/// Holder delegates closing to a keeper and payout to a vault.
fn scenario_2_delegated_close() -> Result<(), Box<dyn std::error::Error>> {
    println!("Scenario 2: Delegated Close\n");

    let (mut engine, mut module) = setup()?;
    let alice = Address::from_low_u64(1);
    let keeper = Address::from_low_u64(2);
    let vault = Address::from_low_u64(3);

    let position = engine.open_position(alice, amount(dec!(10000)));
    engine.hand_to_module(&mut module, alice, position)?;

    module.set_closer_approval(alice, keeper, true)?;
    module.set_recipient_approval(alice, vault, true)?;
    println!("  Alice approves keeper as closer, vault as recipient");

    let partial = engine.close_position(&mut module, keeper, vault, position, amount(dec!(4000)))?;
    println!("  Keeper closes {}, {} remaining", partial.closed, partial.remaining);
    println!("  Deed still held by alice: {}", module.holder_of(position)? == alice);

    let rest = engine.close_position(&mut module, keeper, vault, position, amount(dec!(6000)))?;
    println!("  Keeper closes {}, fully closed: {}", rest.closed, rest.fully_closed);
    println!("  Vault received {}\n", engine.paid_out(vault));
    Ok(())
}

/// Every combination that fails one side of the check is denied.
fn scenario_3_denied_close() -> Result<(), Box<dyn std::error::Error>> {
    println!("Scenario 3: Denied Closes\n");

    let (mut engine, mut module) = setup()?;
    let alice = Address::from_low_u64(1);
    let keeper = Address::from_low_u64(2);
    let vault = Address::from_low_u64(3);
    let mallory = Address::from_low_u64(66);

    let position = engine.open_position(alice, amount(dec!(5000)));
    engine.hand_to_module(&mut module, alice, position)?;
    module.set_closer_approval(alice, keeper, true)?;
    module.set_recipient_approval(alice, vault, true)?;

    for (label, closer, recipient) in [
        ("keeper -> mallory", keeper, mallory),
        ("mallory -> vault", mallory, vault),
        ("mallory -> mallory", mallory, mallory),
    ] {
        match engine.close_position(&mut module, closer, recipient, position, amount(dec!(5000))) {
            Ok(out) => println!("  {}: unexpectedly closed {}", label, out.closed),
            Err(e) => println!("  {}: {}", label, e),
        }
    }

    let remaining = engine.position(position).map(|p| p.principal).unwrap_or_else(Amount::zero);
    println!("  Principal untouched: {}\n", remaining);
    Ok(())
}

/// Holder takes the position back out of the module to a new owner.
fn scenario_4_transfer_out() -> Result<(), Box<dyn std::error::Error>> {
    println!("Scenario 4: Transfer Out\n");

    let (mut engine, mut module) = setup()?;
    let alice = Address::from_low_u64(1);
    let bob = Address::from_low_u64(4);

    let position = engine.open_position(alice, amount(dec!(2500)));
    engine.hand_to_module(&mut module, alice, position)?;

    if let Err(e) = module.transfer(&mut engine, bob, position, bob) {
        println!("  Bob tries to take it: {}", e);
    }

    module.transfer(&mut engine, alice, position, bob)?;
    println!("  Alice transfers to bob");
    println!("  Engine owner is bob: {}", engine.position_owner(position) == Some(bob));
    println!("  Deed tracked: {}", module.is_tracked(position));

    let out = engine.close_position(&mut module, bob, bob, position, amount(dec!(2500)))?;
    println!("  Bob closes directly: {}\n", out.closed);
    Ok(())
}

/// Engine failure mid-transfer leaves the deed in place.
fn scenario_5_rollback() -> Result<(), Box<dyn std::error::Error>> {
    println!("Scenario 5: Rollback\n");

    let (mut engine, mut module) = setup()?;
    let alice = Address::from_low_u64(1);
    let bob = Address::from_low_u64(4);

    let position = engine.open_position(alice, amount(dec!(1000)));
    engine.hand_to_module(&mut module, alice, position)?;

    engine.fail_next_transfer();
    if let Err(e) = module.transfer(&mut engine, alice, position, bob) {
        println!("  Transfer failed: {}", e);
    }
    println!("  Deed holder still alice: {}", module.holder_of(position)? == alice);
    println!("  Engine owner still module: {}", engine.position_owner(position) == Some(module.address()));

    let mut audit = EventCollector::new();
    module.export_events(None, &mut audit);
    println!("  Audit events: {}", audit.events().len());
    Ok(())
}
