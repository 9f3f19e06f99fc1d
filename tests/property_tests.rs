//! Property-based tests for the deed layer's authorization rules.
//!
//! These tests verify invariants hold for arbitrary addresses and positions.

use deed_core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;

const ENGINE: u64 = 0xe4;
const MODULE: u64 = 0xd00d;

// Strategies for generating test data
fn address_strategy() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::new)
}

// kept clear of the engine and module fixtures
fn trader_strategy() -> impl Strategy<Value = Address> {
    (1u64..10_000u64).prop_map(|n| Address::from_low_u64(n + 0x1_0000))
}

fn position_strategy() -> impl Strategy<Value = PositionId> {
    any::<[u8; 32]>().prop_map(PositionId::new)
}

fn amount_strategy() -> impl Strategy<Value = Amount> {
    (1i64..1_000_000i64).prop_map(|x| Amount::new_unchecked(Decimal::new(x, 2)))
}

fn engine() -> Address {
    Address::from_low_u64(ENGINE)
}

fn module() -> DeedModule {
    DeedModule::new(ModuleConfig::new(Address::from_low_u64(MODULE), engine())).unwrap()
}

proptest! {
    /// A second hand-off of the same position always fails, whoever it names.
    #[test]
    fn assign_is_unique(
        position in position_strategy(),
        first in address_strategy(),
        second in address_strategy(),
    ) {
        let mut m = module();
        m.on_ownership_received(engine(), first, position).unwrap();

        let err = m.on_ownership_received(engine(), second, position).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::AlreadyAssigned);
        prop_assert_eq!(m.holder_of(position).unwrap(), first);
    }

    /// Only the holder can transfer.
    #[test]
    fn transfer_requires_holder(
        holder in trader_strategy(),
        other in trader_strategy(),
        new_holder in trader_strategy(),
        principal in amount_strategy(),
    ) {
        prop_assume!(holder != other);
        let mut m = module();
        let mut e = SimulatedMarginEngine::new(engine());
        let position = e.open_position(holder, principal);
        e.hand_to_module(&mut m, holder, position).unwrap();

        let err = m.transfer(&mut e, other, position, new_holder).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Unauthorized);
        prop_assert_eq!(m.holder_of(position).unwrap(), holder);
        prop_assert_eq!(e.position_owner(position), Some(m.address()));
    }

    /// After a transfer out the deed is gone and the engine records the new owner.
    #[test]
    fn transferred_position_is_untracked(
        holder in trader_strategy(),
        new_holder in trader_strategy(),
        principal in amount_strategy(),
    ) {
        let mut m = module();
        let mut e = SimulatedMarginEngine::new(engine());
        let position = e.open_position(holder, principal);
        e.hand_to_module(&mut m, holder, position).unwrap();

        m.transfer(&mut e, holder, position, new_holder).unwrap();

        prop_assert_eq!(m.holder_of(position).unwrap_err().kind(), ErrorKind::NotFound);
        prop_assert_eq!(e.position_owner(position), Some(new_holder));
        prop_assert_eq!(m.balance_of(holder), 0);
    }

    /// Any sequence of closer approvals ends at the last value written.
    #[test]
    fn closer_approval_last_write_wins(
        grantor in trader_strategy(),
        closer in trader_strategy(),
        writes in proptest::collection::vec(any::<bool>(), 1..12),
    ) {
        prop_assume!(grantor != closer);
        let mut m = module();
        for approved in &writes {
            m.set_closer_approval(grantor, closer, *approved).unwrap();
        }
        prop_assert_eq!(m.is_approved_closer(grantor, closer), *writes.last().unwrap());
    }

    /// Same for recipients, including self-approval.
    #[test]
    fn recipient_approval_last_write_wins(
        grantor in trader_strategy(),
        recipient in trader_strategy(),
        writes in proptest::collection::vec(any::<bool>(), 1..12),
    ) {
        let mut m = module();
        for approved in &writes {
            m.set_recipient_approval(grantor, recipient, *approved).unwrap();
        }
        prop_assert_eq!(m.is_approved_recipient(grantor, recipient), *writes.last().unwrap());
    }

    /// Approving yourself as closer always fails and changes nothing.
    #[test]
    fn closer_self_approval_always_rejected(
        grantor in address_strategy(),
        approved in any::<bool>(),
    ) {
        let mut m = module();
        let err = m.set_closer_approval(grantor, grantor, approved).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::SelfApproval);
        prop_assert!(!m.is_approved_closer(grantor, grantor));
        prop_assert!(m.events().is_empty());
    }

    /// Permit iff closer check and recipient check both pass.
    #[test]
    fn close_permit_is_conjunction(
        holder in trader_strategy(),
        closer in trader_strategy(),
        recipient in trader_strategy(),
        approve_closer in any::<bool>(),
        approve_recipient in any::<bool>(),
        position in position_strategy(),
        requested in amount_strategy(),
    ) {
        let mut m = module();
        m.on_ownership_received(engine(), holder, position).unwrap();
        if closer != holder {
            m.set_closer_approval(holder, closer, approve_closer).unwrap();
        }
        m.set_recipient_approval(holder, recipient, approve_recipient).unwrap();

        let closer_ok = closer == holder || approve_closer;
        let recipient_ok = recipient == holder || approve_recipient;

        let decision = m.authorize_close(engine(), position, closer, recipient, requested).unwrap();
        prop_assert_eq!(decision.is_permit(), closer_ok && recipient_ok);
        if decision.is_permit() {
            prop_assert_eq!(decision.permitted_amount(), Some(requested));
        }
    }

    /// Bridge entry points reject every caller except the engine.
    #[test]
    fn bridge_rejects_untrusted_callers(
        caller in address_strategy(),
        holder in trader_strategy(),
        position in position_strategy(),
        requested in amount_strategy(),
    ) {
        prop_assume!(caller != engine());
        let mut m = module();

        let err = m.on_ownership_received(caller, holder, position).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::UntrustedCaller);
        prop_assert!(!m.is_tracked(position));

        m.on_ownership_received(engine(), holder, position).unwrap();
        let err = m.authorize_close(caller, position, holder, holder, requested).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::UntrustedCaller);
    }

    /// Partial closes never touch the deed.
    #[test]
    fn partial_close_keeps_deed(
        holder in trader_strategy(),
        principal in 2i64..1_000_000i64,
        fraction in 1i64..100i64,
    ) {
        let mut m = module();
        let mut e = SimulatedMarginEngine::new(engine());
        let principal = Amount::new_unchecked(Decimal::new(principal, 2));
        let position = e.open_position(holder, principal);
        e.hand_to_module(&mut m, holder, position).unwrap();

        let part = Amount::new_unchecked(principal.value() * Decimal::new(fraction, 2));
        prop_assume!(!part.is_zero() && part < principal);
        let out = e.close_position(&mut m, holder, holder, position, part).unwrap();

        prop_assert!(!out.fully_closed);
        prop_assert_eq!(m.holder_of(position).unwrap(), holder);
    }
}

#[test]
fn holder_with_delegates_examples() {
    let mut m = module();
    let (h, c, r, x) = (
        Address::from_low_u64(1),
        Address::from_low_u64(2),
        Address::from_low_u64(3),
        Address::from_low_u64(4),
    );
    let p = PositionId::from_low_u64(1);
    let requested = Amount::new_unchecked(Decimal::ONE_HUNDRED);

    m.on_ownership_received(engine(), h, p).unwrap();
    m.set_closer_approval(h, c, true).unwrap();
    m.set_recipient_approval(h, r, true).unwrap();

    assert!(m.authorize_close(engine(), p, c, r, requested).unwrap().is_permit());
    assert!(!m.authorize_close(engine(), p, c, x, requested).unwrap().is_permit());
    assert!(!m.authorize_close(engine(), p, x, r, requested).unwrap().is_permit());
    assert!(m.authorize_close(engine(), p, h, h, requested).unwrap().is_permit());
}

#[test]
fn approval_toggle_sequences() {
    let g = Address::from_low_u64(1);
    let c = Address::from_low_u64(2);

    for (writes, expected) in [
        (vec![true, false], false),
        (vec![true, false, false], false),
        (vec![true, true], true),
    ] {
        let mut m = module();
        for approved in writes {
            m.set_closer_approval(g, c, approved).unwrap();
        }
        assert_eq!(m.is_approved_closer(g, c), expected);
    }
}
