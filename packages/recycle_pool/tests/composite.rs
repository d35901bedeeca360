//! Objects assembled from the objects of other pools in the same manager.

use std::cell::RefCell;
use std::rc::Rc;

use recycle_pool::{Cancellable, ConstructCause, Lease, PoolHandle, PoolManager, PopulateOptions};

/// A suit symbol drawn on a card. Each suit is pooled separately, sharing one pool definition.
#[derive(Debug)]
struct Symbol {
    suit: &'static str,
    scale: f32,
}

/// A card that owns a handful of symbols leased from the symbol pools.
#[derive(Debug, Default)]
struct Card {
    symbols: Vec<(PoolHandle<Symbol, &'static str>, Lease)>,
    flip_timer: Option<u32>,
}

impl Cancellable for Card {
    fn cancel_pending(&mut self) {
        self.flip_timer = None;
    }
}

fn register_symbols(
    manager: &mut PoolManager,
    suit: &'static str,
) -> PoolHandle<Symbol, &'static str> {
    let handle = manager
        .register::<Symbol, &'static str>()
        .construct(|ctx| Symbol {
            suit: *ctx.params(),
            scale: 1.0,
        })
        .reset(|symbol, suit| {
            symbol.suit = *suit;
            symbol.scale = 1.0;
        })
        .build()
        .unwrap();

    manager
        .populate(
            handle,
            PopulateOptions::new().initial_size(2).auto_expand(true),
            suit,
        )
        .unwrap();

    handle
}

/// Moves the symbols out of a card and returns them to their pools.
fn release_symbols(manager: &mut PoolManager, cards: PoolHandle<Card, ()>, card: Lease) {
    let symbols = std::mem::take(&mut manager.object_mut(cards, card).unwrap().symbols);

    for (handle, lease) in symbols {
        manager.release(handle, lease).unwrap();
    }
}

#[test]
fn cards_lease_symbols_from_sibling_pools() {
    let mut manager = PoolManager::new();

    let hearts = register_symbols(&mut manager, "heart");
    let spades = register_symbols(&mut manager, "spade");

    let cards = manager
        .register::<Card, ()>()
        .construct(|_| Card::default())
        .cancel_pending()
        .build()
        .unwrap();
    manager
        .populate(cards, PopulateOptions::new().initial_size(1), ())
        .unwrap();

    let card = manager.acquire(cards).unwrap().unwrap();

    for handle in [hearts, hearts, hearts, spades] {
        let symbol = manager.acquire(handle).unwrap().unwrap();
        manager.object_mut(handle, symbol).unwrap().scale = 0.5;
        manager
            .object_mut(cards, card)
            .unwrap()
            .symbols
            .push((handle, symbol));
    }

    manager.object_mut(cards, card).unwrap().flip_timer = Some(250);

    // Three hearts exceed the two pre-filled ones, so the heart pool grew by one.
    assert_eq!(manager.stats(hearts).unwrap().in_use, 3);
    assert_eq!(manager.stats(hearts).unwrap().constructed, 3);
    assert_eq!(manager.stats(spades).unwrap().in_use, 1);

    let suits = manager
        .object(cards, card)
        .unwrap()
        .symbols
        .iter()
        .map(|(handle, lease)| manager.object(*handle, *lease).unwrap().suit)
        .collect::<Vec<_>>();
    assert_eq!(suits, vec!["heart", "heart", "heart", "spade"]);

    release_symbols(&mut manager, cards, card);
    manager.release(cards, card).unwrap();

    assert_eq!(manager.stats(hearts).unwrap().in_use, 0);
    assert_eq!(manager.stats(spades).unwrap().in_use, 0);

    // The recycled card lost its timer and the recycled symbols their scaling.
    let card = manager.acquire(cards).unwrap().unwrap();
    assert_eq!(manager.object(cards, card).unwrap().flip_timer, None);

    let heart = manager.acquire(hearts).unwrap().unwrap();
    assert!((manager.object(hearts, heart).unwrap().scale - 1.0).abs() < f32::EPSILON);

    assert_eq!(manager.teardown_all().unwrap(), 3 + 2 + 1);
}

#[test]
fn construct_callback_knows_why_it_runs() {
    let causes = Rc::new(RefCell::new(Vec::new()));
    let construct_causes = Rc::clone(&causes);

    let mut manager = PoolManager::new();
    let handle = manager
        .register::<u8, ()>()
        .construct(move |ctx| {
            construct_causes.borrow_mut().push(ctx.cause());
            0
        })
        .build()
        .unwrap();

    manager
        .populate(
            handle,
            PopulateOptions::new().initial_size(1).auto_expand(true),
            (),
        )
        .unwrap();

    _ = manager.acquire(handle).unwrap().unwrap();
    _ = manager.acquire(handle).unwrap().unwrap();

    assert_eq!(
        *causes.borrow(),
        vec![ConstructCause::Populate, ConstructCause::Expand]
    );
}
