use std::collections::HashMap;

use relang::nfa::{intersection, intersection_with_map, Nfa, State};
use relang::{Symbol, EPSILON};

const A: Symbol = 'a' as Symbol;
const B: Symbol = 'b' as Symbol;
const C: Symbol = 'c' as Symbol;

/// First operand shared by the plain-intersection tests.
fn aut_one() -> Nfa {
    let mut aut = Nfa::new();
    aut.initial.extend([1, 3]);
    aut.accepts.insert(5);
    aut.delta.add(1, A, 3);
    aut.delta.add(1, A, 10);
    aut.delta.add(1, B, 7);
    aut.delta.add(3, A, 7);
    aut.delta.add(3, B, 9);
    aut.delta.add(9, A, 9);
    aut.delta.add(7, B, 1);
    aut.delta.add(7, A, 3);
    aut.delta.add(7, C, 3);
    aut.delta.add(10, A, 7);
    aut.delta.add(10, B, 7);
    aut.delta.add(10, C, 7);
    aut.delta.add(7, A, 5);
    aut.delta.add(5, A, 5);
    aut.delta.add(5, C, 9);
    aut
}

/// Second operand shared by the plain-intersection tests.
fn aut_two() -> Nfa {
    let mut aut = Nfa::new();
    aut.initial.insert(4);
    aut.accepts.extend([2, 12]);
    aut.delta.add(4, C, 8);
    aut.delta.add(4, A, 8);
    aut.delta.add(8, B, 4);
    aut.delta.add(4, A, 6);
    aut.delta.add(4, B, 6);
    aut.delta.add(6, A, 2);
    aut.delta.add(2, B, 2);
    aut.delta.add(2, A, 0);
    aut.delta.add(0, A, 2);
    aut.delta.add(2, C, 12);
    aut.delta.add(12, A, 14);
    aut.delta.add(14, B, 12);
    aut
}

#[test]
fn intersection_of_empty_automata_is_empty() {
    let mut product_map = HashMap::new();
    let product = intersection_with_map(&Nfa::new(), &Nfa::new(), &mut product_map);
    assert!(product.initial.is_empty());
    assert!(product.accepts.is_empty());
    assert!(product.delta.is_empty());
    assert!(product_map.is_empty());
}

#[test]
fn intersection_without_transitions_pairs_indicator_sets() {
    let mut lhs = Nfa::new();
    lhs.initial.extend([1, 3]);
    lhs.accepts.extend([3, 5]);
    let mut rhs = Nfa::new();
    rhs.initial.extend([4, 6]);
    rhs.accepts.extend([4, 2]);

    let mut product_map = HashMap::new();
    let product = intersection_with_map(&lhs, &rhs, &mut product_map);
    assert!(!product.initial.is_empty());
    assert!(!product.accepts.is_empty());
    let both = product_map[&(3, 4)];
    assert!(product.initial.contains(both));
    assert!(product.accepts.contains(both));
}

#[test]
fn intersection_with_transitions_builds_the_synchronous_product() {
    let mut product_map = HashMap::new();
    let product = intersection_with_map(&aut_one(), &aut_two(), &mut product_map);

    assert!(product.initial.contains(product_map[&(1, 4)]));
    assert!(product.initial.contains(product_map[&(3, 4)]));
    assert!(product.accepts.contains(product_map[&(5, 2)]));

    let contains = |source: (State, State), symbol: Symbol, target: (State, State)| {
        product
            .delta
            .contains(product_map[&source], symbol, product_map[&target])
    };
    assert!(contains((1, 4), A, (3, 6)));
    assert!(contains((1, 4), A, (10, 8)));
    assert!(contains((1, 4), A, (10, 6)));
    assert!(contains((1, 4), B, (7, 6)));
    assert!(contains((3, 6), A, (7, 2)));
    assert!(contains((7, 2), A, (3, 0)));
    assert!(contains((7, 2), A, (5, 0)));
    assert!(contains((3, 0), A, (7, 2)));
    assert!(contains((1, 2), A, (10, 0)));
    assert!(contains((1, 2), A, (3, 0)));
    assert!(contains((10, 0), A, (7, 2)));
    assert!(contains((5, 0), A, (5, 2)));
    assert!(contains((5, 2), A, (5, 0)));
    assert!(contains((10, 6), A, (7, 2)));
    assert!(contains((7, 6), A, (5, 2)));
    assert!(contains((7, 6), A, (3, 2)));
    assert!(contains((10, 8), B, (7, 4)));
    assert!(contains((7, 4), A, (3, 6)));
    assert!(contains((7, 4), A, (3, 8)));
    assert!(contains((7, 4), A, (5, 6)));
    assert!(contains((1, 6), A, (3, 2)));
    assert!(contains((1, 6), A, (10, 2)));
    assert!(contains((10, 2), A, (7, 0)));
    assert!(contains((7, 0), A, (5, 2)));
    assert!(contains((7, 0), A, (3, 2)));
    assert!(contains((3, 2), A, (7, 0)));
    assert!(contains((5, 6), A, (5, 2)));
    assert!(contains((3, 4), A, (7, 6)));
    assert!(contains((3, 4), A, (7, 8)));
    assert!(contains((7, 8), B, (1, 4)));
}

#[test]
fn intersection_without_reachable_accepting_pair_is_empty() {
    let lhs = aut_one();
    let mut rhs = aut_two();
    rhs.accepts.clear();
    rhs.accepts.insert(12);

    let mut product_map = HashMap::new();
    let product = intersection_with_map(&lhs, &rhs, &mut product_map);
    assert!(product.initial.contains(product_map[&(1, 4)]));
    assert!(product.initial.contains(product_map[&(3, 4)]));
    assert!(product.is_lang_empty());
}

#[test]
fn intersection_preserves_epsilon_transitions() {
    let mut lhs = Nfa::new();
    lhs.initial.insert(0);
    lhs.accepts.extend([1, 4, 5]);
    lhs.delta.add(0, EPSILON, 1);
    lhs.delta.add(1, A, 1);
    lhs.delta.add(1, B, 1);
    lhs.delta.add(1, C, 2);
    lhs.delta.add(2, B, 4);
    lhs.delta.add(2, EPSILON, 3);
    lhs.delta.add(3, A, 5);

    let mut rhs = Nfa::new();
    rhs.initial.insert(0);
    rhs.accepts.extend([2, 4, 8, 7]);
    rhs.delta.add(0, B, 1);
    rhs.delta.add(0, A, 2);
    rhs.delta.add(2, A, 4);
    rhs.delta.add(2, EPSILON, 3);
    rhs.delta.add(3, B, 4);
    rhs.delta.add(0, C, 5);
    rhs.delta.add(5, A, 8);
    rhs.delta.add(5, EPSILON, 6);
    rhs.delta.add(6, A, 9);
    rhs.delta.add(6, B, 7);

    let mut product_map = HashMap::new();
    let product = intersection_with_map(&lhs, &rhs, &mut product_map);

    for pair in [
        (0, 0),
        (1, 0),
        (1, 1),
        (1, 2),
        (1, 3),
        (1, 4),
        (2, 5),
        (3, 5),
        (2, 6),
        (3, 6),
        (4, 7),
        (5, 9),
        (5, 8),
    ] {
        assert!(product_map.contains_key(&pair), "missing product state {pair:?}");
    }
    assert_eq!(product.num_of_states(), 13);

    assert_eq!(product.initial.len(), 1);
    assert!(product.initial.contains(product_map[&(0, 0)]));

    assert_eq!(product.accepts.len(), 4);
    for pair in [(1, 2), (1, 4), (4, 7), (5, 8)] {
        assert!(product.accepts.contains(product_map[&pair]));
    }

    assert_eq!(product.delta.num_of_transitions(), 14);

    let state = |pair: (State, State)| product_map[&pair];
    assert!(product.delta.contains(state((0, 0)), EPSILON, state((1, 0))));
    assert_eq!(product.delta.state_post(state((0, 0))).num_of_moves(), 1);

    assert!(product.delta.contains(state((1, 0)), B, state((1, 1))));
    assert!(product.delta.contains(state((1, 0)), A, state((1, 2))));
    assert!(product.delta.contains(state((1, 0)), C, state((2, 5))));
    assert_eq!(product.delta.state_post(state((1, 0))).num_of_moves(), 3);

    assert!(product.delta.state_post(state((1, 1))).is_empty());

    assert!(product.delta.contains(state((1, 2)), EPSILON, state((1, 3))));
    assert!(product.delta.contains(state((1, 2)), A, state((1, 4))));
    assert_eq!(product.delta.state_post(state((1, 2))).num_of_moves(), 2);

    assert!(product.delta.contains(state((1, 3)), B, state((1, 4))));
    assert_eq!(product.delta.state_post(state((1, 3))).num_of_moves(), 1);

    assert!(product.delta.state_post(state((1, 4))).is_empty());

    assert!(product.delta.contains(state((2, 5)), EPSILON, state((3, 5))));
    assert!(product.delta.contains(state((2, 5)), EPSILON, state((2, 6))));
    assert_eq!(product.delta.state_post(state((2, 5))).num_of_moves(), 2);

    assert!(product.delta.contains(state((3, 5)), A, state((5, 8))));
    assert!(product.delta.contains(state((3, 5)), EPSILON, state((3, 6))));
    assert_eq!(product.delta.state_post(state((3, 5))).num_of_moves(), 2);

    assert!(product.delta.contains(state((2, 6)), B, state((4, 7))));
    assert!(product.delta.contains(state((2, 6)), EPSILON, state((3, 6))));
    assert_eq!(product.delta.state_post(state((2, 6))).num_of_moves(), 2);

    assert!(product.delta.contains(state((3, 6)), A, state((5, 9))));
    assert_eq!(product.delta.state_post(state((3, 6))).num_of_moves(), 1);

    assert!(product.delta.state_post(state((4, 7))).is_empty());
    assert!(product.delta.state_post(state((5, 9))).is_empty());
    assert!(product.delta.state_post(state((5, 8))).is_empty());
}

#[test]
fn product_language_is_the_intersection_of_languages() {
    let product = intersection(&aut_one(), &aut_two());
    let word = [A, A, A];
    assert_eq!(
        product.is_in_lang(&word),
        aut_one().is_in_lang(&word) && aut_two().is_in_lang(&word)
    );
    for length in 0..5 {
        let word = vec![A; length];
        assert_eq!(
            product.is_in_lang(&word),
            aut_one().is_in_lang(&word) && aut_two().is_in_lang(&word),
            "product language must agree on {word:?}"
        );
    }
}
