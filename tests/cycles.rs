use burrow::{
    config::Config,
    db::{formula::GroundNode, program::ClauseDb, GroundRef},
    engine::Engine,
    structures::term::Term,
};

use petgraph::algo::is_cyclic_directed;

/// `path(X,Y) :- edge(X,Y). path(X,Y) :- path(X,Z), edge(Z,Y).` over
/// probabilistic edges.
fn path_db(edges: &[(i64, i64)]) -> ClauseDb {
    let mut db = ClauseDb::default();
    for &(from, to) in edges {
        db.add_fact("edge", vec![Term::int(from), Term::int(to)], Some(Term::float(0.5)));
    }

    let direct = db.add_call("edge", vec![Term::var(0), Term::var(1)]);
    db.add_clause("path", vec![Term::var(0), Term::var(1)], direct, 2);

    let step = db.add_call("path", vec![Term::var(0), Term::var(2)]);
    let hop = db.add_call("edge", vec![Term::var(2), Term::var(1)]);
    let body = db.add_conj([step, hop]);
    db.add_clause("path", vec![Term::var(0), Term::var(1)], body, 3);

    db
}

mod left_recursion {
    use super::*;

    #[test]
    fn transitive_closure_grounds() {
        let mut db = path_db(&[(1, 2), (2, 3)]);
        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let formula = engine
            .ground(&db, &Term::compound("path", vec![Term::int(1), Term::int(3)]), None, None)
            .unwrap();

        let names: Vec<_> = formula.names().collect();
        assert_eq!(names.len(), 1);
        assert_eq!(
            names[0].term,
            Term::compound("path", vec![Term::int(1), Term::int(3)])
        );
        assert!(names[0].node.id().is_some());

        // The cyclic call published its results under a mutable disjunction.
        assert!(formula
            .nodes()
            .any(|(_, node)| matches!(node, GroundNode::Or { readonly: false, .. })));
    }

    #[test]
    fn open_query_enumerates_reachability() {
        let mut db = path_db(&[(1, 2), (2, 3)]);
        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let found = engine
            .query(&db, &Term::compound("path", vec![Term::int(1), Term::Unset]))
            .unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.contains(&vec![Term::int(1), Term::int(2)]));
        assert!(found.contains(&vec![Term::int(1), Term::int(3)]));
    }

    #[test]
    fn unreachable_pair_has_no_solution() {
        let mut db = path_db(&[(1, 2), (2, 3)]);
        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let formula = engine
            .ground(&db, &Term::compound("path", vec![Term::int(3), Term::int(1)]), None, None)
            .unwrap();
        let names: Vec<_> = formula.names().collect();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].node, GroundRef::False);
    }
}

mod cyclic_data {
    use super::*;

    /// A cycle in the edge relation itself: grounding still terminates, with
    /// every node reachable from 1 enumerated exactly once.
    #[test]
    fn cyclic_relation_grounds() {
        let mut db = path_db(&[(1, 2), (2, 1), (2, 3)]);
        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let found = engine
            .query(&db, &Term::compound("path", vec![Term::int(1), Term::Unset]))
            .unwrap();

        assert_eq!(found.len(), 3);
        for to in [1, 2, 3] {
            assert!(found.contains(&vec![Term::int(1), Term::int(to)]));
        }
    }

    /// Node allocation is append-only: logical cycles land as disjuncts
    /// added to earlier nodes, never as allocation-time self-reference, so
    /// grounding over acyclic data yields an acyclic formula.
    #[test]
    fn every_grounding_over_acyclic_data_is_acyclic() {
        let mut db = path_db(&[(1, 2), (2, 3)]);
        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let formula = engine
            .ground(&db, &Term::compound("path", vec![Term::int(1), Term::Unset]), None, None)
            .unwrap();
        assert!(!is_cyclic_directed(&formula.as_graph()));
    }
}

mod determinism {
    use super::*;

    /// Two runs over identical inputs produce identical formulas.
    #[test]
    fn grounding_is_deterministic() {
        let render = || {
            let mut db = path_db(&[(1, 2), (2, 1), (2, 3)]);
            let mut engine = Engine::from_config(Config::default());
            engine.prepare(&mut db);
            let formula = engine
                .ground(&db, &Term::compound("path", vec![Term::int(1), Term::Unset]), None, None)
                .unwrap();
            format!("{formula}")
        };

        assert_eq!(render(), render());
    }
}
