use burrow::{
    config::Config,
    db::{formula::GroundNode, program::ClauseDb, GroundRef},
    engine::Engine,
    structures::term::Term,
};

/// `0.3::p(1). 0.5::p(1).` --- two proofs of one instantiation, so `p(1)`
/// publishes a disjunction.
fn two_proof_db() -> ClauseDb {
    let mut db = ClauseDb::default();
    db.add_fact("p", vec![Term::int(1)], Some(Term::float(0.3)));
    db.add_fact("p", vec![Term::int(1)], Some(Term::float(0.5)));

    let a_body = db.add_call("p", vec![Term::int(1)]);
    db.add_clause("a", vec![], a_body, 0);

    let b_body = db.add_call("p", vec![Term::int(1)]);
    db.add_clause("b", vec![], b_body, 0);

    db
}

mod sharing {
    use super::*;

    /// Distinct callers of one predicate instantiation observe one node.
    #[test]
    fn callers_share_the_result_node() {
        let mut db = two_proof_db();
        let call_a = db.add_call("a", vec![]);
        let call_b = db.add_call("b", vec![]);
        let body = db.add_conj([call_a, call_b]);
        db.add_clause("c", vec![], body, 0);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let formula = engine.ground(&db, &Term::symbol("c"), None, None).unwrap();
        let names: Vec<_> = formula.names().collect();
        assert_eq!(names.len(), 1);

        // c grounds to and(n, n) over the one node of p(1).
        let and = names[0].node.id().unwrap();
        let GroundNode::And { children } = formula.node(and) else {
            panic!("expected a conjunction");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[0], children[1]);

        let GroundNode::Or { children: proofs, readonly } = formula.node(children[0].id().unwrap()) else {
            panic!("expected the shared disjunction");
        };
        assert!(*readonly);
        assert_eq!(proofs.len(), 2);
    }

    /// Structural hashing makes separate queries against one formula agree too.
    #[test]
    fn accumulated_queries_share_nodes() {
        let mut db = two_proof_db();
        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let formula = engine.ground(&db, &Term::symbol("a"), None, None).unwrap();
        let formula = engine.ground(&db, &Term::symbol("b"), Some(formula), None).unwrap();

        let nodes: Vec<GroundRef> = formula.names().map(|name| name.node).collect();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0], nodes[1]);
    }
}

mod replay {
    use super::*;

    /// The second conjunct's calls attach after the table has completed, and
    /// are caught up by replay: the full cross product appears.
    #[test]
    fn late_listeners_observe_past_results() {
        let mut db = ClauseDb::default();
        db.add_fact("p", vec![Term::int(1)], Some(Term::float(0.4)));
        db.add_fact("p", vec![Term::int(2)], Some(Term::float(0.7)));

        let first = db.add_call("p", vec![Term::var(0)]);
        let second = db.add_call("p", vec![Term::var(1)]);
        let body = db.add_conj([first, second]);
        db.add_clause("q", vec![Term::var(0), Term::var(1)], body, 2);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let found = engine
            .query(&db, &Term::compound("q", vec![Term::Unset, Term::Unset]))
            .unwrap();

        assert_eq!(found.len(), 4);
        for x in [1, 2] {
            for y in [1, 2] {
                assert!(found.contains(&vec![Term::int(x), Term::int(y)]));
            }
        }
    }

    /// One call per distinct instantiation: narrowing the arguments narrows
    /// the table key.
    #[test]
    fn instantiations_table_separately() {
        let mut db = ClauseDb::default();
        db.add_fact("p", vec![Term::int(1)], Some(Term::float(0.4)));
        db.add_fact("p", vec![Term::int(2)], Some(Term::float(0.7)));

        let open = db.add_call("p", vec![Term::var(0)]);
        let narrow = db.add_call("p", vec![Term::int(1)]);
        let body = db.add_conj([open, narrow]);
        db.add_clause("q", vec![Term::var(0)], body, 1);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let found = engine
            .query(&db, &Term::compound("q", vec![Term::Unset]))
            .unwrap();
        assert_eq!(found, vec![vec![Term::int(1)], vec![Term::int(2)]]);
    }
}
