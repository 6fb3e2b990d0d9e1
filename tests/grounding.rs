use burrow::{
    config::Config,
    db::{
        formula::{GroundNode, QueryName},
        program::ClauseDb,
        GroundRef,
    },
    engine::Engine,
    structures::term::Term,
    types::err::{ErrorKind, GroundingError},
};

fn names(engine: &mut Engine, db: &ClauseDb, query: &Term) -> Vec<QueryName> {
    let formula = engine.ground(db, query, None, None).unwrap();
    formula.names().cloned().collect()
}

mod chains {
    use super::*;

    #[test]
    fn probabilistic_chain() {
        let mut db = ClauseDb::default();
        let p1 = db.add_fact("p", vec![Term::int(1)], Some(Term::float(0.4)));
        let p2 = db.add_fact("p", vec![Term::int(2)], Some(Term::float(0.7)));
        let body = db.add_call("p", vec![Term::var(0)]);
        db.add_clause("q", vec![Term::var(0)], body, 1);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let formula = engine
            .ground(&db, &Term::compound("q", vec![Term::Unset]), None, Some("q"))
            .unwrap();
        let names: Vec<_> = formula.names().collect();

        assert_eq!(names.len(), 2);
        assert_eq!(names[0].term, Term::compound("q", vec![Term::int(1)]));
        assert_eq!(names[1].term, Term::compound("q", vec![Term::int(2)]));
        assert_eq!(names[0].label.as_deref(), Some("q"));

        // Each solution grounds to the atom of its fact.
        let one = names[0].node.id().unwrap();
        let two = names[1].node.id().unwrap();
        assert_ne!(one, two);
        assert!(matches!(
            formula.node(one),
            GroundNode::Atom { key, .. } if *key == burrow::db::formula::AtomKey::Fact(p1)
        ));
        assert!(matches!(
            formula.node(two),
            GroundNode::Atom { key, .. } if *key == burrow::db::formula::AtomKey::Fact(p2)
        ));
    }

    #[test]
    fn deterministic_chain() {
        let mut db = ClauseDb::default();
        db.add_fact("p", vec![Term::int(1)], None);
        db.add_fact("p", vec![Term::int(2)], None);
        let body = db.add_call("p", vec![Term::var(0)]);
        db.add_clause("q", vec![Term::var(0)], body, 1);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        // Deterministic facts collapse to the true sentinel: two solutions,
        // nothing allocated.
        let names = names(&mut engine, &db, &Term::compound("q", vec![Term::Unset]));
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|name| name.node == GroundRef::True));
    }

    #[test]
    fn ground_call_filters() {
        let mut db = ClauseDb::default();
        db.add_fact("p", vec![Term::int(1)], Some(Term::float(0.4)));
        db.add_fact("p", vec![Term::int(2)], Some(Term::float(0.7)));

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let solutions = engine
            .query(&db, &Term::compound("p", vec![Term::int(2)]))
            .unwrap();
        assert_eq!(solutions, vec![vec![Term::int(2)]]);
    }
}

mod shared_subproofs {
    use super::*;

    /// `0.3::a. 0.4::b. c :- a, b. c :- a.` --- the atom of `a` is one node,
    /// shared between the conjunction and the bare disjunct.
    #[test]
    fn atom_shared_between_proofs() {
        let mut db = ClauseDb::default();
        db.add_fact("a", vec![], Some(Term::float(0.3)));
        db.add_fact("b", vec![], Some(Term::float(0.4)));

        let call_a = db.add_call("a", vec![]);
        let call_b = db.add_call("b", vec![]);
        let both = db.add_conj([call_a, call_b]);
        db.add_clause("c", vec![], both, 0);

        let again = db.add_call("a", vec![]);
        db.add_clause("c", vec![], again, 0);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let formula = engine.ground(&db, &Term::symbol("c"), None, None).unwrap();
        let names: Vec<_> = formula.names().collect();
        assert_eq!(names.len(), 1);

        // or(and(a, b), a), with one atom node for a.
        let or = names[0].node.id().unwrap();
        let GroundNode::Or { children, readonly } = formula.node(or) else {
            panic!("expected a disjunction");
        };
        assert!(*readonly);
        assert_eq!(children.len(), 2);

        let and = children[0].id().unwrap();
        let GroundNode::And { children: pair } = formula.node(and) else {
            panic!("expected a conjunction");
        };
        assert_eq!(pair.len(), 2);

        // The bare disjunct is the same node as the first conjunct.
        assert_eq!(children[1], pair[0]);
        assert!(matches!(formula.node(pair[0].id().unwrap()), GroundNode::Atom { .. }));
    }
}

mod annotated_disjunctions {
    use super::*;
    use burrow::db::formula::AtomKey;

    /// `0.2::x; 0.3::y; 0.5::z.` --- one choice atom per branch, distinct
    /// choice indices, one shared group.
    #[test]
    fn branches_share_a_group() {
        let mut db = ClauseDb::default();
        let group = db.add_annotated_disjunction(vec![
            ("x", vec![], Term::float(0.2)),
            ("y", vec![], Term::float(0.3)),
            ("z", vec![], Term::float(0.5)),
        ]);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        // Accumulate all three queries into one formula.
        let formula = engine.ground(&db, &Term::symbol("x"), None, None).unwrap();
        let formula = engine.ground(&db, &Term::symbol("y"), Some(formula), None).unwrap();
        let formula = engine.ground(&db, &Term::symbol("z"), Some(formula), None).unwrap();

        let nodes: Vec<_> = formula.names().map(|name| name.node.id().unwrap()).collect();
        assert_eq!(nodes.len(), 3);

        for (expected, &id) in nodes.iter().enumerate() {
            let GroundNode::Atom { key, group: tag, .. } = formula.node(id) else {
                panic!("expected a choice atom");
            };
            assert_eq!(
                *key,
                AtomKey::Choice {
                    group,
                    args: vec![],
                    choice: expected
                }
            );
            assert_eq!(tag.as_ref(), Some(&(group, vec![])));
        }
    }
}

mod negation {
    use super::*;

    /// `a. b :- \+ a.` --- the body holds deterministically, so `b` has no
    /// solution and is named to the absent node.
    #[test]
    fn negated_deterministic_body_fails() {
        let mut db = ClauseDb::default();
        db.add_fact("a", vec![], None);
        let call_a = db.add_call("a", vec![]);
        let not_a = db.add_neg(call_a);
        db.add_clause("b", vec![], not_a, 0);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let names = names(&mut engine, &db, &Term::symbol("b"));
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].node, GroundRef::False);
    }

    /// `0.3::a. b :- \+ a.` --- one result, not(atom(a)).
    #[test]
    fn negated_probabilistic_body() {
        let mut db = ClauseDb::default();
        db.add_fact("a", vec![], Some(Term::float(0.3)));
        let call_a = db.add_call("a", vec![]);
        let not_a = db.add_neg(call_a);
        db.add_clause("b", vec![], not_a, 0);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let formula = engine.ground(&db, &Term::symbol("b"), None, None).unwrap();
        let names: Vec<_> = formula.names().collect();
        assert_eq!(names.len(), 1);

        let id = names[0].node.id().unwrap();
        let GroundNode::Not { child } = formula.node(id) else {
            panic!("expected a negation");
        };
        assert!(matches!(formula.node(*child), GroundNode::Atom { .. }));
    }

    /// Negation does not shield an undefined predicate: the call raises.
    #[test]
    fn negated_undefined_body_raises() {
        let mut db = ClauseDb::default();
        db.add_fact("other", vec![], None);
        let call_a = db.add_call("a", vec![]);
        let not_a = db.add_neg(call_a);
        db.add_clause("b", vec![], not_a, 0);
        db.add_fact("a", vec![Term::int(9)], None); // a/1, not a/0

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        // a/0 is undefined: \+ a raises rather than failing silently.
        let outcome = engine.ground(&db, &Term::symbol("b"), None, None);
        assert_eq!(
            outcome.unwrap_err(),
            ErrorKind::Grounding(GroundingError::UnknownClause("a/0".to_owned()))
        );
    }

    /// `p(1). b :- \+ p(2).` --- a failing ground body makes the negation
    /// hold with no allocation.
    #[test]
    fn negated_failing_body_holds() {
        let mut db = ClauseDb::default();
        db.add_fact("p", vec![Term::int(1)], None);
        let call = db.add_call("p", vec![Term::int(2)]);
        let neg = db.add_neg(call);
        db.add_clause("b", vec![], neg, 0);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let names = names(&mut engine, &db, &Term::symbol("b"));
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].node, GroundRef::True);
    }
}

mod boundaries {
    use super::*;

    /// A disjunction with zero branches completes without results.
    #[test]
    fn empty_disjunction() {
        let mut db = ClauseDb::default();
        let none = db.add_disj(vec![]);
        db.add_clause("b", vec![], none, 0);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let names = names(&mut engine, &db, &Term::symbol("b"));
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].node, GroundRef::False);
    }

    /// A conjunction over `fail` produces zero results and completes.
    #[test]
    fn conjunction_with_fail() {
        let mut db = ClauseDb::default();
        db.add_fact("a", vec![], None);
        let call_a = db.add_call("a", vec![]);
        let call_fail = db.add_call("fail", vec![]);
        let body = db.add_conj([call_a, call_fail]);
        db.add_clause("c", vec![], body, 0);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let names = names(&mut engine, &db, &Term::symbol("c"));
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].node, GroundRef::False);
    }

    /// A callee result which binds one caller variable two ways is a silent
    /// branch failure.
    #[test]
    fn conflicting_shared_variable() {
        let mut db = ClauseDb::default();
        db.add_fact("s", vec![Term::int(1), Term::int(2)], None);
        let call = db.add_call("s", vec![Term::var(0), Term::var(0)]);
        db.add_clause("t", vec![], call, 1);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let names = names(&mut engine, &db, &Term::symbol("t"));
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].node, GroundRef::False);
    }

    /// A non-ground result binding a head variable which occurs twice is a
    /// program error.
    #[test]
    fn repeated_head_variable_must_ground() {
        let mut db = ClauseDb::default();
        let body = db.add_call("true", vec![]);
        db.add_clause("q", vec![Term::var(0), Term::var(0)], body, 1);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let outcome = engine.ground(&db, &Term::compound("q", vec![Term::Unset, Term::Unset]), None, None);
        assert_eq!(
            outcome.unwrap_err(),
            ErrorKind::Grounding(GroundingError::VariableUnification)
        );
    }
}

mod errors {
    use super::*;

    /// `p(X) :- q(X).` with `q` undefined raises on call expansion.
    #[test]
    fn unknown_clause() {
        let mut db = ClauseDb::default();
        let body = db.add_call("q", vec![Term::var(0)]);
        db.add_clause("p", vec![Term::var(0)], body, 1);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let outcome = engine.ground(&db, &Term::compound("p", vec![Term::int(1)]), None, None);
        assert_eq!(
            outcome.unwrap_err(),
            ErrorKind::Grounding(GroundingError::UnknownClause("q/1".to_owned()))
        );
    }

    /// An unknown *query* predicate merely has no solutions.
    #[test]
    fn unknown_query_predicate() {
        let mut db = ClauseDb::default();
        db.add_fact("p", vec![Term::int(1)], None);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let names = names(&mut engine, &db, &Term::symbol("nope"));
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].node, GroundRef::False);
    }

    /// Programs without a finite grounding exhaust the depth limit.
    #[test]
    fn unbounded_program() {
        let mut db = ClauseDb::default();
        let deeper = db.add_call("p", vec![Term::compound("f", vec![Term::var(0)])]);
        db.add_clause("p", vec![Term::var(0)], deeper, 1);

        let mut engine = Engine::from_config(Config {
            depth_limit: 128,
            ..Config::default()
        });
        engine.prepare(&mut db);

        let outcome = engine.ground(&db, &Term::compound("p", vec![Term::symbol("a")]), None, None);
        assert_eq!(
            outcome.unwrap_err(),
            ErrorKind::Grounding(GroundingError::UnboundProgram)
        );
    }

    /// Queries carry unset variables, never slot indices.
    #[test]
    fn non_ground_query() {
        let mut db = ClauseDb::default();
        db.add_fact("p", vec![Term::int(1)], None);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);

        let outcome = engine.ground(&db, &Term::compound("p", vec![Term::var(0)]), None, None);
        assert_eq!(
            outcome.unwrap_err(),
            ErrorKind::Grounding(GroundingError::NonGroundQuery)
        );

        let outcome = engine.ground(&db, &Term::int(1), None, None);
        assert_eq!(
            outcome.unwrap_err(),
            ErrorKind::Grounding(GroundingError::NonGroundQuery)
        );
    }

    /// Grounding requires a prepared database.
    #[test]
    fn unlinked_database() {
        let mut db = ClauseDb::default();
        db.add_fact("p", vec![Term::int(1)], None);

        let mut engine = Engine::from_config(Config::default());
        // No prepare.
        let outcome = engine.ground(&db, &Term::compound("p", vec![Term::int(1)]), None, None);
        assert_eq!(
            outcome.unwrap_err(),
            ErrorKind::Grounding(GroundingError::UnlinkedDatabase)
        );
    }
}

mod inspection {
    use super::*;
    use burrow::db::NodeId;
    use burrow::engine::inspect::{Inspector, Step};

    struct FailEverything;

    impl Inspector for FailEverything {
        fn enter(&mut self, _depth: usize, _node: NodeId, _args: &[Term]) -> Step {
            Step::Fail
        }
    }

    struct AbortImmediately;

    impl Inspector for AbortImmediately {
        fn enter(&mut self, _depth: usize, _node: NodeId, _args: &[Term]) -> Step {
            Step::Abort
        }
    }

    #[test]
    fn fail_skips_nodes() {
        let mut db = ClauseDb::default();
        db.add_fact("p", vec![Term::int(1)], None);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);
        engine.set_inspector(Box::new(FailEverything));

        let names = names(&mut engine, &db, &Term::compound("p", vec![Term::int(1)]));
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].node, GroundRef::False);
    }

    #[test]
    fn abort_terminates() {
        let mut db = ClauseDb::default();
        db.add_fact("p", vec![Term::int(1)], None);

        let mut engine = Engine::from_config(Config::default());
        engine.prepare(&mut db);
        engine.set_inspector(Box::new(AbortImmediately));

        let outcome = engine.ground(&db, &Term::compound("p", vec![Term::int(1)]), None, None);
        assert_eq!(outcome.unwrap_err(), ErrorKind::Grounding(GroundingError::Abort));
    }
}
