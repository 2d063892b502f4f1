//! Contract tests for positional hint capture and binding.
//!
//! These tests verify:
//! - Collection produces one list per SELECT block and per base table
//! - Binding onto a same-shaped statement reproduces the captured lists
//! - Extra sites are cleared and excess captured lists are ignored
//! - `first_table_hints` / `contains_table_hint` lookups

use sable::bindinfo::{bind_hints, collect_hints, parse_hints_set, HintSet};
use sable::parser::ast::{IndexHint, IndexHintKind, Statement, TableHint};
use sable::parser::{parse_statement, Parser};
use sable::SableError;

fn parse(sql: &str) -> Statement {
    parse_statement(sql).expect("parse")
}

#[test]
fn test_collect_counts_every_site() {
    // Contract: k select blocks and m base tables give k and m lists, empty
    // lists included.
    let stmt = parse(
        "SELECT /*+ HASH_JOIN(t1, t2) */ t1.a FROM t1 JOIN t2 ON t1.a = t2.a \
         WHERE t1.b IN (SELECT b FROM t3 USE INDEX (idx_b)) \
         UNION ALL SELECT a FROM t4",
    );
    let set = collect_hints(&stmt);

    assert_eq!(set.table_hints().len(), 3);
    assert_eq!(set.index_hints().len(), 4);
    assert!(set.table_hints()[1].is_empty());
    assert!(set.table_hints()[2].is_empty());
    assert_eq!(
        set.index_hints()[2],
        vec![IndexHint::new(IndexHintKind::Use, vec!["idx_b".to_string()])]
    );
}

#[test]
fn test_bind_reproduces_captured_lists() {
    // Contract: binding a captured set onto a fresh parse of the same shape
    // reproduces the same lists in the same order.
    let hinted = "SELECT /*+ MERGE_JOIN(t1) */ * FROM t1 FORCE INDEX (pk) \
                  WHERE EXISTS (SELECT /*+ HASH_AGG() */ 1 FROM t2 IGNORE INDEX FOR ORDER BY (idx_c)) \
                  ORDER BY (SELECT /*+ STREAM_AGG() */ 1 FROM t3)";
    let bare = "SELECT * FROM t1 WHERE EXISTS (SELECT 1 FROM t2) ORDER BY (SELECT 1 FROM t3)";

    let set = collect_hints(&parse(hinted));
    let bound = bind_hints(parse(bare), &set);

    assert_eq!(collect_hints(&bound), set);
    assert_eq!(set.table_hints().len(), 3);
    assert!(set.table_hints().iter().all(|block| block.len() == 1));
}

#[test]
fn test_bind_overwrites_existing_hints() {
    // Contract: binding is a full overwrite, not a merge.
    let set = collect_hints(&parse("SELECT a FROM t"));
    let bound = bind_hints(parse("SELECT /*+ HASH_AGG() */ a FROM t USE INDEX (i)"), &set);

    let after = collect_hints(&bound);
    assert!(after.table_hints()[0].is_empty());
    assert!(after.index_hints()[0].is_empty());
}

#[test]
fn test_bind_clears_trailing_blocks() {
    // Contract: k captured blocks bound onto k+2 blocks leave the last two
    // empty.
    let set = collect_hints(&parse("SELECT /*+ HASH_AGG() */ a FROM t"));
    let target = parse(
        "SELECT /*+ STREAM_AGG() */ a FROM t \
         UNION SELECT /*+ STREAM_AGG() */ a FROM t \
         UNION SELECT /*+ STREAM_AGG() */ a FROM t",
    );
    let after = collect_hints(&bind_hints(target, &set));

    assert_eq!(after.table_hints().len(), 3);
    assert_eq!(after.table_hints()[0], set.table_hints()[0]);
    assert!(after.table_hints()[1].is_empty());
    assert!(after.table_hints()[2].is_empty());
}

#[test]
fn test_bind_dml_statements() {
    // Contract: INSERT, UPDATE and DELETE carry hints the same way.
    let cases = [
        (
            "INSERT INTO t SELECT /*+ HASH_AGG() */ a FROM s USE INDEX (i)",
            "INSERT INTO t SELECT a FROM s",
        ),
        (
            "UPDATE t USE INDEX (i) SET a = 1 WHERE b IN (SELECT /*+ HASH_AGG() */ b FROM s)",
            "UPDATE t SET a = 1 WHERE b IN (SELECT b FROM s)",
        ),
        (
            "DELETE FROM t FORCE INDEX (i) WHERE a = (SELECT /*+ HASH_AGG() */ MAX(a) FROM s)",
            "DELETE FROM t WHERE a = (SELECT MAX(a) FROM s)",
        ),
    ];
    for (hinted, bare) in cases {
        let set = collect_hints(&parse(hinted));
        assert!(set.contains_table_hint("hash_agg"), "{hinted}");
        assert_eq!(collect_hints(&bind_hints(parse(bare), &set)), set, "{bare}");
    }
}

#[test]
fn test_first_table_hints() {
    // Contract: empty for zero select blocks, otherwise block 0's list.
    assert!(HintSet::new().first_table_hints().is_empty());

    let set = collect_hints(&parse(
        "SELECT /*+ HASH_AGG() */ a FROM t WHERE a IN (SELECT /*+ STREAM_AGG() */ a FROM s)",
    ));
    assert_eq!(set.first_table_hints(), &[TableHint::new("hash_agg")][..]);
}

#[test]
fn test_contains_table_hint() {
    // Contract: {A, B} in block 0 and {C} in block 1; "b" found, "d" not.
    let set = HintSet::from_parts(
        vec![
            vec![TableHint::new("A"), TableHint::new("B")],
            vec![TableHint::new("C")],
        ],
        vec![],
    );
    assert!(set.contains_table_hint("b"));
    assert!(set.contains_table_hint("c"));
    assert!(!set.contains_table_hint("d"));
}

#[test]
fn test_parse_hints_set() {
    // Contract: parse errors surface unchanged; success equals collect(parse).
    let parser = Parser::new();
    let sql = "SELECT /*+ USE_INDEX(t, idx_a) */ a FROM t";
    assert_eq!(
        parse_hints_set(&parser, sql, "utf8mb4", "utf8mb4_general_ci").unwrap(),
        collect_hints(&parse(sql))
    );
    assert!(matches!(
        parse_hints_set(&parser, "SELECT a FROM", "", ""),
        Err(SableError::ParseError { .. })
    ));
    assert!(matches!(
        parse_hints_set(&parser, sql, "klingon", ""),
        Err(SableError::UnsupportedCharset(_))
    ));
}

mod proptest_positional_round_trip {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    struct Block {
        hint: Option<&'static str>,
        index: Option<&'static str>,
        join: bool,
    }

    fn block_strategy() -> impl Strategy<Value = Block> {
        (
            prop::option::of(prop::sample::select(vec![
                "HASH_JOIN(t)",
                "HASH_AGG()",
                "MAX_EXECUTION_TIME(10)",
                "USE_INDEX(t, i)",
                "QB_NAME(qb1) STREAM_AGG()",
            ])),
            prop::option::of(prop::sample::select(vec![
                "USE INDEX (i)",
                "IGNORE INDEX (j)",
                "FORCE INDEX FOR JOIN (k, l)",
            ])),
            any::<bool>(),
        )
            .prop_map(|(hint, index, join)| Block { hint, index, join })
    }

    /// Renders a chain of nested SELECT blocks, optionally with hints.
    fn render(blocks: &[Block], with_hints: bool) -> String {
        let Some((block, rest)) = blocks.split_first() else {
            return String::new();
        };
        let k = rest.len();
        let mut sql = String::from("SELECT ");
        if let (true, Some(hint)) = (with_hints, block.hint) {
            sql.push_str(&format!("/*+ {hint} */ "));
        }
        sql.push_str(&format!("a FROM t{k}"));
        if let (true, Some(index)) = (with_hints, block.index) {
            sql.push_str(&format!(" {index}"));
        }
        if block.join {
            sql.push_str(&format!(" JOIN s{k} ON t{k}.a = s{k}.a"));
        }
        if rest.is_empty() {
            sql.push_str(" WHERE a > 1");
        } else {
            sql.push_str(&format!(" WHERE a IN ({})", render(rest, with_hints)));
        }
        sql
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: collect, bind onto the bare statement, collect again.
        #[test]
        fn test_bind_after_collect_is_identity(blocks in prop::collection::vec(block_strategy(), 1..6)) {
            let hinted = parse_statement(&render(&blocks, true)).expect("parse hinted");
            let bare = parse_statement(&render(&blocks, false)).expect("parse bare");

            let set = collect_hints(&hinted);
            prop_assert_eq!(set.table_hints().len(), blocks.len());
            prop_assert_eq!(
                set.index_hints().len(),
                blocks.len() + blocks.iter().filter(|b| b.join).count()
            );

            let bound = bind_hints(bare, &set);
            prop_assert_eq!(collect_hints(&bound), set.clone());
            prop_assert!(set.check_shape(&bound).is_ok());
        }

        /// Property: a persisted hint set decodes to itself.
        #[test]
        fn test_encode_decode_preserves_set(blocks in prop::collection::vec(block_strategy(), 1..4)) {
            let set = collect_hints(&parse_statement(&render(&blocks, true)).expect("parse"));
            let bytes = set.encode().expect("encode");
            prop_assert_eq!(HintSet::decode(&bytes).expect("decode"), set);
        }
    }
}
