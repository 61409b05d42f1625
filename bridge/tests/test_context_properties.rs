//! Property tests for the context tables
//!
//! For arbitrary input tables: every present key resolves to its stored
//! handle, the args snapshot agrees with `get_input2`, and outputs written
//! through `rets` land in both the output and retain tables.

use proptest::prelude::*;
use std::collections::BTreeMap;
use zeno_script_bridge::{Literal, ObjectBinding, ObjectRegistry, ScriptContext};

fn literal_strategy() -> impl Strategy<Value = Literal> {
    prop_oneof![
        any::<i64>().prop_map(Literal::Int),
        (-1.0e6f64..1.0e6).prop_map(Literal::Float),
        "[a-z]{0,8}".prop_map(Literal::Str),
        prop::array::uniform3(-100.0f32..100.0).prop_map(Literal::Vec3),
    ]
}

fn table_strategy() -> impl Strategy<Value = BTreeMap<String, Literal>> {
    prop::collection::btree_map("[a-z_]{1,6}", literal_strategy(), 0..8)
}

proptest! {
    #[test]
    fn prop_present_keys_resolve_to_stored_handles(table in table_strategy()) {
        let mut registry = ObjectRegistry::new();
        let mut handles = BTreeMap::new();
        for (key, value) in &table {
            let obj = registry.from_literal(value.clone()).unwrap();
            handles.insert(key.clone(), obj.handle());
        }

        let ctx = ScriptContext::with_inputs(&mut registry, handles.clone());
        for (key, handle) in &handles {
            let wrapped = ctx.get_input(key).unwrap();
            prop_assert_eq!(ctx.binding().to_handle(&wrapped), *handle);
            prop_assert_eq!(&ctx.get_input2(key).unwrap(), &table[key]);
        }

        let absent = "ABSENT";
        let absent_err = ctx.get_input(absent).unwrap_err();
        prop_assert_eq!(absent_err.missing_key(), Some(absent));
    }

    #[test]
    fn prop_update_args_agrees_with_get_input2(table in table_strategy()) {
        let mut registry = ObjectRegistry::new();
        let mut ctx = ScriptContext::new(&mut registry);
        for (key, value) in &table {
            let obj = ctx.binding_mut().from_literal(value.clone()).unwrap();
            ctx.insert_input(key.clone(), obj.handle());
        }

        ctx.update_args().unwrap();

        prop_assert_eq!(ctx.args().len(), table.len());
        for key in table.keys() {
            prop_assert_eq!(ctx.args().get(key), Some(&ctx.get_input2(key).unwrap()));
        }
    }

    #[test]
    fn prop_rets_fill_output_and_retain_tables(table in table_strategy()) {
        let mut registry = ObjectRegistry::new();
        let mut ctx = ScriptContext::new(&mut registry);
        for (key, value) in &table {
            ctx.rets().set(key.clone(), value.clone()).unwrap();
        }

        prop_assert_eq!(ctx.outputs().len(), table.len());
        for (key, value) in &table {
            let handle = ctx.outputs()[key.as_str()];
            let retained = &ctx.retained()[key.as_str()];
            prop_assert_eq!(retained.handle(), handle);
            prop_assert_eq!(&retained.to_literal(), value);
            prop_assert_eq!(&ctx.binding().find(handle).unwrap().to_literal(), value);
        }
    }
}
