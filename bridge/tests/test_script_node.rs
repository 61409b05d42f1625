//! Tests for the script node
//!
//! A node run loads its args into the registry, runs the script against a
//! fresh context, returns the published outputs as a dict, and releases
//! every handle it issued whether or not the script succeeded.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use zeno_script_bridge::node::HostContext;
use zeno_script_bridge::{
    DictObject, HostObject, Literal, ObjectBinding, ObjectRegistry, Script, ScriptError,
    ScriptNode, ScriptNodeInputs, ScriptSource,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn args_of(entries: &[(&str, Literal)]) -> DictObject {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), Arc::new(HostObject::from_literal(v.clone()))))
        .collect()
}

/// Script that copies every arg to an output with a suffix
struct SuffixScript {
    suffix: &'static str,
    runs: usize,
}

impl<'r> Script<&'r mut ObjectRegistry> for SuffixScript {
    fn run(&mut self, ctx: &mut HostContext<'r>) -> Result<(), ScriptError> {
        self.runs += 1;
        let keys: Vec<String> = ctx.inputs().keys().cloned().collect();
        for key in keys {
            let obj = ctx.get_input(&key)?;
            ctx.set_output(format!("{}{}", key, self.suffix), obj);
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_apply_returns_outputs() {
    let mut registry = ObjectRegistry::new();
    let args = args_of(&[("a", Literal::Int(2)), ("b", Literal::Int(5))]);

    let rets = ScriptNode::default()
        .apply_fn(&mut registry, &args, |ctx| {
            let a: i64 = ctx.get_input_as("a")?;
            let b: i64 = ctx.get_input_as("b")?;
            ctx.rets().set("sum", a + b)?;
            ctx.set_output2("label", "total")
        })
        .unwrap();

    assert_eq!(rets.len(), 2);
    assert_eq!(rets.get("sum").unwrap().to_literal(), Literal::Int(7));
    assert_eq!(rets.get("label").unwrap().to_literal(), Literal::from("total"));
}

#[test]
fn test_args_snapshot_available_to_script() {
    let mut registry = ObjectRegistry::new();
    let args = args_of(&[("name", Literal::from("grid"))]);

    let rets = ScriptNode::default()
        .apply_fn(&mut registry, &args, |ctx| {
            let name = ctx.args().get("name").cloned();
            assert_eq!(name, Some(Literal::from("grid")));
            Ok(())
        })
        .unwrap();

    assert!(rets.is_empty());
}

#[test]
fn test_pass_through_keeps_same_object() {
    let mut registry = ObjectRegistry::new();
    let args = args_of(&[("mesh", Literal::from("payload"))]);
    let mut script = SuffixScript {
        suffix: "_out",
        runs: 0,
    };

    let rets = ScriptNode::default()
        .apply(&mut registry, &args, &mut script)
        .unwrap();

    assert_eq!(script.runs, 1);
    assert!(Arc::ptr_eq(
        rets.get("mesh_out").unwrap(),
        args.get("mesh").unwrap()
    ));
}

#[test]
fn test_missing_input_fails_invocation() {
    let mut registry = ObjectRegistry::new();
    let args = args_of(&[("a", Literal::Int(1))]);

    let err = ScriptNode::default()
        .apply_fn(&mut registry, &args, |ctx| {
            ctx.set_output2("early", 1)?;
            ctx.get_input("missing")?;
            Ok(())
        })
        .unwrap_err();

    assert_eq!(err.missing_key(), Some("missing"));
    assert!(registry.is_empty());
}

#[test]
fn test_registry_size_restored() {
    let mut registry = ObjectRegistry::new();
    let preexisting = registry.load(Arc::new(HostObject::from_literal(Literal::Int(0))));
    let args = args_of(&[("a", Literal::Int(1)), ("b", Literal::Int(2))]);

    ScriptNode::default()
        .apply_fn(&mut registry, &args, |ctx| {
            // an unpublished temporary must be released too
            ctx.binding_mut().from_literal(Literal::Int(99))?;
            ctx.set_output2("x", 3)
        })
        .unwrap();

    assert_eq!(registry.len(), 1);
    assert!(registry.contains(preexisting));
}

#[test]
fn test_script_failure_message() {
    let mut registry = ObjectRegistry::new();
    let err = ScriptNode::default()
        .apply_fn(&mut registry, &DictObject::new(), |_ctx| {
            Err(ScriptError::failed("division by zero"))
        })
        .unwrap_err();

    assert_eq!(err.to_string(), "Script failed: division by zero");
}

#[test]
fn test_node_source_from_config() {
    let inputs: ScriptNodeInputs =
        serde_json::from_str(r#"{"code": "rets.x = 1", "path": "scripts/run.py"}"#).unwrap();
    let node = ScriptNode::new(inputs);

    assert_eq!(
        node.source(),
        ScriptSource::File(PathBuf::from("scripts/run.py"))
    );
    assert_eq!(node.inputs().code, "rets.x = 1");
}

#[test]
fn test_source_loads_file() {
    let path = std::env::temp_dir().join(format!("zeno_bridge_{}.py", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "rets.x = args.a").unwrap();
    }

    let source = ScriptSource::File(path.clone());
    assert_eq!(source.load().unwrap(), "rets.x = args.a\n");
    assert_eq!(source.name(), path.display().to_string());

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_inline_source_loads_code() {
    let node = ScriptNode::new(ScriptNodeInputs {
        code: "rets.y = 2".to_string(),
        path: None,
    });
    assert_eq!(node.source().load().unwrap(), "rets.y = 2");
    assert_eq!(node.source().name(), "<string>");
}

// ============================================================================
// Python programs
// ============================================================================

#[cfg(feature = "pyo3")]
mod python {
    use super::*;

    fn inline(code: &str) -> ScriptNode {
        ScriptNode::new(ScriptNodeInputs {
            code: code.to_string(),
            path: None,
        })
    }

    #[test]
    fn test_apply_python_runs_inline_code() {
        let mut registry = ObjectRegistry::new();
        let args = args_of(&[("x", Literal::Int(21))]);

        let rets = inline("tmp = from_literal(0)\nrets.y = args.x * 2")
            .apply_python(&mut registry, &args)
            .unwrap();

        assert_eq!(rets.get("y").unwrap().to_literal(), Literal::Int(42));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_apply_python_prefers_path() {
        let path = std::env::temp_dir().join(format!("zeno_bridge_node_{}.py", std::process::id()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "rets['from_file'] = args.s + '!'").unwrap();
        }

        let mut registry = ObjectRegistry::new();
        let node = ScriptNode::new(ScriptNodeInputs {
            code: "rets.from_code = 1".to_string(),
            path: Some(path.clone()),
        });
        let rets = node
            .apply_python(&mut registry, &args_of(&[("s", Literal::from("hi"))]))
            .unwrap();

        assert_eq!(rets.get("from_file").unwrap().to_literal(), Literal::from("hi!"));
        assert!(!rets.contains_key("from_code"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_apply_python_unreadable_path() {
        let mut registry = ObjectRegistry::new();
        let node = ScriptNode::new(ScriptNodeInputs {
            code: String::new(),
            path: Some(PathBuf::from("/nonexistent/zeno/node.py")),
        });

        let err = node.apply_python(&mut registry, &DictObject::default()).unwrap_err();
        assert!(matches!(err, ScriptError::SourceUnreadable { .. }));
    }

    #[test]
    fn test_apply_python_failure_restores_registry() {
        let mut registry = ObjectRegistry::new();
        let kept = registry.load(Arc::new(HostObject::from_literal(Literal::Int(7))));

        let err = inline("rets.partial = 1\nget_input('missing')")
            .apply_python(&mut registry, &args_of(&[("a", Literal::Int(1))]))
            .unwrap_err();

        assert!(matches!(err, ScriptError::Failed { .. }));
        assert!(err.to_string().contains("invalid input key: missing"));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(kept));
    }
}
