//! PyO3 bindings
//!
//! The Python-facing script surface: `get_input`, `get_input2`,
//! `set_output`, `set_output2`, `update_args`, and the `args` / `rets`
//! proxies with attribute syntax.

pub mod context;
pub mod types;
