use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::Result;
use crate::value::Value;

/// A stateless helper registered under `T(fully.qualified.Type).method(...)`
/// (spec §4.2). The allowlist is explicit — there is no dynamic class
/// loading behind it.
pub type StaticFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Name -> value map available to the Evaluator during one decode/encode
/// operation (spec §3 "Context").
///
/// `base` is the user-supplied configuration set via
/// [`crate::facade::Boxon::set_context`] and is never mutated. `transient`
/// holds operation-scoped entries such as `self` and `prefix`, which are
/// bound and released by the Template Parser on every exit path.
#[derive(Debug, Clone, Default)]
pub struct Context {
    base: IndexMap<String, Value>,
    transient: IndexMap<String, Value>,
    statics: IndexMap<(String, String), StaticFn>,
}

impl Context {
    pub fn new(base: IndexMap<String, Value>) -> Self {
        Self {
            base,
            transient: IndexMap::new(),
            statics: IndexMap::new(),
        }
    }

    pub fn register_static(&mut self, type_path: impl Into<String>, method: impl Into<String>, f: StaticFn) {
        self.statics.insert((type_path.into(), method.into()), f);
    }

    pub fn static_call(&self, type_path: &str, method: &str, args: &[Value]) -> Option<Result<Value>> {
        self.statics
            .get(&(type_path.to_string(), method.to_string()))
            .map(|f| f(args))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.transient.get(name).or_else(|| self.base.get(name))
    }

    pub fn bind_self(&mut self, value: Value) {
        self.transient.insert("self".to_string(), value);
    }

    pub fn unbind_self(&mut self) {
        self.transient.shift_remove("self");
    }

    pub fn self_value(&self) -> Option<&Value> {
        self.transient.get("self")
    }

    /// Runs `f` with `key` bound to `value` in the transient scope,
    /// guaranteeing the entry is removed on every exit path (including a
    /// `?`-propagated error), per spec §5 resource discipline.
    pub fn with_transient<T>(
        &mut self,
        key: &str,
        value: Value,
        f: impl FnOnce(&mut Self) -> crate::error::Result<T>,
    ) -> crate::error::Result<T> {
        self.transient.insert(key.to_string(), value);
        let result = f(self);
        self.transient.shift_remove(key);
        result
    }
}
