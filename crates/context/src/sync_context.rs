//! The synchronous, in-process context — a plain key/value map plus the
//! metadata describing the run it belongs to.

use std::collections::HashMap;

use serde_json::Value;

use crate::meta::ExecutionMeta;

/// In-process context. Directly readable/writable; no I/O.
#[derive(Debug, Clone)]
pub struct Context {
    meta: ExecutionMeta,
    data: HashMap<String, Value>,
}

impl Context {
    pub fn new(meta: ExecutionMeta) -> Self {
        Self {
            meta,
            data: HashMap::new(),
        }
    }

    pub fn with_initial(meta: ExecutionMeta, initial: HashMap<String, Value>) -> Self {
        Self { meta, data: initial }
    }

    pub fn meta(&self) -> &ExecutionMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut ExecutionMeta {
        &mut self.meta
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    /// A JSON object snapshot of every top-level key currently held.
    pub fn to_json(&self) -> Value {
        Value::Object(self.data.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// A fresh context seeded with the current snapshot plus an overlay.
    /// Mutations to the returned scope never propagate back unless an
    /// explicit [`Context::merge`] is issued.
    pub fn create_scope(&self, overlay: HashMap<String, Value>) -> Context {
        let mut data = self.data.clone();
        data.extend(overlay);
        Context {
            meta: self.meta.clone(),
            data,
        }
    }

    /// Merge another context's keys into this one (last-writer-wins).
    pub fn merge(&mut self, other: &Context) {
        for (k, v) in &other.data {
            self.data.insert(k.clone(), v.clone());
        }
    }

    /// Apply a single output-mapping entry: copy `other[from]` into
    /// `self[to]`, used when a sub-workflow's result is mapped back into
    /// its parent.
    pub fn apply_mapped(&mut self, to: impl Into<String>, value: Value) {
        self.data.insert(to.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn meta() -> ExecutionMeta {
        ExecutionMeta::new(Uuid::new_v4(), "bp", "n1")
    }

    #[test]
    fn scope_does_not_leak_back_without_merge() {
        let mut parent = Context::new(meta());
        parent.set("x", json!(1));

        let mut scope = parent.create_scope(HashMap::from([("y".to_string(), json!(2))]));
        assert_eq!(scope.get("x"), Some(&json!(1)));
        assert_eq!(scope.get("y"), Some(&json!(2)));

        scope.set("x", json!(999));
        assert_eq!(parent.get("x"), Some(&json!(1)), "scope mutation must not leak");

        parent.merge(&scope);
        assert_eq!(parent.get("x"), Some(&json!(999)), "explicit merge propagates");
        assert_eq!(parent.get("y"), Some(&json!(2)));
    }

    #[test]
    fn to_json_round_trips_through_same_serializer() {
        let mut ctx = Context::new(meta());
        ctx.set("a", json!("hello"));
        ctx.set("b", json!({"nested": true}));

        let snapshot = ctx.to_json();
        let restored: HashMap<String, Value> = serde_json::from_value(snapshot.clone()).unwrap();
        let mut restored_ctx = Context::with_initial(meta(), restored);
        // meta differs (fresh run id) but data must match.
        restored_ctx.meta = ctx.meta.clone();
        assert_eq!(restored_ctx.to_json(), snapshot);
    }
}
