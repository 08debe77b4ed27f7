//! Adapter registry for runtime model lookup.
//!
//! ```rust
//! use pprovider::AdapterRegistry;
//!
//! let registry = AdapterRegistry::new();
//! assert!(registry.is_empty());
//! assert!(registry.resolve("gpt-4o").is_err());
//! ```

use std::sync::Arc;

use pcommon::Registry;

use crate::{ChatAdapter, ModelCapabilities, ProviderError};

#[derive(Clone)]
pub struct ModelBinding {
    pub adapter: Arc<dyn ChatAdapter>,
    pub capabilities: ModelCapabilities,
}

#[derive(Default, Clone)]
pub struct AdapterRegistry {
    models: Registry<String, ModelBinding>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<A>(
        &mut self,
        model: impl Into<String>,
        capabilities: ModelCapabilities,
        adapter: A,
    ) where
        A: ChatAdapter + 'static,
    {
        self.register_shared(model, capabilities, Arc::new(adapter));
    }

    /// Binds another model name to an adapter that is already shared.
    pub fn register_shared(
        &mut self,
        model: impl Into<String>,
        capabilities: ModelCapabilities,
        adapter: Arc<dyn ChatAdapter>,
    ) {
        self.models.insert(
            model.into(),
            ModelBinding {
                adapter,
                capabilities,
            },
        );
    }

    pub fn get(&self, model: &str) -> Option<ModelBinding> {
        self.models.get(model).cloned()
    }

    pub fn resolve(&self, model: &str) -> Result<ModelBinding, ProviderError> {
        self.get(model)
            .ok_or_else(|| ProviderError::not_found(format!("model '{model}' is not registered")))
    }

    pub fn capabilities(&self, model: &str) -> Option<ModelCapabilities> {
        self.models.get(model).map(|binding| binding.capabilities)
    }

    pub fn remove(&mut self, model: &str) -> Option<ModelBinding> {
        self.models.remove(model)
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.models.keys().cloned().collect();
        models.sort();
        models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatInput, ChatResult, ProviderErrorKind, ProviderFuture, ResultStream, VecResultStream};

    struct EchoAdapter;

    impl ChatAdapter for EchoAdapter {
        fn stream_chat<'a>(&'a self, _input: &'a ChatInput) -> ResultStream<'a> {
            Box::pin(VecResultStream::new(vec![ChatResult::answer("echo")]))
        }

        fn query_chat<'a>(&'a self, _input: &'a ChatInput) -> ProviderFuture<'a, ChatResult> {
            Box::pin(async { ChatResult::answer("echo") })
        }
    }

    #[test]
    fn registry_tracks_bindings_with_capabilities() {
        let mut registry = AdapterRegistry::new();
        registry.register(
            "echo-large",
            ModelCapabilities::text_only().with_functions(),
            EchoAdapter,
        );
        let shared = registry.get("echo-large").expect("binding").adapter;
        registry.register_shared("echo-small", ModelCapabilities::text_only(), shared);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.models(), vec!["echo-large", "echo-small"]);
        assert!(registry.capabilities("echo-large").expect("caps").functions);
        assert!(!registry.capabilities("echo-small").expect("caps").functions);

        let missing = registry.resolve("other").err().expect("lookup should fail");
        assert_eq!(missing.kind, ProviderErrorKind::NotFound);

        assert!(registry.remove("echo-small").is_some());
        assert!(!registry.contains("echo-small"));
    }
}
