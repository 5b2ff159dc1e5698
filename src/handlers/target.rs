use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::events::EventType;
use crate::reporters::ReportError;

use super::descriptor::{DispatchMode, HandlerDescriptor, Invoker, MethodId, TargetId};
use super::subscribe::{Methods, Subscribe};

/// A handler object erased to its identity and declared methods.
///
/// Building a `Target` twice from the same `Arc` yields equal identities, so descriptors
/// discovered at `unregister` time match the ones stored at `register` time.
pub struct Target {
    id: TargetId,
    name: &'static str,
    methods: Vec<TargetMethod>,
}

impl Target {
    /// Erases `object` and its declared handler methods.
    pub fn new<T: Subscribe>(object: &Arc<T>) -> Self {
        let mut methods = Methods::<T>::new();
        T::handlers(&mut methods);

        let owner = TypeId::of::<T>();
        let methods = methods
            .into_declared()
            .into_iter()
            .map(|declared| {
                let me = Arc::clone(object);
                let body = declared.body;
                let invoker: Invoker = Arc::new(move |event| body(Arc::clone(&me), event));
                TargetMethod {
                    id: MethodId::new(owner, declared.name),
                    params: declared.params,
                    mode: declared.mode,
                    invoker,
                }
            })
            .collect();

        Self {
            id: TargetId::of(object),
            name: object.name(),
            methods,
        }
    }

    /// Identity of the object.
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// Name of the object.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared methods, in declaration order.
    pub fn methods(&self) -> &[TargetMethod] {
        &self.methods
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("methods", &self.methods)
            .finish()
    }
}

/// A declared method of a [`Target`], not yet validated.
pub struct TargetMethod {
    id: MethodId,
    params: Vec<EventType>,
    mode: DispatchMode,
    invoker: Invoker,
}

impl TargetMethod {
    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn params(&self) -> &[EventType] {
        &self.params
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Binds this method to `target` as a handler for `accepts`.
    pub fn bind(
        &self,
        target: &Target,
        accepts: EventType,
        reporter: Arc<dyn ReportError>,
    ) -> HandlerDescriptor {
        HandlerDescriptor::new(
            target.id,
            target.name,
            self.id,
            accepts,
            self.mode,
            Arc::clone(&self.invoker),
            reporter,
        )
    }
}

impl fmt::Debug for TargetMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetMethod")
            .field("name", &self.id.name())
            .field("params", &self.params)
            .field("mode", &self.mode)
            .finish()
    }
}
