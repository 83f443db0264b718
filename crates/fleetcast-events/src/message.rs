//! Messages wrapping the resources reported by the watch layer.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::EventError;

/// A watched resource type with a fixed kind identifier.
///
/// The kind is the key under which the resource's event factory is
/// registered, so it must be unique across watched types.
///
/// ```rust
/// use serde::Serialize;
/// use fleetcast_events::Resource;
///
/// #[derive(Debug, Serialize)]
/// struct Lobby {
///     name: String,
/// }
///
/// impl Resource for Lobby {
///     const KIND: &'static str = "Lobby";
/// }
/// ```
pub trait Resource: Serialize + Send + Sync + fmt::Debug + 'static {
    /// Kind identifier used for factory lookup.
    const KIND: &'static str;
}

/// Object-safe view of a resource, carried inside messages.
pub trait DynResource: Send + Sync + fmt::Debug {
    /// Kind identifier used for factory lookup.
    fn kind(&self) -> &str;

    /// JSON form of the resource, used as the envelope payload.
    fn to_json(&self) -> Result<Value, EventError>;
}

impl<T: Resource> DynResource for T {
    fn kind(&self) -> &str {
        T::KIND
    }

    fn to_json(&self) -> Result<Value, EventError> {
        serde_json::to_value(self).map_err(|e| EventError::SerializationFailed {
            kind: T::KIND.to_string(),
            cause: e.to_string(),
        })
    }
}

/// Shared handle to a resource.
pub type ResourceRef = Arc<dyn DynResource>;

/// A resource whose kind is only known at runtime.
///
/// Useful for watch sources that decode arbitrary objects; dispatch for a
/// kind with no registered factory is skipped.
#[derive(Debug, Clone)]
pub struct UnstructuredResource {
    kind: String,
    object: Value,
}

impl UnstructuredResource {
    pub fn new(kind: impl Into<String>, object: Value) -> Self {
        Self {
            kind: kind.into(),
            object,
        }
    }
}

impl DynResource for UnstructuredResource {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn to_json(&self) -> Result<Value, EventError> {
        Ok(self.object.clone())
    }
}

/// Both sides of an update notification.
#[derive(Debug, Clone)]
pub struct UpdatePair {
    pub old_obj: ResourceRef,
    pub new_obj: ResourceRef,
}

/// Payload of a [`Message`].
#[derive(Debug, Clone)]
pub enum Content {
    /// The changed resource, for add and delete notifications.
    Object(ResourceRef),
    /// The previous and current resource, for update notifications.
    Update(UpdatePair),
}

impl Content {
    /// Kind of the content. For updates this is the kind of the new object.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Object(obj) => obj.kind(),
            Self::Update(pair) => pair.new_obj.kind(),
        }
    }

    /// JSON form: the resource itself, or `{"old_obj": .., "new_obj": ..}`.
    pub fn to_json(&self) -> Result<Value, EventError> {
        match self {
            Self::Object(obj) => obj.to_json(),
            Self::Update(pair) => {
                let mut map = serde_json::Map::with_capacity(2);
                map.insert("old_obj".to_string(), pair.old_obj.to_json()?);
                map.insert("new_obj".to_string(), pair.new_obj.to_json()?);
                Ok(Value::Object(map))
            }
        }
    }
}

/// A resource change handed from the watch layer to the broadcaster.
#[derive(Debug, Clone)]
pub struct Message {
    content: Content,
}

impl Message {
    #[must_use]
    pub fn new(content: Content) -> Self {
        Self { content }
    }

    /// Wrap a single resource (add/delete).
    pub fn object(resource: impl DynResource + 'static) -> Self {
        Self::from_ref(Arc::new(resource))
    }

    /// Wrap a shared resource handle (add/delete).
    #[must_use]
    pub fn from_ref(resource: ResourceRef) -> Self {
        Self::new(Content::Object(resource))
    }

    /// Wrap both sides of an update.
    #[must_use]
    pub fn update(old_obj: ResourceRef, new_obj: ResourceRef) -> Self {
        Self::new(Content::Update(UpdatePair { old_obj, new_obj }))
    }

    /// The wrapped content, unchanged.
    #[must_use]
    pub fn content(&self) -> &Content {
        &self.content
    }

    #[must_use]
    pub fn into_content(self) -> Content {
        self.content
    }
}
