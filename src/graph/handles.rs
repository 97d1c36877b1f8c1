// Copyright (c) 2025 - Cowboy AI, Inc.
//! Typed handles returned by the build context
//!
//! A handle is obtained by declaring a resource of its kind. Handles carry no
//! context identity, so each use is still resolved against the graph.

use serde::Serialize;
use std::fmt;

use crate::domain::{PolicySource, ResourceId};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(ResourceId);

        impl $name {
            pub(crate) fn new(id: ResourceId) -> Self {
                Self(id)
            }

            pub fn id(&self) -> &ResourceId {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl AsRef<ResourceId> for $name {
            fn as_ref(&self) -> &ResourceId {
                &self.0
            }
        }
    };
}

handle!(
    /// Declared network segment
    SegmentHandle
);
handle!(
    /// Declared access group
    GroupHandle
);
handle!(
    /// Declared access policy
    PolicyHandle
);
handle!(
    /// Declared edge balancer
    BalancerHandle
);
handle!(
    /// Declared listener
    ListenerHandle
);
handle!(
    /// Declared compute fleet
    FleetHandle
);
handle!(
    /// Declared credential material
    CredentialHandle
);
handle!(
    /// Declared managed database
    DatabaseHandle
);

impl From<&GroupHandle> for PolicySource {
    fn from(group: &GroupHandle) -> Self {
        PolicySource::Group(group.id().clone())
    }
}
