//! Handle that hands its resource back to the pool on release

use crate::errors::{PoolError, PoolResult};
use crate::pool::{Shared, release_quietly};
use crate::resource::{Producer, Resource};

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Weak;

/// A resource checked out of a [`Pool`](crate::Pool)
///
/// Derefs to the underlying resource. Releasing the handle, explicitly or by
/// dropping it, puts the resource back into the pool instead of closing it.
pub struct PooledResource<P: Producer> {
    resource: Option<P::Resource>,
    pool: Weak<Shared<P>>,
}

impl<P: Producer> PooledResource<P> {
    pub(crate) fn new(resource: P::Resource, pool: Weak<Shared<P>>) -> Self {
        Self {
            resource: Some(resource),
            pool,
        }
    }

    /// Return the resource to its pool, reporting what `Pool::put` reports
    pub fn release(mut self) -> PoolResult<()> {
        match self.resource.take() {
            Some(resource) => give_back(&self.pool, resource),
            None => Ok(()),
        }
    }

    /// Take the resource out of the pool's care for good
    pub fn detach(mut self) -> P::Resource {
        self.resource.take().expect("Resource already taken")
    }
}

/// A pool that no longer exists counts as closed.
fn give_back<P: Producer>(pool: &Weak<Shared<P>>, resource: P::Resource) -> PoolResult<()> {
    match pool.upgrade() {
        Some(shared) => shared.recycle(resource),
        None => {
            release_quietly(resource);
            Ok(())
        }
    }
}

impl<P: Producer> Resource for PooledResource<P> {
    type Error = PoolError;

    fn release(self) -> Result<(), Self::Error> {
        PooledResource::release(self)
    }
}

impl<P: Producer> Deref for PooledResource<P> {
    type Target = P::Resource;

    fn deref(&self) -> &Self::Target {
        self.resource.as_ref().expect("Resource already taken")
    }
}

impl<P: Producer> DerefMut for PooledResource<P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.resource.as_mut().expect("Resource already taken")
    }
}

impl<P: Producer> AsRef<P::Resource> for PooledResource<P> {
    fn as_ref(&self) -> &P::Resource {
        self
    }
}

impl<P: Producer> AsMut<P::Resource> for PooledResource<P> {
    fn as_mut(&mut self) -> &mut P::Resource {
        self
    }
}

impl<P: Producer> fmt::Debug for PooledResource<P>
where
    P::Resource: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledResource")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

impl<P: Producer> Drop for PooledResource<P> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            let _ = give_back(&self.pool, resource);
        }
    }
}
