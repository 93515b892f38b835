//! Capabilities the pool consumes: something that can be released, and
//! something that can make one.

use std::error::Error;
use std::net::{Shutdown, TcpStream};

/// A value the pool can dispose of
///
/// `release` consumes the resource, so a handle is released at most once.
///
/// # Examples
///
/// ```
/// use holdpool::Resource;
///
/// struct Session;
///
/// impl Resource for Session {
///     type Error = std::io::Error;
///
///     fn release(self) -> Result<(), Self::Error> {
///         Ok(())
///     }
/// }
/// ```
pub trait Resource {
    type Error: Error + Send + Sync + 'static;

    /// Close the underlying asset
    fn release(self) -> Result<(), Self::Error>;
}

/// Creates new resources on demand
///
/// `produce` may be called from several threads at once whenever the
/// free-list is empty.
pub trait Producer: Send + Sync {
    type Resource: Resource;
    type Error: Error + Send + Sync + 'static;

    fn produce(&self) -> Result<Self::Resource, Self::Error>;
}

impl<F, R, E> Producer for F
where
    F: Fn() -> Result<R, E> + Send + Sync,
    R: Resource,
    E: Error + Send + Sync + 'static,
{
    type Resource = R;
    type Error = E;

    fn produce(&self) -> Result<R, E> {
        self()
    }
}

impl Resource for TcpStream {
    type Error = std::io::Error;

    fn release(self) -> Result<(), Self::Error> {
        match self.shutdown(Shutdown::Both) {
            // peer already hung up
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}
