//! # holdpool
//!
//! Thread-safe pool that recycles expensive resources (database connections,
//! TCP sockets, any closable handle) across many concurrent callers.
//!
//! ## Features
//!
//! - Lock-free bounded free-list of idle resources
//! - Pre-warming with an initial number of resources
//! - Production on demand when the free-list is empty; `get` never waits
//! - Overflow on return is released instead of kept
//! - Handles return themselves to the pool on release or drop
//! - Safe close while `get`/`put` are in flight
//! - Pool-level metrics with Prometheus export
//!
//! ## Quick Start
//!
//! ```rust
//! use holdpool::Pool;
//! use std::net::{TcpListener, TcpStream};
//!
//! let listener = TcpListener::bind("127.0.0.1:0").unwrap();
//! let addr = listener.local_addr().unwrap();
//!
//! let pool = Pool::new(2, 4, move || TcpStream::connect(addr)).unwrap();
//! {
//!     let conn = pool.get().unwrap();
//!     println!("Connected from {}", conn.local_addr().unwrap());
//!     // Connection goes back to the pool when `conn` goes out of scope
//! }
//! assert_eq!(pool.idle_count(), 2);
//! pool.close();
//! ```

mod config;
mod errors;
mod free_list;
mod handle;
mod metrics;
mod pool;
mod resource;

pub use config::PoolConfiguration;
pub use errors::{BoxError, PoolError, PoolResult};
pub use handle::PooledResource;
pub use metrics::{MetricsExporter, PoolMetrics};
pub use pool::Pool;
pub use resource::{Producer, Resource};
