//! Basic usage of the pool with TCP connections

use holdpool::{Pool, PoolConfiguration, Producer};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;

struct TcpProducer {
    addr: SocketAddr,
}

impl Producer for TcpProducer {
    type Resource = TcpStream;
    type Error = io::Error;

    fn produce(&self) -> io::Result<TcpStream> {
        TcpStream::connect(self.addr)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== holdpool - Basic Example ===\n");

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    thread::spawn(move || {
        let mut accepted = Vec::new();
        for stream in listener.incoming().flatten() {
            accepted.push(stream);
        }
    });

    let config = PoolConfiguration::new()
        .with_initial_capacity(2)
        .with_max_capacity(4);
    let pool = Pool::with_config(config, TcpProducer { addr })?;
    println!("Idle after warm-up: {}", pool.idle_count());

    {
        let conn = pool.get()?;
        println!("Borrowed connection from {}", conn.local_addr()?);
        // returned when `conn` goes out of scope
    }

    let held: Vec<_> = (0..6).map(|_| pool.get()).collect::<Result<_, _>>()?;
    println!("Holding {} connections, idle: {}", held.len(), pool.idle_count());
    drop(held);
    println!("After return - idle: {}", pool.idle_count());

    println!("\nMetrics:");
    for (key, value) in pool.export_metrics() {
        println!("  {}: {}", key, value);
    }

    pool.close();
    println!("\nClosed: {}", pool.is_closed());
    Ok(())
}
