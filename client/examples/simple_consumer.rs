//! Consume from the last committed checkpoint, acknowledging as we go.
//!
//! Run against a local broker: `cargo run --example simple_consumer`

use silomq_client::Consumer;
use std::time::Duration;

#[tokio::main]
async fn main() -> silomq_client::Result<()> {
    let mut consumer = Consumer::connect("127.0.0.1:9000", "worker1").await?;

    let position = consumer.resume().await?;
    println!("resuming from offset {}", position);

    loop {
        match consumer.poll().await? {
            Some(payload) => {
                println!("processed: {}", String::from_utf8_lossy(&payload));
                consumer.commit().await?;
            }
            None => {
                // End of the log; wait for new records.
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
