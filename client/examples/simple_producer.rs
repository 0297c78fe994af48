//! Publish a handful of messages and print their offsets.
//!
//! Run against a local broker: `cargo run --example simple_producer`

use silomq_client::Producer;

#[tokio::main]
async fn main() -> silomq_client::Result<()> {
    let mut producer = Producer::connect("127.0.0.1:9000", "orders").await?;

    for i in 0..10 {
        let payload = format!("order #{}", i);
        let offset = producer.send(payload.as_bytes()).await?;
        println!("sent {:?} at offset {}", payload, offset);
    }

    Ok(())
}
