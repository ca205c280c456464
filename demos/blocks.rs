use std::sync::Arc;

use chainfeed::{
    blockchain::{self, Block},
    filter::{self, FilterExt},
    Event, Feed,
};

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let endpoint =
        std::env::var("FEED_ENDPOINT").unwrap_or_else(|_| blockchain::ENDPOINT.to_string());

    let feed = match Feed::new(&endpoint) {
        Ok(feed) => feed,
        Err(err) => {
            println!("Invalid FEED_ENDPOINT: {}", err);
            std::process::exit(1);
        }
    };

    let filter = filter::operation(blockchain::OP_BLOCK).or(filter::connectivity());

    let result = feed
        .run_with_filter(filter, |event: Arc<Event>| async move {
            match event.as_ref() {
                Event::Connect => println!("connected"),
                Event::Disconnect => println!("disconnected, waiting for reconnect"),
                Event::Message(op) => match Block::try_from(op) {
                    Ok(block) => println!("new block #{}, time {}", block.height, block.time),
                    Err(err) => println!("invalid block payload: {}", err),
                },
            }
        })
        .await;

    if let Err(err) = result {
        println!("Feed stopped: {}", err);
    }
}
