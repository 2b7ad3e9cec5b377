//! Transaction resolution pipeline: fetch a signature's detail, extract the
//! pure wSOL swap leg, and classify the result into buy/sell events.

pub mod classifier;
pub mod extractor;
pub mod fetcher;
pub mod types;
