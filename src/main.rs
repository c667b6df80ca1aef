use std::env;

use extract_smoke::{DEFAULT_ENDPOINT, ExtractClient, SAMPLE_TEXT, print_report};

/// One smoke run: POST the text, print the three report lines. A transport
/// failure propagates out of `main` and fails the process without printing
/// any report line.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let endpoint = args.next().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let text = args.next().unwrap_or_else(|| SAMPLE_TEXT.to_string());

    log::debug!("posting {} bytes of text to {endpoint}", text.len());
    let client = ExtractClient::new(&endpoint);
    let response = client.extract(&text).await?;
    log::debug!("round-trip took {:?}", response.elapsed);

    print_report(&response)?;
    Ok(())
}
