use jsonlink_core::{parse_payload, DeviceQuery, FrameKind};
use jsonlink_serial::{FrameExtractor, SerialConfig, SerialTransport};
use tokio::time::{timeout, Duration};

#[tokio::main]
async fn main() {
    let mut config = SerialConfig::from_env();
    if let Some(device) = std::env::args().nth(1) {
        config.device = device;
    }
    let code = std::env::args()
        .nth(2)
        .and_then(|c| c.parse::<u16>().ok())
        .unwrap_or(74);
    let Some(query) = DeviceQuery::from_code(code) else {
        eprintln!("Unknown T code {}", code);
        std::process::exit(5);
    };
    let command = match query.request().to_json() {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Failed to encode request: {}", e);
            std::process::exit(5);
        }
    };
    eprintln!("Querying {} with {}", config.device, command);

    let retries = config.max_retries;

    // Every attempt is bounded by the read timeout; add slack for open/flush.
    let limit = config.read_timeout() * config.max_retries.max(1) + Duration::from_secs(2);
    let probe = tokio::task::spawn_blocking(move || {
        let mut port = SerialTransport::open(&config)?;
        FrameExtractor::new(config.extractor_config()).extract(&mut port, &command, FrameKind::Response)
    });

    match timeout(limit, probe).await {
        Ok(Ok(Ok(Some(frame)))) => match parse_payload(&frame) {
            Ok(value) => println!("Frame: {}", value),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(4);
            }
        },
        Ok(Ok(Ok(None))) => {
            eprintln!("No response frame after {} attempts", retries);
            std::process::exit(3);
        }
        Ok(Ok(Err(e))) => {
            eprintln!("Serial error: {}", e);
            std::process::exit(2);
        }
        Ok(Err(e)) => {
            eprintln!("Probe task failed: {}", e);
            std::process::exit(2);
        }
        Err(_) => {
            eprintln!("Timeout waiting for serial response");
            std::process::exit(3);
        }
    }
}
