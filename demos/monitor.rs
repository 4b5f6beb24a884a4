use poolpilot::{AuthMode, DEFAULT_SCAN_INTERVAL, PoolPilotClient};
use std::env;

#[tokio::main]
async fn main() -> poolpilot::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let host = args
        .get(1)
        .expect("usage: monitor <host> [--auth none|basic|query|cookie] [--user U --pass P]");
    let flag = |name: &str| {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };

    let auth: AuthMode = match flag("--auth") {
        Some(s) => s.parse()?,
        None => AuthMode::None,
    };

    let mut builder = PoolPilotClient::builder(host.as_str())
        .auth(auth)
        .on_event(|event| {
            println!("{event:?}");
        })
        .on_snapshot(|snap| {
            let fmt = |v: Option<f64>| v.map_or("--".to_string(), |t| format!("{t:.1}"));
            println!(
                "water {}\u{00b0}C -> {}\u{00b0}C | air {}\u{00b0}C | mode: {:?} | pump: {} | heating: {} | light: {}",
                fmt(snap.current_temperature()),
                fmt(snap.target_temperature()),
                fmt(snap.value(poolpilot::Field::AIR)),
                snap.hvac_mode(),
                snap.pump_running(),
                snap.heating(),
                snap.light_on(),
            );
        });
    if let (Some(user), Some(pass)) = (flag("--user"), flag("--pass")) {
        builder = builder.credentials(user, pass);
    }

    let client = builder.build()?;

    println!("Checking {host}...");
    if !client.check_connection().await {
        eprintln!("{host} is not reachable, polling anyway");
    }

    loop {
        if let Err(e) = client.refresh().await {
            eprintln!("Refresh error: {e}");
        }
        tokio::time::sleep(DEFAULT_SCAN_INTERVAL).await;
    }
}
