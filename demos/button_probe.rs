use std::error::Error;
use std::process::ExitCode;
use std::time::Duration;

use flicd_client::transport::tcp::TcpTransport;
use flicd_client::{BatteryStatusListener, BdAddr, DEFAULT_PORT, FlicClient, ScanWizard};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flicd_client=warn".into()),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let Some(mode) = args.next() else {
        print_usage();
        return Ok(());
    };
    let host = std::env::var("FLICD_HOST").unwrap_or_else(|_| "localhost".to_string());

    match mode.as_str() {
        "scan" => {
            let client = FlicClient::connect(&host, DEFAULT_PORT)?;
            run_wizard(client)
        }
        "info" => {
            let Some(addr) = args.next() else {
                print_usage();
                return Ok(());
            };
            let addr: BdAddr = addr.parse()?;
            let client = FlicClient::connect(&host, DEFAULT_PORT)?;
            run_info(client, addr)
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn run_wizard(mut client: FlicClient<TcpTransport>) -> Result<(), Box<dyn Error>> {
    let mut wizard = ScanWizard::new();
    let listeners = wizard.listeners();
    let hint = "Found a private button; hold it down for 7 seconds to make it public";
    listeners
        .found_private_button
        .on(move |()| println!("{hint}"));
    listeners
        .found_public_button
        .on(|found| println!("Found {} ({}), connecting...", found.bd_addr, found.name));
    listeners
        .button_connected
        .on(|found| println!("Connected to {}, verifying...", found.bd_addr));
    listeners.completed.on(|completion| match &completion.button {
        Some(found) => println!("Wizard finished: {} for {}", completion.result, found.bd_addr),
        None => println!("Wizard finished: {}", completion.result),
    });

    println!("Press and hold down a Flic button for 7 seconds...");
    let wizard_id = client.add_scan_wizard(wizard)?;
    while client.scan_wizard(wizard_id).is_some() {
        client.poll(Some(Duration::from_millis(250)))?;
    }

    client.close()?;
    Ok(())
}

fn run_info(mut client: FlicClient<TcpTransport>, addr: BdAddr) -> Result<(), Box<dyn Error>> {
    client.ping(|rtt| println!("Ping: {rtt:?}"))?;

    client.get_button_info(addr, |info| {
        println!("Button {}", info.bd_addr);
        match info.uuid {
            Some(uuid) => println!("  uuid:     {uuid}"),
            None => println!("  not verified by this daemon"),
        }
        if let Some(color) = &info.color {
            println!("  color:    {color}");
        }
        if let Some(serial) = &info.serial_number {
            println!("  serial:   {serial}");
        }
        println!("  version:  flic {} firmware {}", info.flic_version, info.firmware_version);
    })?;

    let mut battery = BatteryStatusListener::new(addr);
    battery.listeners().battery_status.once(|status| match status.percentage {
        Some(percentage) => println!("  battery:  {percentage}% (at {})", status.timestamp),
        None => println!("  battery:  unknown"),
    });
    let listener_id = client.add_battery_status_listener(battery)?;

    for _ in 0..8 {
        client.poll(Some(Duration::from_millis(250)))?;
        let answered = client
            .battery_listener(listener_id)
            .is_some_and(|listener| listener.last_status().is_some());
        if answered {
            break;
        }
    }

    client.close()?;
    Ok(())
}

fn print_usage() {
    println!("Usage:");
    println!("  cargo run --example button_probe -- scan");
    println!("  cargo run --example button_probe -- info <BDADDR>");
    println!();
    println!("Set FLICD_HOST to reach a daemon that is not on localhost.");
}
