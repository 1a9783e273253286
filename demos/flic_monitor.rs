use std::error::Error;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flicd_client::{BdAddr, ClientOptions, ConnectionChannel, DEFAULT_PORT, FlicClient, LatencyMode};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flicd_client=info".into()),
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
    let host = args.next().unwrap_or_else(|| "localhost".to_string());
    let port = match args.next() {
        Some(port) => port.parse()?,
        None => DEFAULT_PORT,
    };

    let options = ClientOptions::default()
        .with_port(port)
        .with_connect_timeout(Duration::from_secs(5));
    let mut client = FlicClient::connect_with_options(&host, options)?;
    println!("Connected to flicd at {host}:{port}");

    // Listeners cannot reach the client, so buttons to watch are queued here
    // and picked up between polls.
    let to_watch: Arc<Mutex<Vec<BdAddr>>> = Arc::default();

    let queue = Arc::clone(&to_watch);
    client.get_info(move |info| {
        println!(
            "Controller {} ({}), {} verified button(s)",
            info.my_bd_addr,
            info.bluetooth_controller_state,
            info.verified_buttons.len()
        );
        if let Ok(mut queue) = queue.lock() {
            queue.extend(info.verified_buttons.iter().copied());
        }
    })?;

    let queue = Arc::clone(&to_watch);
    client.listeners().new_verified_button.on(move |addr| {
        println!("New verified button {addr}");
        if let Ok(mut queue) = queue.lock() {
            queue.push(*addr);
        }
    });
    client
        .listeners()
        .bluetooth_controller_state
        .on(|state| println!("Bluetooth controller is now {state}"));
    client
        .listeners()
        .close
        .on(|closed| println!("Connection closed (error: {})", closed.had_error));

    while !client.is_closed() {
        client.poll(Some(Duration::from_millis(250)))?;

        let pending: Vec<BdAddr> = match to_watch.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for addr in pending {
            client.add_connection_channel(watch(addr))?;
        }
    }

    Ok(())
}

fn watch(addr: BdAddr) -> ConnectionChannel {
    let mut channel = ConnectionChannel::new(addr).with_latency_mode(LatencyMode::Normal);
    let listeners = channel.listeners();

    listeners.create_response.on(move |response| {
        println!("{addr}: channel {} ({})", response.error, response.connection_status);
    });
    listeners.removed.on(move |reason| println!("{addr}: removed ({reason})"));
    listeners.connection_status_changed.on(move |change| match change.disconnect_reason {
        Some(reason) => println!("{addr}: {} ({reason})", change.status),
        None => println!("{addr}: {}", change.status),
    });
    listeners.button_up_or_down.on(move |ev| {
        let queued = if ev.was_queued { ", queued" } else { "" };
        println!("{addr}: {}{queued}", ev.click_type);
    });
    listeners
        .button_single_or_double_click_or_hold
        .on(move |ev| println!("{addr}: {}", ev.click_type));

    channel
}
