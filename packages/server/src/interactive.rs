//! Interactive mode for the server.
//!
//! Prompts for the bind address, port and Overpass endpoint before
//! starting the server. Each answer is validated at the prompt so the
//! server never starts from a value it would reject later.

use std::net::IpAddr;

use dialoguer::{Confirm, Input};
use reqwest::Url;
use traffic_watch_geodata::service_config::OverpassConfig;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

/// Checks that `addr` is an IPv4 or IPv6 address.
///
/// # Errors
///
/// Returns a message naming the rejected value.
pub fn validate_bind_addr(addr: &str) -> Result<(), String> {
    addr.trim()
        .parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| format!("'{addr}' is not an IP address"))
}

/// Checks that `endpoint` is an absolute `http` or `https` URL.
///
/// # Errors
///
/// Returns a message naming the rejected value.
pub fn validate_endpoint(endpoint: &str) -> Result<(), String> {
    match Url::parse(endpoint.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        Ok(url) => Err(format!("'{endpoint}' must use http or https, not {}", url.scheme())),
        Err(e) => Err(format!("'{endpoint}' is not a URL: {e}")),
    }
}

/// Checks that `port` can be bound by a server.
///
/// # Errors
///
/// Returns a message for port 0.
pub fn validate_port(port: u16) -> Result<(), String> {
    if port == 0 {
        Err("Port must be between 1 and 65535".to_string())
    } else {
        Ok(())
    }
}

/// Runs the server in interactive mode, prompting for configuration.
///
/// Sets `BIND_ADDR`, `PORT` and `OVERPASS_URL` from the answers and
/// delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if a prompt fails or the underlying
/// server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Traffic Watch Server");
    println!();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(DEFAULT_BIND_ADDR.to_string())
        .validate_with(|s: &String| validate_bind_addr(s))
        .interact_text()
        .map_err(std::io::Error::other)?;

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(DEFAULT_PORT)
        .validate_with(|p: &u16| validate_port(*p))
        .interact_text()
        .map_err(std::io::Error::other)?;

    let default_endpoint = std::env::var("OVERPASS_URL")
        .unwrap_or_else(|_| OverpassConfig::embedded().endpoint);
    let endpoint: String = Input::new()
        .with_prompt("Overpass endpoint")
        .default(default_endpoint)
        .validate_with(|s: &String| validate_endpoint(s))
        .interact_text()
        .map_err(std::io::Error::other)?;

    let bind_addr = bind_addr.trim();
    let endpoint = endpoint.trim();

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port} using {endpoint}?"))
        .default(true)
        .interact()
        .map_err(std::io::Error::other)?
    {
        println!("Cancelled.");
        return Ok(());
    }

    // SAFETY: We are single-threaded at this point (before server starts) and
    // these variables are only read once during server initialisation.
    unsafe {
        std::env::set_var("BIND_ADDR", bind_addr);
        std::env::set_var("PORT", port.to_string());
        std::env::set_var("OVERPASS_URL", endpoint);
    }

    super::run_server().await
}
