use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use astarte_client::{
    device_id::is_valid_device_id, Aggregation, AppEngineClient, DatastreamValue, DeviceDetails,
    InterfaceType, RealmManagementClient, ResultSetOrder,
};

use super::DeviceCommands;
use crate::config::DeviceApiConfig;
use crate::errors::CliError;

pub async fn handle(command: DeviceCommands) -> Result<()> {
    match command {
        DeviceCommands::List => {
            let (appengine, _) = clients()?;
            list(&appengine).await
        }
        DeviceCommands::Describe { device_id } => {
            ensure_valid_device_id(&device_id)?;
            let (appengine, _) = clients()?;
            describe(&appengine, &device_id).await
        }
        DeviceCommands::DataSnapshot { device_id } => {
            ensure_valid_device_id(&device_id)?;
            let (appengine, realm_management) = clients()?;
            data_snapshot(&appengine, &realm_management, &device_id).await
        }
        DeviceCommands::GetSamples {
            device_id,
            interface,
            path,
            count,
            ascending,
            since,
            to,
        } => {
            ensure_valid_device_id(&device_id)?;
            let since = since.as_deref().map(parse_timestamp).transpose()?;
            let to = to.as_deref().map(parse_timestamp).transpose()?;
            let (appengine, realm_management) = clients()?;
            get_samples(
                &appengine,
                &realm_management,
                &device_id,
                &interface,
                &path,
                count,
                ascending,
                since,
                to,
            )
            .await
        }
    }
}

fn clients() -> Result<(AppEngineClient, RealmManagementClient)> {
    let cfg = DeviceApiConfig::load()?;
    let appengine = AppEngineClient::new(&cfg.appengine_url, &cfg.realm, &cfg.appengine_token);
    let realm_management = RealmManagementClient::new(
        &cfg.realm_management_url,
        &cfg.realm,
        &cfg.realm_management_token,
    );
    Ok((appengine, realm_management))
}

fn ensure_valid_device_id(device_id: &str) -> Result<()> {
    if !is_valid_device_id(device_id) {
        return Err(
            CliError::Validation(format!("{device_id} is not a valid Astarte device ID")).into(),
        );
    }
    Ok(())
}

async fn list(appengine: &AppEngineClient) -> Result<()> {
    let devices = appengine.list_devices().await?;
    for device in devices {
        println!("{device}");
    }
    Ok(())
}

async fn describe(appengine: &AppEngineClient, device_id: &str) -> Result<()> {
    let details = appengine.get_device(device_id).await?;
    print_device_details(&details);
    Ok(())
}

fn print_device_details(details: &DeviceDetails) {
    println!("{:<32}{}", "Device ID:", details.id);
    println!("{:<32}{}", "Connected:", details.connected);
    println!("{:<32}{}", "Last Connection:", fmt_time(&details.last_connection));
    println!(
        "{:<32}{}",
        "Last Disconnection:",
        fmt_time(&details.last_disconnection)
    );
    if !details.introspection.is_empty() {
        println!("Introspection:");
        let mut interfaces: Vec<_> = details.introspection.iter().collect();
        interfaces.sort_by(|a, b| a.0.cmp(b.0));
        for (name, version) in interfaces {
            println!("    {} v{}.{}", name, version.major, version.minor);
        }
    }
    if !details.aliases.is_empty() {
        println!("Aliases:");
        let mut aliases: Vec<_> = details.aliases.iter().collect();
        aliases.sort_by(|a, b| a.0.cmp(b.0));
        for (tag, alias) in aliases {
            println!("    {tag}: {alias}");
        }
    }
    println!(
        "{:<32}{}",
        "Received Messages:", details.total_received_msgs
    );
    println!(
        "{:<32}{}",
        "Data Received:",
        format_bytes(details.total_received_bytes)
    );
    println!(
        "{:<32}{}",
        "Last Seen IP:",
        details.last_seen_ip.as_deref().unwrap_or("-")
    );
    println!(
        "{:<32}{}",
        "Last Credentials Request IP:",
        details.last_credentials_request_ip.as_deref().unwrap_or("-")
    );
    println!(
        "{:<32}{}",
        "First Registration:",
        fmt_time(&details.first_registration)
    );
    println!(
        "{:<32}{}",
        "First Credentials Request:",
        fmt_time(&details.first_credentials_request)
    );
}

async fn data_snapshot(
    appengine: &AppEngineClient,
    realm_management: &RealmManagementClient,
    device_id: &str,
) -> Result<()> {
    let details = appengine.get_device(device_id).await?;
    let mut interfaces: Vec<_> = details.introspection.iter().collect();
    interfaces.sort_by(|a, b| a.0.cmp(b.0));

    for (interface, introspection) in interfaces {
        let description = realm_management
            .get_interface(interface, introspection.major)
            .await?;

        println!("{interface}");
        match (description.interface_type, description.aggregation) {
            (InterfaceType::Datastream, Aggregation::Object) => {
                let snapshot = appengine
                    .get_aggregate_datastream_snapshot(device_id, interface)
                    .await?;
                let mut values: Vec<_> = snapshot.values.iter().collect();
                values.sort_by(|a, b| a.0.cmp(b.0));
                for (path, value) in values {
                    let sample = DatastreamValue {
                        value: value.clone(),
                        timestamp: snapshot.timestamp,
                        reception_timestamp: snapshot.reception_timestamp,
                    };
                    println!("    {path}: {sample}");
                }
            }
            (InterfaceType::Datastream, Aggregation::Individual) => {
                let snapshot = appengine
                    .get_datastream_snapshot(device_id, interface)
                    .await?;
                let mut values: Vec<_> = snapshot.iter().collect();
                values.sort_by(|a, b| a.0.cmp(b.0));
                for (path, sample) in values {
                    println!("    {path}: {sample}");
                }
            }
            (InterfaceType::Properties, _) => {
                let properties = appengine.get_properties(device_id, interface).await?;
                let mut values: Vec<_> = properties.iter().collect();
                values.sort_by(|a, b| a.0.cmp(b.0));
                for (path, value) in values {
                    println!("    {path}: {}", astarte_client::types::display_value(value));
                }
            }
        }
        println!();
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn get_samples(
    appengine: &AppEngineClient,
    realm_management: &RealmManagementClient,
    device_id: &str,
    interface: &str,
    path: &str,
    count: usize,
    ascending: bool,
    since: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<()> {
    let details = appengine.get_device(device_id).await?;
    let introspection = details.introspection.get(interface).ok_or_else(|| {
        CliError::Validation(format!(
            "Device {device_id} has no interface named {interface}"
        ))
    })?;

    let description = realm_management
        .get_interface(interface, introspection.major)
        .await?;
    if description.interface_type != InterfaceType::Datastream {
        return Err(CliError::Validation(format!(
            "{interface} is not a datastream interface. get-samples works only on datastream interfaces"
        ))
        .into());
    }

    let order = if ascending {
        ResultSetOrder::Ascending
    } else {
        ResultSetOrder::Descending
    };
    let mut paginator =
        appengine.datastream_time_window_paginator(device_id, interface, path, since, to, order);

    let mut printed = 0usize;
    while paginator.has_next_page() {
        let page = paginator.get_next_page().await?;
        debug!(samples = page.len(), event = "get_samples.page");
        for sample in page {
            println!("{sample}");
            printed += 1;
            if count > 0 && printed >= count {
                return Ok(());
            }
        }
    }
    Ok(())
}

fn fmt_time(time: &Option<DateTime<Utc>>) -> String {
    match time {
        Some(time) => time.to_string(),
        None => "-".to_string(),
    }
}

/// Render a byte counter the way humans read dashboards: 1.5K, 20.0M, ...
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "K", "M", "G", "T"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes}B")
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}

/// Accept RFC 3339 first, then a couple of human formats, date-only last.
fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(input) {
        return Ok(time.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(time) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&time));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(time) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&time));
        }
    }
    Err(CliError::Validation(format!("could not parse timestamp \"{input}\"")).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_timestamp_formats() {
        assert_eq!(
            parse_timestamp("2024-03-01T10:00:00Z").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("2024-03-01 10:00:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("2024-03-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("not a timestamp").is_err());
    }

    #[test]
    fn formats_byte_counters() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(1024), "1.0K");
        assert_eq!(format_bytes(1536), "1.5K");
        assert_eq!(format_bytes(20 * 1024 * 1024), "20.0M");
    }

    #[test]
    fn rejects_malformed_device_ids() {
        assert!(ensure_valid_device_id("2TBn-jNESuuHamE2Zo1anA").is_ok());
        assert!(ensure_valid_device_id("definitely-not-an-id").is_err());
    }
}
