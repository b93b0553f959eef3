use serde::Deserialize;

/// The part of a status response the check relies on.
#[derive(Deserialize)]
struct StatusEnvelope {
    online: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(url), None) = (args.next(), args.next()) else {
        return Err("`mcstatus-healthcheck` requires exactly one argument.".into());
    };
    let envelope: StatusEnvelope = reqwest::get(url).await?.error_for_status()?.json().await?;
    println!(
        "Health check succeeded (server {})",
        if envelope.online { "online" } else { "offline" }
    );
    Ok(())
}
