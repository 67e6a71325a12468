use std::fs;

use anyhow::{bail, Context, Result};
use bm_i2c_proto::{parse_trace, Decoder, DeviceProfile};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args();
    args.next(); // Skip program name
    let (profile, path) = match (args.next(), args.next()) {
        (Some(profile), Some(path)) => (profile, path),
        _ => bail!("usage: decode_trace <APW|dsPIC> <trace file>"),
    };
    let profile: DeviceProfile = profile.parse().context("invalid device profile")?;
    let trace = fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;

    let mut decoder = Decoder::new(profile);
    for (lineno, event) in parse_trace(&trace).enumerate() {
        let event = event.with_context(|| format!("{}: event {}", path, lineno + 1))?;
        if let Some(frame) = decoder.handle(&event) {
            println!("[{:>12} - {:>12}] {}", frame.start(), frame.end(), frame);
        }
    }

    let diag = decoder.diagnostics();
    eprintln!(
        "{} frames, {} preamble errors, {} bus errors, {} foreign transactions",
        diag.frames, diag.preamble_mismatches, diag.bus_errors, diag.foreign_transactions
    );
    Ok(())
}
