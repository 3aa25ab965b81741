//! Audio device listing command.

use clap::{Args, Subcommand};
use timbral_io::{AudioDevice, default_device, list_devices};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all available audio devices
    List,

    /// Show the default input and output devices
    Info,
}

fn print_group(title: &str, devices: &[&AudioDevice]) {
    if devices.is_empty() {
        return;
    }
    println!("{title}:");
    for (idx, device) in devices.iter().enumerate() {
        let duplex = if device.is_input && device.is_output {
            " (duplex)"
        } else {
            ""
        };
        println!(
            "  [{}] {} ({} Hz){}",
            idx, device.name, device.default_sample_rate, duplex
        );
    }
    println!();
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let devices = list_devices()?;
            if devices.is_empty() {
                println!("No audio devices found.");
                return Ok(());
            }

            println!("Available Audio Devices");
            println!("=======================\n");

            let inputs: Vec<_> = devices.iter().filter(|d| d.is_input).collect();
            let outputs: Vec<_> = devices.iter().filter(|d| d.is_output).collect();
            print_group("Input Devices", &inputs);
            print_group("Output Devices", &outputs);

            println!(
                "Total: {} input(s), {} output(s)",
                inputs.len(),
                outputs.len()
            );
            println!("Pass a name to --device to pick one.");
        }
        DevicesCommand::Info => {
            let (input, output) = default_device()?;
            println!("Default Audio Devices");
            println!("=====================\n");
            match input {
                Some(d) => println!("Input:  {} ({} Hz)", d.name, d.default_sample_rate),
                None => println!("Input:  (none)"),
            }
            match output {
                Some(d) => println!("Output: {} ({} Hz)", d.name, d.default_sample_rate),
                None => println!("Output: (none)"),
            }
        }
    }
    Ok(())
}
