use anyhow::{Context, Result};
use songcrypt_core::crypto::{JsonKeyFile, KeyStore};
use songcrypt_core::stream::{inspect_container, ContainerInfo, InputSource};

use super::command::InfoArgs;

pub fn cmd_info(args: &InfoArgs) -> Result<()> {
    log::info!("Inspecting protected song: {}", args.infile.display());

    let key = JsonKeyFile::new(&args.keys)
        .load_key()
        .with_context(|| format!("failed to load key from {}", args.keys.display()))?;

    let info = inspect_container(
        InputSource::File(args.infile.clone()),
        &key,
        &args.decode_config(),
    )
    .with_context(|| format!("failed to inspect {}", args.infile.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_info(&info);
    }

    Ok(())
}

fn print_info(info: &ContainerInfo) {
    let wave = &info.wave;

    println!();
    println!("Container Information");
    println!("=====================");
    println!();
    println!("Wave Header");
    if !wave.riff_tagged {
        println!("  Warning                   missing RIFF/WAVE tags");
    }
    println!("  Channels                  {}", wave.channels);
    println!("  Sampling rate             {} Hz", wave.sample_rate);
    println!("  Bits per sample           {}", wave.bits_per_sample);
    println!("  Byte rate                 {} B/s", wave.byte_rate);
    println!("  Block align               {}", wave.block_align);
    if wave.byte_rate > 0 {
        let secs = info.payload_size as f64 / wave.byte_rate as f64;
        println!("  Duration                  {secs:.2} s");
    }
    println!();
    println!("Sections");
    println!("  Metadata size             {} bytes", info.metadata_size);
    println!("  Reserved metadata         {} bytes", info.reserved_metadata_len);
    println!("  Content digest            {}", info.content_digest);
    println!("  Payload size              {} bytes", info.payload_size);
    println!("  Full chunks               {}", info.chunk_count);
    println!("  Remainder                 {} bytes", info.remainder_size);
    println!("  Expected container size   {} bytes", info.expected_container_len);
    if let Some(len) = info.input_len {
        println!("  Actual container size     {len} bytes");
        if len < info.expected_container_len {
            println!("  Warning                   input is truncated");
        } else if len > info.expected_container_len {
            println!(
                "  Warning                   {} trailing bytes",
                len - info.expected_container_len
            );
        }
    }
    println!();
}
