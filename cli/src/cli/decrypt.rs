use anyhow::{Context, Result};
use songcrypt_core::crypto::JsonKeyFile;
use songcrypt_core::stream::decrypt_file;

use super::command::DecryptArgs;

pub fn cmd_decrypt(args: &DecryptArgs) -> Result<()> {
    let keys = JsonKeyFile::new(&args.keys);
    let config = args.decode_config();

    log::info!("Decrypting protected song: {}", args.infile.display());

    let snapshot = decrypt_file(&args.infile, &args.outfile, &keys, &config)
        .with_context(|| format!("failed to decrypt {}", args.infile.display()))?;

    log::info!(
        "Wrote {} ({} bytes, {} chunks, {} worker(s)) in {:.2?}",
        args.outfile.display(),
        snapshot.bytes_plaintext,
        snapshot.chunks,
        snapshot.workers,
        snapshot.elapsed
    );
    for (stage, _) in snapshot.stage_times.iter() {
        log::debug!("  {:<8} {:.2} ms", stage.name(), snapshot.stage_times.get_ms(stage));
    }

    Ok(())
}
