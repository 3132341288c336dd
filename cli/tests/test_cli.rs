#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::process::{Command, Output};

    use chacha20poly1305::aead::{Aead, KeyInit, Payload};
    use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

    const KEY: [u8; 32] = [7u8; 32];
    const HEX_KEY: &str = "0707070707070707070707070707070707070707070707070707070707070707";

    fn command(args: &[&str], cwd: &Path) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_unprotect-song"));
        cmd.args(args).current_dir(cwd);
        cmd
    }

    fn run(args: &[&str], cwd: &Path) -> i32 {
        command(args, cwd)
            .arg("--loglevel")
            .arg("off")
            .status()
            .expect("spawn unprotect-song")
            .code()
            .expect("exit code")
    }

    fn run_output(args: &[&str], cwd: &Path) -> Output {
        command(args, cwd).output().expect("spawn unprotect-song")
    }

    fn write_key(dir: &Path) {
        std::fs::write(dir.join("keys.json"), format!("{{\"key\": \"{HEX_KEY}\"}}")).unwrap();
    }

    /// `[nonce][tag][ct]`, or `[nonce][ct][tag]` when `tag_last`.
    fn seal(nonce: u8, aad: &[u8], plaintext: &[u8], tag_last: bool) -> Vec<u8> {
        let nonce = [nonce; 12];
        let ct_tag = ChaCha20Poly1305::new(Key::from_slice(&KEY))
            .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad })
            .unwrap();
        let (ct, tag) = ct_tag.split_at(ct_tag.len() - 16);

        let mut out = nonce.to_vec();
        if tag_last {
            out.extend_from_slice(ct);
            out.extend_from_slice(tag);
        } else {
            out.extend_from_slice(tag);
            out.extend_from_slice(ct);
        }
        out
    }

    /// A valid container around `pcm` and the WAV bytes it must decode to.
    fn build_container(pcm: &[u8], header_tag_last: bool) -> (Vec<u8>, Vec<u8>) {
        let mut wave = [0u8; 44];
        wave[0..4].copy_from_slice(b"RIFF");
        wave[4..8].copy_from_slice(&(36 + pcm.len() as u32).to_le_bytes());
        wave[8..16].copy_from_slice(b"WAVEfmt ");
        wave[16..20].copy_from_slice(&16u32.to_le_bytes());
        wave[20..22].copy_from_slice(&1u16.to_le_bytes());
        wave[22..24].copy_from_slice(&2u16.to_le_bytes());
        wave[24..28].copy_from_slice(&44_100u32.to_le_bytes());
        wave[28..32].copy_from_slice(&176_400u32.to_le_bytes());
        wave[32..34].copy_from_slice(&4u16.to_le_bytes());
        wave[34..36].copy_from_slice(&16u16.to_le_bytes());
        wave[36..40].copy_from_slice(b"data");
        wave[40..44].copy_from_slice(&(pcm.len() as u32).to_le_bytes());

        let digest = [0x3cu8; 32];
        let mut metadata = digest.to_vec();
        metadata.extend_from_slice(b"{\"title\":\"cli\"}");

        let mut header = wave.to_vec();
        header.extend_from_slice(&(metadata.len() as u32).to_le_bytes());

        let mut bytes = seal(1, b"wave_header\0", &header, header_tag_last);
        bytes.extend(seal(2, b"meta_data\0", &metadata, false));
        let mut chunks = pcm.chunks_exact(16_000);
        for (i, chunk) in chunks.by_ref().enumerate() {
            bytes.extend(seal(10 + i as u8, &digest, chunk, false));
        }
        bytes.extend(seal(9, &digest, chunks.remainder(), false));

        let mut expected = wave.to_vec();
        expected.extend_from_slice(pcm);
        (bytes, expected)
    }

    fn pcm(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    // ============================================================
    // Success paths
    // ============================================================

    #[test]
    fn decrypt_writes_the_exact_wav() {
        let dir = tempfile::tempdir().unwrap();
        write_key(dir.path());
        let (container, expected) = build_container(&pcm(16_000 * 3 + 321), false);
        std::fs::write(dir.path().join("song.enc"), &container).unwrap();

        let code = run(&["decrypt", "--infile", "song.enc", "--outfile", "song.wav"], dir.path());
        assert_eq!(code, 0);
        assert_eq!(std::fs::read(dir.path().join("song.wav")).unwrap(), expected);
    }

    #[test]
    fn decrypt_with_several_workers_matches() {
        let dir = tempfile::tempdir().unwrap();
        write_key(dir.path());
        let (container, expected) = build_container(&pcm(16_000 * 6 + 5), false);
        std::fs::write(dir.path().join("song.enc"), &container).unwrap();

        let args = [
            "decrypt", "--infile", "song.enc", "--outfile", "song.wav", "--workers", "3",
            "--inflight-chunks", "1",
        ];
        assert_eq!(run(&args, dir.path()), 0);
        assert_eq!(std::fs::read(dir.path().join("song.wav")).unwrap(), expected);
    }

    #[test]
    fn tag_last_header_needs_the_flag() {
        let dir = tempfile::tempdir().unwrap();
        write_key(dir.path());
        let (container, expected) = build_container(&pcm(20_000), true);
        std::fs::write(dir.path().join("song.enc"), &container).unwrap();

        let code = run(&["decrypt", "--infile", "song.enc", "--outfile", "song.wav"], dir.path());
        assert_eq!(code, 5);
        assert!(!dir.path().join("song.wav").exists());

        let args = [
            "decrypt", "--infile", "song.enc", "--outfile", "song.wav", "--header-layout",
            "tag-last",
        ];
        assert_eq!(run(&args, dir.path()), 0);
        assert_eq!(std::fs::read(dir.path().join("song.wav")).unwrap(), expected);
    }

    #[test]
    fn info_json_is_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        write_key(dir.path());
        let (container, _) = build_container(&pcm(16_000 * 2 + 10), false);
        std::fs::write(dir.path().join("song.enc"), &container).unwrap();

        let out = run_output(
            &["info", "--infile", "song.enc", "--json", "--loglevel", "off"],
            dir.path(),
        );
        assert_eq!(out.status.code(), Some(0));

        let info: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
        assert_eq!(info["payload_size"], 32_010);
        assert_eq!(info["chunk_count"], 2);
        assert_eq!(info["remainder_size"], 10);
        assert_eq!(info["wave"]["channels"], 2);
        assert_eq!(info["input_len"], container.len() as u64);
    }

    #[test]
    fn json_log_lines_parse() {
        let dir = tempfile::tempdir().unwrap();
        write_key(dir.path());
        let (container, _) = build_container(&pcm(16_500), false);
        // Quotes and backslashes end up in the logged message.
        let name = "my \"best\" \\ song.enc";
        std::fs::write(dir.path().join(name), &container).unwrap();

        let out = run_output(
            &[
                "--log-format", "json", "--loglevel", "info", "decrypt", "--infile", name,
                "--outfile", "song.wav",
            ],
            dir.path(),
        );
        assert_eq!(out.status.code(), Some(0));

        let stderr = String::from_utf8(out.stderr).unwrap();
        let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
        assert!(!lines.is_empty());

        for line in &lines {
            let record: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(record["ts"].is_string());
            assert!(record["lvl"].is_string());
            assert!(record["target"].is_string());
            assert!(record["msg"].is_string());
        }
        assert!(lines.iter().any(|l| {
            let record: serde_json::Value = serde_json::from_str(l).unwrap();
            record["msg"].as_str().is_some_and(|m| m.contains(name))
        }));
    }

    // ============================================================
    // Failure exit codes
    // ============================================================

    #[test]
    fn missing_key_file_exits_with_key_code() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("song.enc"), [0u8; 10]).unwrap();

        let code = run(&["decrypt", "--infile", "song.enc", "--outfile", "song.wav"], dir.path());
        assert_eq!(code, 7);
        assert!(!dir.path().join("song.wav").exists());
    }

    #[test]
    fn missing_input_exits_with_io_code() {
        let dir = tempfile::tempdir().unwrap();
        write_key(dir.path());

        let code = run(&["decrypt", "--infile", "nope.enc", "--outfile", "song.wav"], dir.path());
        assert_eq!(code, 3);
    }

    #[test]
    fn short_input_exits_with_truncated_code() {
        let dir = tempfile::tempdir().unwrap();
        write_key(dir.path());
        std::fs::write(dir.path().join("song.enc"), [0u8; 40]).unwrap();

        let code = run(&["decrypt", "--infile", "song.enc", "--outfile", "song.wav"], dir.path());
        assert_eq!(code, 4);
        assert!(!dir.path().join("song.wav").exists());
    }

    #[test]
    fn garbage_input_exits_with_auth_code() {
        let dir = tempfile::tempdir().unwrap();
        write_key(dir.path());
        std::fs::write(dir.path().join("song.enc"), vec![0x5au8; 500]).unwrap();

        let code = run(&["info", "--infile", "song.enc"], dir.path());
        assert_eq!(code, 5);
    }

    #[test]
    fn bad_arguments_exit_with_usage_code() {
        let dir = tempfile::tempdir().unwrap();
        let code = run(&["decrypt"], dir.path());
        assert_eq!(code, 2);
    }
}
