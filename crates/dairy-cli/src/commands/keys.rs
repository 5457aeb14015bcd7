//! `dairy keygen` - Generate a session signing keypair.

use dairy_auth::KeyPair;
use std::fs;
use std::path::PathBuf;

pub fn generate(output: Option<PathBuf>) -> anyhow::Result<()> {
    let keypair = KeyPair::generate()?;

    if let Some(output_dir) = output {
        fs::create_dir_all(&output_dir)?;

        let private_path = output_dir.join("private.key");
        let public_path = output_dir.join("public.key");
        fs::write(&private_path, keypair.private_key_hex())?;
        fs::write(&public_path, keypair.public_key_hex())?;

        println!("Generated session keypair:");
        println!("  Private key: {}", private_path.display());
        println!("  Public key:  {}", public_path.display());
        println!();
        println!("Set the private key for the server:");
        println!(
            "  export DAIRY_AUTH_PRIVATE_KEY=$(cat {})",
            private_path.display()
        );
    } else {
        println!("Private key (keep secure!):");
        println!("{}", keypair.private_key_hex());
        println!();
        println!("Public key:");
        println!("{}", keypair.public_key_hex());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_keys_to_files() {
        let dir = tempfile::tempdir().unwrap();
        generate(Some(dir.path().to_path_buf())).unwrap();

        let private_hex = fs::read_to_string(dir.path().join("private.key")).unwrap();
        let public_hex = fs::read_to_string(dir.path().join("public.key")).unwrap();
        assert_eq!(private_hex.len(), 64);
        assert_eq!(public_hex.len(), 64);

        KeyPair::from_private_key_hex(&private_hex).unwrap();
    }
}
