use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use measurement_gateway::crypto::{self, asymmetric, symmetric, SymmetricKey};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator tooling for the measurement gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post a measurement file to a running gateway
    Submit {
        /// JSON measurement file
        file: PathBuf,

        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Decrypt an encrypted URI read from the data ledger
    DecryptUri {
        /// Hex-encoded encrypted URI
        encrypted_uri: String,

        /// Variable holding the administrator's private key
        #[arg(long, default_value = "IOT_GATEWAY_ADMIN_KEY")]
        key_env: String,

        /// The secret holds only a locator (broker storage)
        #[arg(long)]
        locator_only: bool,
    },
    /// Decrypt a stored payload and verify its signature
    Open {
        /// Ciphertext as fetched from storage
        file: PathBuf,

        /// Hex-encoded symmetric key from `decrypt-uri`
        #[arg(long)]
        key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit { file, url } => {
            let body = std::fs::read(&file)?;
            let res = reqwest::Client::new()
                .post(format!("{}/notify", url.trim_end_matches('/')))
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::DecryptUri {
            encrypted_uri,
            key_env,
            locator_only,
        } => {
            let private_key = std::env::var(&key_env)
                .map_err(|_| format!("Environment variable {} not set", key_env))?;
            let secret_key = asymmetric::parse_secret_key(&private_key)?;

            let raw = hex::decode(encrypted_uri.trim().trim_start_matches("0x"))?;
            let secret = asymmetric::decrypt(&secret_key, &raw)?;

            if locator_only {
                println!("locator: {}", String::from_utf8_lossy(&secret));
            } else {
                if secret.len() <= symmetric::KEY_LEN {
                    return Err("secret too short to hold a key and a locator".into());
                }
                let (key, locator) = secret.split_at(symmetric::KEY_LEN);
                println!("key:     {}", hex::encode(key));
                println!("locator: {}", String::from_utf8_lossy(locator));
            }
        }
        Commands::Open { file, key } => {
            let data = std::fs::read(&file)?;
            let message = match key {
                Some(key) => {
                    let key = SymmetricKey::from_slice(&hex::decode(key.trim())?)?;
                    symmetric::decrypt(&key, &data)?
                }
                // Broker payloads are stored as signed plaintext.
                None => data,
            };

            let opened = crypto::open(&message)?;
            let measurement: Value = serde_json::from_slice(&opened.canonical)?;
            println!("hash:   {}", opened.hash);
            println!("signer: {}", opened.signer);
            println!("{}", serde_json::to_string_pretty(&measurement)?);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let header = |name: &str| {
        res.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string()
    };
    let hash = header("x-measurement-hash");
    let outcome = header("x-anchor-outcome");

    if status.is_success() {
        println!("status:  {}", status);
        println!("hash:    {}", hash);
        println!("outcome: {}", outcome);
        return Ok(());
    }

    eprintln!("Error: gateway returned status {}", status);
    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => eprintln!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => eprintln!("{}", text),
    }
    std::process::exit(1);
}
