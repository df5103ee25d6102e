//! `vault-cli` — inspect and recover threshold-signature `.vult` wallet
//! files. Thin argument-parsing and rendering shell around `vault-core`;
//! every `vault_core::Error` becomes a printed message and exit code 1.

mod install_marker;
mod render;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use vault_core::address::ChainTag;
use vault_core::derive::parse_path;
use vault_core::orchestrator;

#[derive(Parser)]
#[command(name = "vault-cli")]
#[command(about = "Inspect and recover threshold-signature .vult wallet files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a vault file and print its record
    Inspect {
        #[arg(short = 'f', long)]
        file: PathBuf,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        summary: bool,
        #[arg(long)]
        validate: bool,
        #[arg(long = "show-keyshares")]
        show_keyshares: bool,
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Alias of `inspect --summary`
    Info {
        #[arg(short = 'f', long)]
        file: PathBuf,
        #[arg(long)]
        password: Option<String>,
    },

    /// Print the fully decoded vault record
    Decode {
        #[arg(short = 'f', long)]
        file: PathBuf,
        #[arg(long)]
        yaml: bool,
    },

    /// Validate a vault file without printing its contents
    Verify {
        #[arg(short = 'f', long)]
        file: PathBuf,
        #[arg(long)]
        password: Option<String>,
    },

    /// Compare two vault records field by field
    Diff {
        a: PathBuf,
        b: PathBuf,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        yaml: bool,
    },

    /// List the public-key-path address for each chain (no reconstruction)
    ListAddresses {
        #[arg(short = 'f', long)]
        file: PathBuf,
        #[arg(long)]
        password: Option<String>,
        #[arg(long, value_delimiter = ',')]
        chains: Vec<String>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        csv: bool,
    },

    /// List a sequential range of addresses for one or all chains
    ListPaths {
        #[arg(short = 'f', long)]
        file: PathBuf,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        chain: Option<String>,
        #[arg(long)]
        sequential: bool,
        #[arg(long)]
        count: Option<u32>,
        #[arg(long = "show-paths")]
        show_paths: bool,
        #[arg(long)]
        json: bool,
    },

    /// Derive one address at an explicit path, public-key path only
    Derive {
        #[arg(short = 'f', long)]
        file: PathBuf,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        path: String,
        #[arg(long)]
        chain: String,
    },

    /// Reconstruct the private key from >= threshold vault shares
    Recover {
        #[arg(required = true)]
        vaults: Vec<PathBuf>,
        #[arg(long)]
        threshold: usize,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        chain: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        )
        .init();
}

fn parse_chains(raw: &[String]) -> Result<Vec<ChainTag>> {
    raw.iter()
        .map(|s| Ok(ChainTag::from_str_loose(s)?))
        .collect()
}

fn read_vault(path: &PathBuf) -> Result<Vec<u8>> {
    Ok(std::fs::read(path)?)
}

fn main() -> Result<()> {
    init_tracing();
    install_marker::show_welcome_if_first_run();

    let cli = Cli::parse();

    let result = run(cli.command);
    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Inspect {
            file,
            password,
            summary,
            validate,
            show_keyshares,
            export,
        } => {
            let bytes = read_vault(&file)?;
            let record = orchestrator::inspect(&bytes, password.as_deref())?;

            if validate {
                println!("ok");
                return Ok(());
            }
            if let Some(export_path) = export {
                std::fs::write(&export_path, serde_json::to_vec_pretty(&record)?)?;
                println!("exported to {}", export_path.display());
                return Ok(());
            }
            if summary {
                render::print_summary(&record);
            } else {
                render::print_vault_full(&record, show_keyshares);
            }
            Ok(())
        }

        Commands::Info { file, password } => {
            let bytes = read_vault(&file)?;
            let record = orchestrator::inspect(&bytes, password.as_deref())?;
            render::print_summary(&record);
            Ok(())
        }

        Commands::Decode { file, yaml } => {
            let bytes = read_vault(&file)?;
            let record = orchestrator::inspect(&bytes, None)?;
            if yaml {
                render::print_vault_yaml(&record)
            } else {
                render::print_vault_json(&record)
            }
        }

        Commands::Verify { file, password } => {
            let bytes = read_vault(&file)?;
            orchestrator::inspect(&bytes, password.as_deref())?;
            println!("valid");
            Ok(())
        }

        Commands::Diff {
            a,
            b,
            password,
            json,
            yaml,
        } => {
            let bytes_a = read_vault(&a)?;
            let bytes_b = read_vault(&b)?;
            let record_a = orchestrator::inspect(&bytes_a, password.as_deref())?;
            let record_b = orchestrator::inspect(&bytes_b, password.as_deref())?;
            let rows = render::diff_records(&record_a, &record_b);
            if json || yaml {
                render::print_diff_structured(&rows, yaml)
            } else {
                render::print_diff_human(&rows);
                Ok(())
            }
        }

        Commands::ListAddresses {
            file,
            password,
            chains,
            json,
            csv,
        } => {
            let bytes = read_vault(&file)?;
            let chain_tags = parse_chains(&chains)?;
            let rows = orchestrator::list_addresses(&bytes, password.as_deref(), &chain_tags, None)?;
            if json {
                render::print_listed_addresses_json(&rows)
            } else if csv {
                render::print_listed_addresses_csv(&rows);
                Ok(())
            } else {
                render::print_listed_addresses_human(&rows);
                Ok(())
            }
        }

        Commands::ListPaths {
            file,
            password,
            chain,
            sequential,
            count,
            show_paths,
            json,
        } => {
            if count.is_some() && !sequential {
                bail!("derivation invalid: --count is only honored with --sequential");
            }
            let bytes = read_vault(&file)?;
            let chain_tags = match &chain {
                Some(c) => vec![ChainTag::from_str_loose(c)?],
                None => Vec::new(),
            };

            let mut rows = Vec::new();
            let n = if sequential { count.unwrap_or(1) } else { 1 };
            let selected: Vec<ChainTag> = if chain_tags.is_empty() {
                orchestrator::ALL_CHAINS.to_vec()
            } else {
                chain_tags
            };
            for tag in selected {
                let mut path = tag.default_path();
                // Ed25519 (SLIP-0010) accepts only hardened steps; secp256k1
                // chains conventionally leave the address index non-hardened.
                let is_hardened = tag.curve() == vault_core::Curve::Ed25519;
                for i in 0..n {
                    if let Some(last) = path.last_mut() {
                        *last = if is_hardened {
                            vault_core::ChildStep::hardened(i)
                        } else {
                            vault_core::ChildStep::normal(i)
                        };
                    }
                    let listed =
                        orchestrator::list_addresses(&bytes, password.as_deref(), &[tag], Some(&path))?;
                    rows.extend(listed);
                }
            }

            if json {
                render::print_listed_addresses_json(&rows)
            } else {
                if show_paths {
                    render::print_listed_addresses_human(&rows);
                } else {
                    for row in &rows {
                        println!("{}", row.address);
                    }
                }
                Ok(())
            }
        }

        Commands::Derive {
            file,
            password,
            path,
            chain,
        } => {
            let bytes = read_vault(&file)?;
            let tag = ChainTag::from_str_loose(&chain)?;
            let steps = parse_path(&path)?;
            let rows =
                orchestrator::list_addresses(&bytes, password.as_deref(), &[tag], Some(&steps))?;
            render::print_listed_addresses_human(&rows);
            Ok(())
        }

        Commands::Recover {
            vaults,
            threshold,
            password,
            chain,
            output,
            json,
        } => {
            let contents: Vec<Vec<u8>> = vaults.iter().map(read_vault).collect::<Result<_>>()?;
            let pairs: Vec<(&[u8], Option<&str>)> = contents
                .iter()
                .map(|bytes| (bytes.as_slice(), password.as_deref()))
                .collect();

            let chain_tags = match &chain {
                Some(c) => vec![ChainTag::from_str_loose(c)?],
                None => Vec::new(),
            };

            let keys = orchestrator::recover(&pairs, threshold, &chain_tags, None)?;

            if let Some(output_path) = &output {
                let json_bytes = serde_json::to_vec_pretty(
                    &keys
                        .iter()
                        .map(|k| {
                            serde_json::json!({
                                "chain": k.chain.as_str(),
                                "path": k.path,
                                "address": k.address,
                                "public_key": hex::encode(&k.public_key_bytes),
                                "private_key": k.private_key_encoded,
                            })
                        })
                        .collect::<Vec<_>>(),
                )?;
                std::fs::write(output_path, json_bytes)?;
            }

            if json {
                render::print_recovered_keys_json(&keys)
            } else {
                render::print_recovered_keys_human(&keys);
                Ok(())
            }
        }
    }
}
